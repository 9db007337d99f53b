//! Backward-induction orchestration over the `(price, time)` mesh.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::{
    Decision, DiagKey, Diagnostics, PricingEngine, PricingError, PricingResult,
};
use crate::instruments::ConvertibleBond;
use crate::instruments::schedule::same_date;
use crate::market::Market;

use super::classifier::Classifier;
use super::diffusion::DiffusionModel;
use super::grid::{price_axis, time_axis};
use super::scheme::{Operator, Scheme, Workspace, advance};

/// Finished solve: value surface, decision codes, and the mesh axes.
///
/// `v[time][price]` and `decisions[time][price]` align with `t` and `s`;
/// time index `0` is the valuation date and the last index is maturity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FdSolution {
    /// Value surface, `v[time][price]`.
    pub v: Vec<Vec<f64>>,
    /// Decision code per mesh node, same shape as `v`.
    pub decisions: Vec<Vec<Decision>>,
    /// Price axis.
    pub s: Vec<f64>,
    /// Time axis.
    pub t: Vec<f64>,
}

impl FdSolution {
    /// Linear interpolation of the value surface at `spot` on one time row.
    pub fn value_at(&self, time_index: usize, spot: f64) -> f64 {
        let row = &self.v[time_index];
        if spot <= self.s[0] {
            return row[0];
        }
        let n = self.s.len() - 1;
        if spot >= self.s[n] {
            return row[n];
        }
        let hi = self.s.partition_point(|&x| x < spot).clamp(1, n);
        let lo = hi - 1;
        let w = (spot - self.s[lo]) / (self.s[hi] - self.s[lo]);
        (1.0 - w) * row[lo] + w * row[hi]
    }

    /// Index of the time-axis entry matching `t`, if present.
    pub fn time_index(&self, t: f64) -> Option<usize> {
        self.t.iter().position(|&x| same_date(x, t))
    }

    /// Index of the price-axis entry matching `s`, if present.
    pub fn price_index(&self, s: f64) -> Option<usize> {
        self.s
            .iter()
            .position(|&x| (x - s).abs() <= 1.0e-9 * (1.0 + s.abs()))
    }
}

/// Finite-difference convertible-bond engine.
///
/// Holds grid configuration only; every `solve` is deterministic for
/// identical inputs and shares no state with other solves.
#[derive(Debug, Clone, PartialEq)]
pub struct FdEngine {
    /// Lower price bound of the mesh.
    pub lower_bound: f64,
    /// Upper price bound of the mesh.
    pub upper_bound: f64,
    /// Number of price intervals.
    pub price_steps: usize,
    /// Target number of uniform time intervals (event dates refine further).
    pub time_steps: usize,
    /// Time-stepping scheme.
    pub scheme: Scheme,
    /// Diffusion variant.
    pub diffusion: DiffusionModel,
}

impl FdEngine {
    /// Creates an engine over `[lower_bound, upper_bound]` with `price_steps`
    /// intervals; time steps default to the same count.
    pub fn new(lower_bound: f64, upper_bound: f64, price_steps: usize) -> Self {
        Self {
            lower_bound,
            upper_bound,
            price_steps,
            time_steps: price_steps,
            scheme: Scheme::default(),
            diffusion: DiffusionModel::default(),
        }
    }

    /// Sets the target number of time steps.
    pub fn with_time_steps(mut self, time_steps: usize) -> Self {
        self.time_steps = time_steps;
        self
    }

    /// Selects the time-stepping scheme.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Selects the diffusion variant.
    pub fn with_diffusion(mut self, diffusion: DiffusionModel) -> Self {
        self.diffusion = diffusion;
        self
    }

    /// Solves the full surface by a single backward sweep.
    ///
    /// The terminal row is the redemption payoff; every earlier row is the
    /// scheme's unconstrained continuation passed through the classifier at
    /// each node. No node is revisited once finalized.
    pub fn solve(
        &self,
        bond: &ConvertibleBond,
        market: &Market,
    ) -> Result<FdSolution, PricingError> {
        bond.validate()?;

        let s = price_axis(self.lower_bound, self.upper_bound, self.price_steps)?;
        let t = time_axis(&bond.event_dates(), bond.maturity, self.time_steps)?;
        let nodes = s.len();
        let steps = t.len() - 1;

        let classifier = Classifier::new(bond);
        let mut v = vec![Vec::new(); steps + 1];
        let mut decisions = vec![Vec::new(); steps + 1];

        // Terminal condition: redemption against conversion, classified like
        // any other finalized row.
        let redemption = bond.redemption_value();
        let terminal: Vec<f64> = s
            .iter()
            .map(|&si| {
                if bond.is_conversion_date(bond.maturity) {
                    redemption.max(bond.conversion_value(si))
                } else {
                    redemption
                }
            })
            .collect();
        let (row, codes) = classify_row(&classifier, bond.maturity, &s, &terminal, &terminal)?;
        v[steps] = row;
        decisions[steps] = codes;

        if steps == 0 {
            return Ok(FdSolution { v, decisions, s, t });
        }

        let op = Operator::build(&s, self.diffusion, market, bond.face_value);
        let mut ws = Workspace::new(nodes);
        let mut continuation = vec![0.0_f64; nodes];

        for k in (0..steps).rev() {
            let dt = t[k + 1] - t[k];
            advance(self.scheme, &op, &v[k + 1], dt, &mut ws, &mut continuation)?;

            // Coupon cash crossing this date enters the row before the
            // classifier sees it; the classifier strips it for its tests.
            let coupon = if bond.is_coupon_date(t[k]) && !same_date(t[k], bond.maturity) {
                bond.coupon_amount
            } else {
                0.0
            };
            let cum: Vec<f64> = continuation.iter().map(|&x| x + coupon).collect();

            let (row, codes) = classify_row(&classifier, t[k], &s, &cum, &continuation)?;
            v[k] = row;
            decisions[k] = codes;
        }

        Ok(FdSolution { v, decisions, s, t })
    }
}

/// Classifies one finalized continuation row node by node.
///
/// Nodes are independent given the solved row, so this is the one spot where
/// a parallel sweep is legal.
fn classify_row(
    classifier: &Classifier<'_>,
    t: f64,
    s: &[f64],
    cum: &[f64],
    aux: &[f64],
) -> Result<(Vec<f64>, Vec<Decision>), PricingError> {
    let classify_node =
        |i: usize| -> Result<(f64, Decision), PricingError> {
            classifier.classify(t, s[i], cum[i], aux[i])
        };

    #[cfg(feature = "parallel")]
    let classified: Vec<(f64, Decision)> = (0..s.len())
        .into_par_iter()
        .map(classify_node)
        .collect::<Result<_, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let classified: Vec<(f64, Decision)> = (0..s.len())
        .map(classify_node)
        .collect::<Result<_, _>>()?;

    Ok(classified.into_iter().unzip())
}

impl PricingEngine<ConvertibleBond> for FdEngine {
    /// Solves the surface and interpolates the valuation-date row at the
    /// market spot.
    fn price(
        &self,
        instrument: &ConvertibleBond,
        market: &Market,
    ) -> Result<PricingResult, PricingError> {
        let solution = self.solve(instrument, market)?;
        let price = solution.value_at(0, market.spot);

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert(DiagKey::NumTimeSteps, (solution.t.len() - 1) as f64);
        diagnostics.insert(DiagKey::NumSpaceSteps, (solution.s.len() - 1) as f64);
        diagnostics.insert(DiagKey::SLower, self.lower_bound);
        diagnostics.insert(DiagKey::SUpper, self.upper_bound);
        diagnostics.insert(DiagKey::HazardRate, market.hazard_rate);
        diagnostics.insert(DiagKey::RecoveryRate, market.recovery);

        Ok(PricingResult { price, diagnostics })
    }
}
