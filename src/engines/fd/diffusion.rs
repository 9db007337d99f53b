//! Local PDE coefficients for the credit-risky convertible diffusion.
//!
//! Both variants price under a total-default jump: on default the equity
//! drops to zero and the holder receives `recovery * face` immediately
//! (Ayache, Forsyth and Vetzal 2003). They differ in where the hazard rate
//! enters the operator:
//!
//! - [`DiffusionModel::Separated`] keeps the riskless drift `r*S` and layers
//!   default risk on top as an additive hazard: extra discounting at the
//!   intensity plus the jump-to-recovery inflow.
//! - [`DiffusionModel::HazardAdjusted`] folds the intensity into the
//!   effective drift `(r + lambda)*S`, compensating the equity for the jump
//!   to zero, so the generic discretization already carries the default risk.
//!
//! With a zero hazard rate the two produce identical coefficients, and the
//! solved surfaces agree to numerical tolerance.

use crate::market::Market;

/// Local coefficients of the spatial operator at one price level.
///
/// The operator applied by the scheme is
/// `L V = diffusion * V_SS + drift * V_S - discount * V + source`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdeCoefficients {
    /// Second-derivative coefficient, `0.5 * vol^2 * S^2`.
    pub diffusion: f64,
    /// First-derivative (convection) coefficient.
    pub drift: f64,
    /// Rate applied to the value itself.
    pub discount: f64,
    /// Inhomogeneous jump-to-default inflow, `lambda * recovery * face`.
    pub source: f64,
}

/// Closed set of diffusion variants selectable per solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiffusionModel {
    /// Riskless diffusion with default risk layered on as an additive hazard.
    Separated,
    /// Hazard rate folded into the effective drift and discount.
    #[default]
    HazardAdjusted,
}

impl DiffusionModel {
    /// Computes the local operator coefficients at price level `s`.
    ///
    /// `recovery_base` is the cash amount the recovery fraction applies to
    /// (the bond's face value).
    pub fn coefficients(self, s: f64, market: &Market, recovery_base: f64) -> PdeCoefficients {
        let lambda = market.hazard_rate;
        let diffusion = 0.5 * market.vol * market.vol * s * s;
        let carry = market.rate - market.dividend_yield;
        let source = lambda * market.recovery * recovery_base;

        match self {
            Self::Separated => PdeCoefficients {
                diffusion,
                drift: carry * s,
                discount: market.rate + lambda,
                source,
            },
            Self::HazardAdjusted => PdeCoefficients {
                diffusion,
                drift: (carry + lambda) * s,
                discount: market.rate + lambda,
                source,
            },
        }
    }
}
