//! Contract-schedule primitives: event-date sets and strike provisions.
//!
//! Dates are year fractions from the valuation date. Membership tests use a
//! fixed absolute tolerance so event dates survive the round trip through
//! time-axis construction.

use crate::core::PricingError;

/// Absolute tolerance for matching contract dates on the time axis.
pub const TIME_TOL: f64 = 1.0e-9;

/// Returns true when two dates coincide up to [`TIME_TOL`].
#[inline]
pub(crate) fn same_date(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_TOL
}

/// Sorted set of contract event dates.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateSet {
    dates: Vec<f64>,
}

impl DateSet {
    /// Creates a date set from strictly increasing, finite, non-negative dates.
    pub fn new(dates: Vec<f64>) -> Result<Self, PricingError> {
        for &d in &dates {
            if !d.is_finite() || d < 0.0 {
                return Err(PricingError::InvalidInput(
                    "schedule dates must be finite and >= 0".to_string(),
                ));
            }
        }
        if dates.windows(2).any(|w| w[1] - w[0] <= TIME_TOL) {
            return Err(PricingError::InvalidInput(
                "schedule dates must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { dates })
    }

    /// Creates the regular set `{step, 2*step, ..}` up to and including `end`.
    pub fn regular(step: f64, end: f64) -> Result<Self, PricingError> {
        if !step.is_finite() || step <= 0.0 || !end.is_finite() || end <= 0.0 {
            return Err(PricingError::InvalidInput(
                "regular schedule needs step > 0 and end > 0".to_string(),
            ));
        }
        let count = (end / step + TIME_TOL).floor() as usize;
        let dates = (1..=count).map(|k| k as f64 * step).collect();
        Self::new(dates)
    }

    /// Empty set.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.dates
    }

    /// Membership up to [`TIME_TOL`].
    pub fn contains(&self, t: f64) -> bool {
        let hi = self.dates.partition_point(|&d| d < t);
        (hi < self.dates.len() && same_date(self.dates[hi], t))
            || (hi > 0 && same_date(self.dates[hi - 1], t))
    }

    /// Largest date in the set, if any.
    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.dates.last().copied()
    }
}

/// Call or put provision: eligible dates paired with a per-date strike.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Provision {
    dates: Vec<f64>,
    strikes: Vec<f64>,
}

impl Provision {
    /// Creates a provision from `(date, strike)` points with strictly
    /// increasing dates and positive strikes.
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, PricingError> {
        let (dates, strikes): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
        DateSet::new(dates.clone())?;
        if strikes.iter().any(|&k| !k.is_finite() || k <= 0.0) {
            return Err(PricingError::InvalidInput(
                "provision strikes must be finite and > 0".to_string(),
            ));
        }
        Ok(Self { dates, strikes })
    }

    /// Creates a provision with one strike level across all dates.
    pub fn flat(dates: &DateSet, strike: f64) -> Result<Self, PricingError> {
        Self::new(dates.as_slice().iter().map(|&d| (d, strike)).collect())
    }

    #[inline]
    pub fn dates(&self) -> &[f64] {
        &self.dates
    }

    /// Membership up to [`TIME_TOL`].
    pub fn contains(&self, t: f64) -> bool {
        self.index_of(t).is_some()
    }

    /// Strike at an eligible date. Querying a non-member date is a contract
    /// violation and is never masked by a default value.
    pub fn strike(&self, t: f64) -> Result<f64, PricingError> {
        self.index_of(t).map(|i| self.strikes[i]).ok_or_else(|| {
            PricingError::InvalidQuery(format!("no provision strike at t={t}"))
        })
    }

    fn index_of(&self, t: f64) -> Option<usize> {
        let hi = self.dates.partition_point(|&d| d < t);
        if hi < self.dates.len() && same_date(self.dates[hi], t) {
            Some(hi)
        } else if hi > 0 && same_date(self.dates[hi - 1], t) {
            Some(hi - 1)
        } else {
            None
        }
    }
}
