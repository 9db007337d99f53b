//! Convertible-bond contract schedule.
//!
//! [`ConvertibleBond`] captures face value, maturity, the coupon schedule, the
//! conversion right, and optional issuer call / holder put provisions.
//! References: Ayache, Forsyth and Vetzal (2003) for the credit-risky pricing
//! problem this contract feeds; standard convertible-bond treatment in Hull.
//! All dates are year fractions; `validate` enforces sign constraints and that
//! every scheduled date lies within `[0, maturity]`.

use crate::core::{Instrument, PricingError};

use super::schedule::{DateSet, Provision, same_date};

/// Convertible bond with optional issuer call and holder put features.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvertibleBond {
    /// Notional/face amount redeemed at maturity.
    pub face_value: f64,
    /// Maturity in years.
    pub maturity: f64,
    /// Coupon cash amount paid on each coupon date.
    pub coupon_amount: f64,
    /// Coupon payment dates.
    pub coupon_dates: DateSet,
    /// Shares received per bond when converted.
    pub conversion_ratio: f64,
    /// Conversion-eligible dates. Maturity counts as eligible whenever the
    /// bond is convertible at all.
    pub conversion_dates: DateSet,
    /// Optional issuer call provision.
    pub call: Option<Provision>,
    /// Optional holder put provision.
    pub put: Option<Provision>,
}

impl ConvertibleBond {
    /// Creates a plain (non-convertible, zero-coupon) bond.
    pub fn new(face_value: f64, maturity: f64) -> Self {
        Self {
            face_value,
            maturity,
            coupon_amount: 0.0,
            coupon_dates: DateSet::empty(),
            conversion_ratio: 0.0,
            conversion_dates: DateSet::empty(),
            call: None,
            put: None,
        }
    }

    /// Attaches a coupon schedule paying `amount` on each date.
    pub fn with_coupons(mut self, dates: DateSet, amount: f64) -> Self {
        self.coupon_dates = dates;
        self.coupon_amount = amount;
        self
    }

    /// Attaches a conversion right for `ratio` shares on the given dates.
    pub fn with_conversion(mut self, dates: DateSet, ratio: f64) -> Self {
        self.conversion_dates = dates;
        self.conversion_ratio = ratio;
        self
    }

    /// Attaches an issuer call provision.
    pub fn with_call(mut self, call: Provision) -> Self {
        self.call = Some(call);
        self
    }

    /// Attaches a holder put provision.
    pub fn with_put(mut self, put: Provision) -> Self {
        self.put = Some(put);
        self
    }

    /// Validates instrument fields.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.face_value <= 0.0 || !self.face_value.is_finite() {
            return Err(PricingError::InvalidInput(
                "convertible face_value must be finite and > 0".to_string(),
            ));
        }
        if self.maturity < 0.0 || !self.maturity.is_finite() {
            return Err(PricingError::InvalidInput(
                "convertible maturity must be finite and >= 0".to_string(),
            ));
        }
        if self.coupon_amount < 0.0 || !self.coupon_amount.is_finite() {
            return Err(PricingError::InvalidInput(
                "convertible coupon_amount must be finite and >= 0".to_string(),
            ));
        }
        if self.conversion_ratio < 0.0 || !self.conversion_ratio.is_finite() {
            return Err(PricingError::InvalidInput(
                "convertible conversion_ratio must be finite and >= 0".to_string(),
            ));
        }
        if !self.conversion_dates.is_empty() && self.conversion_ratio == 0.0 {
            return Err(PricingError::InvalidInput(
                "conversion dates require a conversion_ratio > 0".to_string(),
            ));
        }

        let in_range = |d: f64| d <= self.maturity + super::schedule::TIME_TOL;
        if !self.coupon_dates.as_slice().iter().copied().all(in_range)
            || !self.conversion_dates.as_slice().iter().copied().all(in_range)
            || !self
                .call
                .iter()
                .flat_map(|p| p.dates().iter().copied())
                .all(in_range)
            || !self
                .put
                .iter()
                .flat_map(|p| p.dates().iter().copied())
                .all(in_range)
        {
            return Err(PricingError::InvalidInput(
                "scheduled dates must not exceed maturity".to_string(),
            ));
        }

        Ok(())
    }

    /// True when `t` is a coupon payment date.
    #[inline]
    pub fn is_coupon_date(&self, t: f64) -> bool {
        self.coupon_dates.contains(t)
    }

    /// True when the holder may convert at `t`. Maturity is always eligible
    /// for a convertible bond.
    #[inline]
    pub fn is_conversion_date(&self, t: f64) -> bool {
        self.conversion_dates.contains(t)
            || (!self.conversion_dates.is_empty() && same_date(t, self.maturity))
    }

    /// Equity value received on conversion at price level `s`.
    #[inline]
    pub fn conversion_value(&self, s: f64) -> f64 {
        self.conversion_ratio * s
    }

    /// Cash redeemed at maturity: face plus the final coupon when maturity is
    /// a coupon date.
    pub fn redemption_value(&self) -> f64 {
        if self.is_coupon_date(self.maturity) {
            self.face_value + self.coupon_amount
        } else {
            self.face_value
        }
    }

    /// All scheduled event dates, for seeding the time axis.
    pub fn event_dates(&self) -> Vec<f64> {
        let mut dates = Vec::new();
        dates.extend_from_slice(self.coupon_dates.as_slice());
        dates.extend_from_slice(self.conversion_dates.as_slice());
        if let Some(call) = &self.call {
            dates.extend_from_slice(call.dates());
        }
        if let Some(put) = &self.put {
            dates.extend_from_slice(put.dates());
        }
        dates
    }
}

impl Instrument for ConvertibleBond {
    fn instrument_type(&self) -> &str {
        "ConvertibleBond"
    }
}
