//! Market snapshot consumed by the pricing engine.
//!
//! The snapshot carries the flat model parameters of the single-factor
//! credit-risky diffusion: risk-free rate, dividend yield, volatility, hazard
//! rate, and the fractional recovery on default. Recovery is an explicit field
//! of the snapshot rather than shared state, so independent solves sweeping
//! the recovery rate never interfere with each other.

use crate::core::PricingError;

/// Market snapshot used by all pricing engines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Market {
    /// Spot price of the underlying equity.
    pub spot: f64,
    /// Continuously compounded risk-free rate.
    pub rate: f64,
    /// Continuously compounded dividend yield.
    pub dividend_yield: f64,
    /// Flat volatility of the underlying.
    pub vol: f64,
    /// Instantaneous default intensity.
    pub hazard_rate: f64,
    /// Fractional recovery on the bond's face value upon default, in `[0, 1]`.
    pub recovery: f64,
}

impl Market {
    /// Starts a market builder.
    #[inline]
    pub fn builder() -> MarketBuilder {
        MarketBuilder::default()
    }
}

/// Builder for [`Market`].
#[derive(Debug, Clone, Default)]
pub struct MarketBuilder {
    spot: Option<f64>,
    rate: Option<f64>,
    dividend_yield: Option<f64>,
    flat_vol: Option<f64>,
    hazard_rate: Option<f64>,
    recovery: Option<f64>,
}

impl MarketBuilder {
    /// Sets the spot price.
    #[inline]
    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Sets the flat risk-free rate.
    #[inline]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Sets the continuous dividend yield.
    #[inline]
    pub fn dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = Some(dividend_yield);
        self
    }

    /// Sets a flat volatility.
    #[inline]
    pub fn flat_vol(mut self, vol: f64) -> Self {
        self.flat_vol = Some(vol);
        self
    }

    /// Sets the instantaneous default intensity.
    #[inline]
    pub fn hazard_rate(mut self, hazard_rate: f64) -> Self {
        self.hazard_rate = Some(hazard_rate);
        self
    }

    /// Sets the fractional recovery on default.
    #[inline]
    pub fn recovery(mut self, recovery: f64) -> Self {
        self.recovery = Some(recovery);
        self
    }

    /// Validates and builds a [`Market`].
    pub fn build(self) -> Result<Market, PricingError> {
        let spot = self
            .spot
            .ok_or_else(|| PricingError::InvalidInput("market spot is required".to_string()))?;
        if spot <= 0.0 || !spot.is_finite() {
            return Err(PricingError::InvalidInput(
                "market spot must be finite and > 0".to_string(),
            ));
        }

        let rate = self.rate.unwrap_or(0.0);
        if !rate.is_finite() {
            return Err(PricingError::InvalidInput(
                "market rate must be finite".to_string(),
            ));
        }

        let dividend_yield = self.dividend_yield.unwrap_or(0.0);
        if !dividend_yield.is_finite() {
            return Err(PricingError::InvalidInput(
                "market dividend_yield must be finite".to_string(),
            ));
        }

        let vol = self.flat_vol.ok_or_else(|| {
            PricingError::InvalidInput("market flat_vol is required".to_string())
        })?;
        if vol <= 0.0 || !vol.is_finite() {
            return Err(PricingError::InvalidInput(
                "market flat_vol must be finite and > 0".to_string(),
            ));
        }

        let hazard_rate = self.hazard_rate.unwrap_or(0.0);
        if hazard_rate < 0.0 || !hazard_rate.is_finite() {
            return Err(PricingError::InvalidInput(
                "market hazard_rate must be finite and >= 0".to_string(),
            ));
        }

        let recovery = self.recovery.unwrap_or(1.0);
        if !(0.0..=1.0).contains(&recovery) {
            return Err(PricingError::InvalidInput(
                "market recovery must lie in [0, 1]".to_string(),
            ));
        }

        Ok(Market {
            spot,
            rate,
            dividend_yield,
            vol,
            hazard_rate,
            recovery,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> MarketBuilder {
        Market::builder().spot(100.0).rate(0.05).flat_vol(0.20)
    }

    #[test]
    fn builder_applies_defaults() {
        let market = base().build().unwrap();
        assert_eq!(market.dividend_yield, 0.0);
        assert_eq!(market.hazard_rate, 0.0);
        assert_eq!(market.recovery, 1.0);
    }

    #[test]
    fn builder_rejects_recovery_outside_unit_interval() {
        let err = base().recovery(1.5).build().unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));

        let err = base().recovery(-0.1).build().unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn builder_rejects_non_positive_vol_and_spot() {
        let err = Market::builder()
            .spot(100.0)
            .flat_vol(0.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));

        let err = Market::builder()
            .spot(-1.0)
            .flat_vol(0.2)
            .build()
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn builder_rejects_negative_hazard() {
        let err = base().hazard_rate(-0.01).build().unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }
}
