//! Price and time axis construction for the backward sweep.
//!
//! The price axis is uniform over the caller's bounds. The time axis is the
//! union of the contract's event dates with a uniform refinement, so no step
//! exceeds `maturity / time_steps` and every event lands on a mesh time
//! exactly.

use crate::core::PricingError;
use crate::instruments::schedule::TIME_TOL;

/// Builds the uniform price axis `S[0..=steps]` over `[lower, upper]`.
pub fn price_axis(lower: f64, upper: f64, steps: usize) -> Result<Vec<f64>, PricingError> {
    if !lower.is_finite() || !upper.is_finite() || lower < 0.0 {
        return Err(PricingError::InvalidInput(
            "price bounds must be finite and lower >= 0".to_string(),
        ));
    }
    if upper <= lower {
        return Err(PricingError::InvalidInput(
            "price upper bound must exceed lower bound".to_string(),
        ));
    }
    if steps < 3 {
        return Err(PricingError::InvalidInput(
            "price_steps must be >= 3".to_string(),
        ));
    }

    let ds = (upper - lower) / steps as f64;
    let mut axis: Vec<f64> = (0..=steps).map(|i| lower + i as f64 * ds).collect();
    axis[steps] = upper;
    Ok(axis)
}

/// Builds the time axis `t[0..=M]` from `0` to `maturity`, seeded with the
/// contract event dates and refined so no interval exceeds
/// `maturity / time_steps`.
pub fn time_axis(
    event_dates: &[f64],
    maturity: f64,
    time_steps: usize,
) -> Result<Vec<f64>, PricingError> {
    if !maturity.is_finite() || maturity < 0.0 {
        return Err(PricingError::InvalidInput(
            "maturity must be finite and >= 0".to_string(),
        ));
    }
    if time_steps == 0 {
        return Err(PricingError::InvalidInput(
            "time_steps must be > 0".to_string(),
        ));
    }
    if maturity <= TIME_TOL {
        return Ok(vec![0.0]);
    }

    let mut knots = vec![0.0, maturity];
    knots.extend(
        event_dates
            .iter()
            .copied()
            .filter(|&d| d > TIME_TOL && d < maturity - TIME_TOL),
    );
    knots.sort_by(f64::total_cmp);
    knots.dedup_by(|a, b| (*a - *b).abs() <= TIME_TOL);

    let base_dt = maturity / time_steps as f64;
    let mut axis = Vec::with_capacity(time_steps + knots.len());
    for window in knots.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        let gap = hi - lo;
        let substeps = ((gap / base_dt - TIME_TOL).ceil() as usize).max(1);
        for j in 0..substeps {
            axis.push(lo + gap * j as f64 / substeps as f64);
        }
    }
    axis.push(maturity);

    if axis.windows(2).any(|w| w[1] - w[0] <= TIME_TOL) {
        return Err(PricingError::NumericalError(
            "failed to build a strictly increasing time axis".to_string(),
        ));
    }
    Ok(axis)
}
