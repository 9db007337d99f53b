//! Theta-weighted backward time stepping over the price axis.
//!
//! One step solves `(I - theta*dt*L) V(t0) = (I + (1-theta)*dt*L) V(t1) + dt*q`
//! for the interior nodes, where `L` is the spatial operator assembled from
//! the diffusion term and `q` its jump-to-default inflow. Boundary rows are
//! eliminated with the linearity condition `V_SS = 0`, matching the
//! asymptotically linear behaviour of a convertible far from the money.

use crate::core::PricingError;
use crate::market::Market;

use super::diffusion::DiffusionModel;

/// Closed set of time-stepping schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scheme {
    /// Second-order implicit/explicit blend, `theta = 1/2`.
    #[default]
    CrankNicolson,
    /// Fully implicit first-order step, `theta = 1`; larger stability margin
    /// at large `dt` at the cost of temporal accuracy.
    Implicit,
}

impl Scheme {
    /// Implicit weight of the blend.
    #[inline]
    pub fn theta(self) -> f64 {
        match self {
            Self::CrankNicolson => 0.5,
            Self::Implicit => 1.0,
        }
    }
}

/// Discretized spatial operator bands over the price axis.
///
/// `L V |_i = a[i]*V[i-1] + b[i]*V[i] + c[i]*V[i+1] + q[i]` on the interior;
/// boundary entries stay zero and are handled by extrapolation.
#[derive(Debug, Clone)]
pub(crate) struct Operator {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub q: Vec<f64>,
}

impl Operator {
    /// Assembles central-difference bands on a (possibly non-uniform) grid.
    pub fn build(
        grid: &[f64],
        model: DiffusionModel,
        market: &Market,
        recovery_base: f64,
    ) -> Self {
        let n = grid.len() - 1;
        let mut a = vec![0.0_f64; n + 1];
        let mut b = vec![0.0_f64; n + 1];
        let mut c = vec![0.0_f64; n + 1];
        let mut q = vec![0.0_f64; n + 1];

        for i in 1..n {
            let h_m = grid[i] - grid[i - 1];
            let h_p = grid[i + 1] - grid[i];

            let d1_m = -h_p / (h_m * (h_m + h_p));
            let d1_0 = (h_p - h_m) / (h_m * h_p);
            let d1_p = h_m / (h_p * (h_m + h_p));

            let d2_m = 2.0 / (h_m * (h_m + h_p));
            let d2_0 = -2.0 / (h_m * h_p);
            let d2_p = 2.0 / (h_p * (h_m + h_p));

            let coeff = model.coefficients(grid[i], market, recovery_base);

            a[i] = coeff.diffusion * d2_m + coeff.drift * d1_m;
            b[i] = coeff.diffusion * d2_0 + coeff.drift * d1_0 - coeff.discount;
            c[i] = coeff.diffusion * d2_p + coeff.drift * d1_p;
            q[i] = coeff.source;
        }

        Self { a, b, c, q }
    }
}

/// Scratch buffers reused across time steps.
#[derive(Debug)]
pub(crate) struct Workspace {
    lower: Vec<f64>,
    diag: Vec<f64>,
    upper: Vec<f64>,
    rhs: Vec<f64>,
    c_star: Vec<f64>,
    d_star: Vec<f64>,
}

impl Workspace {
    /// Sizes the buffers for a price axis of `nodes` points.
    pub fn new(nodes: usize) -> Self {
        let interior = nodes.saturating_sub(2);
        Self {
            lower: vec![0.0; interior],
            diag: vec![0.0; interior],
            upper: vec![0.0; interior],
            rhs: vec![0.0; interior],
            c_star: vec![0.0; interior],
            d_star: vec![0.0; interior],
        }
    }
}

/// Advances the solution one step backward in time, writing the unconstrained
/// continuation row into `out`.
pub(crate) fn advance(
    scheme: Scheme,
    op: &Operator,
    v_next: &[f64],
    dt: f64,
    ws: &mut Workspace,
    out: &mut [f64],
) -> Result<(), PricingError> {
    let n = v_next.len() - 1;
    let interior = n - 1;
    let theta = scheme.theta();
    let explicit = 1.0 - theta;

    for k in 0..interior {
        let i = k + 1;
        ws.lower[k] = -theta * dt * op.a[i];
        ws.diag[k] = 1.0 - theta * dt * op.b[i];
        ws.upper[k] = -theta * dt * op.c[i];

        let l_explicit =
            op.a[i] * v_next[i - 1] + op.b[i] * v_next[i] + op.c[i] * v_next[i + 1];
        ws.rhs[k] = v_next[i] + explicit * dt * l_explicit + dt * op.q[i];
    }

    // Eliminate the boundary unknowns with V_0 = 2V_1 - V_2 and
    // V_n = 2V_{n-1} - V_{n-2}.
    ws.diag[0] += 2.0 * ws.lower[0];
    ws.upper[0] -= ws.lower[0];
    ws.lower[0] = 0.0;
    ws.diag[interior - 1] += 2.0 * ws.upper[interior - 1];
    ws.lower[interior - 1] -= ws.upper[interior - 1];
    ws.upper[interior - 1] = 0.0;

    solve_tridiagonal_inplace(
        &ws.lower,
        &ws.diag,
        &ws.upper,
        &ws.rhs,
        &mut ws.c_star,
        &mut ws.d_star,
        &mut out[1..n],
    )?;

    out[0] = 2.0 * out[1] - out[2];
    out[n] = 2.0 * out[n - 1] - out[n - 2];

    if out.iter().any(|v| !v.is_finite()) {
        return Err(PricingError::NumericalError(
            "non-finite value produced by the time step".to_string(),
        ));
    }
    Ok(())
}

/// In-place Thomas solve using pre-allocated scratch buffers.
pub(crate) fn solve_tridiagonal_inplace(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
    c_star: &mut [f64],
    d_star: &mut [f64],
    out: &mut [f64],
) -> Result<(), PricingError> {
    let n = diag.len();
    if n == 0 {
        return Ok(());
    }
    if lower.len() != n
        || upper.len() != n
        || rhs.len() != n
        || c_star.len() != n
        || d_star.len() != n
        || out.len() != n
    {
        return Err(PricingError::InvalidInput(
            "tridiagonal input lengths must match".to_string(),
        ));
    }
    if diag[0].abs() <= 1.0e-14 {
        return Err(PricingError::NumericalError(
            "tridiagonal solver singular matrix".to_string(),
        ));
    }

    c_star[0] = if n > 1 { upper[0] / diag[0] } else { 0.0 };
    d_star[0] = rhs[0] / diag[0];

    for i in 1..n {
        let denom = diag[i] - lower[i] * c_star[i - 1];
        if denom.abs() <= 1.0e-14 {
            return Err(PricingError::NumericalError(
                "tridiagonal solver singular matrix".to_string(),
            ));
        }
        c_star[i] = if i < n - 1 { upper[i] / denom } else { 0.0 };
        d_star[i] = (rhs[i] - lower[i] * d_star[i - 1]) / denom;
    }

    out[n - 1] = d_star[n - 1];
    for i in (0..n - 1).rev() {
        out[i] = d_star[i] - c_star[i] * out[i + 1];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::engines::fd::grid::price_axis;

    fn market(rate: f64, hazard: f64, recovery: f64) -> Market {
        Market::builder()
            .spot(100.0)
            .rate(rate)
            .flat_vol(0.20)
            .hazard_rate(hazard)
            .recovery(recovery)
            .build()
            .unwrap()
    }

    fn step_constant_row(scheme: Scheme, market: &Market, level: f64, dt: f64) -> Vec<f64> {
        let grid = price_axis(0.0, 200.0, 50).unwrap();
        let op = Operator::build(&grid, DiffusionModel::HazardAdjusted, market, 100.0);
        let v_next = vec![level; grid.len()];
        let mut out = vec![0.0; grid.len()];
        let mut ws = Workspace::new(grid.len());
        advance(scheme, &op, &v_next, dt, &mut ws, &mut out).unwrap();
        out
    }

    #[test]
    fn rateless_operator_preserves_constants() {
        let market = market(0.0, 0.0, 1.0);
        for scheme in [Scheme::CrankNicolson, Scheme::Implicit] {
            let out = step_constant_row(scheme, &market, 100.0, 0.01);
            for v in out {
                assert_relative_eq!(v, 100.0, epsilon = 1.0e-9);
            }
        }
    }

    #[test]
    fn crank_nicolson_discounts_constants_at_the_rational_rate() {
        // On a constant row the diffusion and convection stencils vanish, so
        // one CN step is the (1 - r*dt/2)/(1 + r*dt/2) Pade approximation.
        let rate = 0.05;
        let dt = 0.01;
        let market = market(rate, 0.0, 1.0);
        let expected = 100.0 * (1.0 - 0.5 * rate * dt) / (1.0 + 0.5 * rate * dt);

        let out = step_constant_row(Scheme::CrankNicolson, &market, 100.0, dt);
        for v in out {
            assert_relative_eq!(v, expected, epsilon = 1.0e-10);
        }
    }

    #[test]
    fn recovery_steady_state_is_a_fixed_point() {
        // -discount * V + source = 0 at V = lambda*R*X / (r + lambda).
        let market = market(0.05, 0.02, 0.5);
        let steady = 0.02 * 0.5 * 100.0 / 0.07;

        for scheme in [Scheme::CrankNicolson, Scheme::Implicit] {
            let out = step_constant_row(scheme, &market, steady, 0.05);
            for v in out {
                assert_relative_eq!(v, steady, epsilon = 1.0e-10);
            }
        }
    }

    #[test]
    fn singular_system_is_reported_not_propagated() {
        let lower = vec![0.0, 1.0];
        let diag = vec![0.0, 1.0];
        let upper = vec![1.0, 0.0];
        let rhs = vec![1.0, 1.0];
        let mut c_star = vec![0.0; 2];
        let mut d_star = vec![0.0; 2];
        let mut out = vec![0.0; 2];

        let err = solve_tridiagonal_inplace(
            &lower, &diag, &upper, &rhs, &mut c_star, &mut d_star, &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, PricingError::NumericalError(_)));
    }

    #[test]
    fn tridiagonal_solver_rejects_mismatched_buffers() {
        let lower = vec![0.0, 1.0];
        let diag = vec![2.0, 2.0];
        let upper = vec![1.0, 0.0];
        let rhs = vec![4.0, 8.0];
        let mut c_star = vec![0.0; 2];
        let mut d_star = vec![0.0; 2];
        let mut out = vec![0.0; 1];

        let err = solve_tridiagonal_inplace(
            &lower, &diag, &upper, &rhs, &mut c_star, &mut d_star, &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn tridiagonal_solver_matches_direct_elimination() {
        // [2 1 0; 1 2 1; 0 1 2] x = [4; 8; 8] has solution [1; 2; 3].
        let lower = vec![0.0, 1.0, 1.0];
        let diag = vec![2.0, 2.0, 2.0];
        let upper = vec![1.0, 1.0, 0.0];
        let rhs = vec![4.0, 8.0, 8.0];
        let mut c_star = vec![0.0; 3];
        let mut d_star = vec![0.0; 3];
        let mut out = vec![0.0; 3];

        solve_tridiagonal_inplace(
            &lower, &diag, &upper, &rhs, &mut c_star, &mut d_star, &mut out,
        )
        .unwrap();
        assert_relative_eq!(out[0], 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(out[1], 2.0, epsilon = 1.0e-12);
        assert_relative_eq!(out[2], 3.0, epsilon = 1.0e-12);
    }
}
