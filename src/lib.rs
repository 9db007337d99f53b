//! Convertible-bond pricing by finite differences under credit (default) risk.
//!
//! The crate solves the single-factor convertible-bond PDE backwards in time on
//! a `(price, time)` mesh and returns the full value surface together with a
//! per-node decision code (hold, put, call, conversion, forced conversion,
//! redemption) describing which contractual feature binds at each mesh point.
//!
//! References used across modules:
//! - Ayache, Forsyth and Vetzal (2003), *Valuation of Convertible Bonds With
//!   Credit Risk*, for the total-default hazard formulation.
//! - Tsiveriotis and Fernandes (1998) for the classical credit split the
//!   hazard-adjusted model replaces.
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 21 and 27,
//!   for finite-difference discretization and convertible features.
//!
//! Numerical considerations:
//! - The default time stepper is Crank-Nicolson (second order in time); a fully
//!   implicit first-order stepper is available for extra stability margin at
//!   large steps.
//! - Contract event dates are always inserted into the time axis so coupons,
//!   call/put windows, and conversion rights are applied at exact times rather
//!   than being smeared across a step.
//! - A singular tridiagonal system or a non-finite grid row aborts the solve
//!   with a numerical error instead of letting NaNs corrupt earlier steps.
//!
//! # Feature Flags
//! - `parallel`: enables Rayon-parallel per-node classification within a row.
//! - `serde`: enables serde derives on the public contract and result types.
//!
//! # Quick Start
//! Price a 5y convertible paying semiannual coupons of 4, convertible one-for-one
//! on every coupon date, under a 2% hazard rate with full recovery:
//! ```rust
//! use convertible_fd::prelude::*;
//!
//! let coupons = DateSet::regular(0.5, 5.0).unwrap();
//! let bond = ConvertibleBond::new(100.0, 5.0)
//!     .with_coupons(coupons.clone(), 4.0)
//!     .with_conversion(coupons, 1.0);
//! let market = Market::builder()
//!     .spot(100.0)
//!     .rate(0.05)
//!     .flat_vol(0.20)
//!     .hazard_rate(0.02)
//!     .recovery(1.0)
//!     .build()
//!     .unwrap();
//!
//! let solution = FdEngine::new(0.0, 200.0, 200).solve(&bond, &market).unwrap();
//! assert_eq!(solution.s.len(), 201);
//!
//! let price = solution.value_at(0, market.spot);
//! assert!(price > 100.0 && price < 150.0);
//! ```

pub mod core;
pub mod engines;
pub mod instruments;
pub mod market;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::engines::fd::{DiffusionModel, FdEngine, FdSolution, Scheme};
    pub use crate::instruments::*;
    pub use crate::market::*;
}
