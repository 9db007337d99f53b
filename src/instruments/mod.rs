//! Instrument definitions.

pub mod convertible;
pub mod schedule;

pub use convertible::ConvertibleBond;
pub use schedule::{DateSet, Provision};
