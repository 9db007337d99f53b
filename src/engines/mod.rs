//! Pricing engine implementations.

pub mod fd;
