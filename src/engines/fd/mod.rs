//! Finite-difference convertible-bond engine.

pub mod classifier;
pub mod diffusion;
pub mod engine;
pub mod grid;
pub mod scheme;

pub use classifier::Classifier;
pub use diffusion::{DiffusionModel, PdeCoefficients};
pub use engine::{FdEngine, FdSolution};
pub use scheme::Scheme;
