// rmx-core/src/lib.rs
pub mod compat;
pub mod coverage;
pub mod dependents;
pub mod matrix;

// Re-export key types
pub use compat::FormulaCompat;
pub use coverage::{CoverageEngine, RunnerFilter};
pub use dependents::{BrewDependentQuery, DependentQuery};
pub use matrix::{MatrixBuilder, RunnerSpec};
