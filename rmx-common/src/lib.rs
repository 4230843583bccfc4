// rmx-common/src/lib.rs
pub mod config;
pub mod dependency;
pub mod error;
pub mod formulary;
pub mod model;

// Re-export key types
pub use config::Config;
pub use dependency::Requirement;
pub use error::{Result, RmxError};
pub use formulary::Formulary;
pub use model::{Arch, Formula, MacOsCatalog, MacOsVersion, Platform};
