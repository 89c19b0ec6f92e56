//! Configuration for Estimatorium.
//!
//! Reads `.estimatorium/config.yaml` (or an explicit file) holding report
//! and logging options.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
