//! Separate a raw training table into features, target and identifier files.
//!
//! The target may sit in the table itself or in a separate labels file next to
//! it; see [`data::roles`] for how it is found and [`data::split`] for how the
//! outputs are kept row-aligned.

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;

pub use config::PrepConfig;
pub use error::{Diagnostic, PrepError};
pub use pipeline::{RunReport, run};
