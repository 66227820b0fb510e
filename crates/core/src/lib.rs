//! tfusers core library.
//!
//! This crate converts a user-directory CSV export into a Terraform
//! variables file: reading the export, mapping rows to users keyed by login,
//! rendering the mapping as a variable assignment, and writing it out.

pub mod config;
pub mod converter;
pub mod directory;
pub mod errors;
pub mod tfvars;

// Re-exports for convenience.
pub use config::AppConfig;
pub use converter::{ConversionSummary, ConvertOptions, Converter};
pub use directory::{User, UserMapping};
pub use errors::CoreError;
