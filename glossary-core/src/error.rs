//! Domain errors raised during extraction
//!
//! I/O and archive failures travel as `anyhow` errors with context attached.
//! The variants here mark conditions callers may want to tell apart, and can
//! be recovered from an `anyhow::Error` with `downcast_ref::<ExtractError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Sheet '{sheet}' not found in workbook")]
    SheetNotFound { sheet: String },

    #[error("Malformed list formula {formula:?} in data validation for {sqref}")]
    MalformedFormula { sqref: String, formula: String },

    #[error("Unsupported file format: {path} (expected .xlsx or .xlsm)")]
    UnsupportedFormat { path: String },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}
