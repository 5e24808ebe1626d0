//! Zip extraction with path sanitization.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Path sanitization (zip-slip prevention)
//! - `extract.rs` - Member extraction with staged placement
//! - `report.rs` - What was written where

pub use error::{Error, Result};
pub use extract::extract_zip;
pub use options::ExtractOptions;
pub use report::{ExtractReport, ExtractedEntry};
pub use sanitize::{SanitizedPath, sanitize_path_with_options};

mod error;
mod extract;
mod options;
mod report;
mod sanitize;
