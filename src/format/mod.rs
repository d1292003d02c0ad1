//! Auto-formatting
//!
//! Runs an external formatter over a file after it has been written.
//! Formatting never blocks: any failure leaves the file as it was.

mod auto_format;
mod config;

pub use auto_format::{format, format_file, format_file_in, FormatResult};
pub use config::{default_formatters, FormatConfig, FormatterSpec, PATH_PLACEHOLDER};
