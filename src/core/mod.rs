//! Core types shared by every module
//!
//! - `GuardError` / `GuardResult` - error types

pub mod error;

pub use error::{GuardError, GuardResult};
