//! Error codes shared by every error type in the crate.
//!
//! Each module owns its own `thiserror` enum; this trait gives all of them a
//! stable, grepable code and a retryable hint for structured log fields.

/// Stable machine-readable identity for an error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
