//! Shorthand imports for the config crate.

/// Config error type.
pub use crate::error::Error;

/// Result alias used across `ng-config`.
pub type Result<T> = core::result::Result<T, Error>;
