//! Common types for the device layer.

/// Device layer error type.
pub use crate::error::Error;

/// Device layer result type.
pub type Result<T> = core::result::Result<T, Error>;
