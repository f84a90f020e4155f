//! Error and result types used throughout ngather.

pub use crate::error::Error;

pub type Result<T> = core::result::Result<T, Error>;
