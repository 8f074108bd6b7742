//! Types shared by the h2yaml crates: the configuration, the error type, and test helpers.

pub mod config;
mod error;
pub mod test_util;

pub use error::Error;
