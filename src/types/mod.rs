//! Shared types for coffer

mod error;

pub use error::{CofferError, Result};
