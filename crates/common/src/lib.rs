//! ERP QA common library
//!
//! Stock quantity types and the convergence poller shared by the harness crates.

pub mod error;
pub mod poll;
pub mod types;

pub use error::{Error, Result};
pub use poll::{poll_until_eq, ConvergenceTimeout, Converged, PollConfig, PollError};
pub use types::*;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
