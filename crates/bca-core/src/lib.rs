//! Core types for BCa bootstrap analysis
//!
//! This crate provides the foundations shared by the bca-stats crates:
//!
//! - [`Error`] / [`Result`]: the unified error type
//! - [`math`]: standard normal functions and descriptive moments
//! - [`execution`]: sequential and parallel batch engines plus cooperative
//!   cancellation
//!
//! # Example
//!
//! ```rust
//! use bca_core::{execution::{sequential, ExecutionEngine}, math::distributions::normal};
//!
//! let engine = sequential();
//! let z: Vec<f64> = engine.execute_batch(3, |i| normal::ppf(0.25 * (i + 1) as f64));
//! assert_eq!(z[1], 0.0);
//! ```

pub mod error;
pub mod execution;
pub mod math;

pub use error::{Error, Result};

pub use execution::{
    auto_engine, sequential, CancellationToken, ExecutionEngine, ExecutionStrategy,
    SequentialEngine,
};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::execution::{sequential, CancellationToken, ExecutionEngine, ExecutionStrategy};
    #[cfg(feature = "parallel")]
    pub use crate::execution::parallel;
}
