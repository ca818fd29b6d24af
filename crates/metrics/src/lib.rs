//! Metrics collection and export for docbridge.
//!
//! Library crates record through the `metrics` facade behind their own
//! `metrics` feature. The binary installs a recorder with [`init_metrics`];
//! with the `prometheus` feature the recorder renders Prometheus text.
//!
//! ```rust,ignore
//! use docbridge_metrics::{counter, requests};
//!
//! counter!(requests::ACCEPTED_TOTAL).increment(1);
//! ```

mod definitions;
mod error;
mod recorder;

pub use {
    definitions::*,
    error::{Error, Result},
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
