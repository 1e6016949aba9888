//! # relkit-observability
//!
//! Subscriber setup, span macros, and one function per structured log event.

pub mod tracing_setup;

pub use tracing_setup::{events, init_tracing, init_tracing_with_filter};
