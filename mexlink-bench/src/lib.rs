//! # mexlink Bench
//!
//! Fixtures and latency measurement shared by the criterion benches.

pub mod fixtures;
pub mod latency;
