//! Flowmark Core Library
//!
//! This crate provides the fundamental types shared by the Flowmark traffic
//! test tooling: the stream signature codec used to tag and recognize
//! test-generated frames, the concurrent per-stream statistics table shared
//! between the transmit and receive sides, and common error handling.

pub mod error;
pub mod sign;
pub mod stats;

// Re-export commonly used types
pub use error::{Error, Result};
pub use stats::{StreamStats, StreamStatsSnapshot, StreamStatsTable};
