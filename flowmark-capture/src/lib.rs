//! Receive-side capture statistics for Flowmark
//!
//! This crate attaches to a network interface, captures inbound traffic,
//! recognizes frames tagged with the Flowmark stream signature, and keeps
//! running receive counters per stream in a shared statistics table.
//!
//! ## Features
//!
//! - **Session lifecycle**: deterministic start/stop of a background
//!   receive loop from a controller thread
//! - **Tagged-frame filtering**: a capture filter that admits only signed
//!   frames and excludes ICMP copies of them (bare or VLAN-nested)
//! - **Per-stream counters**: lock-free increments into a table shared with
//!   the transmit side
//! - **Engine health**: received/dropped counter deltas from the capture
//!   engine itself
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use flowmark_capture::RxStatsSession;
//! use flowmark_core::StreamStatsTable;
//!
//! let stats = Arc::new(StreamStatsTable::new());
//! let session = RxStatsSession::new("eth0", Arc::clone(&stats));
//!
//! session.start();
//! // ... test traffic flows ...
//! session.stop();
//!
//! for (stream_id, counters) in stats.snapshot() {
//!     println!("stream {}: {} pkts / {} bytes",
//!         stream_id, counters.rx_pkts, counters.rx_bytes);
//! }
//! ```

pub mod engine;
pub mod filter;
pub mod interface;
pub mod session;
pub mod stats;

// Re-export main types
pub use engine::{AbortSignal, CaptureConfig, CaptureEngine, CaptureHandle, PcapEngine, ReadOutcome};
pub use interface::{default_interface, get_interface, list_interfaces, InterfaceInfo};
pub use session::{RxStatsSession, SessionState};
pub use stats::EngineStats;
