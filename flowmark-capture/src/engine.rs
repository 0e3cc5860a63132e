//! Capture engine abstraction and its pcap implementation
//!
//! The receive loop consumes the capture engine only through the traits
//! here, so the same session logic runs against live pcap in production and
//! against a scripted engine in tests (opening a real handle needs
//! privileges most environments don't grant).

use pcap::{Active, Capture, Device};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use flowmark_core::{Error, Result};

use crate::interface::get_interface;
use crate::stats::EngineStats;

/// Default snapshot length (maximum bytes per packet)
const DEFAULT_SNAPLEN: i32 = 65535;

/// Default read timeout. Short enough that the receive loop observes a stop
/// request promptly even with no traffic.
const DEFAULT_TIMEOUT_MS: i32 = 100;

/// Configuration for opening a live capture handle
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Per-read timeout in milliseconds
    pub timeout_ms: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
        }
    }
}

/// One delivery from a capture handle
#[derive(Debug)]
pub enum ReadOutcome {
    /// A captured packet. `data` holds the captured bytes (possibly
    /// truncated at the snapshot length); `wire_len` is the original
    /// on-wire length.
    Packet { data: Vec<u8>, wire_len: u32 },
    /// The read timeout expired with no traffic
    Timeout,
    /// A recoverable read error
    Error(String),
    /// The handle was aborted out-of-band
    Aborted,
}

/// Cross-thread cancellation token for a pending capture read.
///
/// The controller holds a clone while the receive loop owns the handle, so
/// stopping never requires handle access from the controller side.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    /// Create an unraised signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the next (or current) read return [`ReadOutcome::Aborted`]
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether an abort has been requested
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A live capture handle, owned by the receive loop while it runs
pub trait CaptureHandle: Send {
    /// Restrict capture to inbound traffic. Returns `false` when the
    /// platform or engine does not support direction filtering.
    fn set_direction_in(&mut self) -> bool;

    /// Compile and install a capture filter expression
    fn apply_filter(&mut self, expr: &str) -> Result<()>;

    /// Pull the next packet, blocking up to the configured read timeout
    fn next_packet(&mut self) -> ReadOutcome;

    /// Engine-level counters accumulated since the handle was opened
    fn engine_stats(&mut self) -> Result<EngineStats>;

    /// Token that unblocks this handle's reads from another thread
    fn abort_signal(&self) -> AbortSignal;
}

/// Factory for live capture handles
pub trait CaptureEngine: Send + Sync {
    /// Open a live handle on `device`.
    ///
    /// Inability to enable promiscuous mode is reported as
    /// [`Error::PromiscuousDenied`]; any other failure as a generic capture
    /// or interface error.
    fn open(&self, device: &str, config: &CaptureConfig) -> Result<Box<dyn CaptureHandle>>;
}

/// Capture engine backed by the `pcap` crate
#[derive(Debug, Default)]
pub struct PcapEngine;

impl CaptureEngine for PcapEngine {
    fn open(&self, device: &str, config: &CaptureConfig) -> Result<Box<dyn CaptureHandle>> {
        get_interface(device)?;

        let capture = Capture::from_device(Device::from(device))
            .map_err(|e| Error::Capture(format!("Failed to create capture on {}: {}", device, e)))?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.timeout_ms)
            .open()
            .map_err(|e| classify_open_error(config, e))?;

        debug!("Opened live capture on {}", device);

        Ok(Box::new(PcapHandle {
            capture,
            abort: AbortSignal::new(),
        }))
    }
}

fn classify_open_error(config: &CaptureConfig, err: pcap::Error) -> Error {
    let msg = err.to_string();
    if config.promiscuous && msg.contains("promiscuous") {
        Error::PromiscuousDenied(msg)
    } else {
        Error::Capture(msg)
    }
}

struct PcapHandle {
    capture: Capture<Active>,
    abort: AbortSignal,
}

impl CaptureHandle for PcapHandle {
    fn set_direction_in(&mut self) -> bool {
        self.capture.direction(pcap::Direction::In).is_ok()
    }

    fn apply_filter(&mut self, expr: &str) -> Result<()> {
        self.capture
            .filter(expr, true)
            .map_err(|e| Error::Filter(e.to_string()))
    }

    fn next_packet(&mut self) -> ReadOutcome {
        if self.abort.is_raised() {
            return ReadOutcome::Aborted;
        }

        match self.capture.next_packet() {
            Ok(packet) => ReadOutcome::Packet {
                data: packet.data.to_vec(),
                wire_len: packet.header.len,
            },
            Err(pcap::Error::TimeoutExpired) => {
                if self.abort.is_raised() {
                    ReadOutcome::Aborted
                } else {
                    ReadOutcome::Timeout
                }
            }
            Err(pcap::Error::NoMorePackets) => ReadOutcome::Aborted,
            Err(e) => ReadOutcome::Error(e.to_string()),
        }
    }

    fn engine_stats(&mut self) -> Result<EngineStats> {
        let stats = self
            .capture
            .stats()
            .map_err(|e| Error::Capture(format!("Failed to read capture stats: {}", e)))?;

        Ok(EngineStats {
            received: u64::from(stats.received),
            dropped: u64::from(stats.dropped),
            if_dropped: u64::from(stats.if_dropped),
        })
    }

    fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_default() {
        let config = CaptureConfig::default();
        assert_eq!(config.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.promiscuous);
    }

    #[test]
    fn test_abort_signal_shared_between_clones() {
        let signal = AbortSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_raised());

        clone.raise();
        assert!(signal.is_raised());
        assert!(clone.is_raised());
    }

    #[test]
    fn test_classify_promiscuous_denial() {
        let config = CaptureConfig::default();
        let err = classify_open_error(
            &config,
            pcap::Error::PcapError("failed to set promiscuous mode".to_string()),
        );
        assert!(matches!(err, Error::PromiscuousDenied(_)));
    }

    #[test]
    fn test_classify_generic_open_error() {
        let config = CaptureConfig::default();
        let err = classify_open_error(
            &config,
            pcap::Error::PcapError("permission denied".to_string()),
        );
        assert!(matches!(err, Error::Capture(_)));
    }

    #[test]
    fn test_open_unknown_device() {
        let engine = PcapEngine;
        let result = engine.open("nonexistent_interface_xyz", &CaptureConfig::default());
        assert!(matches!(result, Err(Error::InterfaceNotFound(_))));
    }

    #[test]
    fn test_open_loopback() {
        // Opening a real handle needs privileges; accept either outcome
        let engine = PcapEngine;
        let result = get_interface("lo")
            .or_else(|_| get_interface("lo0"))
            .and_then(|iface| engine.open(&iface.name, &CaptureConfig::default()));

        match result {
            Ok(mut handle) => {
                let _ = handle.abort_signal();
                let _ = handle.engine_stats();
            }
            Err(e) => {
                println!("could not open capture (may need privileges): {}", e);
            }
        }
    }
}
