//! Shared per-stream traffic statistics
//!
//! The table is written concurrently by the transmit side (tx counters) and
//! the receive-side capture loop (rx counters), and read by whoever reports
//! results. Every increment is atomic per record, so no update is lost to a
//! concurrent writer.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Live counters for a single test stream
#[derive(Debug, Default)]
pub struct StreamStats {
    /// Packets sent on this stream
    pub tx_pkts: AtomicU64,
    /// Bytes sent on this stream
    pub tx_bytes: AtomicU64,
    /// Tagged packets received for this stream
    pub rx_pkts: AtomicU64,
    /// Bytes received for this stream (captured length)
    pub rx_bytes: AtomicU64,
}

impl StreamStats {
    /// Copy the current counter values
    pub fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            tx_pkts: self.tx_pkts.load(Ordering::Relaxed),
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            rx_pkts: self.rx_pkts.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Plain-integer copy of a stream's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStatsSnapshot {
    pub tx_pkts: u64,
    pub tx_bytes: u64,
    pub rx_pkts: u64,
    pub rx_bytes: u64,
}

/// Concurrent table of per-stream counters, keyed by stream identifier.
///
/// Entries are created implicitly on the first observation of a stream and
/// are never removed.
#[derive(Debug, Default)]
pub struct StreamStatsTable {
    entries: DashMap<u32, Arc<StreamStats>>,
}

impl StreamStatsTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    fn entry(&self, stream_id: u32) -> Arc<StreamStats> {
        self.entries.entry(stream_id).or_default().clone()
    }

    /// Record one received packet of `bytes` captured bytes for a stream
    pub fn record_rx(&self, stream_id: u32, bytes: u64) {
        let entry = self.entry(stream_id);
        entry.rx_pkts.fetch_add(1, Ordering::Relaxed);
        entry.rx_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record one transmitted packet of `bytes` bytes for a stream
    pub fn record_tx(&self, stream_id: u32, bytes: u64) {
        let entry = self.entry(stream_id);
        entry.tx_pkts.fetch_add(1, Ordering::Relaxed);
        entry.tx_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Counters for one stream, if it has been observed
    pub fn get(&self, stream_id: u32) -> Option<StreamStatsSnapshot> {
        self.entries.get(&stream_id).map(|entry| entry.snapshot())
    }

    /// Snapshot of every stream, sorted by identifier
    pub fn snapshot(&self) -> Vec<(u32, StreamStatsSnapshot)> {
        let mut rows: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().snapshot()))
            .collect();
        rows.sort_by_key(|(stream_id, _)| *stream_id);
        rows
    }

    /// Number of streams observed so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any stream has been observed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
