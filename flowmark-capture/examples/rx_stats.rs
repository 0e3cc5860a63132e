//! Example: Receive-side stream statistics
//!
//! Captures tagged test traffic on the default interface for ten seconds
//! and prints per-stream counters plus engine-level deltas.
//! Note: Requires root/administrator privileges to run.
//!
//! Run with: sudo cargo run --example rx_stats

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flowmark_capture::{default_interface, RxStatsSession};
use flowmark_core::StreamStatsTable;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let iface = default_interface()?;
    println!("Collecting rx stream stats on: {}", iface.name);

    let stats = Arc::new(StreamStatsTable::new());
    let session = RxStatsSession::new(&iface.name, Arc::clone(&stats));

    session.start();
    if !session.is_running() {
        println!("Capture did not start (insufficient privileges?)");
        return Ok(());
    }
    if !session.is_directional() {
        println!("Note: inbound-only capture unsupported, local traffic may be double counted");
    }

    for _ in 0..5 {
        thread::sleep(Duration::from_secs(2));

        match session.query_and_reset_engine_stats() {
            Ok(delta) => println!("[engine] {}", delta),
            Err(e) => println!("[engine] stats unavailable: {}", e),
        }

        for (stream_id, counters) in stats.snapshot() {
            println!(
                "  stream {}: {} pkts / {} bytes",
                stream_id, counters.rx_pkts, counters.rx_bytes
            );
        }
    }

    session.stop();

    println!("\n=== Final Per-Stream Statistics ===");
    if stats.is_empty() {
        println!("no tagged streams observed");
    }
    for (stream_id, counters) in stats.snapshot() {
        println!(
            "stream {}: {} pkts / {} bytes",
            stream_id, counters.rx_pkts, counters.rx_bytes
        );
    }

    Ok(())
}
