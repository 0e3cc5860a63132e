//! Receive-side stream statistics session
//!
//! An [`RxStatsSession`] pairs a controller API (start/stop/query, called
//! from any thread) with a background receive loop that owns the capture
//! handle. The loop opens the device, installs the tagged-frame filter,
//! attributes each admitted packet to its stream, and bumps that stream's
//! counters in the shared table.
//!
//! Lifecycle of one run: `NotStarted -> Running -> Finished`, with state
//! written only by the loop once it has been spawned. `start()` and
//! `stop()` block the caller by bounded polling until the loop acknowledges
//! the transition. An open failure skips `Running` entirely and lands on
//! `Finished`, which is how the controller observes it.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use flowmark_core::sign;
use flowmark_core::{Error, Result, StreamStatsTable};

use crate::engine::{
    AbortSignal, CaptureConfig, CaptureEngine, CaptureHandle, PcapEngine, ReadOutcome,
};
use crate::filter;
use crate::stats::EngineStats;

/// Poll interval for the controller's blocking state waits
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lifecycle state of one receive-loop run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No loop is active; also the acknowledgment window during `start()`
    NotStarted,
    /// The receive loop holds an open handle and is consuming packets
    Running,
    /// The loop has exited; the session may be started again
    Finished,
}

/// State shared between the controller and the receive loop.
///
/// `state` is written by the loop and read by the controller;
/// `stop_requested` is written by the controller and read (and cleared on
/// exit) by the loop. The handle slot is owned by the loop while `Running`;
/// the controller touches it only for the documented engine-stats query.
struct Shared {
    state: RwLock<SessionState>,
    stop_requested: AtomicBool,
    directional: AtomicBool,
    handle: Mutex<Option<Box<dyn CaptureHandle>>>,
    abort: Mutex<Option<AbortSignal>>,
    last_engine_stats: Mutex<EngineStats>,
}

/// Receive-side statistics session for a single interface.
///
/// Created once per interface with a handle to the stream statistics table
/// it shares with the transmit side. `start()`/`stop()` may be reissued for
/// as long as the session lives.
pub struct RxStatsSession {
    device: String,
    engine: Arc<dyn CaptureEngine>,
    config: CaptureConfig,
    stream_stats: Arc<StreamStatsTable>,
    shared: Arc<Shared>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl RxStatsSession {
    /// Create a session capturing on `device` with the live pcap engine
    pub fn new(device: &str, stream_stats: Arc<StreamStatsTable>) -> Self {
        Self::with_engine(device, stream_stats, Arc::new(PcapEngine))
    }

    /// Create a session against a specific capture engine implementation
    pub fn with_engine(
        device: &str,
        stream_stats: Arc<StreamStatsTable>,
        engine: Arc<dyn CaptureEngine>,
    ) -> Self {
        Self {
            device: device.to_string(),
            engine,
            config: CaptureConfig::default(),
            stream_stats,
            shared: Arc::new(Shared {
                state: RwLock::new(SessionState::NotStarted),
                stop_requested: AtomicBool::new(false),
                directional: AtomicBool::new(true),
                handle: Mutex::new(None),
                abort: Mutex::new(None),
                last_engine_stats: Mutex::new(EngineStats::default()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Create a session with a custom capture configuration
    pub fn with_config(
        device: &str,
        stream_stats: Arc<StreamStatsTable>,
        config: CaptureConfig,
    ) -> Self {
        let mut session = Self::new(device, stream_stats);
        session.config = config;
        session
    }

    /// Interface this session captures on
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Start the receive loop and block until it acknowledges.
    ///
    /// Returns once the loop has reached `Running`, or `Finished` when the
    /// open failed (the failure itself is logged, not returned). Requesting
    /// a start while already running is a logged no-op.
    pub fn start(&self) {
        if self.is_running() {
            warn!("RxStats start requested on {} but is already running", self.device);
            return;
        }

        // Any previous run has fully exited by now; reap its thread.
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }

        *self.shared.state.write() = SessionState::NotStarted;

        let device = self.device.clone();
        let engine = Arc::clone(&self.engine);
        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);
        let stream_stats = Arc::clone(&self.stream_stats);
        *self.worker.lock() = Some(thread::spawn(move || {
            receive_loop(&device, engine.as_ref(), &config, &shared, &stream_stats);
        }));

        while *self.shared.state.read() == SessionState::NotStarted {
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Stop a running receive loop and block until it has exited.
    ///
    /// Raises the out-of-band abort so a read blocked in the engine returns
    /// promptly instead of waiting out its own timeout. Requesting a stop
    /// while not running is a logged no-op.
    pub fn stop(&self) {
        if !self.is_running() {
            warn!("RxStats stop requested on {} but is not running", self.device);
            return;
        }

        self.shared.stop_requested.store(true, Ordering::Relaxed);
        if let Some(abort) = self.shared.abort.lock().as_ref() {
            abort.raise();
        }

        while self.is_running() {
            thread::sleep(POLL_INTERVAL);
        }

        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }

    /// Whether the receive loop is currently running
    pub fn is_running(&self) -> bool {
        *self.shared.state.read() == SessionState::Running
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.shared.state.read()
    }

    /// Whether capture is restricted to inbound traffic.
    ///
    /// Meaningful only after the loop has attempted to open the handle. On
    /// platforms without direction filtering, locally-originated tagged
    /// traffic may be double counted.
    pub fn is_directional(&self) -> bool {
        self.shared.directional.load(Ordering::Relaxed)
    }

    /// Engine-level counters accumulated since the previous call.
    ///
    /// Every call stores the fresh snapshot as the new baseline, so each
    /// result reads "since last query", not "since loop start". The
    /// baseline is zeroed whenever the loop re-opens the handle. On failure
    /// the baseline is left untouched.
    pub fn query_and_reset_engine_stats(&self) -> Result<EngineStats> {
        let mut slot = self.shared.handle.lock();
        let handle = slot
            .as_mut()
            .ok_or_else(|| Error::capture("Capture not active"))?;
        let current = handle.engine_stats()?;

        let mut baseline = self.shared.last_engine_stats.lock();
        let delta = current.delta_since(&baseline);
        *baseline = current;
        Ok(delta)
    }
}

impl Drop for RxStatsSession {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

/// Body of the background receive loop for one `start()`/`stop()` cycle.
fn receive_loop(
    device: &str,
    engine: &dyn CaptureEngine,
    config: &CaptureConfig,
    shared: &Shared,
    stream_stats: &StreamStatsTable,
) {
    // A stop raced against the tail of a previous run must not cancel this one.
    shared.stop_requested.store(false, Ordering::Relaxed);

    let mut handle = match engine.open(device, config) {
        Ok(handle) => handle,
        Err(Error::PromiscuousDenied(reason)) => {
            warn!(
                "Unable to set promiscuous mode on {}: {} - stream stats rx will not work",
                device, reason
            );
            *shared.state.write() = SessionState::Finished;
            return;
        }
        Err(err) => {
            warn!(
                "Unable to open {}: {} - stream stats rx will not work",
                device, err
            );
            *shared.state.write() = SessionState::Finished;
            return;
        }
    };

    if !handle.set_direction_in() {
        debug!("{}: inbound-only capture not supported", device);
        shared.directional.store(false, Ordering::Relaxed);
    }

    // Filter failures degrade to unfiltered capture rather than aborting.
    let filter = filter::rx_stats_filter(sign::SIGN_MAGIC);
    if let Err(err) = handle.apply_filter(&filter) {
        warn!("{}: error setting filter: {} - capturing unfiltered", device, err);
    }

    *shared.last_engine_stats.lock() = EngineStats::default();
    *shared.abort.lock() = Some(handle.abort_signal());
    *shared.handle.lock() = Some(handle);
    *shared.state.write() = SessionState::Running;

    loop {
        // The slot is unlocked between reads so the controller's stats
        // query can interleave with the loop.
        let outcome = match shared.handle.lock().as_mut() {
            Some(handle) => handle.next_packet(),
            None => break,
        };

        match outcome {
            ReadOutcome::Packet { data, .. } => {
                if let Some(stream_id) = sign::extract_stream_id(&data) {
                    stream_stats.record_rx(stream_id, data.len() as u64);
                }
            }
            ReadOutcome::Timeout => {}
            ReadOutcome::Error(err) => {
                warn!("{}: error reading packet: {}", device, err);
            }
            ReadOutcome::Aborted => {
                debug!("{}: capture read aborted", device);
                break;
            }
        }

        if shared.stop_requested.load(Ordering::Relaxed) {
            debug!("User requested rxstats stop on {}", device);
            break;
        }
    }

    *shared.handle.lock() = None;
    *shared.abort.lock() = None;
    shared.stop_requested.store(false, Ordering::Relaxed);
    *shared.state.write() = SessionState::Finished;
}
