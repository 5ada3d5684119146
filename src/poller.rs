//! Background poller feeding snapshots and countdown status to the UI.
//!
//! Runs on a dedicated thread. Every `poll_interval` it fetches a full
//! catalog snapshot and sends it over the channel; every `status_interval`
//! it refreshes the cosmetic countdown. Fetch failures send nothing — the
//! receiver keeps showing previous state and waits for the next tick.
//!
//! Serialization with user input comes for free: the TUI drains this channel
//! in the same single-threaded event loop that handles keys, so exactly one
//! snapshot or action mutates the session at a time, and each snapshot is
//! applied whole. The thread fetches serially, so at most one request per
//! endpoint is ever in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use crate::api::{ApiClient, ServerStatus};
use crate::config::Config;
use crate::model::types::Snapshot;

/// Messages the poll thread pushes to the UI loop.
#[derive(Debug, Clone)]
pub enum PollerMsg {
    /// A full, schema-valid catalog snapshot.
    Snapshot(Snapshot),
    /// Countdown refresh.
    Status(ServerStatus),
}

/// Periodic snapshot/status fetcher. Call [`Poller::start`] to spawn.
pub struct Poller {
    config: Config,
    stop: Arc<AtomicBool>,
}

/// Handle returned by [`Poller::start`]. Dropping it stops the thread.
pub struct PollerHandle {
    join: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    rx: Receiver<PollerMsg>,
}

impl Poller {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the polling thread.
    #[must_use]
    pub fn start(self) -> PollerHandle {
        let stop = Arc::clone(&self.stop);
        let (tx, rx) = unbounded();
        let join = thread::Builder::new()
            .name("dwatch-poller".into())
            .spawn(move || self.run(tx))
            .expect("spawn dwatch-poller thread");
        PollerHandle {
            join: Some(join),
            stop,
            rx,
        }
    }

    fn run(self, tx: Sender<PollerMsg>) {
        let client = ApiClient::new(&self.config);
        // Fire immediately on startup, then on cadence.
        let mut next_poll = Instant::now();
        let mut next_status = Instant::now();

        while !self.stop.load(Ordering::Relaxed) {
            let now = Instant::now();

            if now >= next_poll {
                next_poll = now + self.config.poll_interval;
                match client.fetch_snapshot() {
                    Ok(snapshot) => {
                        if tx.send(PollerMsg::Snapshot(snapshot)).is_err() {
                            break; // receiver gone, UI shut down
                        }
                    }
                    Err(err) => warn!(%err, "snapshot fetch failed, keeping previous catalog"),
                }
            }

            if now >= next_status {
                next_status = now + self.config.status_interval;
                match client.fetch_status() {
                    Ok(status) => {
                        if tx.send(PollerMsg::Status(status)).is_err() {
                            break;
                        }
                    }
                    // Optional endpoint; stay quiet at debug level.
                    Err(err) => debug!(%err, "status fetch failed"),
                }
            }

            // Sleep in small increments so shutdown is prompt.
            let wake = next_poll.min(next_status);
            let mut remaining = wake.saturating_duration_since(Instant::now());
            let tick = Duration::from_millis(100);
            while remaining > Duration::ZERO && !self.stop.load(Ordering::Relaxed) {
                let sleep = remaining.min(tick);
                thread::sleep(sleep);
                remaining = remaining.saturating_sub(sleep);
            }
        }
    }
}

impl PollerHandle {
    /// Channel end the UI loop drains.
    pub fn receiver(&self) -> &Receiver<PollerMsg> {
        &self.rx
    }

    /// Signal the thread to stop and wait for it to exit.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
