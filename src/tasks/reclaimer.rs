//! Background Reclaimer
//!
//! Cooperative worker that periodically deletes expired entries under a
//! time and table-share budget. A driving timer resumes it every interval;
//! between cycles it stays paused.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;

/// Something the reclaimer can sweep.
pub trait Sweep: Send + Sync + 'static {
    /// Runs one bounded sweep and returns the number of entries removed.
    fn sweep(&self, settings: &ReclaimerSettings) -> usize;

    /// Current number of entries, for logging.
    fn entry_count(&self) -> usize;
}

/// Budget and cadence of reclaim cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimerSettings {
    /// Time between two resume signals
    pub interval: Duration,
    /// Share of the table one cycle may collect (0-100)
    pub max_percentage: u8,
    /// Wall-clock budget of one cycle
    pub max_duration: Duration,
}

impl From<&EngineConfig> for ReclaimerSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            interval: config.clean_interval(),
            max_percentage: config.max_clean_percentage,
            max_duration: config.max_clean_duration(),
        }
    }
}

/// Where the worker currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimerState {
    Scanning,
    Paused,
    Exited,
}

/// Sends the exit signal to a reclaimer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ExitSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ExitSignal {
    /// Asks the worker to exit once any in-flight scan has finished.
    pub fn send(&self) {
        // No receivers left means the worker is already gone
        let _ = self.tx.send(true);
    }
}

/// Handle to a running reclaimer. Dropping it stops the worker.
#[derive(Debug)]
pub struct ReclaimerHandle {
    state: Arc<Mutex<ReclaimerState>>,
    resume: Arc<Notify>,
    exit: ExitSignal,
    worker: JoinHandle<()>,
    timer: JoinHandle<()>,
}

impl ReclaimerHandle {
    pub fn state(&self) -> ReclaimerState {
        *self.state.lock()
    }

    /// Requests a cycle now. A request made while scanning is kept and
    /// starts the next cycle as soon as the current one ends.
    pub fn resume(&self) {
        self.resume.notify_one();
    }

    pub fn exit_signal(&self) -> ExitSignal {
        self.exit.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished() && self.timer.is_finished()
    }
}

impl Drop for ReclaimerHandle {
    fn drop(&mut self) {
        self.exit.send();
    }
}

/// Spawns the reclaimer worker and its driving timer.
pub struct Reclaimer;

impl Reclaimer {
    /// Spawns the worker for `target` on the current Tokio runtime.
    ///
    /// The worker starts paused; the first cycle runs one interval later.
    /// It exits on the exit signal or once `target` has been dropped.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn<T: Sweep>(target: Weak<T>, settings: ReclaimerSettings) -> ReclaimerHandle {
        let (exit_tx, exit_rx) = watch::channel(false);
        let state = Arc::new(Mutex::new(ReclaimerState::Paused));
        let resume = Arc::new(Notify::new());

        info!(
            "Starting cache reclaimer: interval={:?}, max_percentage={}, max_duration={:?}",
            settings.interval, settings.max_percentage, settings.max_duration
        );

        let worker = tokio::spawn(run_worker(
            target,
            settings,
            Arc::clone(&resume),
            exit_rx.clone(),
            Arc::clone(&state),
        ));
        let timer = tokio::spawn(drive_timer(settings.interval, Arc::clone(&resume), exit_rx));

        ReclaimerHandle {
            state,
            resume,
            exit: ExitSignal {
                tx: Arc::new(exit_tx),
            },
            worker,
            timer,
        }
    }
}

async fn run_worker<T: Sweep>(
    target: Weak<T>,
    settings: ReclaimerSettings,
    resume: Arc<Notify>,
    mut exit_rx: watch::Receiver<bool>,
    state: Arc<Mutex<ReclaimerState>>,
) {
    loop {
        *state.lock() = ReclaimerState::Paused;

        tokio::select! {
            biased;
            _ = exit_rx.changed() => break,
            _ = resume.notified() => {}
        }
        if *exit_rx.borrow() {
            break;
        }

        let Some(target) = target.upgrade() else {
            break;
        };

        *state.lock() = ReclaimerState::Scanning;
        // Sweeps are synchronous and lock-bound; keep them off the runtime's workers
        let cycle = tokio::task::spawn_blocking(move || {
            let removed = target.sweep(&settings);
            (removed, target.entry_count())
        })
        .await;

        let (removed, remaining) = match cycle {
            Ok(counts) => counts,
            Err(e) => {
                warn!(error = %e, "Reclaim cycle aborted");
                continue;
            }
        };
        if removed > 0 {
            info!(
                "Reclaim cycle: removed {} expired entries, {} remaining",
                removed, remaining
            );
        } else {
            debug!("Reclaim cycle: no expired entries found");
        }
    }

    *state.lock() = ReclaimerState::Exited;
    info!("Cache reclaimer exited");
}

async fn drive_timer(interval: Duration, resume: Arc<Notify>, mut exit_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; wait a full interval instead
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = exit_rx.changed() => break,
            _ = ticker.tick() => resume.notify_one(),
        }
    }
}
