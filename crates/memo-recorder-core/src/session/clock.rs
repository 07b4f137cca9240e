use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, instrument};

/// Default period between elapsed-seconds ticks.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Elapsed-seconds counter bound to the Recording state.
///
/// Arming spawns a ticker task owned by this clock; disarming aborts it and
/// resets the count to zero. Each arming gets a fresh epoch and the ticker
/// checks it under the watch lock, so a tick racing a disarm can never land
/// after the reset.
pub struct Clock {
    period: Duration,
    elapsed: Arc<watch::Sender<u64>>,
    epoch: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
}

impl Clock {
    /// Creates a disarmed clock ticking every `period` once armed.
    ///
    /// A zero period falls back to [`DEFAULT_TICK_PERIOD`].
    pub fn new(period: Duration) -> Self {
        let (elapsed, _) = watch::channel(0);
        Self {
            period: if period.is_zero() {
                DEFAULT_TICK_PERIOD
            } else {
                period
            },
            elapsed: Arc::new(elapsed),
            epoch: Arc::new(AtomicU64::new(0)),
            ticker: None,
        }
    }

    /// Starts counting from zero. Arming an armed clock does nothing.
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(skip(self))]
    pub fn arm(&mut self) {
        if self.ticker.is_some() {
            return;
        }

        let armed_epoch = self.epoch.load(Ordering::Acquire);
        self.elapsed.send_replace(0);

        let elapsed = Arc::clone(&self.elapsed);
        let epoch = Arc::clone(&self.epoch);
        let period = self.period;

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let counted = elapsed.send_if_modified(|seconds| {
                    if epoch.load(Ordering::Acquire) != armed_epoch {
                        return false;
                    }
                    *seconds += 1;
                    true
                });
                if !counted {
                    break;
                }
            }
        }));

        debug!(period_ms = self.period.as_millis(), "Clock armed");
    }

    /// Stops counting and resets to zero, discarding any pending tick.
    #[instrument(skip(self))]
    pub fn disarm(&mut self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            debug!("Clock disarmed");
        }
        self.elapsed.send_replace(0);
    }

    /// Whether a ticker is currently running.
    pub fn is_armed(&self) -> bool {
        self.ticker.is_some()
    }

    /// Seconds counted since arming; zero while disarmed.
    pub fn elapsed(&self) -> u64 {
        *self.elapsed.borrow()
    }

    /// Receiver notified on every tick and reset.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed.subscribe()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD)
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
