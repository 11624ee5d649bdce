//! Adaptive REST poll scheduling.
//!
//! REST polling is expensive and rate-limited; the user stream is cheap once
//! trusted, but must never be trusted blindly. The scheduler therefore picks
//! between two cadences on every heartbeat: while the stream is actively
//! delivering events the long interval applies, and any stream silence beyond
//! the activity threshold immediately tightens polling to the short interval.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// Poll interval while the user stream is silent.
pub const SHORT_POLL_INTERVAL: f64 = 5.0;
/// Poll interval while the user stream is actively delivering events.
pub const LONG_POLL_INTERVAL: f64 = 120.0;
/// Seconds of stream silence after which the stream no longer counts as
/// keeping the ledgers fresh.
pub const USER_STREAM_SILENCE_THRESHOLD: f64 = 60.0;

/// Last-activity timestamp of the user stream, written by the websocket
/// session task and read by the scheduler.
#[derive(Debug, Default)]
pub struct StreamActivity {
    last_recv_bits: AtomicU64,
}

impl StreamActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record stream activity at the given unix timestamp (seconds).
    pub fn record(&self, timestamp: f64) {
        self.last_recv_bits
            .store(timestamp.to_bits(), Ordering::Release);
    }

    /// Unix timestamp (seconds) of the last observed stream activity,
    /// 0.0 if none was ever observed.
    pub fn last_recv(&self) -> f64 {
        f64::from_bits(self.last_recv_bits.load(Ordering::Acquire))
    }
}

/// Decides, once per heartbeat, whether a REST refresh is due.
///
/// A refresh becomes due when the tick timestamp crosses an interval
/// boundary; the very first tick always marks one due. The consumer clears
/// the flag after acting on it.
#[derive(Debug)]
pub struct PollScheduler {
    last_timestamp: Mutex<f64>,
    poll_due: AtomicBool,
    notify: Notify,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            last_timestamp: Mutex::new(0.0),
            poll_due: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Advance the scheduler clock to `timestamp` (unix seconds).
    ///
    /// `activity` is the stream's last-activity tracker used to select the
    /// applicable interval.
    pub fn tick(&self, timestamp: f64, activity: &StreamActivity) {
        let poll_interval = if timestamp - activity.last_recv() > USER_STREAM_SILENCE_THRESHOLD {
            SHORT_POLL_INTERVAL
        } else {
            LONG_POLL_INTERVAL
        };

        let mut last_timestamp = self.last_timestamp.lock();
        let last_tick = (*last_timestamp / poll_interval) as i64;
        let current_tick = (timestamp / poll_interval) as i64;

        if current_tick > last_tick {
            self.poll_due.store(true, Ordering::SeqCst);
            self.notify.notify_one();
        }

        *last_timestamp = timestamp;
    }

    /// Whether a refresh is currently marked due.
    pub fn is_poll_due(&self) -> bool {
        self.poll_due.load(Ordering::SeqCst)
    }

    /// Clear the refresh-due flag after consuming it.
    pub fn reset_poll(&self) {
        self.poll_due.store(false, Ordering::SeqCst);
    }

    /// Timestamp of the last tick.
    pub fn last_timestamp(&self) -> f64 {
        *self.last_timestamp.lock()
    }

    /// Wait until a refresh is marked due.
    pub async fn poll_requested(&self) {
        while !self.is_poll_due() {
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2021-01-01 00:00:00 UTC, a multiple of both poll intervals
    const START_TS: f64 = 1_609_459_200.0;

    #[test]
    fn test_first_tick_marks_poll_due() {
        let scheduler = PollScheduler::new();
        let activity = StreamActivity::new();

        scheduler.tick(START_TS, &activity);

        assert_eq!(scheduler.last_timestamp(), START_TS);
        assert!(scheduler.is_poll_due());
    }

    #[test]
    fn test_tick_within_short_poll_interval() {
        // Stream has never delivered, so the short interval applies
        let scheduler = PollScheduler::new();
        let activity = StreamActivity::new();

        scheduler.tick(START_TS, &activity);
        scheduler.reset_poll();

        let next_tick = START_TS + (SHORT_POLL_INTERVAL - 1.0);
        scheduler.tick(next_tick, &activity);

        assert_eq!(scheduler.last_timestamp(), next_tick);
        assert!(!scheduler.is_poll_due());
    }

    #[test]
    fn test_tick_exceeding_short_poll_interval() {
        let scheduler = PollScheduler::new();
        let activity = StreamActivity::new();

        scheduler.tick(START_TS, &activity);
        scheduler.reset_poll();

        let next_tick = START_TS + (SHORT_POLL_INTERVAL + 1.0);
        scheduler.tick(next_tick, &activity);

        assert_eq!(scheduler.last_timestamp(), next_tick);
        assert!(scheduler.is_poll_due());
    }

    #[test]
    fn test_tick_within_long_poll_interval() {
        // Stream active just before the tick, so the long interval applies
        let scheduler = PollScheduler::new();
        let activity = StreamActivity::new();

        scheduler.tick(START_TS, &activity);
        scheduler.reset_poll();

        let next_tick = START_TS + (LONG_POLL_INTERVAL - 1.0);
        activity.record(next_tick - 1.0);
        scheduler.tick(next_tick, &activity);

        assert_eq!(scheduler.last_timestamp(), next_tick);
        assert!(!scheduler.is_poll_due());
    }

    #[test]
    fn test_stale_stream_falls_back_to_short_interval() {
        // Same elapsed time as the long-interval test, but the last stream
        // activity is old enough that the short interval applies instead
        let scheduler = PollScheduler::new();
        let activity = StreamActivity::new();

        scheduler.tick(START_TS, &activity);
        scheduler.reset_poll();

        activity.record(START_TS);
        let next_tick = START_TS + (LONG_POLL_INTERVAL - 1.0);
        scheduler.tick(next_tick, &activity);

        assert_eq!(scheduler.last_timestamp(), next_tick);
        assert!(scheduler.is_poll_due());
    }

    #[test]
    fn test_active_stream_crossing_long_interval_marks_due() {
        let scheduler = PollScheduler::new();
        let activity = StreamActivity::new();

        scheduler.tick(START_TS, &activity);
        scheduler.reset_poll();

        let next_tick = START_TS + (LONG_POLL_INTERVAL + 1.0);
        activity.record(next_tick - 1.0);
        scheduler.tick(next_tick, &activity);

        assert!(scheduler.is_poll_due());
    }

    #[test]
    fn test_flag_stays_cleared_until_next_boundary() {
        let scheduler = PollScheduler::new();
        let activity = StreamActivity::new();

        scheduler.tick(START_TS, &activity);
        scheduler.reset_poll();

        scheduler.tick(START_TS + 1.0, &activity);
        scheduler.tick(START_TS + 2.0, &activity);
        assert!(!scheduler.is_poll_due());

        scheduler.tick(START_TS + SHORT_POLL_INTERVAL, &activity);
        assert!(scheduler.is_poll_due());
    }

    #[tokio::test]
    async fn test_poll_requested_wakes_on_tick() {
        use std::sync::Arc;

        let scheduler = Arc::new(PollScheduler::new());
        let activity = Arc::new(StreamActivity::new());

        let waiter = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move {
                scheduler.poll_requested().await;
            })
        };

        scheduler.tick(START_TS, &activity);

        waiter.await.expect("waiter should complete");
        assert!(scheduler.is_poll_due());
    }

    #[test]
    fn test_stream_activity_records_latest() {
        let activity = StreamActivity::new();
        assert_eq!(activity.last_recv(), 0.0);

        activity.record(START_TS);
        assert_eq!(activity.last_recv(), START_TS);

        activity.record(START_TS + 5.0);
        assert_eq!(activity.last_recv(), START_TS + 5.0);
    }
}
