use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(1);

/// Loop rates measured over the last completed interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub dropped_ticks: u32,
}

/// Latest [`LoopMetricsSnapshot`], readable from any thread while the host
/// keeps publishing. A poisoned lock still yields the last value written.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Option<Instant>,
    interval: Duration,
    frames: u32,
    ticks: u32,
    dropped_ticks: u32,
    frame_time_sum: Duration,
}

impl MetricsAccumulator {
    /// The interval starts at the first recorded event.
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: None,
            interval: interval.max(Duration::from_millis(1)),
            frames: 0,
            ticks: 0,
            dropped_ticks: 0,
            frame_time_sum: Duration::ZERO,
        }
    }

    fn begin(&mut self, now: Instant) {
        if self.interval_start.is_none() {
            self.interval_start = Some(now);
        }
    }

    pub(crate) fn record_frame(&mut self, now: Instant, frame_dt: Duration) {
        self.begin(now);
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
    }

    pub(crate) fn record_ticks(&mut self, now: Instant, ticks: u32) {
        self.begin(now);
        self.ticks = self.ticks.saturating_add(ticks);
    }

    pub(crate) fn record_dropped_ticks(&mut self, now: Instant, dropped: u32) {
        self.begin(now);
        self.dropped_ticks = self.dropped_ticks.saturating_add(dropped);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let start = self.interval_start?;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
            dropped_ticks: self.dropped_ticks,
        };

        self.interval_start = Some(now);
        self.frames = 0;
        self.ticks = 0;
        self.dropped_ticks = 0;
        self.frame_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}
