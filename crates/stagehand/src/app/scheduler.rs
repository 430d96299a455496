use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

pub const DEFAULT_RATE: u32 = 60;
pub const DEFAULT_MAX_CATCH_UP_TICKS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickRate {
    Fixed(u32),
    /// No logic ticks. Rendering continues at [`DEFAULT_RATE`].
    RenderOnly,
}

impl TickRate {
    /// Non-positive rates fall back to render-only.
    pub fn from_per_second(rate: i32) -> Self {
        match u32::try_from(rate) {
            Ok(rate) if rate > 0 => Self::Fixed(rate),
            _ => Self::RenderOnly,
        }
    }

    pub fn ticks_per_second(self) -> Option<u32> {
        match self {
            Self::Fixed(rate) => Some(rate),
            Self::RenderOnly => None,
        }
    }

    pub fn render_rate(self) -> u32 {
        match self {
            Self::Fixed(rate) => rate,
            Self::RenderOnly => DEFAULT_RATE,
        }
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::Fixed(DEFAULT_RATE)
    }
}

impl fmt::Display for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(rate) => write!(f, "{rate}/s"),
            Self::RenderOnly => write!(f, "render-only@{DEFAULT_RATE}/s"),
        }
    }
}

/// Work that came due during one [`Scheduler::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueWork {
    pub ticks: u32,
    pub render: bool,
    pub dropped_ticks: u32,
    pub dropped_backlog: Duration,
}

impl DueWork {
    pub fn is_idle(&self) -> bool {
        self.ticks == 0 && !self.render
    }
}

#[derive(Debug, Clone, Copy)]
struct Cadence {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Cadence {
    fn per_second(rate: u32) -> Self {
        let rate = u64::from(rate.max(1));
        Self {
            interval: Duration::from_nanos((1_000_000_000 / rate).max(1)),
            next_due: None,
        }
    }

    fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now);
        }
    }

    fn stop(&mut self) {
        self.next_due = None;
    }
}

/// Two independent periodic cadences (logic and render) driven by polling.
///
/// Nothing here owns a thread or an OS timer. The loop runner calls
/// [`Scheduler::poll`] with the current instant and runs whatever came due,
/// then sleeps until [`Scheduler::next_deadline`].
#[derive(Debug)]
pub struct Scheduler {
    rate: TickRate,
    logic: Option<Cadence>,
    render: Cadence,
    running: bool,
    max_catch_up_ticks: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let rate = TickRate::default();
        Self {
            rate,
            logic: rate.ticks_per_second().map(Cadence::per_second),
            render: Cadence::per_second(rate.render_rate()),
            running: false,
            max_catch_up_ticks: DEFAULT_MAX_CATCH_UP_TICKS,
        }
    }

    pub fn with_max_catch_up_ticks(mut self, max_catch_up_ticks: u32) -> Self {
        self.max_catch_up_ticks = max_catch_up_ticks.max(1);
        self
    }

    /// Applies `rate` to both cadences. A running scheduler restarts at `now`.
    pub fn configure(&mut self, rate: i32, now: Instant) -> TickRate {
        let rate = TickRate::from_per_second(rate);
        let was_running = self.running;
        self.stop();

        self.rate = rate;
        self.logic = rate.ticks_per_second().map(Cadence::per_second);
        self.render = Cadence::per_second(rate.render_rate());

        if was_running {
            self.start(now);
        }
        debug!(rate = %rate, restarted = was_running, "scheduler_configured");
        rate
    }

    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        if let Some(logic) = self.logic.as_mut() {
            logic.start(now);
        }
        self.render.start(now);
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(logic) = self.logic.as_mut() {
            logic.stop();
        }
        self.render.stop();
    }

    pub fn poll(&mut self, now: Instant) -> DueWork {
        let mut work = DueWork::default();
        if !self.running {
            return work;
        }

        if let Some(logic) = self.logic.as_mut() {
            if let Some(mut next) = logic.next_due {
                while next <= now && work.ticks < self.max_catch_up_ticks {
                    work.ticks += 1;
                    next += logic.interval;
                }
                if next <= now {
                    let behind = now.saturating_duration_since(next);
                    let dropped = behind.as_nanos() / logic.interval.as_nanos().max(1) + 1;
                    work.dropped_ticks = u32::try_from(dropped).unwrap_or(u32::MAX);
                    work.dropped_backlog = logic.interval.saturating_mul(work.dropped_ticks);
                    next = now + logic.interval;
                    warn!(
                        ticks = work.ticks,
                        dropped_ticks = work.dropped_ticks,
                        dropped_backlog_ms = work.dropped_backlog.as_millis() as u64,
                        max_catch_up_ticks = self.max_catch_up_ticks,
                        "sim_clamp_triggered"
                    );
                }
                logic.next_due = Some(next);
            }
        }

        if let Some(next) = self.render.next_due {
            if next <= now {
                work.render = true;
                let following = next + self.render.interval;
                self.render.next_due = Some(if following <= now {
                    now + self.render.interval
                } else {
                    following
                });
            }
        }

        work
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.running {
            return None;
        }
        let logic = self.logic.and_then(|cadence| cadence.next_due);
        match (logic, self.render.next_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn rate(&self) -> TickRate {
        self.rate
    }

    pub fn logic_interval(&self) -> Option<Duration> {
        self.logic.map(|cadence| cadence.interval)
    }

    pub fn render_interval(&self) -> Duration {
        self.render.interval
    }

    pub fn max_catch_up_ticks(&self) -> u32 {
        self.max_catch_up_ticks
    }
}
