//! Politeness delays between requests to the source system.
//!
//! The ASP backend drops sessions that move too fast, so these waits are part
//! of the protocol rather than a tuning knob. They sit behind [`Pacer`] so
//! tests can run the whole pipeline without sleeping.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::{trace, warn};

use crate::utils::fmt_duration;

/// Why a pause is being taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// Between the menu GET and the selection POST.
    BeforeSelection,
    /// Between the selection POST and the report GET.
    BeforeReport,
    /// After each program of a batch, whatever its outcome.
    BetweenPrograms,
    /// Backoff before another attempt at a failed program.
    RetryBackoff,
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeforeSelection => "before_selection",
            Self::BeforeReport => "before_report",
            Self::BetweenPrograms => "between_programs",
            Self::RetryBackoff => "retry_backoff",
        })
    }
}

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, reason: PauseReason, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimePacer;

#[async_trait]
impl Pacer for RealTimePacer {
    async fn pause(&self, reason: PauseReason, duration: Duration) {
        trace!(reason = %reason, duration = fmt_duration(duration), "pausing");
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self, _reason: PauseReason, _duration: Duration) {}
}

/// The three delays of a batch run, never below their floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub selection_delay: Duration,
    pub report_delay: Duration,
    pub program_delay: Duration,
}

impl Pacing {
    pub const MIN_SELECTION_DELAY: Duration = Duration::from_secs(1);
    pub const MIN_REPORT_DELAY: Duration = Duration::from_secs(2);
    pub const MIN_PROGRAM_DELAY: Duration = Duration::from_secs(3);

    /// Build pacing from configured values, raising any that fall below the floor.
    pub fn new(selection_delay: Duration, report_delay: Duration, program_delay: Duration) -> Self {
        Self {
            selection_delay: at_least(selection_delay, Self::MIN_SELECTION_DELAY, "selection_delay"),
            report_delay: at_least(report_delay, Self::MIN_REPORT_DELAY, "report_delay"),
            program_delay: at_least(program_delay, Self::MIN_PROGRAM_DELAY, "program_delay"),
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            selection_delay: Self::MIN_SELECTION_DELAY,
            report_delay: Self::MIN_REPORT_DELAY,
            program_delay: Self::MIN_PROGRAM_DELAY,
        }
    }
}

fn at_least(configured: Duration, floor: Duration, name: &str) -> Duration {
    if configured < floor {
        warn!(
            setting = name,
            configured = fmt_duration(configured),
            floor = fmt_duration(floor),
            "delay below minimum, using minimum"
        );
        return floor;
    }
    configured
}
