use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

use crate::acatlan::{NegotiationError, ProgramRef, Report, ReportSource};
use crate::pacing::{PauseReason, Pacer, Pacing};
use crate::schedule::{self, NoTableFound, ProgramCatalog};
use crate::scraper::dataset::ConsolidatedDataset;
use crate::utils::{fmt_duration, log_if_slow};

/// A program taking longer than this (pauses included) is worth a warning.
const SLOW_PROGRAM_THRESHOLD: Duration = Duration::from_secs(60);

/// Why a single program could not be retrieved. Never fatal to the batch.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    NoTableFound(#[from] NoTableFound),
}

impl ProgramError {
    /// Pipeline stage that failed, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Negotiation(e) => e.stage().as_str(),
            Self::NoTableFound(_) => "parse",
        }
    }
}

/// Bounded retry around the negotiation. The default makes a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Exponential backoff before attempt `attempt + 1`, plus up to 50% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let jitter_cap = u64::try_from(exp.as_millis() / 2).unwrap_or(u64::MAX);
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_cap)
        };
        exp + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(10))
    }
}

/// Per-run counters, logged when the batch ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Runs the program catalog through negotiation, parsing and aggregation, one
/// program at a time.
pub struct BatchOrchestrator {
    source: Arc<dyn ReportSource>,
    pacer: Arc<dyn Pacer>,
    program_delay: Duration,
    retry: RetryPolicy,
}

impl BatchOrchestrator {
    /// The inter-program delay comes from `pacing`, so it is never below its floor.
    pub fn new(source: Arc<dyn ReportSource>, pacer: Arc<dyn Pacer>, pacing: Pacing) -> Self {
        Self {
            source,
            pacer,
            program_delay: pacing.program_delay,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_with_retry(&self, program: &ProgramRef) -> Result<Report, NegotiationError> {
        let mut attempt = 1;
        loop {
            match self.source.fetch_report(program).await {
                Ok(report) => return Ok(report),
                Err(e) if attempt < self.retry.max_attempts => {
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        stage = %e.stage(),
                        error = %e,
                        backoff = fmt_duration(backoff),
                        "negotiation failed, retrying"
                    );
                    self.pacer.pause(PauseReason::RetryBackoff, backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Retrieve and parse a single program.
    pub async fn scrape_program(&self, program: &ProgramRef) -> Result<ProgramCatalog, ProgramError> {
        match self.fetch_with_retry(program).await? {
            Report::Empty => {
                info!("report has no schedule data");
                Ok(ProgramCatalog::empty(program.code.as_str(), program.name.as_str()))
            }
            Report::Populated(html) => Ok(schedule::build_catalog(program, &html)?),
        }
    }

    /// Process every program in order and build the dataset from those that succeeded.
    pub async fn run(&self, programs: &[ProgramRef], cancel: &CancellationToken) -> ConsolidatedDataset {
        self.run_with_summary(programs, cancel).await.0
    }

    pub async fn run_with_summary(
        &self,
        programs: &[ProgramRef],
        cancel: &CancellationToken,
    ) -> (ConsolidatedDataset, BatchSummary) {
        let batch_start = Instant::now();
        let mut summary = BatchSummary::default();
        let mut catalogs = Vec::with_capacity(programs.len());

        info!(programs = programs.len(), "starting batch");

        for (index, program) in programs.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            summary.attempted += 1;
            let start = Instant::now();
            let span = tracing::info_span!("program", code = %program.code);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(program = %program.code, "batch cancelled mid-program, discarding it");
                    summary.cancelled = true;
                    break;
                }
                result = self.scrape_program(program).instrument(span) => result,
            };

            match result {
                Ok(catalog) => {
                    if catalog.courses.is_empty() {
                        summary.empty += 1;
                    }
                    info!(
                        program = %program.code,
                        name = %program.name,
                        courses = catalog.course_count(),
                        groups = catalog.group_count(),
                        duration = fmt_duration(start.elapsed()),
                        "program retrieved"
                    );
                    summary.succeeded += 1;
                    catalogs.push(catalog);
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        program = %program.code,
                        name = %program.name,
                        stage = e.stage(),
                        error = %e,
                        "program failed, omitting from dataset"
                    );
                }
            }
            log_if_slow(start, SLOW_PROGRAM_THRESHOLD, &program.code);

            if index + 1 < programs.len() {
                debug!(delay = fmt_duration(self.program_delay), "waiting before next program");
                tokio::select! {
                    _ = cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = self.pacer.pause(PauseReason::BetweenPrograms, self.program_delay) => {}
                }
            }
        }

        let dataset = ConsolidatedDataset::new(catalogs);
        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            empty = summary.empty,
            failed = summary.failed,
            cancelled = summary.cancelled,
            duration = fmt_duration(batch_start.elapsed()),
            "batch complete"
        );
        (dataset, summary)
    }
}
