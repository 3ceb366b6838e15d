//! Per-job bookkeeping for the status poller.
//!
//! An [`Observation`] exists for exactly one selected job id. Every status
//! request issued for it carries a sequence number taken at issuance; the
//! observation decides which completions are applied and when the timer is
//! allowed to issue the next request.
use std::collections::BTreeSet;

use engine_logging::engine_debug;

use crate::{FetchFailure, JobId, JobStatusSnapshot, Millis, PollSettings};

/// Monotonically increasing tag attached to every status request.
pub type RequestSeq = u64;

/// Externally visible phase of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    /// No job selected.
    #[default]
    Idle,
    /// At least one status request is in flight.
    Fetching,
    /// Waiting for the next timer tick.
    Observing,
    /// The backend reported the job as not found. Terminal for this id.
    Gone,
}

/// Where the observed job stands relative to a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TerminalWatch {
    /// Not terminal; poll on every due tick.
    Live,
    /// Terminal seen; one confirming poll is allowed once an interval has
    /// passed since the last success.
    Cooling,
    /// The confirming poll is in flight.
    Confirming,
    /// Terminal confirmed; the timer no longer issues polls.
    Settled,
}

/// Outcome of a timer tick for the observed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickDecision {
    NotDue,
    Poll,
    Suppressed,
}

/// Whether a completion may touch visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Apply,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Observation {
    pub(crate) job_id: JobId,
    first_seq: RequestSeq,
    in_flight: BTreeSet<RequestSeq>,
    last_applied_seq: Option<RequestSeq>,
    pub(crate) snapshot: Option<JobStatusSnapshot>,
    pub(crate) error: Option<FetchFailure>,
    gone: bool,
    next_poll_at: Millis,
    last_success_at: Option<Millis>,
    terminal: TerminalWatch,
    pub(crate) cancelling: bool,
}

impl Observation {
    /// Starts observing `job_id`; `first_seq` is the tag of the initial fetch.
    pub(crate) fn new(job_id: JobId, first_seq: RequestSeq, now: Millis, settings: PollSettings) -> Self {
        let mut in_flight = BTreeSet::new();
        in_flight.insert(first_seq);
        Self {
            job_id,
            first_seq,
            in_flight,
            last_applied_seq: None,
            snapshot: None,
            error: None,
            gone: false,
            next_poll_at: now.saturating_add(settings.interval_ms),
            last_success_at: None,
            terminal: TerminalWatch::Live,
            cancelling: false,
        }
    }

    pub(crate) fn phase(&self) -> PollPhase {
        if self.gone {
            PollPhase::Gone
        } else if self.in_flight.is_empty() {
            PollPhase::Observing
        } else {
            PollPhase::Fetching
        }
    }

    pub(crate) fn is_gone(&self) -> bool {
        self.gone
    }

    /// True when the timer will never issue another request for this job.
    pub(crate) fn polling_stopped(&self) -> bool {
        self.gone || self.terminal == TerminalWatch::Settled
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.status.is_terminal())
    }

    pub(crate) fn next_poll_at(&self) -> Millis {
        self.next_poll_at
    }

    /// Records an out-of-band request. The timer deadline is left alone.
    pub(crate) fn track(&mut self, seq: RequestSeq) {
        self.in_flight.insert(seq);
    }

    pub(crate) fn on_tick(&mut self, now: Millis, settings: PollSettings) -> TickDecision {
        if self.gone || now < self.next_poll_at {
            return TickDecision::NotDue;
        }
        self.next_poll_at = now.saturating_add(settings.interval_ms);

        if !self.in_flight.is_empty() {
            engine_debug!(
                "poll for job {} skipped: {} request(s) still in flight",
                self.job_id,
                self.in_flight.len()
            );
            return TickDecision::Suppressed;
        }

        match self.terminal {
            TerminalWatch::Live => TickDecision::Poll,
            TerminalWatch::Cooling => {
                let since_success = self
                    .last_success_at
                    .map(|at| now.saturating_sub(at))
                    .unwrap_or(Millis::MAX);
                if since_success < settings.interval_ms {
                    engine_debug!(
                        "poll for terminal job {} suppressed ({}ms since last success)",
                        self.job_id,
                        since_success
                    );
                    TickDecision::Suppressed
                } else {
                    engine_debug!("confirming terminal status of job {}", self.job_id);
                    self.terminal = TerminalWatch::Confirming;
                    TickDecision::Poll
                }
            }
            TerminalWatch::Confirming | TerminalWatch::Settled => TickDecision::Suppressed,
        }
    }

    /// Decides whether a completion tagged `seq` belongs to this observation
    /// and is newer than anything already applied.
    pub(crate) fn admit(&mut self, seq: RequestSeq) -> Admission {
        if seq < self.first_seq {
            return Admission::Stale;
        }
        self.in_flight.remove(&seq);
        if self.gone {
            return Admission::Stale;
        }
        match self.last_applied_seq {
            Some(last) if seq < last => Admission::Stale,
            _ => {
                self.last_applied_seq = Some(seq);
                Admission::Apply
            }
        }
    }

    /// Applies a successful snapshot. Returns true the first time a terminal
    /// status is observed for this job.
    pub(crate) fn apply_success(&mut self, mut snapshot: JobStatusSnapshot, now: Millis) -> bool {
        snapshot.progress = self.guard_progress(snapshot.progress);
        let terminal = snapshot.status.is_terminal();
        let was_live = self.terminal == TerminalWatch::Live && !self.is_terminal();

        self.snapshot = Some(snapshot);
        self.error = None;
        self.last_success_at = Some(now);

        self.terminal = match (terminal, self.terminal) {
            (false, _) => TerminalWatch::Live,
            (true, TerminalWatch::Live) => TerminalWatch::Cooling,
            (true, TerminalWatch::Cooling) => TerminalWatch::Cooling,
            (true, TerminalWatch::Confirming | TerminalWatch::Settled) => TerminalWatch::Settled,
        };
        terminal && was_live
    }

    pub(crate) fn apply_failure(&mut self, failure: FetchFailure) {
        if failure.is_not_found() {
            self.gone = true;
            self.snapshot = None;
            self.in_flight.clear();
            self.error = Some(FetchFailure::not_found());
            return;
        }
        if self.terminal == TerminalWatch::Confirming {
            self.terminal = TerminalWatch::Cooling;
        }
        self.error = Some(failure);
    }

    /// Clamps progress to 0..=100 and ignores regressions within this job.
    fn guard_progress(&self, progress: f64) -> f64 {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 100.0)
        } else {
            0.0
        };
        match self.snapshot.as_ref() {
            Some(previous) if progress < previous.progress => {
                engine_debug!(
                    "ignoring progress regression for job {}: {} -> {}",
                    self.job_id,
                    previous.progress,
                    progress
                );
                previous.progress
            }
            _ => progress,
        }
    }
}
