use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_debug, engine_info};
use vidgen_core::{update, AppState, CreateJobRequest, JobId, JobStatus, Msg, PollPhase, PollSettings};
use vidgen_engine::EngineHandle;

use super::effects::EffectRunner;
use super::{render, Clock};

/// Granularity of the timer; the poller decides which ticks are due.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub poll: PollSettings,
    pub state_dir: PathBuf,
    pub color: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchStart {
    Job(JobId),
    Prompt(CreateJobRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Terminal status confirmed; polling stopped.
    Settled { job_id: JobId, status: JobStatus },
    /// The backend no longer knows the job.
    Gone { job_id: JobId },
    /// The job could not be created.
    Rejected { message: String },
}

/// Drives the poller until the observed job settles or disappears, printing
/// a status line whenever it changes.
pub fn run_watch(
    engine: EngineHandle,
    options: WatchOptions,
    start: WatchStart,
    out: &mut dyn Write,
) -> anyhow::Result<WatchOutcome> {
    let clock = Clock::start();
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(engine, msg_tx.clone(), clock, options.state_dir.clone());

    let tick_tx = msg_tx.clone();
    thread::spawn(move || {
        while tick_tx.send(Msg::Tick { now: clock.now() }).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    let first = match start {
        WatchStart::Job(job_id) => Msg::JobSelected {
            job_id,
            now: clock.now(),
        },
        WatchStart::Prompt(request) => Msg::PromptSubmitted(request),
    };
    let _ = msg_tx.send(first);
    drop(msg_tx);

    let mut state = AppState::with_settings(options.poll);
    let mut last_line = String::new();
    let outcome = loop {
        let msg = msg_rx.recv().context("message channel closed")?;
        let (next, effects) = update(state, msg);
        state = next;
        runner.run(effects);
        if !state.consume_dirty() {
            continue;
        }

        let view = state.view();
        if let Some(banner) = &view.banner {
            writeln!(out, "! {banner}")?;
            if view.observed.is_none() && !view.creating {
                break WatchOutcome::Rejected {
                    message: banner.clone(),
                };
            }
            let (next, _) = update(state, Msg::BannerDismissed);
            state = next;
        }

        let Some(observed) = &view.observed else {
            continue;
        };
        let line = render::status_line(observed, options.color);
        if line != last_line {
            writeln!(out, "{line}")?;
            last_line = line;
        }
        if observed.phase == PollPhase::Gone {
            break WatchOutcome::Gone {
                job_id: observed.job_id.clone(),
            };
        }
        if observed.polling_stopped {
            write!(out, "{}", render::observed_details(observed, options.color))?;
            let status = observed
                .snapshot
                .as_ref()
                .map(|snapshot| snapshot.status.clone())
                .unwrap_or_default();
            engine_info!("job {} settled with status {}", observed.job_id, status);
            break WatchOutcome::Settled {
                job_id: observed.job_id.clone(),
                status,
            };
        }
    };

    let (_, effects) = update(state, Msg::ViewClosed);
    runner.run(effects);
    engine_debug!("watch loop finished: {:?}", outcome);
    Ok(outcome)
}
