use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use vidgen_core::{Effect, FailureClass, FetchFailure, Msg};
use vidgen_engine::{ApiError, EngineEvent, EngineHandle, FailureKind};

use super::{persistence, Clock};

/// Longest wait for an engine event before the forwarder rechecks its stop flag.
const FORWARD_WAIT: Duration = Duration::from_millis(50);

/// Executes core effects against the engine and feeds completions back as messages.
///
/// Dropping the runner stops the forwarding thread.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
    state_dir: PathBuf,
    stop: Arc<AtomicBool>,
    forwarder: Option<JoinHandle<()>>,
}

impl EffectRunner {
    pub(crate) fn new(
        engine: EngineHandle,
        msg_tx: mpsc::Sender<Msg>,
        clock: Clock,
        state_dir: PathBuf,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let forwarder = spawn_event_loop(engine.clone(), msg_tx, clock, Arc::clone(&stop));
        Self {
            engine,
            state_dir,
            stop,
            forwarder: Some(forwarder),
        }
    }

    pub(crate) fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchStatus { job_id, seq } => {
                    engine_debug!("FetchStatus job_id={} seq={}", job_id, seq);
                    self.engine.fetch_status(job_id, seq);
                }
                Effect::AbortStatusFetches => self.engine.abort_status_fetches(),
                Effect::LoadJobs => self.engine.load_jobs(),
                Effect::CreateJob(request) => {
                    engine_info!("CreateJob prompt_len={}", request.prompt.len());
                    self.engine.create_job(request);
                }
                Effect::CancelJob { job_id } => {
                    engine_info!("CancelJob job_id={}", job_id);
                    self.engine.cancel_job(job_id);
                }
                Effect::FetchScript { job_id } => self.engine.fetch_script(job_id),
                Effect::FetchAssets { job_id } => self.engine.fetch_assets(job_id),
                Effect::RememberSelection { job_id } => {
                    persistence::save_selection(&self.state_dir, job_id.as_deref());
                }
            }
        }
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(forwarder) = self.forwarder.take() {
            if forwarder.join().is_err() {
                engine_warn!("engine event forwarder panicked");
            }
        }
    }
}

fn spawn_event_loop(
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    clock: Clock,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Acquire) {
            let Some(event) = engine.recv_timeout(FORWARD_WAIT) else {
                continue;
            };
            if msg_tx.send(event_to_msg(event, clock.now())).is_err() {
                break;
            }
        }
        engine_debug!("engine event forwarder stopped");
    })
}

pub(crate) fn event_to_msg(event: EngineEvent, now: vidgen_core::Millis) -> Msg {
    match event {
        EngineEvent::StatusFetched {
            job_id,
            seq,
            result,
        } => Msg::StatusFetched {
            job_id,
            seq,
            result: result.map_err(to_failure),
            now,
        },
        EngineEvent::JobsLoaded(result) => Msg::JobsLoaded(result.map_err(to_failure)),
        EngineEvent::JobCreated(result) => Msg::JobCreated {
            result: result.map_err(to_failure),
            now,
        },
        EngineEvent::JobCancelled { job_id, result } => {
            if let Err(err) = &result {
                engine_warn!("Cancel of job {} failed: {}", job_id, err);
            }
            Msg::CancelCompleted {
                job_id,
                result: result.map_err(to_failure),
            }
        }
        EngineEvent::ScriptLoaded { job_id, result } => Msg::ScriptLoaded {
            job_id,
            result: result.map_err(to_failure),
        },
        EngineEvent::AssetsLoaded { job_id, result } => Msg::AssetsLoaded {
            job_id,
            result: result.map_err(to_failure),
        },
    }
}

pub(crate) fn to_failure(err: ApiError) -> FetchFailure {
    FetchFailure::new(map_kind(&err.kind), err.message)
}

fn map_kind(kind: &FailureKind) -> FailureClass {
    match kind {
        FailureKind::InvalidUrl | FailureKind::Network | FailureKind::Timeout | FailureKind::Io => {
            FailureClass::Network
        }
        FailureKind::NotFound => FailureClass::NotFound,
        FailureKind::HttpStatus(_) => FailureClass::Server,
        FailureKind::Backend => FailureClass::Backend,
        FailureKind::Malformed | FailureKind::TooLarge { .. } => FailureClass::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn not_found_keeps_its_class() {
        let failure = to_failure(ApiError::new(FailureKind::NotFound, "Job not found"));
        assert!(failure.is_not_found());
    }

    #[test]
    fn timeouts_are_network_failures() {
        let failure = to_failure(ApiError::new(FailureKind::Timeout, "deadline elapsed"));
        assert_eq!(failure.class, FailureClass::Network);
        assert_eq!(failure.message, "deadline elapsed");
    }

    #[test]
    fn status_event_carries_clock_and_sequence() {
        let msg = event_to_msg(
            EngineEvent::StatusFetched {
                job_id: "abc123".to_string(),
                seq: 4,
                result: Err(ApiError::new(FailureKind::HttpStatus(502), "Bad Gateway")),
            },
            1_500,
        );
        assert_eq!(
            msg,
            Msg::StatusFetched {
                job_id: "abc123".to_string(),
                seq: 4,
                result: Err(FetchFailure::new(FailureClass::Server, "Bad Gateway")),
                now: 1_500,
            }
        );
    }
}
