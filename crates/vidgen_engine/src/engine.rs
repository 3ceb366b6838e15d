use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use tokio_util::sync::CancellationToken;
use vidgen_core::{CreateJobRequest, JobId, RequestSeq};

use crate::{BackendClient, EngineEvent};

enum EngineCommand {
    FetchStatus { job_id: JobId, seq: RequestSeq },
    AbortStatusFetches,
    LoadJobs,
    CreateJob(CreateJobRequest),
    CancelJob { job_id: JobId },
    FetchScript { job_id: JobId },
    FetchAssets { job_id: JobId },
}

/// Runs backend requests on a background tokio runtime and reports each
/// completion as an [`EngineEvent`].
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(client: Arc<dyn BackendClient>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("vidgen-engine")
            .build()?;

        thread::Builder::new()
            .name("vidgen-engine-commands".to_string())
            .spawn(move || {
                let mut status_scope = CancellationToken::new();
                while let Ok(command) = cmd_rx.recv() {
                    if let EngineCommand::AbortStatusFetches = command {
                        engine_debug!("aborting in-flight status fetches");
                        status_scope.cancel();
                        status_scope = CancellationToken::new();
                        continue;
                    }
                    let client = client.clone();
                    let event_tx = event_tx.clone();
                    let scope = status_scope.clone();
                    runtime.spawn(async move {
                        handle_command(client.as_ref(), command, scope, event_tx).await;
                    });
                }
                engine_info!("engine command channel closed");
            })?;

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn fetch_status(&self, job_id: JobId, seq: RequestSeq) {
        self.send(EngineCommand::FetchStatus { job_id, seq });
    }

    /// Drops every status request issued so far. Their completions are not reported.
    pub fn abort_status_fetches(&self) {
        self.send(EngineCommand::AbortStatusFetches);
    }

    pub fn load_jobs(&self) {
        self.send(EngineCommand::LoadJobs);
    }

    pub fn create_job(&self, request: CreateJobRequest) {
        self.send(EngineCommand::CreateJob(request));
    }

    pub fn cancel_job(&self, job_id: JobId) {
        self.send(EngineCommand::CancelJob { job_id });
    }

    pub fn fetch_script(&self, job_id: JobId) {
        self.send(EngineCommand::FetchScript { job_id });
    }

    pub fn fetch_assets(&self, job_id: JobId) {
        self.send(EngineCommand::FetchAssets { job_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

async fn handle_command(
    client: &dyn BackendClient,
    command: EngineCommand,
    status_scope: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::FetchStatus { job_id, seq } => {
            let result = tokio::select! {
                _ = status_scope.cancelled() => {
                    engine_debug!("status #{} for job {} aborted", seq, job_id);
                    return;
                }
                result = client.job_status(&job_id) => result,
            };
            EngineEvent::StatusFetched {
                job_id,
                seq,
                result,
            }
        }
        EngineCommand::AbortStatusFetches => return,
        EngineCommand::LoadJobs => EngineEvent::JobsLoaded(client.list_jobs().await),
        EngineCommand::CreateJob(request) => {
            EngineEvent::JobCreated(client.create_job(&request).await)
        }
        EngineCommand::CancelJob { job_id } => {
            let result = client.cancel_job(&job_id).await;
            EngineEvent::JobCancelled { job_id, result }
        }
        EngineCommand::FetchScript { job_id } => {
            let result = client.script(&job_id).await;
            EngineEvent::ScriptLoaded { job_id, result }
        }
        EngineCommand::FetchAssets { job_id } => {
            let result = client.assets(&job_id).await;
            EngineEvent::AssetsLoaded { job_id, result }
        }
    };
    let _ = event_tx.send(event);
}
