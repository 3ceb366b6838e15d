use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use engine_logging::{engine_info, engine_trace};
use vidgen_core::{
    update, AppState, CreateJobRequest, Effect, JobStatus, JobStatusSnapshot, Msg,
    ObservedJobView, JOB_NOT_FOUND_MESSAGE,
};
use vidgen_engine::{
    local_filename, ApiError, AtomicFileWriter, BackendClient, Download, DownloadProgress,
    EngineHandle, FailureKind, ProgressSink, ReqwestBackend,
};

use crate::cli::Command;
use crate::config::AppConfig;
use crate::terminal::app::{run_watch, WatchOptions, WatchOutcome, WatchStart};
use crate::terminal::{persistence, render};

pub fn run(config: &AppConfig, command: Command) -> anyhow::Result<()> {
    let backend = ReqwestBackend::new(config.backend_settings())
        .with_context(|| format!("cannot use backend at {}", config.api_url))?;
    let color = io::stdout().is_terminal();

    match command {
        Command::Watch { job_id } => {
            let job_id = match job_id {
                Some(job_id) => job_id,
                None => persistence::load_selection(&config.state_dir)
                    .context("no job id given and no previous selection remembered")?,
            };
            watch(config, backend, WatchStart::Job(job_id), color)
        }
        Command::Create {
            prompt,
            duration,
            style,
            watch: true,
        } => {
            let request = validated_request(CreateJobRequest {
                prompt,
                duration,
                style,
            })?;
            watch(config, backend, WatchStart::Prompt(request), color)
        }
        command => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("cannot start async runtime")?;
            let mut stdout = io::stdout().lock();
            runtime.block_on(one_shot(config, &backend, command, color, &mut stdout))
        }
    }
}

fn watch(
    config: &AppConfig,
    backend: ReqwestBackend,
    start: WatchStart,
    color: bool,
) -> anyhow::Result<()> {
    let engine = EngineHandle::new(Arc::new(backend)).context("cannot start engine")?;
    let options = WatchOptions {
        poll: config.poll,
        state_dir: config.state_dir.clone(),
        color,
    };
    let outcome = run_watch(engine, options, start, &mut io::stdout().lock())?;
    match outcome {
        WatchOutcome::Settled {
            status: JobStatus::Completed,
            ..
        } => Ok(()),
        WatchOutcome::Settled { job_id, status } => {
            bail!("job {job_id} ended with status {status}")
        }
        WatchOutcome::Gone { job_id } => bail!("job {job_id}: {JOB_NOT_FOUND_MESSAGE}"),
        WatchOutcome::Rejected { message } => bail!(message),
    }
}

async fn one_shot(
    config: &AppConfig,
    backend: &dyn BackendClient,
    command: Command,
    color: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Test => {
            let report = backend.health().await.context("health check failed")?;
            writeln!(out, "{}", non_empty(&report.message, "API is reachable"))?;
        }
        Command::ToolVersion => {
            let tool = backend
                .tool_version()
                .await
                .context("cannot read tool version")?;
            let text = tool.version.or(tool.message).unwrap_or_default();
            writeln!(out, "{}", non_empty(&text, "unknown version"))?;
        }
        Command::Upload { file } => {
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("{} has no usable file name", file.display()))?
                .to_string();
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let receipt = backend
                .upload(&filename, bytes)
                .await
                .context("upload failed")?;
            writeln!(out, "{}", non_empty(&receipt.message, "uploaded"))?;
            if let Some(url) = receipt.url.or(receipt.filename) {
                writeln!(out, "{url}")?;
            }
        }
        Command::Jobs => {
            let jobs = backend.list_jobs().await.context("cannot load jobs")?;
            let (state, _) = update(AppState::new(), Msg::JobsLoaded(Ok(jobs)));
            let remembered = persistence::load_selection(&config.state_dir);
            write!(
                out,
                "{}",
                render::job_table(&state.view().jobs, remembered.as_deref(), color)
            )?;
        }
        Command::Create {
            prompt,
            duration,
            style,
            watch: _,
        } => {
            let request = validated_request(CreateJobRequest {
                prompt,
                duration,
                style,
            })?;
            let job_id = backend
                .create_job(&request)
                .await
                .context("failed to create job")?;
            persistence::save_selection(&config.state_dir, Some(&job_id));
            writeln!(out, "{job_id}")?;
        }
        Command::Status { job_id } => {
            let snapshot = backend
                .job_status(&job_id)
                .await
                .map_err(|err| not_found_as_gone(&job_id, err))?;
            persistence::save_selection(&config.state_dir, Some(&job_id));
            let view = snapshot_view(&job_id, snapshot)?;
            write!(out, "{}", render::observed_details(&view, color))?;
        }
        Command::Cancel { job_id } => {
            let message = backend
                .cancel_job(&job_id)
                .await
                .map_err(|err| not_found_as_gone(&job_id, err))?;
            engine_info!("cancelled job {}", job_id);
            writeln!(out, "{}", non_empty(&message, "cancel requested"))?;
        }
        Command::Script { job_id } => {
            let script = backend
                .script(&job_id)
                .await
                .with_context(|| format!("cannot load script of job {job_id}"))?;
            write!(out, "{}", render::script_text(&script))?;
        }
        Command::Assets { job_id } => {
            let bundle = backend
                .assets(&job_id)
                .await
                .with_context(|| format!("cannot load assets of job {job_id}"))?;
            write!(out, "{}", render::asset_list(&bundle))?;
        }
        Command::DownloadVideo { job_id, output } => {
            let download = backend
                .download_video(&job_id, &TraceProgress)
                .await
                .with_context(|| format!("cannot download video of job {job_id}"))?;
            let fallback = format!("{job_id}.mp4");
            let path = save_download(&output, download, &fallback)?;
            writeln!(out, "{}", path.display())?;
        }
        Command::DownloadAsset {
            job_id,
            category,
            filename,
            output,
        } => {
            let download = backend
                .download_asset(&job_id, category, &filename, &TraceProgress)
                .await
                .with_context(|| format!("cannot download {category}/{filename} of job {job_id}"))?;
            let path = save_download(&output, download, &filename)?;
            writeln!(out, "{}", path.display())?;
        }
        Command::Watch { .. } => bail!("watch runs in the interactive loop"),
    }
    Ok(())
}

/// Applies the same checks the interactive loop uses before submitting.
fn validated_request(request: CreateJobRequest) -> anyhow::Result<CreateJobRequest> {
    let (state, effects) = update(AppState::new(), Msg::PromptSubmitted(request));
    for effect in effects {
        if let Effect::CreateJob(request) = effect {
            return Ok(request);
        }
    }
    bail!(state
        .view()
        .banner
        .unwrap_or_else(|| "job request rejected".to_string()))
}

/// Runs one snapshot through the poller so it renders like the watch loop.
fn snapshot_view(job_id: &str, snapshot: JobStatusSnapshot) -> anyhow::Result<ObservedJobView> {
    let (state, effects) = update(
        AppState::new(),
        Msg::JobSelected {
            job_id: job_id.to_string(),
            now: 0,
        },
    );
    let seq = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchStatus { seq, .. } => Some(*seq),
            _ => None,
        })
        .context("job id is empty")?;
    let (state, _) = update(
        state,
        Msg::StatusFetched {
            job_id: job_id.to_string(),
            seq,
            result: Ok(snapshot),
            now: 0,
        },
    );
    state.view().observed.context("job is not observed")
}

fn not_found_as_gone(job_id: &str, err: ApiError) -> anyhow::Error {
    if err.kind == FailureKind::NotFound {
        anyhow::anyhow!("job {job_id}: {JOB_NOT_FOUND_MESSAGE}")
    } else {
        anyhow::Error::new(err).context(format!("request for job {job_id} failed"))
    }
}

fn save_download(
    dir: &Path,
    download: Download,
    fallback: &str,
) -> anyhow::Result<std::path::PathBuf> {
    let name = local_filename(download.suggested_name.as_deref(), fallback);
    let path = AtomicFileWriter::new(dir)
        .write(&name, &download.bytes)
        .with_context(|| format!("cannot write {name} into {}", dir.display()))?;
    engine_info!("saved {} bytes to {:?}", download.bytes.len(), path);
    Ok(path)
}

fn non_empty<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}

struct TraceProgress;

impl ProgressSink for TraceProgress {
    fn emit(&self, progress: DownloadProgress) {
        match progress.total {
            Some(total) => engine_trace!("downloaded {}/{} bytes", progress.received, total),
            None => engine_trace!("downloaded {} bytes", progress.received),
        }
    }
}
