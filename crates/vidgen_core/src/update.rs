use engine_logging::engine_warn;

use crate::{AppState, AssetBundle, CreateJobRequest, Effect, Msg, Panel, ScriptRef};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::JobSelected { job_id, now } => state.select_job(job_id, now),
        Msg::RefreshClicked => state.refresh(),
        Msg::Tick { now } => state.tick(now),
        Msg::StatusFetched {
            job_id,
            seq,
            result,
            now,
        } => state.apply_status(&job_id, seq, result, now),
        Msg::ViewClosed => state.close_view(),
        Msg::LoadJobsClicked => {
            if state.begin_jobs_load() {
                vec![Effect::LoadJobs]
            } else {
                Vec::new()
            }
        }
        Msg::JobsLoaded(result) => {
            state.apply_jobs(result);
            Vec::new()
        }
        Msg::PromptSubmitted(request) => submit_prompt(&mut state, request),
        Msg::JobCreated { result, now } => {
            state.set_creating(false);
            match result {
                Ok(job_id) => {
                    state.set_banner(None);
                    let mut effects = state.select_job(job_id, now);
                    if state.begin_jobs_load() {
                        effects.push(Effect::LoadJobs);
                    }
                    effects
                }
                Err(failure) => {
                    engine_warn!("job creation failed: {}", failure);
                    state.set_banner(Some(format!("Failed to create job: {}", failure.message)));
                    Vec::new()
                }
            }
        }
        Msg::CancelClicked => {
            let Some(obs) = state.active_observation() else {
                return (state, Vec::new());
            };
            if obs.cancelling || obs.is_terminal() {
                return (state, Vec::new());
            }
            obs.cancelling = true;
            let job_id = obs.job_id.clone();
            state.mark_dirty();
            vec![Effect::CancelJob { job_id }]
        }
        Msg::CancelCompleted { job_id, result } => {
            state.finish_cancel(&job_id);
            match result {
                Ok(_message) => {
                    let mut effects = if state.observed_job_id() == Some(job_id.as_str()) {
                        state.refresh()
                    } else {
                        Vec::new()
                    };
                    if state.begin_jobs_load() {
                        effects.push(Effect::LoadJobs);
                    }
                    effects
                }
                Err(failure) => {
                    state.set_banner(Some(format!("Failed to cancel job: {}", failure.message)));
                    Vec::new()
                }
            }
        }
        Msg::ScriptRequested => request_script(&mut state),
        Msg::ScriptLoaded { job_id, result } => {
            state.resolve_script(&job_id, result);
            Vec::new()
        }
        Msg::AssetsRequested => request_assets(&mut state),
        Msg::AssetsLoaded { job_id, result } => {
            state.resolve_assets(&job_id, result);
            Vec::new()
        }
        Msg::BannerDismissed => {
            state.set_banner(None);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit_prompt(state: &mut AppState, request: CreateJobRequest) -> Vec<Effect> {
    if state.is_creating() {
        return Vec::new();
    }
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        state.set_banner(Some("Please enter a prompt.".to_string()));
        return Vec::new();
    }
    let style = request
        .style
        .map(|style| style.trim().to_string())
        .filter(|style| !style.is_empty());

    state.set_banner(None);
    state.set_creating(true);
    vec![Effect::CreateJob(CreateJobRequest {
        prompt,
        duration: request.duration.filter(|seconds| *seconds > 0),
        style,
    })]
}

fn request_script(state: &mut AppState) -> Vec<Effect> {
    let Some(job_id) = state.observed_job_id().map(str::to_string) else {
        return Vec::new();
    };
    let inline = state
        .observed_snapshot()
        .and_then(|snapshot| snapshot.output.as_ref())
        .and_then(|output| match &output.script {
            Some(ScriptRef::Inline(script)) => Some(script.clone()),
            Some(ScriptRef::Path(_)) | None => None,
        });
    match inline {
        Some(value) => {
            state.set_script_panel(Panel::Ready { job_id, value });
            Vec::new()
        }
        None => {
            state.set_script_panel(Panel::Loading {
                job_id: job_id.clone(),
            });
            vec![Effect::FetchScript { job_id }]
        }
    }
}

fn request_assets(state: &mut AppState) -> Vec<Effect> {
    let Some(job_id) = state.observed_job_id().map(str::to_string) else {
        return Vec::new();
    };
    let known = state
        .observed_snapshot()
        .map(|snapshot| snapshot.asset_paths())
        .filter(|paths| !paths.is_empty())
        .map(|paths| AssetBundle::from_paths(paths.iter().cloned()));
    match known {
        Some(value) => {
            state.set_assets_panel(Panel::Ready { job_id, value });
            Vec::new()
        }
        None => {
            state.set_assets_panel(Panel::Loading {
                job_id: job_id.clone(),
            });
            vec![Effect::FetchAssets { job_id }]
        }
    }
}
