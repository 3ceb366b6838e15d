use pretty_assertions::assert_eq;
use vidgen_core::{
    update, AppState, AssetBundle, AssetCategory, CreateJobRequest, Effect, FailureClass,
    FetchFailure, Job, JobOutput, JobStatus, JobStatusSnapshot, Msg, Panel, Script, ScriptRef,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn job(id: &str, status: JobStatus) -> Job {
    Job {
        job_id: id.to_string(),
        prompt: Some(format!("prompt for {id}")),
        status,
        created_at: 1_700_000_000.0,
        completed_at: None,
        video_ready: false,
        video_path: None,
        error: None,
    }
}

fn observe(job_id: &str, snapshot: JobStatusSnapshot) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::JobSelected {
            job_id: job_id.to_string(),
            now: 0,
        },
    );
    let (state, _) = update(
        state,
        Msg::StatusFetched {
            job_id: job_id.to_string(),
            seq: 1,
            result: Ok(snapshot),
            now: 10,
        },
    );
    state
}

fn processing(job_id: &str) -> JobStatusSnapshot {
    JobStatusSnapshot {
        job_id: job_id.to_string(),
        status: JobStatus::Processing,
        progress: 40.0,
        ..JobStatusSnapshot::default()
    }
}

#[test]
fn load_jobs_is_single_flight_and_marks_selected_row() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::JobSelected {
            job_id: "b".to_string(),
            now: 0,
        },
    );

    let (state, effects) = update(state, Msg::LoadJobsClicked);
    assert_eq!(effects, vec![Effect::LoadJobs]);
    let (state, effects) = update(state, Msg::LoadJobsClicked);
    assert!(effects.is_empty());
    assert!(state.view().jobs_loading);

    let (state, _) = update(
        state,
        Msg::JobsLoaded(Ok(vec![
            job("a", JobStatus::Completed),
            job("b", JobStatus::Rendering),
        ])),
    );
    let view = state.view();
    assert!(!view.jobs_loading);
    let selected: Vec<_> = view.jobs.iter().map(|row| (row.job_id.as_str(), row.selected)).collect();
    assert_eq!(selected, vec![("a", false), ("b", true)]);
    assert_eq!(view.jobs[1].style.label, "Rendering");
}

#[test]
fn list_reloads_wait_for_the_load_in_flight() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::JobSelected {
            job_id: "a".to_string(),
            now: 0,
        },
    );
    let (state, effects) = update(state, Msg::LoadJobsClicked);
    assert_eq!(effects, vec![Effect::LoadJobs]);

    let (state, effects) = update(
        state,
        Msg::JobCreated {
            result: Ok("b".to_string()),
            now: 5,
        },
    );
    assert!(!effects.contains(&Effect::LoadJobs));
    assert!(effects.contains(&Effect::FetchStatus {
        job_id: "b".to_string(),
        seq: 2
    }));

    let (state, effects) = update(
        state,
        Msg::StatusFetched {
            job_id: "b".to_string(),
            seq: 2,
            result: Ok(JobStatusSnapshot {
                job_id: "b".to_string(),
                status: JobStatus::Completed,
                progress: 100.0,
                ..JobStatusSnapshot::default()
            }),
            now: 20,
        },
    );
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::JobsLoaded(Ok(vec![job("b", JobStatus::Completed)])));
    let (_, effects) = update(state, Msg::LoadJobsClicked);
    assert_eq!(effects, vec![Effect::LoadJobs]);
}

#[test]
fn jobs_failure_sets_banner_and_keeps_previous_list() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::LoadJobsClicked);
    let (state, _) = update(state, Msg::JobsLoaded(Ok(vec![job("a", JobStatus::Pending)])));
    let (state, _) = update(state, Msg::LoadJobsClicked);
    let (state, _) = update(
        state,
        Msg::JobsLoaded(Err(FetchFailure::network("connection refused"))),
    );

    let view = state.view();
    assert_eq!(view.jobs.len(), 1);
    assert_eq!(
        view.banner.as_deref(),
        Some("Failed to load jobs: connection refused")
    );

    let (state, _) = update(state, Msg::BannerDismissed);
    assert_eq!(state.view().banner, None);
}

#[test]
fn empty_prompt_is_rejected_locally() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::PromptSubmitted(CreateJobRequest {
            prompt: "   ".to_string(),
            duration: Some(10),
            style: None,
        }),
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().banner.as_deref(), Some("Please enter a prompt."));
    assert!(!state.view().creating);
}

#[test]
fn prompt_is_trimmed_and_blank_options_are_dropped() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::PromptSubmitted(CreateJobRequest {
            prompt: "  a calm ocean  ".to_string(),
            duration: Some(0),
            style: Some("  ".to_string()),
        }),
    );
    assert_eq!(
        effects,
        vec![Effect::CreateJob(CreateJobRequest {
            prompt: "a calm ocean".to_string(),
            duration: None,
            style: None,
        })]
    );

    let (_, effects) = update(
        state,
        Msg::PromptSubmitted(CreateJobRequest {
            prompt: "second".to_string(),
            duration: None,
            style: None,
        }),
    );
    assert!(effects.is_empty(), "creation is single-flight");
}

#[test]
fn failed_creation_reports_backend_message() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::PromptSubmitted(CreateJobRequest {
            prompt: "sunset".to_string(),
            duration: None,
            style: None,
        }),
    );
    let (state, effects) = update(
        state,
        Msg::JobCreated {
            result: Err(FetchFailure::new(FailureClass::Backend, "No prompt provided")),
            now: 5,
        },
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert!(!view.creating);
    assert!(view.observed.is_none());
    assert_eq!(
        view.banner.as_deref(),
        Some("Failed to create job: No prompt provided")
    );
}

#[test]
fn cancel_is_single_flight_and_refreshes_on_success() {
    init_logging();
    let state = observe("job-1", processing("job-1"));

    let (state, effects) = update(state, Msg::CancelClicked);
    assert_eq!(
        effects,
        vec![Effect::CancelJob {
            job_id: "job-1".to_string()
        }]
    );
    assert!(state.view().observed.unwrap().cancelling);

    let (state, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::CancelCompleted {
            job_id: "job-1".to_string(),
            result: Ok("Job cancelled".to_string()),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::FetchStatus {
                job_id: "job-1".to_string(),
                seq: 2
            },
            Effect::LoadJobs,
        ]
    );
    assert!(!state.view().observed.unwrap().cancelling);
}

#[test]
fn cancel_is_refused_for_terminal_jobs() {
    init_logging();
    let state = observe(
        "done",
        JobStatusSnapshot {
            job_id: "done".to_string(),
            status: JobStatus::Completed,
            progress: 100.0,
            ..JobStatusSnapshot::default()
        },
    );
    let (_, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
}

#[test]
fn cancel_failure_shows_banner() {
    init_logging();
    let state = observe("job-1", processing("job-1"));
    let (state, _) = update(state, Msg::CancelClicked);
    let (state, effects) = update(
        state,
        Msg::CancelCompleted {
            job_id: "job-1".to_string(),
            result: Err(FetchFailure::new(FailureClass::Server, "HTTP 500")),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.view().banner.as_deref(),
        Some("Failed to cancel job: HTTP 500")
    );
}

#[test]
fn inline_script_is_shown_without_a_request() {
    init_logging();
    let script = Script {
        title: "Sunrise".to_string(),
        ..Script::default()
    };
    let mut snapshot = processing("job-1");
    snapshot.output = Some(JobOutput {
        script: Some(ScriptRef::Inline(script.clone())),
        ..JobOutput::default()
    });
    let state = observe("job-1", snapshot);

    let (state, effects) = update(state, Msg::ScriptRequested);
    assert!(effects.is_empty());
    assert_eq!(
        state.view().script,
        Panel::Ready {
            job_id: "job-1".to_string(),
            value: script
        }
    );
}

#[test]
fn script_is_fetched_and_late_results_for_other_jobs_are_dropped() {
    init_logging();
    let state = observe("job-1", processing("job-1"));

    let (state, effects) = update(state, Msg::ScriptRequested);
    assert_eq!(
        effects,
        vec![Effect::FetchScript {
            job_id: "job-1".to_string()
        }]
    );
    assert!(state.view().script.is_loading());

    let (state, _) = update(
        state,
        Msg::ScriptLoaded {
            job_id: "job-0".to_string(),
            result: Ok(Script::default()),
        },
    );
    assert!(state.view().script.is_loading());

    let (state, _) = update(
        state,
        Msg::ScriptLoaded {
            job_id: "job-1".to_string(),
            result: Err(FetchFailure::new(FailureClass::Backend, "Script not found")),
        },
    );
    assert_eq!(
        state.view().script,
        Panel::Failed {
            job_id: "job-1".to_string(),
            message: "Script not found".to_string()
        }
    );
}

#[test]
fn assets_from_snapshot_are_grouped_by_extension() {
    init_logging();
    let mut snapshot = processing("job-1");
    snapshot.output = Some(JobOutput {
        assets: vec![
            "assets/frame.PNG".to_string(),
            "assets/voice.mp3".to_string(),
            "assets/notes.txt".to_string(),
        ],
        ..JobOutput::default()
    });
    let state = observe("job-1", snapshot);
    assert!(state.view().observed.unwrap().tabs.assets);

    let (state, effects) = update(state, Msg::AssetsRequested);
    assert!(effects.is_empty());
    let Panel::Ready { value, .. } = state.view().assets else {
        panic!("assets should be ready");
    };
    assert_eq!(value.get(AssetCategory::Images), ["assets/frame.PNG"]);
    assert_eq!(value.get(AssetCategory::Audio), ["assets/voice.mp3"]);
    assert_eq!(value.total(), 2);
}

#[test]
fn switching_jobs_clears_viewer_panels() {
    init_logging();
    let state = observe("job-1", processing("job-1"));
    let (state, _) = update(state, Msg::AssetsRequested);
    let (state, _) = update(
        state,
        Msg::AssetsLoaded {
            job_id: "job-1".to_string(),
            result: Ok(AssetBundle::from_paths(["a.png"])),
        },
    );
    assert!(matches!(state.view().assets, Panel::Ready { .. }));

    let (state, _) = update(
        state,
        Msg::JobSelected {
            job_id: "job-2".to_string(),
            now: 100,
        },
    );
    assert_eq!(state.view().assets, Panel::Empty);
    assert_eq!(state.view().script, Panel::Empty);
}
