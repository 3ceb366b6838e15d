use std::sync::Arc;
use std::time::Duration;

use vidgen_core::{
    AssetBundle, AssetCategory, CreateJobRequest, Job, JobId, JobStatus, JobStatusSnapshot, Script,
};
use vidgen_engine::{
    ApiError, BackendClient, Download, EngineEvent, EngineHandle, FailureKind, HealthReport,
    ProgressSink, ToolVersion, UploadReceipt,
};

/// Answers status requests after a per-job delay; everything else is canned.
struct FakeBackend;

fn unsupported() -> ApiError {
    ApiError::new(FailureKind::Backend, "not supported by the fake backend")
}

#[async_trait::async_trait]
impl BackendClient for FakeBackend {
    async fn health(&self) -> Result<HealthReport, ApiError> {
        Err(unsupported())
    }

    async fn tool_version(&self) -> Result<ToolVersion, ApiError> {
        Err(unsupported())
    }

    async fn upload(&self, _filename: &str, _bytes: Vec<u8>) -> Result<UploadReceipt, ApiError> {
        Err(unsupported())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        Ok(vec![Job {
            job_id: "abc123".to_string(),
            prompt: None,
            status: JobStatus::Rendering,
            created_at: 0.0,
            completed_at: None,
            video_ready: false,
            video_path: None,
            error: None,
        }])
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusSnapshot, ApiError> {
        if job_id == "missing-id" {
            return Err(ApiError::new(FailureKind::NotFound, "Job not found"));
        }
        if job_id.starts_with("slow") {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Ok(JobStatusSnapshot {
            job_id: job_id.to_string(),
            status: JobStatus::Processing,
            ..JobStatusSnapshot::default()
        })
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobId, ApiError> {
        Ok(format!("job-for-{}", request.prompt))
    }

    async fn cancel_job(&self, _job_id: &str) -> Result<String, ApiError> {
        Ok("Job canceled successfully".to_string())
    }

    async fn script(&self, _job_id: &str) -> Result<Script, ApiError> {
        Err(ApiError::new(FailureKind::Backend, "Script not found"))
    }

    async fn assets(&self, _job_id: &str) -> Result<AssetBundle, ApiError> {
        Ok(AssetBundle::from_paths(["sky.png"]))
    }

    async fn download_video(
        &self,
        _job_id: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<Download, ApiError> {
        Err(unsupported())
    }

    async fn download_asset(
        &self,
        _job_id: &str,
        _category: AssetCategory,
        _filename: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<Download, ApiError> {
        Err(unsupported())
    }
}

fn engine() -> EngineHandle {
    EngineHandle::new(Arc::new(FakeBackend)).unwrap()
}

fn next_event(engine: &EngineHandle) -> EngineEvent {
    engine
        .recv_timeout(Duration::from_secs(5))
        .expect("engine event")
}

#[test]
fn status_fetch_reports_sequence_number() {
    let engine = engine();
    engine.fetch_status("abc123".to_string(), 7);

    match next_event(&engine) {
        EngineEvent::StatusFetched {
            job_id,
            seq,
            result,
        } => {
            assert_eq!(job_id, "abc123");
            assert_eq!(seq, 7);
            assert_eq!(result.unwrap().status, JobStatus::Processing);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn aborted_status_fetches_are_never_reported() {
    let engine = engine();
    engine.fetch_status("slow-1".to_string(), 1);
    engine.abort_status_fetches();
    engine.fetch_status("abc123".to_string(), 2);

    match next_event(&engine) {
        EngineEvent::StatusFetched { seq, .. } => assert_eq!(seq, 2),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(engine.recv_timeout(Duration::from_millis(600)).is_none());
}

#[test]
fn not_found_is_passed_through() {
    let engine = engine();
    engine.fetch_status("missing-id".to_string(), 1);

    match next_event(&engine) {
        EngineEvent::StatusFetched { result, .. } => {
            assert_eq!(result.unwrap_err().kind, FailureKind::NotFound);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn collaborator_requests_report_their_results() {
    let engine = engine();

    engine.load_jobs();
    assert!(matches!(next_event(&engine), EngineEvent::JobsLoaded(Ok(jobs)) if jobs.len() == 1));

    engine.create_job(CreateJobRequest {
        prompt: "sunrise".to_string(),
        duration: None,
        style: None,
    });
    assert_eq!(
        next_event(&engine),
        EngineEvent::JobCreated(Ok("job-for-sunrise".to_string()))
    );

    engine.cancel_job("abc123".to_string());
    assert_eq!(
        next_event(&engine),
        EngineEvent::JobCancelled {
            job_id: "abc123".to_string(),
            result: Ok("Job canceled successfully".to_string()),
        }
    );

    engine.fetch_assets("abc123".to_string());
    match next_event(&engine) {
        EngineEvent::AssetsLoaded { job_id, result } => {
            assert_eq!(job_id, "abc123");
            assert_eq!(result.unwrap().total(), 1);
        }
        other => panic!("unexpected event {other:?}"),
    }

    engine.fetch_script("abc123".to_string());
    match next_event(&engine) {
        EngineEvent::ScriptLoaded { result, .. } => {
            assert_eq!(result.unwrap_err().message, "Script not found");
        }
        other => panic!("unexpected event {other:?}"),
    }
}
