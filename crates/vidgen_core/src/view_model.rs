use crate::{
    AssetBundle, FetchFailure, JobId, JobStatus, JobStatusSnapshot, Panel, PollPhase, Script,
    StatusStyle,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub observed: Option<ObservedJobView>,
    pub jobs: Vec<JobRowView>,
    pub jobs_loading: bool,
    pub creating: bool,
    /// Page-level, dismissable error.
    pub banner: Option<String>,
    pub script: Panel<Script>,
    pub assets: Panel<AssetBundle>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservedJobView {
    pub job_id: JobId,
    pub phase: PollPhase,
    pub snapshot: Option<JobStatusSnapshot>,
    pub status_style: Option<StatusStyle>,
    pub progress: u8,
    pub error: Option<FetchFailure>,
    /// The timer will not issue further requests for this job.
    pub polling_stopped: bool,
    pub cancelling: bool,
    pub tabs: TabAvailability,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabAvailability {
    pub script: bool,
    pub assets: bool,
    pub video: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub prompt: String,
    pub status: JobStatus,
    pub style: StatusStyle,
    pub created_at: f64,
    pub video_ready: bool,
    pub selected: bool,
}
