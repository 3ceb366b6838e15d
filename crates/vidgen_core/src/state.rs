use engine_logging::{engine_debug, engine_info};

use crate::poller::{Admission, Observation, TickDecision};
use crate::view_model::{AppViewModel, JobRowView, ObservedJobView, TabAvailability};
use crate::{
    AssetBundle, Effect, FetchFailure, Job, JobId, JobStatusSnapshot, Millis, PollPhase,
    PollSettings, RequestSeq, Script,
};

/// A viewer panel whose content is fetched on demand for one job.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Panel<T> {
    #[default]
    Empty,
    Loading {
        job_id: JobId,
    },
    Ready {
        job_id: JobId,
        value: T,
    },
    Failed {
        job_id: JobId,
        message: String,
    },
}

impl<T> Panel<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Panel::Loading { .. })
    }

    /// Stores `result` if the panel is still waiting on `job_id`.
    fn resolve(&mut self, job_id: &str, result: Result<T, FetchFailure>) -> bool {
        match self {
            Panel::Loading { job_id: waiting } if waiting.as_str() == job_id => {
                let job_id = std::mem::take(waiting);
                *self = match result {
                    Ok(value) => Panel::Ready { job_id, value },
                    Err(failure) => Panel::Failed {
                        job_id,
                        message: failure.message,
                    },
                };
                true
            }
            _ => false,
        }
    }
}

/// The single state container owned by the interface loop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    settings: PollSettings,
    next_seq: RequestSeq,
    observation: Option<Observation>,
    jobs: Vec<Job>,
    jobs_loading: bool,
    creating: bool,
    banner: Option<String>,
    script: Panel<Script>,
    assets: Panel<AssetBundle>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: PollSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    pub fn observed_job_id(&self) -> Option<&str> {
        self.observation.as_ref().map(|obs| obs.job_id.as_str())
    }

    pub fn poll_phase(&self) -> PollPhase {
        self.observation
            .as_ref()
            .map(Observation::phase)
            .unwrap_or(PollPhase::Idle)
    }

    /// Deadline of the next timer poll for the observed job.
    pub fn next_poll_at(&self) -> Option<Millis> {
        self.observation
            .as_ref()
            .filter(|obs| !obs.polling_stopped())
            .map(Observation::next_poll_at)
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            observed: self.observation.as_ref().map(observed_view),
            jobs: self
                .jobs
                .iter()
                .map(|job| JobRowView {
                    job_id: job.job_id.clone(),
                    prompt: job.prompt.clone().unwrap_or_default(),
                    style: job.status.style(),
                    status: job.status.clone(),
                    created_at: job.created_at,
                    video_ready: job.video_ready,
                    selected: self.observed_job_id() == Some(job.job_id.as_str()),
                })
                .collect(),
            jobs_loading: self.jobs_loading,
            creating: self.creating,
            banner: self.banner.clone(),
            script: self.script.clone(),
            assets: self.assets.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether state changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn take_seq(&mut self) -> RequestSeq {
        self.next_seq += 1;
        self.next_seq
    }

    pub(crate) fn select_job(&mut self, job_id: JobId, now: Millis) -> Vec<Effect> {
        let job_id = job_id.trim().to_string();
        if job_id.is_empty() {
            return Vec::new();
        }
        if self.observed_job_id() == Some(job_id.as_str()) {
            engine_debug!("job {} already observed; selection ignored", job_id);
            return Vec::new();
        }

        let mut effects = Vec::with_capacity(3);
        if let Some(previous) = self.observation.take() {
            engine_info!("switching observation from {} to {}", previous.job_id, job_id);
            effects.push(Effect::AbortStatusFetches);
        } else {
            engine_info!("observing job {}", job_id);
        }

        let seq = self.take_seq();
        self.observation = Some(Observation::new(job_id.clone(), seq, now, self.settings));
        self.script = Panel::Empty;
        self.assets = Panel::Empty;
        self.mark_dirty();

        effects.push(Effect::FetchStatus {
            job_id: job_id.clone(),
            seq,
        });
        effects.push(Effect::RememberSelection {
            job_id: Some(job_id),
        });
        effects
    }

    pub(crate) fn refresh(&mut self) -> Vec<Effect> {
        let seq = self.next_seq + 1;
        let Some(obs) = self.observation.as_mut().filter(|obs| !obs.is_gone()) else {
            return Vec::new();
        };
        obs.track(seq);
        let job_id = obs.job_id.clone();
        self.next_seq = seq;
        self.mark_dirty();
        vec![Effect::FetchStatus { job_id, seq }]
    }

    pub(crate) fn tick(&mut self, now: Millis) -> Vec<Effect> {
        let settings = self.settings;
        let seq = self.next_seq + 1;
        let Some(obs) = self.observation.as_mut() else {
            return Vec::new();
        };
        match obs.on_tick(now, settings) {
            TickDecision::NotDue | TickDecision::Suppressed => Vec::new(),
            TickDecision::Poll => {
                obs.track(seq);
                let job_id = obs.job_id.clone();
                self.next_seq = seq;
                self.mark_dirty();
                vec![Effect::FetchStatus { job_id, seq }]
            }
        }
    }

    pub(crate) fn apply_status(
        &mut self,
        job_id: &str,
        seq: RequestSeq,
        result: Result<JobStatusSnapshot, FetchFailure>,
        now: Millis,
    ) -> Vec<Effect> {
        let Some(obs) = self
            .observation
            .as_mut()
            .filter(|obs| obs.job_id == job_id)
        else {
            engine_debug!("discarding status #{} for unobserved job {}", seq, job_id);
            return Vec::new();
        };

        if obs.admit(seq) == Admission::Stale {
            engine_debug!("discarding stale status #{} for job {}", seq, job_id);
            // The in-flight set may have shrunk.
            self.mark_dirty();
            return Vec::new();
        }

        let mut reached_terminal = false;
        match result {
            Ok(snapshot) => {
                let status = snapshot.status.clone();
                if obs.apply_success(snapshot, now) {
                    engine_info!("job {} reached terminal status {}", job_id, status);
                    reached_terminal = true;
                }
            }
            Err(failure) => {
                if failure.is_not_found() {
                    engine_info!("job {} no longer exists; polling stopped", job_id);
                } else {
                    engine_debug!("status #{} for job {} failed: {}", seq, job_id, failure);
                }
                obs.apply_failure(failure);
            }
        }
        self.mark_dirty();
        if reached_terminal && self.begin_jobs_load() {
            vec![Effect::LoadJobs]
        } else {
            Vec::new()
        }
    }

    pub(crate) fn close_view(&mut self) -> Vec<Effect> {
        self.script = Panel::Empty;
        self.assets = Panel::Empty;
        match self.observation.take() {
            Some(obs) => {
                engine_info!("stopped observing job {}", obs.job_id);
                self.mark_dirty();
                vec![Effect::AbortStatusFetches]
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn begin_jobs_load(&mut self) -> bool {
        if self.jobs_loading {
            return false;
        }
        self.jobs_loading = true;
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_jobs(&mut self, result: Result<Vec<Job>, FetchFailure>) {
        self.jobs_loading = false;
        match result {
            Ok(jobs) => self.jobs = jobs,
            Err(failure) => self.banner = Some(format!("Failed to load jobs: {}", failure.message)),
        }
        self.mark_dirty();
    }

    pub(crate) fn is_creating(&self) -> bool {
        self.creating
    }

    pub(crate) fn set_creating(&mut self, creating: bool) {
        self.creating = creating;
        self.mark_dirty();
    }

    pub(crate) fn set_banner(&mut self, banner: Option<String>) {
        if self.banner != banner {
            self.banner = banner;
            self.mark_dirty();
        }
    }

    /// The observed job when it can still be acted upon.
    pub(crate) fn active_observation(&mut self) -> Option<&mut Observation> {
        self.observation.as_mut().filter(|obs| !obs.is_gone())
    }

    pub(crate) fn finish_cancel(&mut self, job_id: &str) {
        if let Some(obs) = self
            .observation
            .as_mut()
            .filter(|obs| obs.job_id == job_id)
        {
            obs.cancelling = false;
            self.mark_dirty();
        }
    }

    pub(crate) fn observed_snapshot(&self) -> Option<&JobStatusSnapshot> {
        self.observation
            .as_ref()
            .and_then(|obs| obs.snapshot.as_ref())
    }

    pub(crate) fn set_script_panel(&mut self, panel: Panel<Script>) {
        self.script = panel;
        self.mark_dirty();
    }

    pub(crate) fn set_assets_panel(&mut self, panel: Panel<AssetBundle>) {
        self.assets = panel;
        self.mark_dirty();
    }

    pub(crate) fn resolve_script(&mut self, job_id: &str, result: Result<Script, FetchFailure>) {
        if self.script.resolve(job_id, result) {
            self.mark_dirty();
        } else {
            engine_debug!("discarding script for job {}", job_id);
        }
    }

    pub(crate) fn resolve_assets(
        &mut self,
        job_id: &str,
        result: Result<AssetBundle, FetchFailure>,
    ) {
        if self.assets.resolve(job_id, result) {
            self.mark_dirty();
        } else {
            engine_debug!("discarding assets for job {}", job_id);
        }
    }
}

fn observed_view(obs: &Observation) -> ObservedJobView {
    let snapshot = obs.snapshot.clone();
    let (tabs, video_url, progress, status_style) = match snapshot.as_ref() {
        Some(snapshot) => {
            let video_url = snapshot.video_url(&obs.job_id);
            (
                TabAvailability {
                    script: snapshot.has_script(),
                    assets: !snapshot.asset_paths().is_empty(),
                    video: video_url.is_some(),
                },
                video_url,
                snapshot.progress_percent(),
                Some(snapshot.status.style()),
            )
        }
        None => (TabAvailability::default(), None, 0, None),
    };
    ObservedJobView {
        job_id: obs.job_id.clone(),
        phase: obs.phase(),
        snapshot,
        status_style,
        progress,
        error: obs.error.clone(),
        polling_stopped: obs.polling_stopped(),
        cancelling: obs.cancelling,
        tabs,
        video_url,
    }
}
