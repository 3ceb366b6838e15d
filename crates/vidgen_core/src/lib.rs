//! Vidgen core: job model and the pure status-poller state machine.
mod effect;
mod failure;
mod model;
mod msg;
mod poller;
mod settings;
mod state;
mod style;
mod update;
mod view_model;

pub use effect::Effect;
pub use failure::{FailureClass, FetchFailure, JOB_NOT_FOUND_MESSAGE};
pub use model::{
    AssetBundle, AssetCategory, CreateJobRequest, Job, JobId, JobOutput, JobStatus,
    JobStatusSnapshot, Scene, Script, ScriptRef, Step,
};
pub use msg::Msg;
pub use poller::{PollPhase, RequestSeq};
pub use settings::{Millis, PollSettings};
pub use state::{AppState, Panel};
pub use style::{StatusStyle, Tone};
pub use update::update;
pub use view_model::{AppViewModel, JobRowView, ObservedJobView, TabAvailability};
