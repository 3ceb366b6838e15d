use std::fs;
use std::path::Path;

use engine_logging::{engine_debug, engine_error, engine_warn};
use serde::{Deserialize, Serialize};
use vidgen_core::JobId;
use vidgen_engine::AtomicFileWriter;

const STATE_FILENAME: &str = ".vidgen_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
struct PersistedState {
    last_job_id: Option<JobId>,
}

/// The job selected during the previous run, if any.
pub(crate) fn load_selection(state_dir: &Path) -> Option<JobId> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            engine_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedState>(&content) {
        Ok(state) => state.last_job_id.filter(|id| !id.trim().is_empty()),
        Err(err) => {
            engine_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_selection(state_dir: &Path, job_id: Option<&str>) {
    let state = PersistedState {
        last_job_id: job_id.map(str::to_string),
    };
    let content = match ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new()) {
        Ok(content) => content,
        Err(err) => {
            engine_error!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    match AtomicFileWriter::new(state_dir).write(STATE_FILENAME, content.as_bytes()) {
        Ok(path) => engine_debug!("Remembered selection in {:?}", path),
        Err(err) => engine_error!("Failed to write persisted state in {:?}: {}", state_dir, err),
    }
}
