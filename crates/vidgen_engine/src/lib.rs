//! Vidgen engine: HTTP client for the job backend and effect execution.
mod client;
mod engine;
mod envelope;
mod filename;
mod persist;
mod types;

pub use client::{BackendClient, BackendSettings, ProgressSink, ReqwestBackend, DEFAULT_API_URL};
pub use engine::EngineHandle;
pub use filename::local_filename;
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use types::{
    ApiError, Download, DownloadProgress, EngineEvent, FailureKind, HealthReport, ToolVersion,
    UploadReceipt,
};
