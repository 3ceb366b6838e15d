use std::fmt;

use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;
use vidgen_core::{AssetBundle, Job, JobId, JobStatusSnapshot, RequestSeq, Script};

/// A request to the backend that did not produce the expected payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    NotFound,
    HttpStatus(u16),
    /// The backend answered with `status: "error"`.
    Backend,
    Malformed,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Backend => write!(f, "backend error"),
            FailureKind::Malformed => write!(f, "malformed response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// Reply of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub message: String,
}

/// Version of the rendering tool installed next to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ToolVersion {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "image_id")]
    pub file_id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, alias = "file_path")]
    pub url: Option<String>,
}

/// A binary body read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    /// Filename suggested by `Content-Disposition`, if any.
    pub suggested_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub received: u64,
    pub total: Option<u64>,
}

/// Completion reported by the background engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StatusFetched {
        job_id: JobId,
        seq: RequestSeq,
        result: Result<JobStatusSnapshot, ApiError>,
    },
    JobsLoaded(Result<Vec<Job>, ApiError>),
    JobCreated(Result<JobId, ApiError>),
    JobCancelled {
        job_id: JobId,
        result: Result<String, ApiError>,
    },
    ScriptLoaded {
        job_id: JobId,
        result: Result<Script, ApiError>,
    },
    AssetsLoaded {
        job_id: JobId,
        result: Result<AssetBundle, ApiError>,
    },
}
