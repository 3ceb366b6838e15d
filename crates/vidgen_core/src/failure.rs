use std::fmt;

/// Text shown once the observed job has disappeared from the backend.
pub const JOB_NOT_FOUND_MESSAGE: &str = "Job not found. It may have been deleted.";

/// How a request to the backend failed, as far as the interface cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Transport failure or timeout; the next poll may succeed.
    Network,
    /// HTTP 404: the job no longer exists.
    NotFound,
    /// Any other non-2xx status.
    Server,
    /// Well-formed `status: "error"` payload.
    Backend,
    /// Payload that does not have the expected shape.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub class: FailureClass,
    pub message: String,
}

impl FetchFailure {
    pub fn new(class: FailureClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureClass::Network, message)
    }

    pub fn not_found() -> Self {
        Self::new(FailureClass::NotFound, JOB_NOT_FOUND_MESSAGE)
    }

    pub fn is_not_found(&self) -> bool {
        self.class == FailureClass::NotFound
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            FailureClass::Network => "network error",
            FailureClass::NotFound => "not found",
            FailureClass::Server => "server error",
            FailureClass::Backend => "backend error",
            FailureClass::Malformed => "unexpected response",
        };
        write!(f, "{class}: {}", self.message)
    }
}
