use thiserror::Error;

use crate::domain::FetchTarget;

/// Why a single fetch did not produce a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cancelled by batch deadline")]
    Cancelled,
}

/// Terminal result of one fetch attempt.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success { target: FetchTarget, body: String },
    Failure { target: FetchTarget, reason: FetchFailure },
}

impl FetchOutcome {
    pub fn target(&self) -> &FetchTarget {
        match self {
            FetchOutcome::Success { target, .. } | FetchOutcome::Failure { target, .. } => target,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            FetchOutcome::Success { body, .. } => Some(body),
            FetchOutcome::Failure { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Failure { reason, .. } => Some(reason),
        }
    }
}
