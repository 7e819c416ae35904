use std::fmt;

use certwatch_core::{CheckOutcome, SiteId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    CheckCompleted {
        site_id: SiteId,
        outcome: CheckOutcome,
    },
    /// Every check of one batch, reported together once all have settled.
    BatchCompleted {
        outcomes: Vec<(SiteId, CheckOutcome)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CheckError {
    pub kind: FailureKind,
    pub message: String,
}

impl CheckError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Dns,
    Connect,
    Handshake,
    Certificate,
    Timeout,
    HttpStatus(u16),
    MalformedResponse,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Dns => write!(f, "dns resolution failed"),
            FailureKind::Connect => write!(f, "connect failed"),
            FailureKind::Handshake => write!(f, "tls handshake failed"),
            FailureKind::Certificate => write!(f, "certificate unreadable"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
