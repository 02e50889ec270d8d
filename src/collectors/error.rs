use crate::v2ray::RpcError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Upstream call a [`ScrapeError::QueryFailed`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    SysStats,
    Stats,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SysStats => f.write_str("sys stats"),
            Self::Stats => f.write_str("stats"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to dial {endpoint}: {source}, timeout: {timeout:?}")]
    DialFailed {
        endpoint: String,
        timeout: Duration,
        #[source]
        source: RpcError,
    },

    #[error("failed to get {query}: {source}")]
    QueryFailed {
        query: Query,
        #[source]
        source: RpcError,
    },

    #[error("malformed stat name {0:?}, expected dimension>>>target>>>category>>>direction")]
    Malformed(String),

    #[error("metric {name} declares {expected} label(s) but got {got}")]
    LabelMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
}

impl ScrapeError {
    /// Stable tag for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DialFailed { .. } => "dial_failed",
            Self::QueryFailed { .. } => "query_failed",
            Self::Malformed(_) => "malformed",
            Self::LabelMismatch { .. } => "label_mismatch",
        }
    }
}
