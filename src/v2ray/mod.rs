//! Upstream boundary: the V2Ray `StatsService` API.
//!
//! The scrape orchestrator only talks to V2Ray through [`Dialer`] and
//! [`StatsApi`], which keeps the gRPC transport swappable in tests.

mod client;
pub mod proto;

pub use client::{GrpcDialer, StatsServiceClient};

use futures::future::BoxFuture;
use proto::{Stat, SysStatsResponse};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("rpc status {}: {}", .0.code(), .0.message())]
    Status(Box<tonic::Status>),

    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

impl From<tonic::Status> for RpcError {
    fn from(status: tonic::Status) -> Self {
        Self::Status(Box::new(status))
    }
}

/// The two `StatsService` calls a scrape issues.
pub trait StatsApi: Send {
    fn get_sys_stats(&mut self) -> BoxFuture<'_, Result<SysStatsResponse, RpcError>>;

    /// Query every named counter. `reset` zeroes the counters upstream after
    /// reading; scrapes always pass `false` so cumulative values never go
    /// backwards.
    fn query_stats(&mut self, reset: bool) -> BoxFuture<'_, Result<Vec<Stat>, RpcError>>;
}

/// Opens one upstream session per scrape. The session is closed when the
/// returned client is dropped.
pub trait Dialer: Send + Sync {
    type Client: StatsApi + 'static;

    fn dial<'a>(&'a self, endpoint: &'a str) -> BoxFuture<'a, Result<Self::Client, RpcError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = RpcError::from(tonic::Status::unavailable("v2ray is down"));
        let msg = err.to_string();
        assert!(msg.contains("v2ray is down"), "unexpected message: {msg}");
    }

    #[test]
    fn test_deadline_error_display() {
        let err = RpcError::DeadlineExceeded(Duration::from_secs(3));
        assert_eq!(err.to_string(), "deadline exceeded after 3s");
    }
}
