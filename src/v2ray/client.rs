use super::proto::{
    QueryStatsRequest, QueryStatsResponse, Stat, SysStatsRequest, SysStatsResponse,
};
use super::{Dialer, RpcError, StatsApi};
use futures::future::BoxFuture;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info_span};
use tracing_futures::Instrument as _;

const GET_SYS_STATS: &str = "/v2ray.core.app.stats.command.StatsService/GetSysStats";
const QUERY_STATS: &str = "/v2ray.core.app.stats.command.StatsService/QueryStats";

/// gRPC client for `v2ray.core.app.stats.command.StatsService`.
#[derive(Debug, Clone)]
pub struct StatsServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl StatsServiceClient {
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn unary<Req, Resp>(&mut self, request: Req, path: &'static str) -> Result<Resp, RpcError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unknown(format!("service was not ready: {e}")))?;

        let codec = tonic_prost::ProstCodec::default();
        let response = self
            .inner
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await?;

        Ok(response.into_inner())
    }
}

impl StatsApi for StatsServiceClient {
    fn get_sys_stats(&mut self) -> BoxFuture<'_, Result<SysStatsResponse, RpcError>> {
        let span = info_span!(
            "rpc.call",
            rpc.system = "grpc",
            rpc.method = "GetSysStats",
            otel.kind = "client"
        );
        Box::pin(
            async move { self.unary(SysStatsRequest {}, GET_SYS_STATS).await }.instrument(span),
        )
    }

    fn query_stats(&mut self, reset: bool) -> BoxFuture<'_, Result<Vec<Stat>, RpcError>> {
        let span = info_span!(
            "rpc.call",
            rpc.system = "grpc",
            rpc.method = "QueryStats",
            otel.kind = "client"
        );
        Box::pin(
            async move {
                let request = QueryStatsRequest {
                    reset,
                    ..Default::default()
                };
                let response: QueryStatsResponse = self.unary(request, QUERY_STATS).await?;
                Ok(response.stat)
            }
            .instrument(span),
        )
    }
}

/// Dials the V2Ray API over plaintext HTTP/2, blocking until the
/// connection is established.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcDialer;

impl Dialer for GrpcDialer {
    type Client = StatsServiceClient;

    fn dial<'a>(&'a self, endpoint: &'a str) -> BoxFuture<'a, Result<Self::Client, RpcError>> {
        Box::pin(async move {
            let channel = Endpoint::from_shared(endpoint.to_string())?
                .connect()
                .await?;

            debug!(endpoint, "connected to v2ray api");

            Ok(StatsServiceClient::new(channel))
        })
    }
}
