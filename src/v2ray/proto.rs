//! Messages of the `v2ray.core.app.stats.command` package.
//!
//! Only the subset of `StatsService` the exporter calls is declared here.

/// Request for `StatsService/QueryStats`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryStatsRequest {
    /// Substring filter; empty matches every counter.
    #[prost(string, tag = "1")]
    pub pattern: ::prost::alloc::string::String,
    /// Reset counters to zero after reading them.
    #[prost(bool, tag = "2")]
    pub reset: bool,
    #[prost(string, repeated, tag = "3")]
    pub patterns: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(bool, tag = "4")]
    pub regexp: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Stat {
    /// e.g. `inbound>>>socks-proxy>>>traffic>>>uplink`
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(int64, tag = "2")]
    pub value: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryStatsResponse {
    #[prost(message, repeated, tag = "1")]
    pub stat: ::prost::alloc::vec::Vec<Stat>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct SysStatsRequest {}

/// Go runtime statistics of the V2Ray process.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct SysStatsResponse {
    #[prost(uint32, tag = "1")]
    pub num_goroutine: u32,
    #[prost(uint32, tag = "2")]
    pub num_gc: u32,
    #[prost(uint64, tag = "3")]
    pub alloc: u64,
    #[prost(uint64, tag = "4")]
    pub total_alloc: u64,
    #[prost(uint64, tag = "5")]
    pub sys: u64,
    #[prost(uint64, tag = "6")]
    pub mallocs: u64,
    #[prost(uint64, tag = "7")]
    pub frees: u64,
    #[prost(uint64, tag = "8")]
    pub live_objects: u64,
    #[prost(uint64, tag = "9")]
    pub pause_total_ns: u64,
    /// Seconds since the V2Ray process started.
    #[prost(uint32, tag = "10")]
    pub uptime: u32,
}
