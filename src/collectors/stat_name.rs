//! Stat-Name Parser.
//!
//! V2Ray names its counters `dimension>>>target>>>category>>>direction`,
//! for example `inbound>>>socks-proxy>>>traffic>>>uplink` or
//! `user>>>love@v2ray.com>>>traffic>>>downlink`.

use crate::collectors::error::ScrapeError;

pub const DELIMITER: &str = ">>>";

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStat<'a> {
    /// `category_direction`
    pub key: String,
    pub dimension: &'a str,
    pub target: &'a str,
    pub value: f64,
}

/// Split a raw counter name into metric key and label values.
///
/// Segments are not validated beyond their count; empty segments yield empty
/// label values.
///
/// # Errors
///
/// Returns [`ScrapeError::Malformed`] unless the name has exactly four segments.
#[allow(clippy::cast_precision_loss)]
pub fn parse(name: &str, value: i64) -> Result<ParsedStat<'_>, ScrapeError> {
    let mut segments = name.split(DELIMITER);

    match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(dimension), Some(target), Some(category), Some(direction), None) => Ok(ParsedStat {
            key: format!("{category}_{direction}"),
            dimension,
            target,
            value: value as f64,
        }),
        _ => Err(ScrapeError::Malformed(name.to_string())),
    }
}
