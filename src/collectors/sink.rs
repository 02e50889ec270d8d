//! Renders a scrape's samples in the Prometheus text exposition format.
//!
//! Samples are written into a throwaway `prometheus::Registry` so the
//! encoding, escaping and ordering rules come from the `prometheus` crate.

use crate::collectors::descriptors::{Descriptor, ValueKind};
use crate::collectors::sample::Sample;
use anyhow::Result;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use tracing::warn;

enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

fn register(registry: &Registry, desc: &Descriptor) -> Option<Family> {
    let opts = Opts::new(desc.name.clone(), desc.help.clone());
    let labels: Vec<&str> = desc.labels.iter().map(String::as_str).collect();

    let family = match desc.kind {
        ValueKind::Gauge => GaugeVec::new(opts, &labels).and_then(|vec| {
            registry.register(Box::new(vec.clone()))?;
            Ok(Family::Gauge(vec))
        }),
        ValueKind::Counter => CounterVec::new(opts, &labels).and_then(|vec| {
            registry.register(Box::new(vec.clone()))?;
            Ok(Family::Counter(vec))
        }),
    };

    match family {
        Ok(family) => Some(family),
        Err(e) => {
            warn!(metric = %desc.name, error = %e, "dropping metric family");
            None
        }
    }
}

/// Encode `samples` as text, dropping (and logging) any sample that
/// contradicts an earlier sample of the same name.
///
/// # Errors
///
/// Returns an error if the text encoder fails.
pub fn encode(samples: &[Sample]) -> Result<String> {
    let registry = Registry::new();
    let mut families: HashMap<&str, Option<Family>> = HashMap::new();

    for sample in samples {
        let desc = sample.desc();
        let family = families
            .entry(desc.name.as_str())
            .or_insert_with(|| register(&registry, desc));

        let Some(family) = family else {
            continue;
        };

        let values: Vec<&str> = sample.label_values().iter().map(String::as_str).collect();
        let value = sample.value();

        let written = match (family, sample.kind()) {
            (Family::Gauge(vec), ValueKind::Gauge) => vec
                .get_metric_with_label_values(values.as_slice())
                .map(|gauge| gauge.set(value))
                .map_err(|e| e.to_string()),
            (Family::Counter(vec), ValueKind::Counter) => {
                if value.is_nan() || value < 0.0 {
                    Err(format!("counter value {value} is negative"))
                } else {
                    vec.get_metric_with_label_values(values.as_slice())
                        .map(|counter| counter.inc_by(value))
                        .map_err(|e| e.to_string())
                }
            }
            _ => Err("value type differs from earlier sample".to_string()),
        };

        if let Err(e) = written {
            warn!(metric = %desc.name, error = %e, "dropping metric sample");
        }
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::descriptors::DescriptorRegistry;
    use crate::collectors::sample::Emitter;
    use std::sync::Arc;

    #[test]
    fn test_encode_gauges_and_counters() {
        let registry = DescriptorRegistry::new();
        let mut emitter = Emitter::new(&registry);
        emitter.gauge("up", 1.0);
        emitter.counter(
            "traffic_uplink",
            2048.0,
            &[("dimension", "inbound"), ("target", "socks-proxy")],
        );

        let text = encode(&emitter.into_samples()).unwrap();

        assert!(text.contains("# HELP v2ray_up Indicate scrape succeeded or not"));
        assert!(text.contains("# TYPE v2ray_up gauge"));
        assert!(text.contains("v2ray_up 1"));
        assert!(text.contains("# TYPE v2ray_traffic_uplink_bytes_total counter"));
        assert!(text.contains(
            r#"v2ray_traffic_uplink_bytes_total{dimension="inbound",target="socks-proxy"} 2048"#
        ));
    }

    #[test]
    fn test_encode_groups_labeled_series() {
        let registry = DescriptorRegistry::new();
        let mut emitter = Emitter::new(&registry);
        emitter.counter("traffic_downlink", 1.0, &[("dimension", "inbound"), ("target", "a")]);
        emitter.counter("traffic_downlink", 2.0, &[("dimension", "outbound"), ("target", "b")]);

        let text = encode(&emitter.into_samples()).unwrap();

        assert_eq!(
            text.matches("# TYPE v2ray_traffic_downlink_bytes_total counter")
                .count(),
            1
        );
        assert!(text.contains(r#"dimension="inbound",target="a"} 1"#));
        assert!(text.contains(r#"dimension="outbound",target="b"} 2"#));
    }

    #[test]
    fn test_encode_drops_negative_counter() {
        let desc = Arc::new(Descriptor::new("weird_total", "weird", &[], ValueKind::Counter));
        let samples = vec![Sample::new(desc, -5.0, vec![]).unwrap()];

        let text = encode(&samples).unwrap();
        assert!(!text.contains("v2ray_weird_total -5"));
    }

    #[test]
    fn test_encode_drops_invalid_metric_name() {
        let desc = Arc::new(Descriptor::new("bad-name", "bad", &[], ValueKind::Gauge));
        let samples = vec![Sample::new(desc, 1.0, vec![]).unwrap()];

        let text = encode(&samples).unwrap();
        assert!(!text.contains("bad-name"));
    }

    #[test]
    fn test_encode_drops_conflicting_label_sets() {
        let with_labels = Arc::new(Descriptor::new(
            "thing",
            "thing",
            &["dimension"],
            ValueKind::Gauge,
        ));
        let without_labels = Arc::new(Descriptor::new("thing", "thing", &[], ValueKind::Gauge));

        let samples = vec![
            Sample::new(with_labels, 1.0, vec!["inbound".to_string()]).unwrap(),
            Sample::new(without_labels, 2.0, vec![]).unwrap(),
        ];

        let text = encode(&samples).unwrap();
        assert!(text.contains(r#"v2ray_thing{dimension="inbound"} 1"#));
        assert!(!text.contains("v2ray_thing 2"));
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&[]).unwrap(), "");
    }
}
