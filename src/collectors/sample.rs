//! Emitted metric samples and the helpers that build them.

use crate::collectors::descriptors::{Descriptor, DescriptorRegistry, ValueKind};
use crate::collectors::error::ScrapeError;
use std::sync::Arc;
use tracing::{debug, error};

/// One immutable `(descriptor, value, label values)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    desc: Arc<Descriptor>,
    value: f64,
    label_values: Vec<String>,
}

impl Sample {
    /// # Errors
    ///
    /// Returns [`ScrapeError::LabelMismatch`] when the number of label values
    /// differs from the labels the descriptor declares.
    pub fn new(
        desc: Arc<Descriptor>,
        value: f64,
        label_values: Vec<String>,
    ) -> Result<Self, ScrapeError> {
        if desc.labels.len() != label_values.len() {
            return Err(ScrapeError::LabelMismatch {
                name: desc.name.clone(),
                expected: desc.labels.len(),
                got: label_values.len(),
            });
        }

        Ok(Self {
            desc,
            value,
            label_values,
        })
    }

    #[must_use]
    pub fn desc(&self) -> &Descriptor {
        &self.desc
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.desc.kind
    }

    #[must_use]
    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Label value for `label`, if the descriptor declares it.
    #[must_use]
    pub fn label(&self, label: &str) -> Option<&str> {
        self.desc
            .labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }
}

/// Accumulates the samples of one scrape.
///
/// Labels are passed as `(name, value)` pairs so a descriptor can be
/// synthesized for keys the registry does not know.
pub struct Emitter<'r> {
    registry: &'r DescriptorRegistry,
    samples: Vec<Sample>,
}

impl<'r> Emitter<'r> {
    #[must_use]
    pub const fn new(registry: &'r DescriptorRegistry) -> Self {
        Self {
            registry,
            samples: Vec::new(),
        }
    }

    pub fn gauge(&mut self, key: &str, value: f64) {
        self.emit(key, ValueKind::Gauge, value, &[]);
    }

    pub fn counter(&mut self, key: &str, value: f64, labels: &[(&str, &str)]) {
        self.emit(key, ValueKind::Counter, value, labels);
    }

    fn emit(&mut self, key: &str, kind: ValueKind, value: f64, labels: &[(&str, &str)]) {
        let desc = if let Some(desc) = self.registry.resolve(key) {
            desc
        } else {
            debug!(key, "no descriptor registered for metric, synthesizing one");
            let names: Vec<&str> = labels.iter().map(|(name, _)| *name).collect();
            Arc::new(DescriptorRegistry::synthesize(key, &names, kind))
        };

        let label_values = labels.iter().map(|(_, value)| (*value).to_string()).collect();

        match Sample::new(desc, value, label_values) {
            Ok(sample) => self.samples.push(sample),
            Err(e) => error!(key, error = %e, kind = e.kind(), "dropping metric sample"),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}
