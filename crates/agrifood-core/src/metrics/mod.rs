//! In-process metric registry with Prometheus text exposition.
//!
//! Instruments keep one series per label-value tuple in a `DashMap`. A series
//! is mutated while its map entry is held, so a concurrent export always sees
//! a series either before or after an update, never in between. Families are
//! rendered in registration order and series sorted by label values.

pub mod counter;
pub mod histogram;
pub mod process;
pub mod registry;
pub mod text;

pub use counter::Counter;
pub use histogram::{Histogram, HistogramSnapshot, HistogramTimer};
pub use process::ProcessCollector;
pub use registry::{Collector, Registry};
pub use text::{MetricFamily, MetricKind, Sample, TEXT_CONTENT_TYPE};

use crate::error::{AgriFoodError, Result};

/// Name, help text and ordered label names shared by every instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Desc {
    pub name: String,
    pub help: String,
    pub label_names: Vec<String>,
}

impl Desc {
    pub(crate) fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        validate_metric_name(name)?;
        for (i, label) in label_names.iter().enumerate() {
            validate_label_name(label)?;
            if label_names[..i].contains(label) {
                return Err(AgriFoodError::InvalidName(format!(
                    "duplicate label {label} on {name}"
                )));
            }
        }
        Ok(Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        })
    }

    /// Turn positional label values into a series key.
    pub(crate) fn key(&self, values: &[&str]) -> Result<Vec<String>> {
        if values.len() != self.label_names.len() {
            return Err(AgriFoodError::LabelMismatch {
                metric: self.name.clone(),
                expected: self.label_names.len(),
                got: values.len(),
            });
        }
        Ok(values.iter().map(|v| v.to_string()).collect())
    }

    /// Zip a series key back with the label names for rendering.
    pub(crate) fn pairs(&self, key: &[String]) -> Vec<(String, String)> {
        self.label_names
            .iter()
            .cloned()
            .zip(key.iter().cloned())
            .collect()
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(AgriFoodError::InvalidName(format!("metric name {name:?}")))
    }
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, not starting with `__`.
pub fn validate_label_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if ok && !name.starts_with("__") {
        Ok(())
    } else {
        Err(AgriFoodError::InvalidName(format!("label name {name:?}")))
    }
}
