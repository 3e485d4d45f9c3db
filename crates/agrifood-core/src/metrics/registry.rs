//! Process-wide metric registry.
//!
//! The registry is built once at startup by the composition root and handed to
//! whoever records or exports. Registration order is export order.

use std::sync::{Arc, RwLock};

use super::counter::Counter;
use super::histogram::{normalize_bounds, Histogram};
use super::process::ProcessCollector;
use super::text::{self, MetricFamily};
use super::Desc;
use crate::error::{AgriFoodError, Result};

/// Families sampled at export time rather than updated in place.
pub trait Collector: Send + Sync {
    /// Family names this collector emits; checked for clashes on registration.
    fn names(&self) -> Vec<String>;
    fn collect(&self) -> Vec<MetricFamily>;
}

enum Entry {
    Counter(Counter),
    Histogram(Histogram),
    Collector(Arc<dyn Collector>),
}

impl Entry {
    fn names(&self) -> Vec<String> {
        match self {
            Entry::Counter(c) => vec![c.desc().name.clone()],
            Entry::Histogram(h) => vec![h.desc().name.clone()],
            Entry::Collector(c) => c.names(),
        }
    }
}

#[derive(Default)]
pub struct Registry {
    entries: RwLock<Vec<Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or look up) a counter.
    ///
    /// Re-registering the same name with the same label names returns the
    /// existing handle; any other clash is a `Conflict`.
    pub fn register_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Counter> {
        let desc = Desc::new(name, help, label_names)?;
        let mut entries = self.write()?;

        if let Some(existing) = find(&entries, name) {
            return match existing {
                Entry::Counter(c) if c.same_shape(&desc) => Ok(c.clone()),
                _ => Err(conflict(name)),
            };
        }

        let counter = Counter::new(desc);
        entries.push(Entry::Counter(counter.clone()));
        tracing::debug!(metric = %name, "counter registered");
        Ok(counter)
    }

    /// Register (or look up) a histogram with ascending bucket bounds.
    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        bounds: &[f64],
    ) -> Result<Histogram> {
        let desc = Desc::new(name, help, label_names)?;
        let bounds = normalize_bounds(bounds.to_vec())?;
        let mut entries = self.write()?;

        if let Some(existing) = find(&entries, name) {
            return match existing {
                Entry::Histogram(h) if h.same_shape(&desc, &bounds) => Ok(h.clone()),
                _ => Err(conflict(name)),
            };
        }

        let histogram = Histogram::new(desc, bounds)?;
        entries.push(Entry::Histogram(histogram.clone()));
        tracing::debug!(metric = %name, "histogram registered");
        Ok(histogram)
    }

    /// Register a lazily sampled collector. Every name it emits must be free.
    pub fn register_collector(&self, collector: Arc<dyn Collector>) -> Result<()> {
        let names = collector.names();
        for n in &names {
            super::validate_metric_name(n)?;
        }
        let mut entries = self.write()?;
        if let Some(n) = names.iter().find(|n| find(&entries, n).is_some()) {
            return Err(conflict(n));
        }
        entries.push(Entry::Collector(collector));
        tracing::debug!(families = names.len(), "collector registered");
        Ok(())
    }

    /// Register the built-in process metrics under `prefix`.
    pub fn collect_default_metrics(&self, prefix: &str) -> Result<()> {
        self.register_collector(Arc::new(ProcessCollector::new(prefix)))
    }

    /// Snapshot every family in registration order.
    pub fn gather(&self) -> Result<Vec<MetricFamily>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AgriFoodError::Internal("metric registry lock poisoned".into()))?;

        let mut out = Vec::with_capacity(entries.len());
        for e in entries.iter() {
            match e {
                Entry::Counter(c) => out.push(c.collect()),
                Entry::Histogram(h) => out.push(h.collect()),
                Entry::Collector(c) => out.extend(c.collect()),
            }
        }
        Ok(out)
    }

    /// Render all families in the text exposition format.
    pub fn export_text(&self) -> Result<String> {
        text::encode(&self.gather()?)
    }

    /// Names of every registered family, in export order.
    pub fn names(&self) -> Result<Vec<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AgriFoodError::Internal("metric registry lock poisoned".into()))?;
        Ok(entries.iter().flat_map(Entry::names).collect())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Entry>>> {
        self.entries
            .write()
            .map_err(|_| AgriFoodError::Internal("metric registry lock poisoned".into()))
    }
}

fn find<'a>(entries: &'a [Entry], name: &str) -> Option<&'a Entry> {
    entries.iter().find(|e| e.names().iter().any(|n| n == name))
}

fn conflict(name: &str) -> AgriFoodError {
    AgriFoodError::Conflict(format!("metric {name} already registered with a different shape"))
}
