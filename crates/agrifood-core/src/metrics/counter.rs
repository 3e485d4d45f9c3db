use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use super::text::{MetricFamily, MetricKind, Sample};
use super::Desc;
use crate::error::Result;

/// Monotonic counter partitioned by label values.
///
/// Cloning the handle shares the underlying series.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<CounterCore>,
}

struct CounterCore {
    desc: Desc,
    series: DashMap<Vec<String>, u64>,
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("desc", &self.inner.desc)
            .field("series", &self.inner.series.len())
            .finish()
    }
}

impl Counter {
    pub(crate) fn new(desc: Desc) -> Self {
        Self {
            inner: Arc::new(CounterCore {
                desc,
                series: DashMap::new(),
            }),
        }
    }

    pub fn desc(&self) -> &Desc {
        &self.inner.desc
    }

    /// Increment by 1. `values` follow the declared label order.
    pub fn inc(&self, values: &[&str]) -> Result<()> {
        self.inc_by(values, 1)
    }

    /// Increment by an arbitrary value.
    pub fn inc_by(&self, values: &[&str], v: u64) -> Result<()> {
        let key = self.inner.desc.key(values)?;
        let mut count = self.inner.series.entry(key).or_insert(0);
        *count = count.saturating_add(v);
        Ok(())
    }

    /// Current value, `None` if the tuple was never incremented.
    pub fn get(&self, values: &[&str]) -> Option<u64> {
        let key = self.inner.desc.key(values).ok()?;
        self.inner.series.get(&key).map(|c| *c)
    }

    pub(crate) fn same_shape(&self, desc: &Desc) -> bool {
        self.inner.desc.label_names == desc.label_names
    }

    pub(crate) fn collect(&self) -> MetricFamily {
        let desc = &self.inner.desc;
        let mut rows: Vec<(Vec<String>, u64)> = self
            .inner
            .series
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        MetricFamily {
            name: desc.name.clone(),
            help: desc.help.clone(),
            kind: MetricKind::Counter,
            samples: rows
                .into_iter()
                .map(|(key, v)| Sample::new(desc.pairs(&key), v as f64))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AgriFoodError;

    fn counter() -> Counter {
        Counter::new(Desc::new("reqs_total", "Requests", &["method", "status"]).unwrap())
    }

    #[test]
    fn increments_per_tuple() {
        let c = counter();
        c.inc(&["GET", "200"]).unwrap();
        c.inc(&["GET", "200"]).unwrap();
        c.inc_by(&["POST", "500"], 5).unwrap();

        assert_eq!(c.get(&["GET", "200"]), Some(2));
        assert_eq!(c.get(&["POST", "500"]), Some(5));
        assert_eq!(c.get(&["GET", "404"]), None);
    }

    #[test]
    fn wrong_arity_does_not_create_series() {
        let c = counter();
        let err = c.inc(&["GET"]).unwrap_err();
        assert!(matches!(err, AgriFoodError::LabelMismatch { .. }));
        assert!(c.collect().samples.is_empty());
    }

    #[test]
    fn collect_is_sorted() {
        let c = counter();
        c.inc(&["POST", "200"]).unwrap();
        c.inc(&["GET", "500"]).unwrap();
        c.inc(&["GET", "200"]).unwrap();

        let fam = c.collect();
        let order: Vec<_> = fam
            .samples
            .iter()
            .map(|s| format!("{}:{}", s.labels[0].1, s.labels[1].1))
            .collect();
        assert_eq!(order, vec!["GET:200", "GET:500", "POST:200"]);
    }

    #[test]
    fn debug_shows_desc() {
        let c = counter();
        c.inc(&["GET", "200"]).unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("reqs_total"));
        assert!(dbg.contains("series: 1"));
    }

    #[test]
    fn clones_share_series() {
        let a = counter();
        let b = a.clone();
        a.inc(&["GET", "200"]).unwrap();
        b.inc(&["GET", "200"]).unwrap();
        assert_eq!(a.get(&["GET", "200"]), Some(2));
    }
}
