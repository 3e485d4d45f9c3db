use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::text::{MetricFamily, MetricKind, Sample};
use super::Desc;
use crate::error::{AgriFoodError, Result};

/// Histogram with fixed upper bounds plus an implicit `+Inf` bucket.
///
/// Bucket counts are stored cumulatively: an observation `v` increments every
/// bucket whose bound is `>= v`.
#[derive(Clone)]
pub struct Histogram {
    inner: Arc<HistogramCore>,
}

struct HistogramCore {
    desc: Desc,
    bounds: Vec<f64>,
    series: DashMap<Vec<String>, HistogramSeries>,
}

struct HistogramSeries {
    cumulative: Vec<u64>,
    sum: f64,
    count: u64,
}

/// Copy of one series, as exported.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper bound, cumulative count)`, excluding `+Inf`.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    /// Also the `+Inf` bucket count.
    pub count: u64,
}

/// Check bounds and drop a trailing `+Inf`.
pub(crate) fn normalize_bounds(mut bounds: Vec<f64>) -> Result<Vec<f64>> {
    if bounds.last() == Some(&f64::INFINITY) {
        bounds.pop();
    }
    if bounds.is_empty() {
        return Err(AgriFoodError::InvalidBuckets("no finite bucket bounds".into()));
    }
    if let Some(b) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(AgriFoodError::InvalidBuckets(format!("bound {b} is not finite")));
    }
    if bounds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(AgriFoodError::InvalidBuckets(
            "bounds must be strictly ascending".into(),
        ));
    }
    Ok(bounds)
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram")
            .field("desc", &self.inner.desc)
            .field("bounds", &self.inner.bounds)
            .field("series", &self.inner.series.len())
            .finish()
    }
}

impl Histogram {
    pub(crate) fn new(desc: Desc, bounds: Vec<f64>) -> Result<Self> {
        if desc.label_names.iter().any(|l| l == "le") {
            return Err(AgriFoodError::InvalidName(format!(
                "label \"le\" is reserved on histogram {}",
                desc.name
            )));
        }
        Ok(Self {
            inner: Arc::new(HistogramCore {
                desc,
                bounds: normalize_bounds(bounds)?,
                series: DashMap::new(),
            }),
        })
    }

    pub fn desc(&self) -> &Desc {
        &self.inner.desc
    }

    /// Record one observation. `values` follow the declared label order.
    pub fn observe(&self, values: &[&str], v: f64) -> Result<()> {
        if v.is_nan() {
            return Err(AgriFoodError::InvalidValue(format!(
                "NaN observed on {}",
                self.inner.desc.name
            )));
        }
        let key = self.inner.desc.key(values)?;
        let bounds = &self.inner.bounds;

        // The entry guard keeps buckets, sum and count in step for readers.
        let mut series = self.inner.series.entry(key).or_insert_with(|| HistogramSeries {
            cumulative: vec![0; bounds.len()],
            sum: 0.0,
            count: 0,
        });
        for (i, &b) in bounds.iter().enumerate() {
            if v <= b {
                series.cumulative[i] += 1;
            }
        }
        series.sum += v;
        series.count += 1;
        Ok(())
    }

    /// Record a duration in seconds.
    pub fn observe_duration(&self, values: &[&str], d: Duration) -> Result<()> {
        self.observe(values, d.as_secs_f64())
    }

    /// Start timing now; labels are supplied when the timer is observed.
    pub fn start_timer(&self) -> HistogramTimer {
        HistogramTimer {
            histogram: self.clone(),
            started: Instant::now(),
        }
    }

    pub fn snapshot(&self, values: &[&str]) -> Option<HistogramSnapshot> {
        let key = self.inner.desc.key(values).ok()?;
        let series = self.inner.series.get(&key)?;
        Some(self.to_snapshot(&series))
    }

    fn to_snapshot(&self, series: &HistogramSeries) -> HistogramSnapshot {
        HistogramSnapshot {
            buckets: self
                .inner
                .bounds
                .iter()
                .copied()
                .zip(series.cumulative.iter().copied())
                .collect(),
            sum: series.sum,
            count: series.count,
        }
    }

    pub(crate) fn same_shape(&self, desc: &Desc, bounds: &[f64]) -> bool {
        self.inner.desc.label_names == desc.label_names && self.inner.bounds == bounds
    }

    pub(crate) fn collect(&self) -> MetricFamily {
        let desc = &self.inner.desc;
        let mut rows: Vec<(Vec<String>, HistogramSnapshot)> = self
            .inner
            .series
            .iter()
            .map(|r| (r.key().clone(), self.to_snapshot(r.value())))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        let mut samples = Vec::with_capacity(rows.len() * (self.inner.bounds.len() + 3));
        for (key, snap) in rows {
            let labels = desc.pairs(&key);
            let bucket = |le: String, v: u64| {
                let mut l = labels.clone();
                l.push(("le".to_string(), le));
                Sample {
                    suffix: "_bucket",
                    labels: l,
                    value: v as f64,
                }
            };
            for &(le, v) in &snap.buckets {
                samples.push(bucket(super::text::format_value(le), v));
            }
            samples.push(bucket("+Inf".to_string(), snap.count));
            samples.push(Sample {
                suffix: "_sum",
                labels: labels.clone(),
                value: snap.sum,
            });
            samples.push(Sample {
                suffix: "_count",
                labels,
                value: snap.count as f64,
            });
        }

        MetricFamily {
            name: desc.name.clone(),
            help: desc.help.clone(),
            kind: MetricKind::Histogram,
            samples,
        }
    }
}

/// Pending duration measurement from [`Histogram::start_timer`].
pub struct HistogramTimer {
    histogram: Histogram,
    started: Instant,
}

impl HistogramTimer {
    /// Record the elapsed time under `values` and return it.
    pub fn observe(self, values: &[&str]) -> Result<Duration> {
        let elapsed = self.started.elapsed();
        self.histogram.observe_duration(values, elapsed)?;
        Ok(elapsed)
    }
}
