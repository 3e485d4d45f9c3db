//! Prometheus text exposition (format version 0.0.4).

use std::fmt::Write;

use crate::error::{AgriFoodError, Result};

/// Content type served alongside [`encode`] output.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// One data line. `suffix` is appended to the family name (`_bucket`, `_sum`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub suffix: &'static str,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Sample {
    pub fn new(labels: Vec<(String, String)>, value: f64) -> Self {
        Self { suffix: "", labels, value }
    }
}

/// Point-in-time view of one metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub samples: Vec<Sample>,
}

/// Escape a label value.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escape HELP text (quotes are legal there).
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Render a sample value or bucket bound.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        // f64 Display is the shortest round-trip form and drops ".0".
        format!("{v}")
    }
}

/// Encode families in order, one HELP and one TYPE line each.
pub fn encode(families: &[MetricFamily]) -> Result<String> {
    let mut out = String::new();
    for family in families {
        encode_family(family, &mut out)
            .map_err(|e| AgriFoodError::Internal(format!("encode {}: {e}", family.name)))?;
    }
    Ok(out)
}

fn encode_family(family: &MetricFamily, out: &mut String) -> std::fmt::Result {
    writeln!(out, "# HELP {} {}", family.name, escape_help(&family.help))?;
    writeln!(out, "# TYPE {} {}", family.name, family.kind.as_str())?;
    for s in &family.samples {
        out.push_str(&family.name);
        out.push_str(s.suffix);
        if !s.labels.is_empty() {
            let label_str = s
                .labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                .collect::<Vec<_>>()
                .join(",");
            write!(out, "{{{}}}", label_str)?;
        }
        writeln!(out, " {}", format_value(s.value))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn values_and_bounds() {
        assert_eq!(format_value(2.0), "2");
        assert_eq!(format_value(0.05), "0.05");
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn family_layout() {
        let fam = MetricFamily {
            name: "http_requests_total".into(),
            help: "Total HTTP requests".into(),
            kind: MetricKind::Counter,
            samples: vec![Sample::new(
                vec![pair("method", "GET"), pair("route", "/products"), pair("status", "200")],
                2.0,
            )],
        };
        let text = encode(&[fam]).unwrap();
        assert_eq!(
            text,
            "# HELP http_requests_total Total HTTP requests\n\
             # TYPE http_requests_total counter\n\
             http_requests_total{method=\"GET\",route=\"/products\",status=\"200\"} 2\n"
        );
    }

    #[test]
    fn unlabeled_sample_has_no_braces() {
        let fam = MetricFamily {
            name: "up".into(),
            help: "h".into(),
            kind: MetricKind::Gauge,
            samples: vec![Sample::new(vec![], 1.0)],
        };
        assert!(encode(&[fam]).unwrap().ends_with("\nup 1\n"));
    }

    #[test]
    fn escaping() {
        let fam = MetricFamily {
            name: "m".into(),
            help: "line\\one\nline two \"quoted\"".into(),
            kind: MetricKind::Counter,
            samples: vec![Sample::new(vec![pair("path", "a\"b\\c\nd")], 1.0)],
        };
        let text = encode(&[fam]).unwrap();
        assert!(text.contains("# HELP m line\\\\one\\nline two \"quoted\"\n"));
        assert!(text.contains("m{path=\"a\\\"b\\\\c\\nd\"} 1\n"));
    }

    #[test]
    fn empty_family_keeps_header() {
        let fam = MetricFamily {
            name: "h".into(),
            help: "x".into(),
            kind: MetricKind::Histogram,
            samples: vec![],
        };
        assert_eq!(encode(&[fam]).unwrap(), "# HELP h x\n# TYPE h histogram\n");
    }
}
