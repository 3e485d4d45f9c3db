#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use agrifood_core::metrics::{Registry, TEXT_CONTENT_TYPE};

const LABELS: [&str; 3] = ["method", "route", "status"];
const BUCKETS: [f64; 7] = [0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0];

fn registry() -> Registry {
    let r = Registry::new();
    r.collect_default_metrics("agri_food_api_").unwrap();
    r.register_counter("http_requests_total", "Total HTTP requests", &LABELS)
        .unwrap();
    r.register_histogram(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &LABELS,
        &BUCKETS,
    )
    .unwrap();
    r
}

/// Strip sample values so two exports can be compared by shape.
fn shape(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| {
            if l.starts_with('#') {
                l.to_string()
            } else {
                l.rsplit_once(' ').map(|(k, _)| k.to_string()).unwrap_or_default()
            }
        })
        .collect()
}

#[test]
fn content_type_names_format_version() {
    assert!(TEXT_CONTENT_TYPE.starts_with("text/plain"));
    assert!(TEXT_CONTENT_TYPE.contains("version=0.0.4"));
}

#[test]
fn empty_registry_lists_every_family_without_rows() {
    let r = registry();
    let text = r.export_text().unwrap();

    for name in r.names().unwrap() {
        assert_eq!(text.matches(&format!("# HELP {name} ")).count(), 1, "{name}");
        assert_eq!(text.matches(&format!("# TYPE {name} ")).count(), 1, "{name}");
    }
    assert!(text.contains("# TYPE http_requests_total counter\n"));
    assert!(text.contains("# TYPE http_request_duration_seconds histogram\n"));
    // No tuple observed yet, so no data rows for either instrument.
    assert!(!text.contains("http_requests_total{"));
    assert!(!text.contains("http_request_duration_seconds_bucket"));
}

#[test]
fn histogram_rows() {
    let r = registry();
    let h = r
        .register_histogram(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            &LABELS,
            &BUCKETS,
        )
        .unwrap();
    h.observe(&["GET", "/products", "200"], 0.5).unwrap();
    h.observe(&["GET", "/products", "200"], 1.5).unwrap();

    let text = r.export_text().unwrap();
    let p = r#"method="GET",route="/products",status="200""#;
    for (le, n) in [
        ("0.05", 0),
        ("0.1", 0),
        ("0.2", 0),
        ("0.5", 1),
        ("1", 1),
        ("2", 2),
        ("5", 2),
        ("+Inf", 2),
    ] {
        let line = format!("http_request_duration_seconds_bucket{{{p},le=\"{le}\"}} {n}\n");
        assert!(text.contains(&line), "missing {line}");
    }
    assert!(text.contains(&format!("http_request_duration_seconds_sum{{{p}}} 2\n")));
    assert!(text.contains(&format!("http_request_duration_seconds_count{{{p}}} 2\n")));
}

#[test]
fn shape_is_stable_across_exports() {
    let r = registry();
    let c = r
        .register_counter("http_requests_total", "Total HTTP requests", &LABELS)
        .unwrap();
    c.inc(&["GET", "/error", "500"]).unwrap();

    let first = r.export_text().unwrap();
    c.inc(&["GET", "/error", "500"]).unwrap();
    let second = r.export_text().unwrap();

    assert_ne!(first, second);
    assert_eq!(shape(&first), shape(&second));
    let row = r#"http_requests_total{method="GET",route="/error",status="500"} 2"#;
    assert!(second.lines().any(|l| l == row));
}

#[test]
fn concurrent_writers_and_readers() {
    let r = Arc::new(registry());
    let c = r
        .register_counter("http_requests_total", "Total HTTP requests", &LABELS)
        .unwrap();
    let h = r
        .register_histogram(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            &LABELS,
            &BUCKETS,
        )
        .unwrap();

    let writers: Vec<_> = (0..8)
        .map(|_| {
            let (c, h) = (c.clone(), h.clone());
            thread::spawn(move || {
                for i in 0..500 {
                    let v = if i % 2 == 0 { 0.01 } else { 3.0 };
                    c.inc(&["GET", "/products", "200"]).unwrap();
                    h.observe(&["GET", "/products", "200"], v).unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let r = Arc::clone(&r);
        thread::spawn(move || {
            for _ in 0..50 {
                for fam in r.gather().unwrap() {
                    if fam.name != "http_request_duration_seconds" {
                        continue;
                    }
                    // Within one series, buckets never exceed +Inf (= count).
                    let values: Vec<f64> = fam
                        .samples
                        .iter()
                        .filter(|s| s.suffix == "_bucket")
                        .map(|s| s.value)
                        .collect();
                    assert!(values.windows(2).all(|w| w[0] <= w[1]));
                }
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(c.get(&["GET", "/products", "200"]), Some(4000));
    let snap = h.snapshot(&["GET", "/products", "200"]).unwrap();
    assert_eq!(snap.count, 4000);
    assert_eq!(snap.buckets[0], (0.05, 2000));
    assert_eq!(snap.buckets[6], (5.0, 4000));
}
