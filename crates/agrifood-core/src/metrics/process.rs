//! Built-in process metrics, sampled when the registry is exported.
//!
//! On Linux the values come from procfs. Elsewhere only the start time and
//! uptime are known; the other families keep their HELP/TYPE lines with no
//! samples.

use std::time::{SystemTime, UNIX_EPOCH};

use super::registry::Collector;
use super::text::{MetricFamily, MetricKind, Sample};

/// Kernel clock ticks per second (USER_HZ); 100 on every mainstream Linux build.
const CLOCK_TICKS: f64 = 100.0;
/// Assume 4KB pages.
const PAGE_SIZE: u64 = 4096;

const FAMILIES: [(&str, &str, MetricKind); 10] = [
    (
        "process_cpu_user_seconds_total",
        "Total user CPU time spent in seconds.",
        MetricKind::Counter,
    ),
    (
        "process_cpu_system_seconds_total",
        "Total system CPU time spent in seconds.",
        MetricKind::Counter,
    ),
    (
        "process_cpu_seconds_total",
        "Total user and system CPU time spent in seconds.",
        MetricKind::Counter,
    ),
    (
        "process_start_time_seconds",
        "Start time of the process since unix epoch in seconds.",
        MetricKind::Gauge,
    ),
    ("process_uptime_seconds", "Seconds since the process started.", MetricKind::Gauge),
    ("process_resident_memory_bytes", "Resident memory size in bytes.", MetricKind::Gauge),
    ("process_virtual_memory_bytes", "Virtual memory size in bytes.", MetricKind::Gauge),
    ("process_open_fds", "Number of open file descriptors.", MetricKind::Gauge),
    ("process_max_fds", "Maximum number of open file descriptors.", MetricKind::Gauge),
    ("process_threads", "Number of OS threads in the process.", MetricKind::Gauge),
];

pub struct ProcessCollector {
    prefix: String,
    start_time: f64,
}

impl ProcessCollector {
    pub fn new(prefix: &str) -> Self {
        let start_time = procfs::start_time().unwrap_or_else(now_secs);
        Self {
            prefix: prefix.to_string(),
            start_time,
        }
    }

    fn sample(&self, family: &str) -> Option<f64> {
        let stat = procfs::read_stat;
        match family {
            "process_cpu_user_seconds_total" => stat().map(|s| s.utime as f64 / CLOCK_TICKS),
            "process_cpu_system_seconds_total" => stat().map(|s| s.stime as f64 / CLOCK_TICKS),
            "process_cpu_seconds_total" => stat().map(|s| (s.utime + s.stime) as f64 / CLOCK_TICKS),
            "process_start_time_seconds" => Some(self.start_time),
            "process_uptime_seconds" => Some((now_secs() - self.start_time).max(0.0)),
            "process_resident_memory_bytes" => stat().map(|s| (s.rss_pages * PAGE_SIZE) as f64),
            "process_virtual_memory_bytes" => stat().map(|s| s.vsize as f64),
            "process_open_fds" => procfs::open_fds().map(|n| n as f64),
            "process_max_fds" => procfs::max_fds().map(|n| n as f64),
            "process_threads" => stat().map(|s| s.threads as f64),
            _ => None,
        }
    }
}

impl Collector for ProcessCollector {
    fn names(&self) -> Vec<String> {
        FAMILIES
            .iter()
            .map(|(name, _, _)| format!("{}{}", self.prefix, name))
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        FAMILIES
            .iter()
            .map(|&(name, help, kind)| MetricFamily {
                name: format!("{}{}", self.prefix, name),
                help: help.to_string(),
                kind,
                samples: self
                    .sample(name)
                    .map(|v| vec![Sample::new(vec![], v)])
                    .unwrap_or_default(),
            })
            .collect()
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Fields of `/proc/self/stat` the collector uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcStat {
    pub utime: u64,
    pub stime: u64,
    pub threads: u64,
    pub start_ticks: u64,
    pub vsize: u64,
    pub rss_pages: u64,
}

/// Parse `/proc/<pid>/stat`. The command name may contain spaces and
/// parentheses, so fields are counted from the last `)`.
pub fn parse_stat(s: &str) -> Option<ProcStat> {
    let rest = &s[s.rfind(')')? + 1..];
    let f: Vec<&str> = rest.split_whitespace().collect();
    // f[0] is field 3 (state).
    let num = |i: usize| f.get(i)?.parse::<u64>().ok();
    Some(ProcStat {
        utime: num(11)?,
        stime: num(12)?,
        threads: num(17)?,
        start_ticks: num(19)?,
        vsize: num(20)?,
        rss_pages: num(21)?,
    })
}

/// Soft "Max open files" limit from `/proc/<pid>/limits`.
pub fn parse_max_fds(s: &str) -> Option<u64> {
    let line = s.lines().find(|l| l.starts_with("Max open files"))?;
    line["Max open files".len()..]
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

/// `btime` (boot time, unix seconds) from `/proc/stat`.
pub fn parse_boot_time(s: &str) -> Option<u64> {
    s.lines()
        .find_map(|l| l.strip_prefix("btime "))?
        .trim()
        .parse()
        .ok()
}

#[cfg(target_os = "linux")]
mod procfs {
    use std::fs;

    use super::{parse_boot_time, parse_max_fds, parse_stat, ProcStat, CLOCK_TICKS};

    pub fn read_stat() -> Option<ProcStat> {
        parse_stat(&fs::read_to_string("/proc/self/stat").ok()?)
    }

    pub fn open_fds() -> Option<usize> {
        Some(fs::read_dir("/proc/self/fd").ok()?.count())
    }

    pub fn max_fds() -> Option<u64> {
        parse_max_fds(&fs::read_to_string("/proc/self/limits").ok()?)
    }

    pub fn start_time() -> Option<f64> {
        let btime = parse_boot_time(&fs::read_to_string("/proc/stat").ok()?)?;
        let stat = read_stat()?;
        Some(btime as f64 + stat.start_ticks as f64 / CLOCK_TICKS)
    }
}

#[cfg(not(target_os = "linux"))]
mod procfs {
    use super::ProcStat;

    pub fn read_stat() -> Option<ProcStat> {
        None
    }

    pub fn open_fds() -> Option<usize> {
        None
    }

    pub fn max_fds() -> Option<u64> {
        None
    }

    pub fn start_time() -> Option<f64> {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STAT: &str = "4242 (agri (food) api) S 1 4242 4242 0 -1 4194560 1234 0 0 0 \
                        250 75 0 0 20 0 9 0 123456 104857600 2048 18446744073709551615";

    #[test]
    fn stat_fields() {
        let s = parse_stat(STAT).unwrap();
        assert_eq!(s.utime, 250);
        assert_eq!(s.stime, 75);
        assert_eq!(s.threads, 9);
        assert_eq!(s.start_ticks, 123456);
        assert_eq!(s.vsize, 104857600);
        assert_eq!(s.rss_pages, 2048);
    }

    #[test]
    fn truncated_stat_is_none() {
        assert!(parse_stat("1 (x) S 1 2").is_none());
        assert!(parse_stat("garbage").is_none());
    }

    #[test]
    fn limits_soft_value() {
        let limits = "Limit                     Soft Limit           Hard Limit           Units\n\
                      Max cpu time              unlimited            unlimited            seconds\n\
                      Max open files            1024                 1048576              files\n";
        assert_eq!(parse_max_fds(limits), Some(1024));
        let unlimited = "Max open files            unlimited            unlimited            files";
        assert_eq!(parse_max_fds(unlimited), None);
    }

    #[test]
    fn boot_time() {
        let stat = "cpu  1 2 3 4\nintr 0\nbtime 1700000000\nprocesses 10\n";
        assert_eq!(parse_boot_time(stat), Some(1_700_000_000));
    }

    #[test]
    fn families_are_prefixed_and_stable() {
        let c = ProcessCollector::new("agri_food_api_");
        let names = c.names();
        assert_eq!(names.len(), FAMILIES.len());
        assert!(names.iter().all(|n| n.starts_with("agri_food_api_process_")));

        let fams = c.collect();
        let collected: Vec<_> = fams.iter().map(|f| f.name.clone()).collect();
        assert_eq!(collected, names);

        let start = fams
            .iter()
            .find(|f| f.name == "agri_food_api_process_start_time_seconds")
            .unwrap();
        assert_eq!(start.samples.len(), 1);
        assert!(start.samples[0].value > 0.0);
    }
}
