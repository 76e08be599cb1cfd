pub mod report;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const TRACE_FILE: &str = "qos-vs-time.txt";

/// One line of a per-UE QoS trace. Delay and jitter are in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QosSample {
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "UE", default)]
    pub ue: Option<u32>,
    #[serde(rename = "Delay")]
    pub delay: f64,
    #[serde(rename = "Jitter")]
    pub jitter: f64,
    // the simulator writes the header misspelled
    #[serde(rename = "Throughput", alias = "Throughtput")]
    pub throughput: f64,
    #[serde(rename = "PDR")]
    pub pdr: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QosMetrics {
    pub pdr: f64,
    pub throughput: f64,
    pub delay_ms: f64,
    pub jitter_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QosSummary {
    pub variant: String,
    pub num_ues: i64,
    pub runs: usize,
    pub mean: QosMetrics,
    pub std: QosMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePoint {
    pub time: f64,
    pub pdr: f64,
    pub throughput: f64,
    pub delay_ms: f64,
    pub jitter_ms: f64,
}

pub fn read_samples(path: impl AsRef<Path>) -> Result<Vec<QosSample>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut samples = Vec::new();
    for row in reader.deserialize() {
        samples.push(row.with_context(|| format!("Malformed row in {}", path.display()))?);
    }
    Ok(samples)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Sample standard deviation; zero below two values.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Averages of one run. Throughput is summed over UEs per timestep first.
pub fn run_metrics(samples: &[QosSample]) -> QosMetrics {
    let mut per_time: BTreeMap<u64, f64> = BTreeMap::new();
    for s in samples {
        *per_time.entry(s.time.to_bits()).or_default() += s.throughput;
    }

    QosMetrics {
        pdr: mean(samples.iter().map(|s| s.pdr)),
        throughput: mean(per_time.values().copied()),
        delay_ms: mean(samples.iter().map(|s| s.delay)) * 1000.0,
        jitter_ms: mean(samples.iter().map(|s| s.jitter)) * 1000.0,
    }
}

pub fn summarize(variant: &str, num_ues: i64, runs: &[QosMetrics]) -> QosSummary {
    let column = |f: fn(&QosMetrics) -> f64| runs.iter().map(f).collect::<Vec<f64>>();
    let pdr = column(|m| m.pdr);
    let throughput = column(|m| m.throughput);
    let delay = column(|m| m.delay_ms);
    let jitter = column(|m| m.jitter_ms);

    QosSummary {
        variant: variant.to_string(),
        num_ues,
        runs: runs.len(),
        mean: QosMetrics {
            pdr: mean(pdr.iter().copied()),
            throughput: mean(throughput.iter().copied()),
            delay_ms: mean(delay.iter().copied()),
            jitter_ms: mean(jitter.iter().copied()),
        },
        std: QosMetrics {
            pdr: std_dev(&pdr),
            throughput: std_dev(&throughput),
            delay_ms: std_dev(&delay),
            jitter_ms: std_dev(&jitter),
        },
    }
}

/// `num-ues=N` subdirectories of `path`, ordered by N.
pub fn scenarios(path: impl AsRef<Path>) -> Result<Vec<(i64, PathBuf)>> {
    let pattern = path.as_ref().join("num-ues=*");
    let mut found = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let dir = entry?;
        let num = dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.rsplit('=').next())
            .and_then(|n| n.parse::<i64>().ok());
        match num {
            Some(num) if dir.is_dir() => found.push((num, dir)),
            _ => warn!("Ignoring {}", dir.display()),
        }
    }
    found.sort_by_key(|(num, _)| *num);
    Ok(found)
}

/// Mean/std per `num-ues` scenario of one variant directory.
pub fn users_report(variant: &str, path: impl AsRef<Path>) -> Result<Vec<QosSummary>> {
    let mut summaries = Vec::new();
    for (num_ues, dir) in scenarios(path)? {
        // result keys other than num-ues may sit between the scenario and its runs
        let pattern = dir.join("**").join("run=*").join(TRACE_FILE);
        let mut runs = Vec::new();
        for entry in glob::glob(&pattern.to_string_lossy())? {
            runs.push(run_metrics(&read_samples(entry?)?));
        }

        if runs.is_empty() {
            warn!("Scenario {} has no data", dir.display());
        } else {
            info!("Scenario {} has {} data points", dir.display(), runs.len());
        }
        summaries.push(summarize(variant, num_ues, &runs));
    }
    Ok(summaries)
}

/// Per-timestep averages over all UEs of one trace.
pub fn time_series(samples: &[QosSample]) -> Vec<TimePoint> {
    let mut groups: BTreeMap<u64, Vec<&QosSample>> = BTreeMap::new();
    for s in samples {
        groups.entry(s.time.to_bits()).or_default().push(s);
    }

    let mut points: Vec<TimePoint> = groups
        .into_values()
        .map(|group| TimePoint {
            time: group[0].time,
            pdr: mean(group.iter().map(|s| s.pdr)),
            throughput: mean(group.iter().map(|s| s.throughput)),
            delay_ms: mean(group.iter().map(|s| s.delay)) * 1000.0,
            jitter_ms: mean(group.iter().map(|s| s.jitter)) * 1000.0,
        })
        .collect();
    points.sort_by(|a, b| a.time.total_cmp(&b.time));
    points
}
