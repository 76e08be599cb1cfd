use super::{QosSummary, TimePoint};
use anyhow::Result;
use csv::Writer;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct SummaryRecord<'a> {
    variant: &'a str,
    num_ues: i64,
    runs: usize,
    pdr_mean: f64,
    pdr_std: f64,
    throughput_mean: f64,
    throughput_std: f64,
    delay_ms_mean: f64,
    delay_ms_std: f64,
    jitter_ms_mean: f64,
    jitter_ms_std: f64,
}

impl<'a> From<&'a QosSummary> for SummaryRecord<'a> {
    fn from(s: &'a QosSummary) -> Self {
        Self {
            variant: &s.variant,
            num_ues: s.num_ues,
            runs: s.runs,
            pdr_mean: s.mean.pdr,
            pdr_std: s.std.pdr,
            throughput_mean: s.mean.throughput,
            throughput_std: s.std.throughput,
            delay_ms_mean: s.mean.delay_ms,
            delay_ms_std: s.std.delay_ms,
            jitter_ms_mean: s.mean.jitter_ms,
            jitter_ms_std: s.std.jitter_ms,
        }
    }
}

pub fn write_summaries(path: impl AsRef<Path>, summaries: &[QosSummary]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for summary in summaries {
        writer.serialize(SummaryRecord::from(summary))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_time_series(path: impl AsRef<Path>, points: &[TimePoint]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn comparison_table(summaries: &[QosSummary]) {
    println!("\n╔══════════════════════╦═════════╦════════════════╦════════════════╦════════════════╦════════════════╗");
    println!("║ Handover             ║ UEs     ║ PDR (%)        ║ Throughput     ║ Delay (ms)     ║ Jitter (ms)    ║");
    println!("╠══════════════════════╬═════════╬════════════════╬════════════════╬════════════════╬════════════════╣");

    for s in summaries {
        println!(
            "║ {:<20} ║ {:>7} ║ {:>6.2} ± {:<5.2} ║ {:>6.2} ± {:<5.2} ║ {:>6.2} ± {:<5.2} ║ {:>6.2} ± {:<5.2} ║",
            s.variant,
            s.num_ues,
            s.mean.pdr,
            s.std.pdr,
            s.mean.throughput,
            s.std.throughput,
            s.mean.delay_ms,
            s.std.delay_ms,
            s.mean.jitter_ms,
            s.std.jitter_ms,
        );
    }

    println!("╚══════════════════════╩═════════╩════════════════╩════════════════╩════════════════╩════════════════╝\n");

    if let Some(best) = summaries
        .iter()
        .filter(|s| s.runs > 0)
        .max_by(|a, b| a.mean.pdr.total_cmp(&b.mean.pdr))
    {
        println!("Top PDR: {} with {} UEs ({:.2}%)", best.variant, best.num_ues, best.mean.pdr);
    }

    if let Some(best) = summaries
        .iter()
        .filter(|s| s.runs > 0)
        .min_by(|a, b| a.mean.delay_ms.total_cmp(&b.mean.delay_ms))
    {
        println!("Lowest Delay: {} with {} UEs ({:.2} ms)", best.variant, best.num_ues, best.mean.delay_ms);
    }

    println!();
}
