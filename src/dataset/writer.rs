use super::reorder::TrainingRow;
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

pub struct DatasetWriter {
    writer: Writer<File>,
}

impl DatasetWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let writer = WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, row: &TrainingRow) -> Result<()> {
        self.writer.write_record(row.fields())?;
        Ok(())
    }

    pub fn write_batch(&mut self, rows: &[TrainingRow]) -> Result<()> {
        for row in rows {
            self.write(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossBin {
    pub lower: f64,
    pub upper: f64,
    pub fraction: f64,
}

/// Equal-width histogram of the loss label, as a fraction of all rows.
pub fn loss_distribution(rows: &[TrainingRow], bins: usize) -> Vec<LossBin> {
    if rows.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = rows.iter().map(|r| r.loss).fold(f64::INFINITY, f64::min);
    let max = rows.iter().map(|r| r.loss).fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for row in rows {
        let index = if width > 0.0 {
            (((row.loss - min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[index] += 1;
    }

    let total = rows.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| LossBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            fraction: count as f64 / total,
        })
        .collect()
}
