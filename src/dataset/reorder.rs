use super::aggregate::FeatureRow;
use anyhow::{anyhow, Result};

/// One supervised-learning sample. Cells are ordered nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub distances: Vec<f64>,
    /// Co-indexed with `distances`.
    pub features: Vec<f64>,
    pub loss: f64,
    /// Position of the target cell in the distance ordering.
    pub target_rank: usize,
}

impl TrainingRow {
    /// Divides every distance by the farthest one and drops the farthest column.
    /// Distances divided by the farthest one, which becomes 1.0. Left as is
    /// when the farthest distance is zero.
    pub fn scaled_distances(&self) -> Vec<f64> {
        match self.distances.last() {
            Some(&max) if max > 0.0 => self.distances.iter().map(|d| d / max).collect(),
            _ => self.distances.clone(),
        }
    }

    /// Scaled distances without the constant farthest column.
    pub fn normalized(&self) -> TrainingRow {
        let mut distances = self.scaled_distances();
        distances.pop();

        TrainingRow {
            distances,
            features: self.features.clone(),
            loss: self.loss,
            target_rank: self.target_rank,
        }
    }

    /// Columns in output order: distances, features, loss, target rank.
    pub fn fields(&self) -> Vec<String> {
        self.distances
            .iter()
            .chain(self.features.iter())
            .chain(std::iter::once(&self.loss))
            .map(|v| v.to_string())
            .chain(std::iter::once(self.target_rank.to_string()))
            .collect()
    }
}

pub fn reorder(row: &FeatureRow) -> Result<TrainingRow> {
    let record = &row.labeled.record;

    let mut cells: Vec<(u32, f64, f64)> = record
        .distances
        .iter()
        .zip(row.cell_means.iter())
        .enumerate()
        .map(|(i, (d, m))| (i as u32 + 1, *d, *m))
        .collect();
    cells.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let target_rank = cells
        .iter()
        .position(|(cell_id, _, _)| *cell_id == row.labeled.target_cell)
        .ok_or_else(|| {
            anyhow!(
                "Target cell {} of node {} at t={} is not among {} cells",
                row.labeled.target_cell,
                record.node_id,
                record.time,
                cells.len()
            )
        })?;

    Ok(TrainingRow {
        distances: cells.iter().map(|c| c.1).collect(),
        features: cells.iter().map(|c| c.2).collect(),
        loss: record.loss,
        target_rank,
    })
}
