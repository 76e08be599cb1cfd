use super::records::RunKey;
use super::selector::LabeledRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How a cell with no observations for a (run, timestep) is represented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingCell {
    Fill(f64),
    DropRow,
}

impl Default for MissingCell {
    fn default() -> Self {
        Self::Fill(0.0)
    }
}

impl std::str::FromStr for MissingCell {
    type Err = anyhow::Error;

    /// `drop` or `fill:<value>`.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.split_once(':') {
            None if s.eq_ignore_ascii_case("drop") => Ok(Self::DropRow),
            Some((kind, value)) if kind.eq_ignore_ascii_case("fill") => Ok(Self::Fill(value.parse()?)),
            _ => anyhow::bail!("Unknown missing-cell policy: {}. Use: drop or fill:<value>", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub labeled: LabeledRecord,
    /// Mean loss per cell, index `i` is cell id `i + 1`.
    pub cell_means: Vec<f64>,
}

type MeanKey = (RunKey, i64);

/// Mean loss per (run, timestep, serving cell).
pub fn cell_means(labeled: &[LabeledRecord]) -> HashMap<MeanKey, BTreeMap<u32, f64>> {
    let mut sums: HashMap<MeanKey, BTreeMap<u32, (f64, usize)>> = HashMap::new();
    for l in labeled {
        let r = &l.record;
        let entry = sums
            .entry((r.key, r.time))
            .or_default()
            .entry(r.cell_id)
            .or_insert((0.0, 0));
        entry.0 += r.loss;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(key, cells)| {
            let means = cells
                .into_iter()
                .map(|(cell, (sum, n))| (cell, sum / n as f64))
                .collect();
            (key, means)
        })
        .collect()
}

/// Attaches the per-cell means of each row's (run, timestep) to the rows of
/// `node_id`. Output is ordered by (scenario, run, start-config, timestep).
pub fn merge_cell_means(
    labeled: Vec<LabeledRecord>,
    node_id: u32,
    num_cells: usize,
    missing: MissingCell,
) -> Vec<FeatureRow> {
    let means = cell_means(&labeled);

    let mut rows: Vec<FeatureRow> = labeled
        .into_iter()
        .filter(|l| l.record.node_id == node_id)
        .filter_map(|l| {
            let cells = means.get(&(l.record.key, l.record.time))?;
            let mut cell_means = Vec::with_capacity(num_cells);
            for cell_id in 1..=num_cells as u32 {
                match (cells.get(&cell_id), missing) {
                    (Some(mean), _) => cell_means.push(*mean),
                    (None, MissingCell::Fill(value)) => cell_means.push(value),
                    (None, MissingCell::DropRow) => return None,
                }
            }
            Some(FeatureRow { labeled: l, cell_means })
        })
        .collect();

    rows.sort_by_key(|row| (row.labeled.record.key, row.labeled.record.time));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::records::SimulationRecord;
    use crate::geometry::Point;

    fn labeled(node_id: u32, start_config: i64, time: i64, cell_id: u32, loss: f64) -> LabeledRecord {
        LabeledRecord {
            record: SimulationRecord {
                node_id,
                loss,
                next_loss: 0.0,
                cell_id,
                position: Point::new(0.0, 0.0),
                time,
                key: RunKey { scenario: 0, run_id: 0, start_config },
                distances: vec![1.0, 2.0, 3.0],
            },
            target_cell: cell_id,
        }
    }

    #[test]
    fn means_group_by_serving_cell() {
        let rows = vec![
            labeled(1, 0, 100, 1, 0.2),
            labeled(2, 0, 100, 1, 0.4),
            labeled(3, 0, 100, 2, 1.0),
            labeled(1, 1, 100, 1, 0.9),
        ];
        let means = cell_means(&rows);
        let key0 = (RunKey { scenario: 0, run_id: 0, start_config: 0 }, 100);
        let cells = &means[&key0];
        assert!((cells[&1] - 0.3).abs() < 1e-12);
        assert_eq!(cells[&2], 1.0);
        assert_eq!(means.len(), 2);
    }

    #[test]
    fn merge_keeps_node_of_interest_and_fills_gaps() {
        let rows = vec![
            labeled(1, 0, 100, 1, 0.2),
            labeled(2, 0, 100, 3, 0.6),
        ];
        let merged = merge_cell_means(rows, 1, 3, MissingCell::Fill(-1.0));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].cell_means, vec![0.2, -1.0, 0.6]);
    }

    #[test]
    fn drop_policy_discards_incomplete_rows() {
        let rows = vec![
            labeled(1, 0, 100, 1, 0.2),
            labeled(2, 0, 100, 2, 0.6),
            labeled(1, 1, 100, 1, 0.2),
        ];
        let merged = merge_cell_means(rows, 1, 2, MissingCell::DropRow);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].labeled.record.key.start_config, 0);
    }

    #[test]
    fn merged_rows_sorted_by_run_then_time() {
        let rows = vec![
            labeled(1, 1, 200, 1, 0.0),
            labeled(1, 0, 200, 1, 0.0),
            labeled(1, 0, 100, 1, 0.0),
        ];
        let order: Vec<(i64, i64)> = merge_cell_means(rows, 1, 1, MissingCell::default())
            .iter()
            .map(|r| (r.labeled.record.key.start_config, r.labeled.record.time))
            .collect();
        assert_eq!(order, vec![(0, 100), (0, 200), (1, 200)]);
    }

    #[test]
    fn parses_policy_flags() {
        assert_eq!("drop".parse::<MissingCell>().unwrap(), MissingCell::DropRow);
        assert_eq!("fill:0.5".parse::<MissingCell>().unwrap(), MissingCell::Fill(0.5));
        assert!("zero".parse::<MissingCell>().is_err());
    }
}
