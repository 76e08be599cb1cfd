use super::records::SimulationRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What happens to the rows of the configuration that won a timestep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LabelPolicy {
    /// Drop the winning configuration's own rows from the labeled set.
    #[default]
    ExcludeSource,
    /// Keep every row, the winner included.
    IncludeSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub record: SimulationRecord,
    pub target_cell: u32,
}

impl LabeledRecord {
    pub fn target_distance(&self) -> Option<f64> {
        self.record.distance_to(self.target_cell)
    }
}

/// The row of `node_id` with the lowest (next loss, serving distance) in a group.
/// Full ties keep the earliest row.
pub fn select_optimal<'a>(group: &[&'a SimulationRecord], node_id: u32) -> Option<&'a SimulationRecord> {
    group
        .iter()
        .copied()
        .filter(|r| r.node_id == node_id)
        .reduce(|best, candidate| {
            let ordering = candidate
                .next_loss
                .total_cmp(&best.next_loss)
                .then(candidate.serving_distance().total_cmp(&best.serving_distance()));
            if ordering.is_lt() { candidate } else { best }
        })
}

/// Labels every (scenario, run, timestep) group with the best cell for `node_id`.
/// Other nodes keep their serving cell as target.
pub fn label(records: &[SimulationRecord], node_id: u32, policy: LabelPolicy) -> Vec<LabeledRecord> {
    let mut groups: BTreeMap<(i64, i64, i64), Vec<&SimulationRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.key.scenario, record.key.run_id, record.time))
            .or_default()
            .push(record);
    }

    let mut labeled = Vec::with_capacity(records.len());
    for ((scenario, run_id, time), group) in groups {
        let Some(best) = select_optimal(&group, node_id) else {
            warn!(
                "No rows for node {} in scenario={} run-id={} t={}, skipping",
                node_id, scenario, run_id, time
            );
            continue;
        };
        debug!(
            "scenario={} run-id={} t={}: start-config {} wins with cell {}",
            scenario, run_id, time, best.key.start_config, best.cell_id
        );

        for record in group {
            if policy == LabelPolicy::ExcludeSource && record.key.start_config == best.key.start_config {
                continue;
            }
            let target_cell = if record.node_id == node_id {
                best.cell_id
            } else {
                record.cell_id
            };
            labeled.push(LabeledRecord {
                record: record.clone(),
                target_cell,
            });
        }
    }

    labeled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::records::RunKey;
    use crate::geometry::Point;
    use proptest::prelude::*;

    fn record(node_id: u32, start_config: i64, cell_id: u32, next_loss: f64, distances: Vec<f64>) -> SimulationRecord {
        SimulationRecord {
            node_id,
            loss: 0.0,
            next_loss,
            cell_id,
            position: Point::new(0.0, 0.0),
            time: 100,
            key: RunKey { scenario: 0, run_id: 0, start_config },
            distances,
        }
    }

    #[test]
    fn lowest_next_loss_wins() {
        let rows = vec![
            record(1, 0, 1, 0.4, vec![10.0, 20.0, 30.0]),
            record(1, 1, 2, 0.1, vec![10.0, 20.0, 30.0]),
            record(1, 2, 3, 0.3, vec![10.0, 20.0, 30.0]),
        ];
        let refs: Vec<&SimulationRecord> = rows.iter().collect();
        assert_eq!(select_optimal(&refs, 1).unwrap().key.start_config, 1);
    }

    #[test]
    fn distance_breaks_loss_ties() {
        let rows = vec![
            record(1, 0, 3, 0.2, vec![10.0, 20.0, 30.0]),
            record(1, 1, 1, 0.2, vec![10.0, 20.0, 30.0]),
            record(1, 2, 2, 0.2, vec![10.0, 20.0, 30.0]),
        ];
        let refs: Vec<&SimulationRecord> = rows.iter().collect();
        assert_eq!(select_optimal(&refs, 1).unwrap().cell_id, 1);
    }

    #[test]
    fn other_nodes_never_win() {
        let rows = vec![record(2, 0, 1, 0.0, vec![1.0]), record(1, 1, 1, 0.9, vec![1.0])];
        let refs: Vec<&SimulationRecord> = rows.iter().collect();
        assert_eq!(select_optimal(&refs, 1).unwrap().key.start_config, 1);
        assert!(select_optimal(&refs[..1], 1).is_none());
    }

    #[test]
    fn exclude_source_drops_winning_configuration() {
        let rows = vec![
            record(1, 0, 1, 0.5, vec![10.0, 20.0]),
            record(2, 0, 1, 0.0, vec![10.0, 20.0]),
            record(1, 1, 2, 0.1, vec![10.0, 20.0]),
            record(2, 1, 2, 0.0, vec![10.0, 20.0]),
        ];

        let labeled = label(&rows, 1, LabelPolicy::ExcludeSource);
        assert_eq!(labeled.len(), 2);
        assert!(labeled.iter().all(|l| l.record.key.start_config == 0));
        // node 1 relabeled to the winner's cell, node 2 keeps its own
        assert_eq!(labeled[0].target_cell, 2);
        assert_eq!(labeled[1].target_cell, 1);
        assert_eq!(labeled[0].target_distance(), Some(20.0));
    }

    #[test]
    fn include_source_keeps_every_row() {
        let rows = vec![
            record(1, 0, 1, 0.5, vec![10.0, 20.0]),
            record(1, 1, 2, 0.1, vec![10.0, 20.0]),
        ];
        let labeled = label(&rows, 1, LabelPolicy::IncludeSource);
        assert_eq!(labeled.len(), 2);
        assert!(labeled.iter().all(|l| l.target_cell == 2));
    }

    #[test]
    fn group_without_node_of_interest_is_skipped() {
        let rows = vec![record(2, 0, 1, 0.5, vec![10.0])];
        assert!(label(&rows, 1, LabelPolicy::IncludeSource).is_empty());
    }

    proptest! {
        #[test]
        fn winner_is_lexicographic_minimum(
            candidates in prop::collection::vec((0u8..5, 1u32..4), 1..12)
        ) {
            let rows: Vec<SimulationRecord> = candidates
                .iter()
                .enumerate()
                .map(|(i, (loss, cell))| record(1, i as i64, *cell, *loss as f64 / 4.0, vec![5.0, 1.0, 3.0]))
                .collect();
            let refs: Vec<&SimulationRecord> = rows.iter().collect();
            let best = select_optimal(&refs, 1).unwrap();

            for row in &rows {
                let lhs = (best.next_loss, best.serving_distance());
                let rhs = (row.next_loss, row.serving_distance());
                prop_assert!(lhs <= rhs);
            }
        }
    }
}
