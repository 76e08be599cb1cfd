use crate::geometry::{self, Point};
use crate::repository::{BaseStation, UeObservation};
use crate::scenario::ScenarioParams;
use anyhow::{bail, Result};
use std::collections::{BTreeSet, HashMap};

/// Identifies the simulation run a database belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunKey {
    pub scenario: i64,
    pub run_id: i64,
    pub start_config: i64,
}

impl RunKey {
    pub fn from_params(params: &ScenarioParams) -> Result<Self> {
        Ok(Self {
            scenario: params.int("scenario")?,
            run_id: params.int("run-id")?,
            start_config: params.int("start-config")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRecord {
    pub node_id: u32,
    pub loss: f64,
    /// Loss the same node reports at the following timestep.
    pub next_loss: f64,
    pub cell_id: u32,
    pub position: Point,
    pub time: i64,
    pub key: RunKey,
    /// Index `i` is the distance to the cell with id `i + 1`.
    pub distances: Vec<f64>,
}

impl SimulationRecord {
    pub fn distance_to(&self, cell_id: u32) -> Option<f64> {
        let index = cell_id.checked_sub(1)? as usize;
        self.distances.get(index).copied()
    }

    pub fn serving_distance(&self) -> f64 {
        self.distance_to(self.cell_id).unwrap_or(f64::INFINITY)
    }
}

/// Pairs each observation with the loss of the same node one timestep later.
/// Observations at the last timestep, or whose node vanishes, are dropped.
pub fn attach_next_loss(observations: Vec<UeObservation>) -> Vec<(UeObservation, f64)> {
    let times: Vec<i64> = observations
        .iter()
        .map(|o| o.time)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let next_time: HashMap<i64, i64> = times.windows(2).map(|w| (w[0], w[1])).collect();

    let loss_at: HashMap<(u32, i64), f64> = observations
        .iter()
        .map(|o| ((o.node_id, o.time), o.loss))
        .collect();

    observations
        .into_iter()
        .filter_map(|o| {
            let next = next_time.get(&o.time)?;
            let next_loss = *loss_at.get(&(o.node_id, *next))?;
            Some((o, next_loss))
        })
        .collect()
}

/// eNB positions indexed by `cell_id - 1`. Cell ids must be exactly `1..=n`.
pub fn positions_by_cell(base_stations: &[BaseStation]) -> Result<Vec<Point>> {
    let mut slots: Vec<Option<Point>> = vec![None; base_stations.len()];
    for enb in base_stations {
        let slot = enb
            .cell_id
            .checked_sub(1)
            .and_then(|i| slots.get_mut(i as usize));
        let Some(slot) = slot else {
            bail!(
                "eNB {} serves cell {}, outside 1..={}",
                enb.node_id,
                enb.cell_id,
                base_stations.len()
            );
        };
        if slot.replace(enb.position).is_some() {
            bail!("Cell {} is served by more than one eNB", enb.cell_id);
        }
    }
    // n ids in 1..=n with no duplicates cover every slot
    Ok(slots.into_iter().flatten().collect())
}

pub fn build_records(
    observations: Vec<UeObservation>,
    key: RunKey,
    base_stations: &[BaseStation],
) -> Result<Vec<SimulationRecord>> {
    let enb_positions = positions_by_cell(base_stations)?;

    let mut records = Vec::with_capacity(observations.len());
    for (obs, next_loss) in attach_next_loss(observations) {
        if obs.cell_id == 0 || obs.cell_id as usize > enb_positions.len() {
            bail!(
                "Node {} at t={} is served by cell {}, but only {} eNBs exist",
                obs.node_id,
                obs.time,
                obs.cell_id,
                enb_positions.len()
            );
        }

        records.push(SimulationRecord {
            node_id: obs.node_id,
            loss: obs.loss,
            next_loss,
            cell_id: obs.cell_id,
            distances: geometry::distances(&obs.position, &enb_positions),
            position: obs.position,
            time: obs.time,
            key,
        });
    }

    Ok(records)
}
