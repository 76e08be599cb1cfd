//! Read side of the simulator's `oran-repository.db`.

use crate::geometry::Point;
use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, Row};
use std::path::Path;
use tracing::debug;

/// Simulation time (ns) at which eNB locations are sampled.
pub const ENB_SAMPLE_TIME: i64 = 2_000_000_000;

const UE_QUERY: &str = "SELECT nodeapploss.nodeid, loss, cellid, x, y, nodeapploss.simulationtime
    FROM nodeapploss
    INNER JOIN lteuecell
        ON nodeapploss.nodeid = lteuecell.nodeid
        AND nodeapploss.simulationtime = lteuecell.simulationtime
    INNER JOIN nodelocation
        ON lteuecell.nodeid = nodelocation.nodeid
        AND lteuecell.simulationtime = nodelocation.simulationtime
    ORDER BY nodeapploss.simulationtime, nodeapploss.nodeid";

const ENB_QUERY: &str = "SELECT nodelocation.nodeid, lteenb.cellid, x, y
    FROM nodelocation
    INNER JOIN lteenb
        ON nodelocation.nodeid = lteenb.nodeid
        AND nodelocation.simulationtime = ?1
    ORDER BY lteenb.cellid, nodelocation.nodeid";

#[derive(Debug, Clone, PartialEq)]
pub struct UeObservation {
    pub node_id: u32,
    pub loss: f64,
    pub cell_id: u32,
    pub position: Point,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseStation {
    pub node_id: u32,
    pub cell_id: u32,
    pub position: Point,
}

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        debug!("Opened {}", path.display());
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Every UE observation that has a loss, a serving cell and a location at the same time.
    pub fn ue_observations(&self) -> Result<Vec<UeObservation>> {
        let mut stmt = self.conn.prepare(UE_QUERY)?;
        let rows = stmt.query_map([], |row: &Row| {
            Ok(UeObservation {
                node_id: row.get(0)?,
                loss: row.get(1)?,
                cell_id: row.get(2)?,
                position: Point::new(row.get(3)?, row.get(4)?),
                time: row.get(5)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.context("Malformed UE observation row")?);
        }
        Ok(result)
    }

    /// eNBs ordered by the cell id they serve.
    pub fn base_stations(&self) -> Result<Vec<BaseStation>> {
        let mut stmt = self.conn.prepare(ENB_QUERY)?;
        let rows = stmt.query_map([ENB_SAMPLE_TIME], |row: &Row| {
            Ok(BaseStation {
                node_id: row.get(0)?,
                cell_id: row.get(1)?,
                position: Point::new(row.get(2)?, row.get(3)?),
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.context("Malformed eNB row")?);
        }
        Ok(result)
    }
}


#[cfg(test)]
mod tests {
    use super::fixture::*;
    use super::*;

    fn repository() -> Repository {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        insert_enb(&conn, 11, 2, 50.0, 0.0);
        insert_enb(&conn, 10, 1, 0.0, 0.0);
        insert_ue(&conn, 1, 2_000_000_000, 1, 1.0, 2.0, 0.25);
        insert_ue(&conn, 1, 2_500_000_000, 2, 3.0, 4.0, 0.5);
        // location without loss is not an observation
        conn.execute(
            "INSERT INTO nodelocation VALUES (2, 2000000000, 9.0, 9.0, 0)",
            [],
        )
        .unwrap();
        Repository::from_connection(conn)
    }

    #[test]
    fn loads_joined_ue_rows_in_time_order() {
        let rows = repository().ue_observations().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, 2_000_000_000);
        assert_eq!(rows[0].cell_id, 1);
        assert_eq!(rows[1].position, Point::new(3.0, 4.0));
        assert_eq!(rows[1].loss, 0.5);
    }

    #[test]
    fn base_stations_load_with_cell_ids() {
        let enbs = repository().base_stations().unwrap();
        let ids: Vec<(u32, u32)> = enbs.iter().map(|e| (e.cell_id, e.node_id)).collect();
        assert_eq!(ids, vec![(1, 10), (2, 11)]);
        assert_eq!(enbs[1].position, Point::new(50.0, 0.0));
    }

    #[test]
    fn base_stations_follow_cell_id_not_node_id() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        insert_enb(&conn, 10, 2, 0.0, 0.0);
        insert_enb(&conn, 11, 1, 100.0, 0.0);

        let enbs = Repository::from_connection(conn).base_stations().unwrap();
        let cells: Vec<(u32, u32)> = enbs.iter().map(|e| (e.cell_id, e.node_id)).collect();
        assert_eq!(cells, vec![(1, 11), (2, 10)]);
        assert_eq!(enbs[0].position, Point::new(100.0, 0.0));
    }

    #[test]
    fn opening_missing_file_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        let err = Repository::open(&path).err().unwrap();
        assert!(format!("{:#}", err).contains("missing.db"));
    }
}
