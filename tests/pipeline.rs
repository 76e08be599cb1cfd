use oranml::prelude::*;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

const T0: i64 = 2_000_000_000;
const STEP: i64 = 500_000_000;

// eNB node ids map to cells 1..=3 in node id order
const ENBS: [(u32, f64, f64); 3] = [(10, 0.0, 0.0), (11, 100.0, 0.0), (12, 0.0, 100.0)];

// node 1 loss per timestep, per start-config
const NODE1_LOSS: [[f64; 3]; 3] = [[0.5, 0.4, 0.3], [0.2, 0.1, 0.6], [0.9, 0.8, 0.05]];

fn create_db(path: &Path, start_config: usize) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE nodelocation (nodeid INTEGER, simulationtime INTEGER, x REAL, y REAL, z REAL);
         CREATE TABLE lteenb (nodeid INTEGER, cellid INTEGER);
         CREATE TABLE lteuecell (nodeid INTEGER, simulationtime INTEGER, cellid INTEGER);
         CREATE TABLE nodeapploss (nodeid INTEGER, simulationtime INTEGER, loss REAL);",
    )
    .unwrap();

    for (i, (node, x, y)) in ENBS.iter().enumerate() {
        conn.execute("INSERT INTO lteenb VALUES (?1, ?2)", params![node, i as u32 + 1])
            .unwrap();
        conn.execute(
            "INSERT INTO nodelocation VALUES (?1, ?2, ?3, ?4, 0)",
            params![node, T0, x, y],
        )
        .unwrap();
    }

    for step in 0..3 {
        let time = T0 + STEP * step as i64;
        // node 1 is attached to cell start_config + 1, node 2 always to cell 2
        let ues = [
            (1u32, 20.0, 10.0, start_config as u32 + 1, NODE1_LOSS[start_config][step]),
            (2u32, 90.0, 5.0, 2, 0.0),
        ];
        for (node, x, y, cell, loss) in ues {
            conn.execute(
                "INSERT INTO nodelocation VALUES (?1, ?2, ?3, ?4, 0)",
                params![node, time, x, y],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO lteuecell VALUES (?1, ?2, ?3)",
                params![node, time, cell],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO nodeapploss VALUES (?1, ?2, ?3)",
                params![node, time, loss],
            )
            .unwrap();
        }
    }
}

fn results_tree(root: &Path) -> PathBuf {
    let results = root.join("results-train");
    for start_config in 0..3 {
        let db = results
            .join("scenario=0")
            .join(format!("start-config={}", start_config))
            .join("run-id=0")
            .join("run=0")
            .join("oran-repository.db");
        create_db(&db, start_config);
    }
    results
}

fn read_rows(path: &Path) -> Vec<Vec<f64>> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split(' ').map(|v| v.parse().unwrap()).collect())
        .collect()
}

#[test]
fn hand_computed_targets_survive_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig::default()
        .with_results_dir(results_tree(dir.path()))
        .with_output_dir(dir.path().join("out"));

    let builder = DatasetBuilder::new(config);
    let dataset = builder.run().unwrap();

    // t0: config 1 has the lowest next loss (0.1), so cell 2 which is 2nd nearest
    // t1: config 2 wins (0.05) with cell 3, the farthest
    // the winning configuration's rows are excluded
    let ranks: Vec<usize> = dataset.rows.iter().map(|r| r.target_rank).collect();
    assert_eq!(ranks, vec![1, 2, 2, 1]);
    let losses: Vec<f64> = dataset.rows.iter().map(|r| r.loss).collect();
    assert_eq!(losses, vec![0.5, 0.4, 0.1, 0.9]);
    assert_eq!(dataset.num_cells, 3);

    let raw = read_rows(&builder.config().raw_path());
    assert_eq!(raw.len(), 4);
    assert_eq!(raw[0].len(), 8);
    let d = [500f64.sqrt(), 6500f64.sqrt(), 8500f64.sqrt()];
    for (got, want) in raw[0][..3].iter().zip(d.iter()) {
        assert!((got - want).abs() < 1e-9);
    }
    // cell means of config 0 at t0: node 1 on cell 1, node 2 on cell 2, nobody on cell 3
    assert_eq!(&raw[0][3..], &[0.5, 0.0, 0.0, 0.5, 1.0]);

    let normalized = read_rows(&builder.config().normalized_path());
    assert_eq!(normalized.len(), 4);
    assert_eq!(normalized[0].len(), 7);
    assert!((normalized[0][0] - d[0] / d[2]).abs() < 1e-9);
    assert!((normalized[0][1] - d[1] / d[2]).abs() < 1e-9);
    assert_eq!(normalized[3][6], 1.0);
}

#[test]
fn include_source_keeps_winning_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig::default()
        .with_results_dir(results_tree(dir.path()))
        .with_output_dir(dir.path().join("out"))
        .with_label_policy(LabelPolicy::IncludeSource);

    let dataset = DatasetBuilder::new(config).run().unwrap();
    let ranks: Vec<usize> = dataset.rows.iter().map(|r| r.target_rank).collect();
    assert_eq!(ranks, vec![1, 2, 1, 2, 1, 2]);
}

#[test]
fn dropping_incomplete_rows_can_empty_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig::default()
        .with_results_dir(results_tree(dir.path()))
        .with_output_dir(dir.path().join("out"))
        .with_missing_cell(MissingCell::DropRow);

    let err = DatasetBuilder::new(config).run().unwrap_err();
    assert!(err.to_string().contains("No training rows"));
}

#[test]
fn empty_results_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig::default().with_results_dir(dir.path());
    assert!(DatasetBuilder::new(config).discover().is_err());
}
