pub mod aggregate;
pub mod config;
pub mod records;
pub mod reorder;
pub mod selector;
pub mod writer;

pub use config::DatasetConfig;
pub use reorder::TrainingRow;

use crate::repository::Repository;
use crate::scenario::ScenarioParams;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use records::{RunKey, SimulationRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use writer::DatasetWriter;

/// Rows as written to the raw file; the normalized file is derived from them.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<TrainingRow>,
    pub num_cells: usize,
}

impl Dataset {
    pub fn normalized(&self) -> Vec<TrainingRow> {
        self.rows.iter().map(TrainingRow::normalized).collect()
    }
}

pub struct DatasetBuilder {
    config: DatasetConfig,
}

impl DatasetBuilder {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.config.glob_pattern();
        let mut files = Vec::new();
        for entry in glob::glob(&pattern).with_context(|| format!("Invalid pattern {}", pattern))? {
            files.push(entry?);
        }
        files.sort();

        if files.is_empty() {
            bail!("No databases match {}", pattern);
        }
        Ok(files)
    }

    /// Loads one database; the connection lives only for this call.
    pub fn load_file(&self, path: &Path) -> Result<(Vec<SimulationRecord>, usize)> {
        let params = ScenarioParams::from_path(path);
        let key = RunKey::from_params(&params)?;

        let repository = Repository::open(path)?;
        let base_stations = repository
            .base_stations()
            .with_context(|| format!("Failed to read eNBs from {}", path.display()))?;
        let observations = repository
            .ue_observations()
            .with_context(|| format!("Failed to read UE rows from {}", path.display()))?;

        let records = records::build_records(observations, key, &base_stations)
            .with_context(|| format!("Inconsistent data in {}", path.display()))?;
        debug!("{}: {} records, {} eNBs", path.display(), records.len(), base_stations.len());

        Ok((records, base_stations.len()))
    }

    pub fn load(&self, files: &[PathBuf]) -> Result<(Vec<SimulationRecord>, usize)> {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} {msg}")?
                .progress_chars("█▓░"),
        );

        let mut all = Vec::new();
        let mut num_cells = None;
        for file in files {
            let (records, cells) = self.load_file(file)?;
            match num_cells {
                None => num_cells = Some(cells),
                Some(n) if n != cells => {
                    bail!("{} has {} eNBs, expected {}", file.display(), cells, n)
                }
                Some(_) => {}
            }
            all.extend(records);
            pb.inc(1);
        }
        pb.finish_with_message("Databases loaded");

        Ok((all, num_cells.unwrap_or(0)))
    }

    pub fn build(&self, records: &[SimulationRecord], num_cells: usize) -> Result<Dataset> {
        let labeled = selector::label(records, self.config.node_id, self.config.label_policy);
        info!("Labeled {} of {} records", labeled.len(), records.len());

        let features = aggregate::merge_cell_means(
            labeled,
            self.config.node_id,
            num_cells,
            self.config.missing_cell,
        );

        let rows = features
            .iter()
            .map(reorder::reorder)
            .collect::<Result<Vec<_>>>()?;

        if rows.is_empty() {
            bail!("No training rows produced for node {}", self.config.node_id);
        }

        Ok(Dataset { rows, num_cells })
    }

    pub fn write(&self, dataset: &Dataset) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let raw_path = self.config.raw_path();
        DatasetWriter::new(&raw_path)?.write_batch(&dataset.rows)?;
        info!("Unnormalized dataset saved to: {}", raw_path.display());

        let normalized_path = self.config.normalized_path();
        DatasetWriter::new(&normalized_path)?.write_batch(&dataset.normalized())?;
        info!("Normalized dataset saved to: {}", normalized_path.display());

        for bin in writer::loss_distribution(&dataset.rows, self.config.histogram_bins) {
            info!("  loss ({:.4}, {:.4}]: {:.4}", bin.lower, bin.upper, bin.fraction);
        }

        Ok(())
    }

    pub fn run(&self) -> Result<Dataset> {
        info!("Building training data from: {}", self.config.results_dir.display());
        info!("Label policy: {:?}", self.config.label_policy);

        let files = self.discover()?;
        info!("Found {} databases", files.len());

        let (records, num_cells) = self.load(&files)?;
        let dataset = self.build(&records, num_cells)?;
        info!("{} training rows over {} cells", dataset.rows.len(), dataset.num_cells);

        self.write(&dataset)?;
        Ok(dataset)
    }
}
