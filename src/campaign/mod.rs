pub mod config;
pub mod grid;
pub mod presets;
pub mod runner;

pub use config::CampaignConfig;
pub use grid::{ParamGrid, ParamSet};
pub use runner::{Ns3Runner, SimulationRunner};

use crate::scenario::ParamValue;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const MARKER_FILE: &str = "COMPLETED";
const PARAMS_FILE: &str = "params.json";
const RNG_RUN: &str = "RngRun";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunRecord {
    params: ParamSet,
    run: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignReport {
    pub executed: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Campaign<R: SimulationRunner> {
    config: CampaignConfig,
    runner: R,
}

impl<R: SimulationRunner> Campaign<R> {
    pub fn new(config: CampaignConfig, runner: R) -> Result<Self> {
        if config.overwrite && config.campaign_dir.exists() {
            warn!("Removing previous campaign at {}", config.campaign_dir.display());
            std::fs::remove_dir_all(&config.campaign_dir)
                .with_context(|| format!("Failed to remove {}", config.campaign_dir.display()))?;
        }
        std::fs::create_dir_all(config.campaign_dir.join("data"))?;

        Ok(Self { config, runner })
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    fn run_dir(&self, params: &ParamSet, run: u32) -> PathBuf {
        let mut dir = self.config.campaign_dir.join("data");
        for (key, value) in params.iter() {
            dir.push(grid::segment(key, value));
        }
        dir.join(format!("run={}", run))
    }

    pub fn is_complete(&self, params: &ParamSet, run: u32) -> bool {
        self.run_dir(params, run).join(MARKER_FILE).exists()
    }

    /// Runs every (combination, run index) without a completion marker.
    /// The run index doubles as `RngRun` unless the grid pins it.
    pub fn run_missing_simulations(&self, grid: &ParamGrid, runs: u32) -> Result<CampaignReport> {
        let combinations = grid.combinations();
        let total = combinations.len() as u64 * runs as u64;
        info!("Campaign for {}: {} simulations", self.runner.name(), total);

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} {msg}")?
                .progress_chars("█▓░"),
        );

        let mut report = CampaignReport::default();
        for params in &combinations {
            for run in 0..runs {
                pb.inc(1);
                if self.is_complete(params, run) {
                    report.skipped += 1;
                    continue;
                }

                match self.execute(params, run) {
                    Ok(()) => report.executed += 1,
                    Err(e) if self.config.stop_on_errors => {
                        pb.abandon();
                        return Err(e);
                    }
                    Err(e) => {
                        error!("Simulation failed ({:?}, run {}): {:#}", params.to_args(), run, e);
                        report.failed += 1;
                    }
                }
                pb.set_message(format!("Failed: {}", report.failed));
            }
        }
        pb.finish_with_message("Campaign complete");

        info!(
            "Executed {}, skipped {}, failed {}",
            report.executed, report.skipped, report.failed
        );
        Ok(report)
    }

    fn execute(&self, params: &ParamSet, run: u32) -> Result<()> {
        let dir = self.run_dir(params, run);
        std::fs::create_dir_all(&dir)?;

        let mut effective = params.clone();
        if params.get(RNG_RUN).is_none() {
            effective.0.push((RNG_RUN.to_string(), ParamValue::Int(run as i64)));
        }

        let record = RunRecord {
            params: params.clone(),
            run,
        };
        std::fs::write(dir.join(PARAMS_FILE), serde_json::to_string_pretty(&record)?)?;

        let attempts = self.config.retries + 1;
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.runner.run(&effective, &dir) {
                Ok(()) => {
                    std::fs::write(dir.join(MARKER_FILE), chrono::Local::now().to_rfc3339())?;
                    return Ok(());
                }
                Err(e) => {
                    if attempt < attempts {
                        warn!("Attempt {}/{} failed: {:#}", attempt, attempts, e);
                    }
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Simulation never ran")))
    }

    /// Copies completed runs matching `results` into `dest/<key=value...>/run=N`.
    pub fn save_to_folders(&self, results: &ParamGrid, dest: impl AsRef<Path>, runs: u32) -> Result<usize> {
        let dest = dest.as_ref();
        let pattern = self
            .config
            .campaign_dir
            .join("data")
            .join("**")
            .join(PARAMS_FILE);

        let mut exported = 0;
        for entry in glob::glob(&pattern.to_string_lossy())? {
            let params_path = entry?;
            let Some(run_dir) = params_path.parent() else {
                continue;
            };
            if !run_dir.join(MARKER_FILE).exists() {
                continue;
            }

            let content = std::fs::read_to_string(&params_path)?;
            let record: RunRecord = serde_json::from_str(&content)
                .with_context(|| format!("Corrupt run record {}", params_path.display()))?;
            if record.run >= runs || !results.matches(&record.params) {
                continue;
            }

            let target = dest
                .join(results.folder(&record.params))
                .join(format!("run={}", record.run));
            copy_outputs(run_dir, &target)?;
            exported += 1;
        }

        info!("Exported {} runs to {}", exported, dest.display());
        Ok(exported)
    }
}

fn copy_outputs(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let path = entry?.path();
        let Some(name) = path.file_name() else {
            continue;
        };
        if !path.is_file() || name == MARKER_FILE || name == PARAMS_FILE {
            continue;
        }
        std::fs::copy(&path, to.join(name))
            .with_context(|| format!("Failed to copy {}", path.display()))?;
    }
    Ok(())
}
