//! The two campaigns used by the handover study: collecting training data and
//! comparing traditional against ML-driven handover.

use super::{Campaign, CampaignConfig, Ns3Runner, ParamGrid};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TRAINING_SCRIPT: &str = "oran-lte-2-lte-ml-handover-train";
pub const EVALUATION_SCRIPT: &str = "oran-lte-2-lte-ml-handover-simulation";

const EVALUATION_RUNS: u32 = 32;
const NUM_UES: [i64; 3] = [50, 75, 100];
const TRADITIONAL_HANDOVER: &str = "ns3::A2A4RsrqHandoverAlgorithm";
const NOOP_HANDOVER: &str = "ns3::NoOpHandoverAlgorithm";

#[derive(Debug, Clone)]
pub struct PresetOptions {
    pub ns_path: PathBuf,
    pub overwrite: bool,
    /// Skip simulations and only export what already exists.
    pub export_only: bool,
    pub retries: u32,
}

impl Default for PresetOptions {
    fn default() -> Self {
        Self {
            ns_path: PathBuf::from("./"),
            overwrite: false,
            export_only: false,
            retries: 0,
        }
    }
}

pub fn training_grid() -> ParamGrid {
    ParamGrid::new()
        .fixed("use-oran", true)
        .fixed("use-distance-lm", false)
        .fixed("use-onnx-lm", false)
        .fixed("use-torch-lm", false)
        .with("scenario", 0i64..3)
        .with("start-config", 0i64..3)
        .with("run-id", 0i64..100)
        .fixed("sim-time", 10i64)
        .fixed("RngRun", 0i64)
}

pub fn training_results() -> ParamGrid {
    ParamGrid::new()
        .with("scenario", 0i64..3)
        .with("start-config", 0i64..3)
        .with("run-id", 0i64..100)
}

pub fn evaluation_grid(handover: &str, use_torch: bool) -> ParamGrid {
    ParamGrid::new()
        .fixed("traffic-trace-file", "/dev/null")
        .fixed("position-trace-file", "/dev/null")
        .fixed("handover-trace-file", "/dev/null")
        .fixed("sim-time", 200i64)
        .with("num-ues", NUM_UES)
        .fixed("handover-algorithm", handover)
        .fixed("use-torch-lm", use_torch)
}

pub fn evaluation_results(handover: &str, use_torch: bool) -> ParamGrid {
    ParamGrid::new()
        .with("num-ues", NUM_UES)
        .fixed("handover-algorithm", handover)
        .fixed("use-torch-lm", use_torch)
}

pub fn run_training(options: &PresetOptions) -> Result<PathBuf> {
    let ns_path = &options.ns_path;
    let results_dir = ns_path.join("results-train");

    let config = CampaignConfig::default()
        .with_script(TRAINING_SCRIPT)
        .with_campaign_dir(ns_path.join("sem-train"))
        .with_overwrite(options.overwrite)
        .with_retries(options.retries);
    let campaign = Campaign::new(config, Ns3Runner::new(ns_path, TRAINING_SCRIPT))?;

    if options.overwrite && results_dir.exists() {
        std::fs::remove_dir_all(&results_dir)?;
    }

    if !options.export_only {
        campaign.run_missing_simulations(&training_grid(), 1)?;
    }

    // An existing export is kept unless --overwrite cleared it
    if !results_dir.exists() {
        campaign.save_to_folders(&training_results(), &results_dir, 1)?;
    } else {
        info!("{} already exists, not exporting", results_dir.display());
    }

    Ok(results_dir)
}

pub fn run_evaluation(options: &PresetOptions) -> Result<PathBuf> {
    let ns_path = &options.ns_path;
    let results_dir = ns_path.join("results");

    let config = CampaignConfig::default()
        .with_script(EVALUATION_SCRIPT)
        .with_campaign_dir(ns_path.join("sem"))
        .with_overwrite(options.overwrite)
        .with_retries(options.retries);
    let campaign = Campaign::new(config, Ns3Runner::new(ns_path, EVALUATION_SCRIPT))?;

    let variants = [
        ("traditional handover", TRADITIONAL_HANDOVER, false, "sem ia"),
        ("IA based handover", NOOP_HANDOVER, true, "com ia"),
    ];

    for (label, handover, use_torch, folder) in variants {
        if !options.export_only {
            info!("Running simulations with {}", label);
            campaign.run_missing_simulations(&evaluation_grid(handover, use_torch), EVALUATION_RUNS)?;
        }
        info!("Exporting results");
        export_variant(&campaign, handover, use_torch, &results_dir.join(folder))?;
    }

    Ok(results_dir)
}

fn export_variant(
    campaign: &Campaign<Ns3Runner>,
    handover: &str,
    use_torch: bool,
    dest: &Path,
) -> Result<usize> {
    campaign.save_to_folders(&evaluation_results(handover, use_torch), dest, EVALUATION_RUNS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_grid_covers_every_configuration() {
        assert_eq!(training_grid().combinations().len(), 3 * 3 * 100);
    }

    #[test]
    fn training_folders_match_dataset_layout() {
        let set = &training_grid().combinations()[0];
        assert!(training_results().matches(set));
        assert_eq!(
            training_results().folder(set),
            PathBuf::from("scenario=0/start-config=0/run-id=0")
        );
    }

    #[test]
    fn evaluation_variants_do_not_overlap() {
        let traditional = evaluation_grid(TRADITIONAL_HANDOVER, false).combinations();
        let ml = evaluation_results(NOOP_HANDOVER, true);
        assert_eq!(traditional.len(), 3);
        assert!(traditional.iter().all(|set| !ml.matches(set)));
    }
}
