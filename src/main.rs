// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use oranml::prelude::*;
use oranml::campaign::presets::{self, PresetOptions};
use oranml::positions;
use oranml::qos::{self, report};

use clap::{Parser, Subcommand, ValueEnum};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Training,
    Evaluation,
}

#[derive(Clone, Copy, ValueEnum)]
enum ShapeKind {
    Square,
    Disc,
}

#[derive(Subcommand)]
enum Commands {
    /// Random initial UE positions for the training scenario
    Positions {
        #[arg(short, long, value_enum, default_value = "square")]
        shape: ShapeKind,
        #[arg(short = 'n', long, default_value_t = 2000)]
        count: usize,
        /// Half-width of the square, or radius of the disc
        #[arg(short, long, default_value_t = 100)]
        range: i64,
        #[arg(long, default_value_t = 0)]
        center_x: i64,
        #[arg(long, default_value_t = 0)]
        center_y: i64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long, default_value = "train-initial-positions.tr")]
        output: PathBuf,
    },

    Campaign {
        #[arg(value_enum)]
        preset: Preset,
        /// Overwrite previous campaign
        #[arg(short, long)]
        overwrite: bool,
        /// Don't run simulations, just export the results
        #[arg(short, long)]
        export: bool,
        #[arg(long, default_value = "./")]
        ns_path: PathBuf,
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },

    /// Build training-no-norm.data and training.data from a results tree
    Dataset {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        results_dir: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        policy: Option<LabelPolicy>,
        /// `drop` or `fill:<value>`
        #[arg(long)]
        missing: Option<MissingCell>,
        #[arg(long)]
        node: Option<u32>,
    },

    #[command(subcommand)]
    Qos(QosCommand),
}

#[derive(Subcommand)]
enum QosCommand {
    /// Mean and std per number of UEs, one `name=path` per handover variant
    Users {
        #[arg(required = true)]
        variants: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Per-time averages, one `name=trace file` per variant
    Time {
        #[arg(required = true)]
        variants: Vec<String>,
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Positions { shape, count, range, center_x, center_y, seed, output } => {
            let shape = match shape {
                ShapeKind::Square => Shape::Square { range },
                ShapeKind::Disc => Shape::Disc { radius: range, center_x, center_y },
            };
            let config = PositionConfig { count, shape, seed };
            positions::write_positions(&output, &positions::generate(&config)?)?;
        }

        Commands::Campaign { preset, overwrite, export, ns_path, retries } => {
            let options = PresetOptions {
                ns_path,
                overwrite,
                export_only: export,
                retries,
            };
            let results = match preset {
                Preset::Training => presets::run_training(&options)?,
                Preset::Evaluation => presets::run_evaluation(&options)?,
            };
            info!("Results available in: {}", results.display());
        }

        Commands::Dataset { config, results_dir, output_dir, policy, missing, node } => {
            let mut dataset_config = match config {
                Some(path) => DatasetConfig::load(path)?,
                None => DatasetConfig::default(),
            };
            if let Some(dir) = results_dir {
                dataset_config = dataset_config.with_results_dir(dir);
            }
            if let Some(dir) = output_dir {
                dataset_config = dataset_config.with_output_dir(dir);
            }
            if let Some(policy) = policy {
                dataset_config = dataset_config.with_label_policy(policy);
            }
            if let Some(missing) = missing {
                dataset_config = dataset_config.with_missing_cell(missing);
            }
            if let Some(node) = node {
                dataset_config.node_id = node;
            }

            DatasetBuilder::new(dataset_config).run()?;
        }

        Commands::Qos(QosCommand::Users { variants, output }) => {
            let mut summaries = Vec::new();
            for variant in &variants {
                let (name, path) = parse_variant(variant)?;
                info!("Variant {}: {}", name, path.display());
                summaries.extend(qos::users_report(name, path)?);
            }

            report::comparison_table(&summaries);

            let output = output.unwrap_or_else(|| {
                let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                PathBuf::from(format!("qos-vs-users_{}.csv", timestamp))
            });
            report::write_summaries(&output, &summaries)?;
            info!("Summary saved to: {}", output.display());
        }

        Commands::Qos(QosCommand::Time { variants, output_dir }) => {
            std::fs::create_dir_all(&output_dir)?;
            for variant in &variants {
                let (name, path) = parse_variant(variant)?;
                let points = qos::time_series(&qos::read_samples(&path)?);

                let output = output_dir.join(format!("qos-vs-time_{}.csv", slug(name)));
                report::write_time_series(&output, &points)?;
                info!("{}: {} timesteps saved to {}", name, points.len(), output.display());
            }
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn parse_variant(arg: &str) -> Result<(&str, PathBuf)> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name, PathBuf::from(path))),
        _ => anyhow::bail!("Expected name=path, got: {}", arg),
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}
