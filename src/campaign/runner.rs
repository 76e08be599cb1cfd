use super::grid::ParamSet;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

pub trait SimulationRunner {
    /// Runs one simulation with its working directory set to `output_dir`.
    fn run(&self, params: &ParamSet, output_dir: &Path) -> Result<()>;
    fn name(&self) -> &str;
}

/// Runs a scratch script through the ns-3 build wrapper.
#[derive(Debug, Clone)]
pub struct Ns3Runner {
    ns_path: PathBuf,
    script: String,
}

impl Ns3Runner {
    pub fn new(ns_path: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            ns_path: ns_path.into(),
            script: script.into(),
        }
    }

    pub fn program_line(&self, params: &ParamSet) -> String {
        let mut line = self.script.clone();
        for arg in params.to_args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

impl SimulationRunner for Ns3Runner {
    fn run(&self, params: &ParamSet, output_dir: &Path) -> Result<()> {
        let program = self.program_line(params);
        let cwd = std::fs::canonicalize(output_dir)
            .with_context(|| format!("Missing run directory {}", output_dir.display()))?;
        debug!("ns3 run \"{}\" --cwd {}", program, cwd.display());

        let output = Command::new(self.ns_path.join("ns3"))
            .current_dir(&self.ns_path)
            .arg("run")
            .arg(&program)
            .arg("--cwd")
            .arg(&cwd)
            .output()
            .with_context(|| format!("Failed to launch ns3 in {}", self.ns_path.display()))?;

        std::fs::write(cwd.join("stdout"), &output.stdout)?;
        std::fs::write(cwd.join("stderr"), &output.stderr)?;

        if !output.status.success() {
            bail!("{} exited with {}", self.script, output.status);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.script
    }
}
