use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub ns_path: PathBuf,
    pub script: String,
    pub campaign_dir: PathBuf,
    pub overwrite: bool,
    pub stop_on_errors: bool,
    /// Extra attempts after a failed run.
    pub retries: u32,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            ns_path: PathBuf::from("./"),
            script: "oran-lte-2-lte-ml-handover-simulation".to_string(),
            campaign_dir: PathBuf::from("./sem"),
            overwrite: false,
            stop_on_errors: false,
            retries: 0,
        }
    }
}

impl CampaignConfig {
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_campaign_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.campaign_dir = dir.into();
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}
