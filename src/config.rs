use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;

use crate::data::DataSource;
use crate::decision::DecisionPolicy;
use crate::error::Result;
use crate::kernel::KernelConfig;
use crate::persistence::ModelStore;

#[derive(Debug, Clone, Parser)]
#[command(name = "student_result_predictor", version, about = "Student result prediction API")]
pub struct Cli {
    #[arg(long, env = "PREDICTOR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PREDICTOR_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Training CSV; the built-in sample set is used when absent or missing on disk.
    #[arg(long, env = "PREDICTOR_DATA")]
    pub data: Option<PathBuf>,

    /// Directory for cached model artifacts.
    #[arg(long, env = "PREDICTOR_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Ignore cached artifacts and overwrite them.
    #[arg(long)]
    pub retrain: bool,

    /// Overrides the policy from `--config`.
    #[arg(long, env = "PREDICTOR_POLICY", value_enum)]
    pub policy: Option<DecisionPolicy>,

    /// JSON file with thresholds, recommendation bands and classifier settings.
    #[arg(long, env = "PREDICTOR_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn data_source(&self) -> DataSource {
        DataSource::from_option(self.data.clone())
    }

    pub fn model_store(&self) -> Option<ModelStore> {
        self.model_dir.clone().map(ModelStore::new)
    }

    pub fn kernel_config(&self) -> Result<KernelConfig> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
            None => KernelConfig::default(),
        };
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
