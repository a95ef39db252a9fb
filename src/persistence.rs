//! JSON model artifacts, so restarts can skip training.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::data::TrainingSample;
use crate::error::Result;
use crate::kernel::{build_kernel, KernelConfig, PredictionKernel};

pub const NORMALIZER_FILE: &str = "normalizer.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const REGRESSOR_FILE: &str = "regressor.json";
pub const TRAINING_FILE: &str = "training.json";

/// Identifies the rows a set of artifacts was fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingFingerprint {
    pub rows: usize,
    pub sha256: String,
}

impl TrainingFingerprint {
    pub fn of(samples: &[TrainingSample]) -> Self {
        let mut hasher = Sha256::new();
        for s in samples {
            hasher.update(
                format!(
                    "{},{},{},{}\n",
                    s.study_hours,
                    s.attendance,
                    u8::from(s.passed),
                    s.total_marks
                )
                .as_bytes(),
            );
        }
        Self {
            rows: samples.len(),
            sha256: format!("{:x}", hasher.finalize()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True only when every artifact, fingerprint included, is present.
    pub fn is_complete(&self) -> bool {
        [NORMALIZER_FILE, CLASSIFIER_FILE, REGRESSOR_FILE, TRAINING_FILE]
            .iter()
            .all(|name| self.dir.join(name).is_file())
    }

    pub fn save(&self, kernel: &PredictionKernel, samples: &[TrainingSample]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        write_json(&self.dir.join(NORMALIZER_FILE), kernel.stats())?;
        write_json(&self.dir.join(CLASSIFIER_FILE), kernel.classifier_model()?)?;
        write_json(&self.dir.join(REGRESSOR_FILE), kernel.regressor_model()?)?;
        write_json(&self.dir.join(TRAINING_FILE), &TrainingFingerprint::of(samples))?;
        info!("Saved model artifacts to {}", self.dir.display());
        Ok(())
    }

    pub fn fingerprint(&self) -> Result<TrainingFingerprint> {
        read_json(&self.dir.join(TRAINING_FILE))
    }

    pub fn load(&self, config: KernelConfig, samples: &[TrainingSample]) -> Result<PredictionKernel> {
        let kernel = PredictionKernel::from_models(
            read_json(&self.dir.join(NORMALIZER_FILE))?,
            read_json(&self.dir.join(CLASSIFIER_FILE))?,
            read_json(&self.dir.join(REGRESSOR_FILE))?,
            config,
            samples,
        )?;
        info!("Loaded model artifacts from {}", self.dir.display());
        Ok(kernel)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Cached artifacts win unless `retrain` is set or they were fitted on different rows;
/// a fresh fit is written back to the store.
/// Returns the kernel and whether it came from the cache.
pub fn load_or_build(
    samples: &[TrainingSample],
    config: KernelConfig,
    store: Option<&ModelStore>,
    retrain: bool,
) -> Result<(PredictionKernel, bool)> {
    let Some(store) = store else {
        return Ok((build_kernel(samples, config)?, false));
    };

    if !retrain {
        if store.is_complete() {
            let cached = store.fingerprint()?;
            let current = TrainingFingerprint::of(samples);
            if cached == current {
                return Ok((store.load(config, samples)?, true));
            }
            warn!(
                "Model artifacts in {} were fitted on different rows ({} cached, {} now), retraining",
                store.dir().display(),
                cached.rows,
                current.rows
            );
        } else if store.dir().exists() {
            warn!(
                "Model artifacts in {} are incomplete, retraining",
                store.dir().display()
            );
        }
    }

    let kernel = build_kernel(samples, config)?;
    store.save(&kernel, samples)?;
    Ok((kernel, false))
}
