use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::{info, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

pub const STUDY_HOURS_COLUMN: &str = "StudyHours";
pub const ATTENDANCE_COLUMN: &str = "Attendance";
pub const RESULT_COLUMN: &str = "ResultNumeric";
pub const MARKS_COLUMN: &str = "TotalMarks";

/// Number of features in a [`FeatureVector`], in `(study_hours, attendance)` order.
pub const N_FEATURES: usize = 2;

/// One labelled historical row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub study_hours: f64,
    pub attendance: f64,
    pub passed: bool,
    pub total_marks: f64,
}

impl TrainingSample {
    pub fn new(study_hours: f64, attendance: f64, passed: bool, total_marks: f64) -> Self {
        Self {
            study_hours,
            attendance,
            passed,
            total_marks,
        }
    }

    pub fn features(&self) -> FeatureVector {
        FeatureVector::new(self.study_hours, self.attendance)
    }
}

/// `(study_hours, attendance)`. Both models and the normalizer index it positionally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub study_hours: f64,
    pub attendance: f64,
}

impl FeatureVector {
    pub fn new(study_hours: f64, attendance: f64) -> Self {
        Self {
            study_hours,
            attendance,
        }
    }

    /// Checks a user-supplied pair: finite, non-negative hours, attendance within 0..=100.
    pub fn validated(study_hours: f64, attendance: f64) -> Result<Self> {
        if !study_hours.is_finite() || study_hours < 0.0 {
            return Err(KernelError::invalid_input(
                "study_hours",
                format!("expected a non-negative number, got {study_hours}"),
            ));
        }
        if !attendance.is_finite() || !(0.0..=100.0).contains(&attendance) {
            return Err(KernelError::invalid_input(
                "attendance",
                format!("expected a percentage between 0 and 100, got {attendance}"),
            ));
        }
        Ok(Self::new(study_hours, attendance))
    }

    /// Parses free-text input the way the dashboard text boxes deliver it.
    pub fn parse(study_hours: &str, attendance: &str) -> Result<Self> {
        let hours = parse_number("study_hours", study_hours)?;
        let attendance = parse_number("attendance", attendance)?;
        Self::validated(hours, attendance)
    }

    pub fn to_array(&self) -> [f64; N_FEATURES] {
        [self.study_hours, self.attendance]
    }

    pub fn from_array(values: [f64; N_FEATURES]) -> Self {
        Self::new(values[0], values[1])
    }

    /// Single-row matrix for the models.
    pub fn to_row(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, N_FEATURES), |(_, j)| self.to_array()[j])
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| KernelError::invalid_input(field, format!("`{}` is not a number", raw.trim())))
}

/// Where the training rows come from. Resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    FilePath(PathBuf),
    BuiltInSample,
}

impl DataSource {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => DataSource::FilePath(path),
            None => DataSource::BuiltInSample,
        }
    }

    /// A missing file falls back to the built-in rows; a malformed one is an error.
    /// Returns the rows and the source they actually came from.
    pub fn load(&self) -> Result<(Vec<TrainingSample>, DataSource)> {
        match self {
            DataSource::FilePath(path) if path.exists() => {
                let samples = load_data(path)?;
                info!("Loaded {} student records from {}", samples.len(), path.display());
                Ok((samples, self.clone()))
            }
            DataSource::FilePath(path) => {
                warn!(
                    "Training data {} not found, falling back to built-in sample set",
                    path.display()
                );
                Ok((built_in_samples(), DataSource::BuiltInSample))
            }
            DataSource::BuiltInSample => {
                info!("Using built-in sample set");
                Ok((built_in_samples(), DataSource::BuiltInSample))
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::FilePath(path) => write!(f, "{}", path.display()),
            DataSource::BuiltInSample => f.write_str("built-in sample"),
        }
    }
}

/// The ten-row canonical dataset.
pub fn built_in_samples() -> Vec<TrainingSample> {
    const HOURS: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
    const ATTENDANCE: [f64; 10] = [40.0, 45.0, 50.0, 60.0, 65.0, 75.0, 80.0, 85.0, 90.0, 95.0];
    const RESULT: [u8; 10] = [0, 0, 0, 0, 1, 1, 1, 1, 1, 1];
    const MARKS: [f64; 10] = [25.0, 30.0, 38.0, 45.0, 55.0, 68.0, 75.0, 82.0, 88.0, 95.0];

    (0..HOURS.len())
        .map(|i| TrainingSample::new(HOURS[i], ATTENDANCE[i], RESULT[i] == 1, MARKS[i]))
        .collect()
}

pub fn load_data(path: &Path) -> Result<Vec<TrainingSample>> {
    read_samples(File::open(path)?)
}

/// Reads samples from CSV with a header row; columns are located by name.
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<TrainingSample>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| KernelError::MissingColumn(name.to_string()))
    };
    let hours_idx = column(STUDY_HOURS_COLUMN)?;
    let attendance_idx = column(ATTENDANCE_COLUMN)?;
    let result_idx = column(RESULT_COLUMN)?;
    let marks_idx = column(MARKS_COLUMN)?;

    let mut samples = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let cell = |field: &'static str, idx: usize| -> Result<f64> {
            let raw = record.get(idx).unwrap_or("");
            raw.parse::<f64>().map_err(|_| {
                KernelError::invalid_input(field, format!("row {}: `{raw}` is not a number", row + 1))
            })
        };

        let hours = cell(STUDY_HOURS_COLUMN, hours_idx)?;
        let attendance = cell(ATTENDANCE_COLUMN, attendance_idx)?;
        let pass_fail = cell(RESULT_COLUMN, result_idx)?;
        let marks = cell(MARKS_COLUMN, marks_idx)?;

        let features = FeatureVector::validated(hours, attendance).map_err(|e| match e {
            KernelError::InvalidInput { field, reason } => KernelError::InvalidInput {
                field,
                reason: format!("row {}: {reason}", row + 1),
            },
            other => other,
        })?;
        if !(0.0..=1.0).contains(&pass_fail) {
            return Err(KernelError::invalid_input(
                RESULT_COLUMN,
                format!("row {}: {pass_fail} is outside 0..=1", row + 1),
            ));
        }
        if !(0.0..=100.0).contains(&marks) {
            return Err(KernelError::invalid_input(
                MARKS_COLUMN,
                format!("row {}: {marks} is outside 0..=100", row + 1),
            ));
        }

        samples.push(TrainingSample::new(
            features.study_hours,
            features.attendance,
            pass_fail > 0.5,
            marks,
        ));
    }

    Ok(samples)
}

pub fn feature_matrix(samples: &[TrainingSample]) -> Array2<f64> {
    Array2::from_shape_fn((samples.len(), N_FEATURES), |(i, j)| {
        samples[i].features().to_array()[j]
    })
}

pub fn labels(samples: &[TrainingSample]) -> Array1<bool> {
    samples.iter().map(|s| s.passed).collect()
}

pub fn marks(samples: &[TrainingSample]) -> Array1<f64> {
    samples.iter().map(|s| s.total_marks).collect()
}

/// `(pass_count, fail_count)`
pub fn class_distribution(samples: &[TrainingSample]) -> (usize, usize) {
    let pass_count = samples.iter().filter(|s| s.passed).count();
    (pass_count, samples.len() - pass_count)
}

pub fn calculate_accuracy(predictions: &Array1<bool>, targets: &Array1<bool>) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    predictions
        .iter()
        .zip(targets.iter())
        .filter(|(&pred, &actual)| pred == actual)
        .count() as f64
        / targets.len() as f64
}
