//! Z-score scaling of `(study_hours, attendance)` using training-set statistics.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::{feature_matrix, FeatureVector, TrainingSample, N_FEATURES};
use crate::error::{KernelError, Result};

const FEATURE_NAMES: [&str; N_FEATURES] = ["study_hours", "attendance"];

/// Per-feature mean and population standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub mean: [f64; N_FEATURES],
    pub std_dev: [f64; N_FEATURES],
}

impl NormalizationStats {
    /// Fails on an empty set or a constant column rather than dividing by zero later.
    pub fn fit(samples: &[TrainingSample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(KernelError::DegenerateTrainingData(
                "no training samples".to_string(),
            ));
        }

        let x = feature_matrix(samples);
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| KernelError::DegenerateTrainingData("no training samples".to_string()))?;
        let std_dev = x.std_axis(Axis(0), 0.0);

        let stats = Self {
            mean: [mean[0], mean[1]],
            std_dev: [std_dev[0], std_dev[1]],
        };
        stats.validate()?;
        Ok(stats)
    }

    /// Rejects statistics that would make `transform` divide by zero or produce NaN.
    pub fn validate(&self) -> Result<()> {
        for (j, name) in FEATURE_NAMES.iter().enumerate() {
            if !self.mean[j].is_finite() {
                return Err(KernelError::DegenerateTrainingData(format!(
                    "feature `{name}` has a non-finite mean"
                )));
            }
            if !self.std_dev[j].is_finite() || self.std_dev[j] <= f64::EPSILON {
                return Err(KernelError::DegenerateTrainingData(format!(
                    "feature `{name}` has zero variance"
                )));
            }
        }
        Ok(())
    }

    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let raw = features.to_array();
        FeatureVector::from_array([
            (raw[0] - self.mean[0]) / self.std_dev[0],
            (raw[1] - self.mean[1]) / self.std_dev[1],
        ])
    }

    pub fn inverse_transform(&self, features: &FeatureVector) -> FeatureVector {
        let scaled = features.to_array();
        FeatureVector::from_array([
            scaled[0] * self.std_dev[0] + self.mean[0],
            scaled[1] * self.std_dev[1] + self.mean[1],
        ])
    }

    /// Scales every training row; the result feeds both model fits.
    pub fn transform_samples(&self, samples: &[TrainingSample]) -> Array2<f64> {
        let mut x = feature_matrix(samples);
        for (j, mut column) in x.axis_iter_mut(Axis(1)).enumerate() {
            column.mapv_inplace(|v| (v - self.mean[j]) / self.std_dev[j]);
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::built_in_samples;

    #[test]
    fn test_fit_uses_population_std() {
        let stats = NormalizationStats::fit(&built_in_samples()).unwrap();
        assert!((stats.mean[0] - 5.5).abs() < 1e-12);
        assert!((stats.mean[1] - 68.5).abs() < 1e-12);
        // sqrt(8.25) for hours 1..=10
        assert!((stats.std_dev[0] - 8.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip() {
        let samples = built_in_samples();
        let stats = NormalizationStats::fit(&samples).unwrap();
        for sample in &samples {
            let restored = stats.inverse_transform(&stats.transform(&sample.features()));
            assert!((restored.study_hours - sample.study_hours).abs() < 1e-9);
            assert!((restored.attendance - sample.attendance).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transformed_columns_are_standardized() {
        let samples = built_in_samples();
        let stats = NormalizationStats::fit(&samples).unwrap();
        let x = stats.transform_samples(&samples);

        let mean = x.mean_axis(Axis(0)).unwrap();
        let std = x.std_axis(Axis(0), 0.0);
        for j in 0..N_FEATURES {
            assert!(mean[j].abs() < 1e-12);
            assert!((std[j] - 1.0).abs() < 1e-12);
        }
        let row = stats.transform(&samples[3].features());
        assert!((x[[3, 0]] - row.study_hours).abs() < 1e-12);
        assert!((x[[3, 1]] - row.attendance).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_is_degenerate() {
        let samples = vec![
            TrainingSample::new(1.0, 80.0, false, 30.0),
            TrainingSample::new(5.0, 80.0, true, 60.0),
            TrainingSample::new(9.0, 80.0, true, 90.0),
        ];
        match NormalizationStats::fit(&samples) {
            Err(KernelError::DegenerateTrainingData(msg)) => assert!(msg.contains("attendance")),
            other => panic!("expected DegenerateTrainingData, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_or_non_finite_std() {
        let zero = NormalizationStats {
            mean: [5.5, 68.5],
            std_dev: [0.0, 0.0],
        };
        assert!(matches!(zero.validate(), Err(KernelError::DegenerateTrainingData(_))));

        let infinite = NormalizationStats {
            mean: [5.5, 68.5],
            std_dev: [2.87, f64::INFINITY],
        };
        assert!(matches!(infinite.validate(), Err(KernelError::DegenerateTrainingData(_))));

        let fitted = NormalizationStats::fit(&built_in_samples()).unwrap();
        assert!(fitted.validate().is_ok());
    }

    #[test]
    fn test_empty_set_is_degenerate() {
        assert!(matches!(
            NormalizationStats::fit(&[]),
            Err(KernelError::DegenerateTrainingData(_))
        ));
    }
}
