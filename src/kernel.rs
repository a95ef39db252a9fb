use log::info;
use serde::{Deserialize, Serialize};

use crate::data::{class_distribution, labels, marks, FeatureVector, TrainingSample};
use crate::decision::{decide, DecisionPolicy, Recommendation, RecommendationBands, Thresholds, Verdict};
use crate::error::Result;
use crate::model::{ClassifierModel, ClassifierParams, MarksRegressor, PassClassifier, RegressorModel};
use crate::normalizer::NormalizationStats;

pub const MIN_MARKS: f64 = 0.0;
pub const MAX_MARKS: f64 = 100.0;

/// Everything that shapes a kernel besides its training rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub policy: DecisionPolicy,
    pub thresholds: Thresholds,
    pub bands: RecommendationBands,
    pub classifier: ClassifierParams,
}

impl KernelConfig {
    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub pass_probability: f64,
    /// Clamped to `[MIN_MARKS, MAX_MARKS]`.
    pub estimated_marks: f64,
    pub verdict: Verdict,
    pub recommendation: Recommendation,
}

impl PredictionResult {
    pub fn probability_percent(&self) -> String {
        format!("{:.1}%", self.pass_probability * 100.0)
    }

    pub fn marks_display(&self) -> String {
        format!("{:.1} / 100", self.estimated_marks)
    }
}

/// Training-set fit quality, computed once at build time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEvaluation {
    pub training_samples: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub accuracy: f64,
    pub r2: f64,
}

/// Fitted normalizer and models plus the decision configuration. Read-only after build.
#[derive(Debug, Clone)]
pub struct PredictionKernel {
    stats: NormalizationStats,
    classifier: PassClassifier,
    regressor: MarksRegressor,
    config: KernelConfig,
    evaluation: ModelEvaluation,
}

pub fn build_kernel(samples: &[TrainingSample], config: KernelConfig) -> Result<PredictionKernel> {
    let stats = NormalizationStats::fit(samples)?;
    let x = stats.transform_samples(samples);

    let mut classifier = PassClassifier::new(config.classifier.clone());
    classifier.fit(&x, &labels(samples))?;

    let mut regressor = MarksRegressor::new();
    regressor.fit(&x, &marks(samples))?;

    let kernel = PredictionKernel::assemble(stats, classifier, regressor, config, samples)?;
    info!(
        "Kernel trained on {} samples (accuracy {:.2}%, R² {:.3})",
        samples.len(),
        kernel.evaluation.accuracy * 100.0,
        kernel.evaluation.r2
    );
    Ok(kernel)
}

impl PredictionKernel {
    /// Rebuilds a kernel from previously fitted parts; `samples` are only used for evaluation.
    /// Each part is validated first, so a bad artifact is an error rather than a panic or NaN.
    pub fn from_models(
        stats: NormalizationStats,
        classifier: ClassifierModel,
        regressor: RegressorModel,
        config: KernelConfig,
        samples: &[TrainingSample],
    ) -> Result<Self> {
        stats.validate()?;
        classifier.validate()?;
        regressor.validate()?;

        Self::assemble(
            stats,
            PassClassifier::from_model(classifier),
            MarksRegressor::from_model(regressor),
            config,
            samples,
        )
    }

    fn assemble(
        stats: NormalizationStats,
        classifier: PassClassifier,
        regressor: MarksRegressor,
        config: KernelConfig,
        samples: &[TrainingSample],
    ) -> Result<Self> {
        let x = stats.transform_samples(samples);
        let (pass_count, fail_count) = class_distribution(samples);
        let evaluation = ModelEvaluation {
            training_samples: samples.len(),
            pass_count,
            fail_count,
            accuracy: classifier.accuracy(&x, &labels(samples))?,
            r2: regressor.r2_score(&x, &marks(samples))?,
        };

        Ok(Self {
            stats,
            classifier,
            regressor,
            config,
            evaluation,
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult> {
        let normalized = self.stats.transform(features);
        let pass_probability = self.classifier.predict_probability(&normalized)?;
        let estimated_marks = self
            .regressor
            .predict_score(&normalized)?
            .clamp(MIN_MARKS, MAX_MARKS);

        let verdict = decide(
            self.config.policy,
            &self.config.thresholds,
            pass_probability,
            estimated_marks,
        );

        Ok(PredictionResult {
            pass_probability,
            estimated_marks,
            verdict,
            recommendation: self.config.bands.recommend(pass_probability),
        })
    }

    /// Parses free-text input, then predicts.
    pub fn predict_text(&self, study_hours: &str, attendance: &str) -> Result<PredictionResult> {
        self.predict(&FeatureVector::parse(study_hours, attendance)?)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn stats(&self) -> &NormalizationStats {
        &self.stats
    }

    pub fn classifier_model(&self) -> Result<&ClassifierModel> {
        self.classifier.model()
    }

    pub fn regressor_model(&self) -> Result<&RegressorModel> {
        self.regressor.model()
    }

    pub fn evaluation(&self) -> &ModelEvaluation {
        &self.evaluation
    }
}
