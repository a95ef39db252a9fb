use linfa::prelude::*;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::{calculate_accuracy, FeatureVector, N_FEATURES};
use crate::error::{KernelError, Result};

/// Hyperparameters for the pass/fail classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// L2 regularization strength; keeps weights bounded on separable data.
    pub alpha: f64,
    pub max_iterations: u64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iterations: 100,
        }
    }
}

/// Fitted logistic weights over normalized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierModel {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl ClassifierModel {
    pub fn validate(&self) -> Result<()> {
        check_linear_params("classifier", &self.weights, self.bias)
    }

    pub fn predict_probability(&self, normalized: &FeatureVector) -> f64 {
        let x = normalized.to_array();
        let z = self.weights[0] * x[0] + self.weights[1] * x[1] + self.bias;
        sigmoid(z)
    }

    pub fn predict_probabilities(&self, normalized: &Array2<f64>) -> Array1<f64> {
        (normalized.dot(&self.weights) + self.bias).mapv(sigmoid)
    }
}

/// Fitted least-squares weights over normalized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorModel {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl RegressorModel {
    pub fn validate(&self) -> Result<()> {
        check_linear_params("regressor", &self.weights, self.bias)
    }

    /// Raw linear prediction; callers clamp.
    pub fn predict_score(&self, normalized: &FeatureVector) -> f64 {
        let x = normalized.to_array();
        self.weights[0] * x[0] + self.weights[1] * x[1] + self.bias
    }

    pub fn predict_scores(&self, normalized: &Array2<f64>) -> Array1<f64> {
        normalized.dot(&self.weights) + self.bias
    }
}

/// One finite weight per feature and a finite bias.
fn check_linear_params(model: &str, weights: &Array1<f64>, bias: f64) -> Result<()> {
    if weights.len() != N_FEATURES {
        return Err(KernelError::InvalidArtifact(format!(
            "{model} has {} weights, expected {N_FEATURES}",
            weights.len()
        )));
    }
    if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
        return Err(KernelError::InvalidArtifact(format!(
            "{model} has non-finite parameters"
        )));
    }
    Ok(())
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn check_shape(x: &Array2<f64>, n_targets: usize) -> Result<()> {
    if x.nrows() != n_targets {
        return Err(KernelError::Training(format!(
            "{} feature rows but {} targets",
            x.nrows(),
            n_targets
        )));
    }
    if x.nrows() == 0 {
        return Err(KernelError::DegenerateTrainingData(
            "no training samples".to_string(),
        ));
    }
    Ok(())
}

/// Logistic regression for the pass probability.
#[derive(Debug, Clone, Default)]
pub struct PassClassifier {
    params: ClassifierParams,
    model: Option<ClassifierModel>,
}

impl PassClassifier {
    pub fn new(params: ClassifierParams) -> Self {
        Self {
            params,
            model: None,
        }
    }

    pub fn from_model(model: ClassifierModel) -> Self {
        Self {
            params: ClassifierParams::default(),
            model: Some(model),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<&ClassifierModel> {
        self.model.as_ref().ok_or(KernelError::NotFitted("classifier"))
    }

    pub fn fit(&mut self, normalized: &Array2<f64>, labels: &Array1<bool>) -> Result<&mut Self> {
        check_shape(normalized, labels.len())?;
        let pass_count = labels.iter().filter(|&&passed| passed).count();
        if pass_count == 0 || pass_count == labels.len() {
            return Err(KernelError::DegenerateTrainingData(
                "labels contain a single class; need both passes and fails".to_string(),
            ));
        }

        let dataset = Dataset::new(normalized.clone(), labels.clone());
        let fitted = LogisticRegression::default()
            .alpha(self.params.alpha)
            .max_iterations(self.params.max_iterations)
            .fit(&dataset)
            .map_err(|e| KernelError::Training(e.to_string()))?;

        // Probabilities are reported for linfa's positive class; flip if that is `false`.
        let probabilities = fitted.predict_probabilities(normalized);
        let predicted: Array1<bool> = fitted.predict(normalized);
        let positive_is_pass = predicted[0] == (probabilities[0] >= 0.5);

        let (weights, bias) = if positive_is_pass {
            (fitted.params().to_owned(), fitted.intercept())
        } else {
            (fitted.params().mapv(|w| -w), -fitted.intercept())
        };

        self.model = Some(ClassifierModel { weights, bias });
        Ok(self)
    }

    pub fn predict_probability(&self, normalized: &FeatureVector) -> Result<f64> {
        Ok(self.model()?.predict_probability(normalized))
    }

    /// Share of rows where `p >= 0.5` agrees with the label.
    pub fn accuracy(&self, normalized: &Array2<f64>, labels: &Array1<bool>) -> Result<f64> {
        let predictions = self
            .model()?
            .predict_probabilities(normalized)
            .mapv(|p| p >= 0.5);
        Ok(calculate_accuracy(&predictions, labels))
    }
}

/// Ordinary least squares for the estimated marks.
#[derive(Debug, Clone, Default)]
pub struct MarksRegressor {
    model: Option<RegressorModel>,
}

impl MarksRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_model(model: RegressorModel) -> Self {
        Self { model: Some(model) }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<&RegressorModel> {
        self.model.as_ref().ok_or(KernelError::NotFitted("regressor"))
    }

    pub fn fit(&mut self, normalized: &Array2<f64>, targets: &Array1<f64>) -> Result<&mut Self> {
        check_shape(normalized, targets.len())?;

        let x_mean = normalized
            .mean_axis(Axis(0))
            .ok_or_else(|| KernelError::DegenerateTrainingData("no training samples".to_string()))?;
        let y_mean = targets.mean().unwrap_or(0.0);

        let x_centered = normalized - &x_mean.view().insert_axis(Axis(0));
        let y_centered = targets - y_mean;

        let xtx = x_centered.t().dot(&x_centered);
        let xty = x_centered.t().dot(&y_centered);
        let weights = cholesky_solve(&xtx, &xty).ok_or_else(|| {
            KernelError::DegenerateTrainingData(
                "features are collinear; least squares has no unique solution".to_string(),
            )
        })?;
        let bias = y_mean - weights.dot(&x_mean);

        self.model = Some(RegressorModel { weights, bias });
        Ok(self)
    }

    pub fn predict_score(&self, normalized: &FeatureVector) -> Result<f64> {
        Ok(self.model()?.predict_score(normalized))
    }

    /// Coefficient of determination on the given rows.
    pub fn r2_score(&self, normalized: &Array2<f64>, targets: &Array1<f64>) -> Result<f64> {
        let y_pred = self.model()?.predict_scores(normalized);
        let y_mean = targets.mean().unwrap_or(0.0);
        let ss_res = (&y_pred - targets).mapv(|v| v * v).sum();
        let ss_tot = targets.mapv(|v| (v - y_mean) * (v - y_mean)).sum();

        if ss_tot == 0.0 {
            return Ok(1.0);
        }
        Ok(1.0 - ss_res / ss_tot)
    }
}

/// Solves `a * x = b` for symmetric positive-definite `a`. `None` if `a` is not.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    let scale = a.diag().iter().map(|v| v.abs()).fold(0.0, f64::max);
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-12 * scale.max(1.0) {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[[i, k]] * y[k]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| l[[k, i]] * x[k]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}
