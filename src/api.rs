use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::analytics::{analyze_training_set, summarize_batch, BatchSummary};
use crate::data::{FeatureVector, TrainingSample};
use crate::decision::{DecisionPolicy, Thresholds};
use crate::error::{KernelError, Result};
use crate::kernel::{ModelEvaluation, PredictionKernel, PredictionResult};
use crate::normalizer::NormalizationStats;

/// Shared, read-only state behind every handler.
pub struct AppState {
    pub kernel: PredictionKernel,
    pub samples: Vec<TrainingSample>,
    pub data_source: String,
    pub loaded_from_cache: bool,
}

/// A number, or the text a form field sent for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(alias = "hours")]
    pub study_hours: NumericInput,
    pub attendance: NumericInput,
}

impl PredictRequest {
    fn features(&self) -> Result<FeatureVector> {
        features_from(&self.study_hours, &self.attendance)
    }
}

fn features_from(study_hours: &NumericInput, attendance: &NumericInput) -> Result<FeatureVector> {
    match (study_hours, attendance) {
        (NumericInput::Number(h), NumericInput::Number(a)) => FeatureVector::validated(*h, *a),
        _ => FeatureVector::parse(&as_text(study_hours), &as_text(attendance)),
    }
}

fn as_text(input: &NumericInput) -> String {
    match input {
        NumericInput::Number(v) => v.to_string(),
        NumericInput::Text(s) => s.clone(),
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub probability_percent: String,
    pub marks_display: String,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            probability_percent: result.probability_percent(),
            marks_display: result.marks_display(),
            result,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    #[serde(alias = "hours")]
    pub study_hours: NumericInput,
    pub attendance: NumericInput,
}

#[derive(Debug, Serialize)]
pub struct BatchPrediction {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub total_students: usize,
    pub predictions: Vec<BatchPrediction>,
    pub summary: BatchSummary,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo<'a> {
    pub policy: DecisionPolicy,
    pub thresholds: &'a Thresholds,
    pub recommendation_bands: Vec<&'a str>,
    pub normalization: &'a NormalizationStats,
    pub evaluation: &'a ModelEvaluation,
    pub data_source: &'a str,
    pub loaded_from_cache: bool,
}

async fn predict(
    req: web::Json<PredictRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let features = req.features()?;
    let result = state.kernel.predict(&features)?;
    Ok(HttpResponse::Ok().json(PredictResponse::from(result)))
}

async fn batch_predict(
    students: web::Json<Vec<StudentRecord>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut predictions = Vec::with_capacity(students.len());
    let mut results = Vec::new();

    for student in students.into_inner() {
        let outcome = features_from(&student.study_hours, &student.attendance)
            .and_then(|features| state.kernel.predict(&features));
        match outcome {
            Ok(result) => {
                results.push(result.clone());
                predictions.push(BatchPrediction {
                    name: student.name,
                    prediction: Some(result.into()),
                    error: None,
                });
            }
            Err(e @ KernelError::InvalidInput { .. }) => predictions.push(BatchPrediction {
                name: student.name,
                prediction: None,
                error: Some(e.to_string()),
            }),
            Err(e) => return Err(e),
        }
    }

    Ok(HttpResponse::Ok().json(BatchResult {
        total_students: predictions.len(),
        summary: summarize_batch(&results),
        predictions,
    }))
}

async fn get_model_info(state: web::Data<AppState>) -> HttpResponse {
    let config = state.kernel.config();
    HttpResponse::Ok().json(ModelInfo {
        policy: config.policy,
        thresholds: &config.thresholds,
        recommendation_bands: config.bands.labels(),
        normalization: state.kernel.stats(),
        evaluation: state.kernel.evaluation(),
        data_source: &state.data_source,
        loaded_from_cache: state.loaded_from_cache,
    })
}

async fn get_analytics(state: web::Data<AppState>) -> Result<HttpResponse> {
    let analytics = analyze_training_set(&state.kernel, &state.samples)?;
    Ok(HttpResponse::Ok().json(analytics))
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Student Result Predictor API is running!")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        KernelError::invalid_input("request body", err.to_string()).into()
    }))
    .route("/predict", web::post().to(predict))
    .route("/batch-predict", web::post().to(batch_predict))
    .route("/model/info", web::get().to(get_model_info))
    .route("/analytics", web::get().to(get_analytics))
    .route("/health", web::get().to(health_check));
}
