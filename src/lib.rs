//! Student result prediction: z-score normalization, a logistic pass/fail classifier,
//! a least-squares marks regressor and a configurable decision policy, served over HTTP.

pub mod analytics;
pub mod api;
pub mod config;
pub mod data;
pub mod decision;
pub mod error;
pub mod kernel;
pub mod model;
pub mod normalizer;
pub mod persistence;

pub use data::{DataSource, FeatureVector, TrainingSample};
pub use decision::{DecisionPolicy, RecommendationBands, Thresholds, Verdict};
pub use error::{KernelError, Result};
pub use kernel::{build_kernel, KernelConfig, PredictionKernel, PredictionResult};
