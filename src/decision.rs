//! Turning `(pass_probability, estimated_marks)` into a verdict and a recommendation.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("PASS"),
            Verdict::Fail => f.write_str("FAIL"),
        }
    }
}

/// Rule combining the two model outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecisionPolicy {
    /// Probability alone.
    Simple,
    /// Probability and estimated marks must both clear their thresholds.
    #[default]
    Hybrid,
}

impl fmt::Display for DecisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionPolicy::Simple => f.write_str("simple"),
            DecisionPolicy::Hybrid => f.write_str("hybrid"),
        }
    }
}

/// Inclusive lower edges used by [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub pass_probability: f64,
    pub marks: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pass_probability: 0.5,
            marks: 40.0,
        }
    }
}

pub fn decide(
    policy: DecisionPolicy,
    thresholds: &Thresholds,
    pass_probability: f64,
    estimated_marks: f64,
) -> Verdict {
    let probability_ok = pass_probability >= thresholds.pass_probability;
    let passed = match policy {
        DecisionPolicy::Simple => probability_ok,
        DecisionPolicy::Hybrid => probability_ok && estimated_marks >= thresholds.marks,
    };

    if passed {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Inclusive lower probability edge.
    pub min_probability: f64,
    pub label: String,
    pub message: String,
}

impl Band {
    pub fn new(min_probability: f64, label: &str, message: &str) -> Self {
        Self {
            min_probability,
            label: label.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub label: String,
    pub message: String,
}

/// Probability bands, highest edge first, with a catch-all for everything below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BandsConfig")]
pub struct RecommendationBands {
    bands: Vec<Band>,
    fallback: Band,
}

impl Default for RecommendationBands {
    fn default() -> Self {
        Self {
            bands: vec![
                Band::new(
                    0.8,
                    "Excellent",
                    "Excellent performance! Keep up the consistency and focus on advanced topics.",
                ),
                Band::new(
                    0.5,
                    "Safe",
                    "You are in the safe zone, but consider increasing study time by 1-2 hours to improve marks.",
                ),
            ],
            fallback: Band::new(
                0.0,
                "Warning",
                "Warning! You need to increase both attendance and study hours immediately to pass.",
            ),
        }
    }
}

#[derive(Deserialize)]
struct BandsConfig {
    bands: Vec<Band>,
    fallback: Band,
}

impl From<BandsConfig> for RecommendationBands {
    fn from(config: BandsConfig) -> Self {
        RecommendationBands::new(config.bands, config.fallback)
    }
}

impl RecommendationBands {
    /// Sorts `bands` so the highest edge is checked first.
    pub fn new(mut bands: Vec<Band>, fallback: Band) -> Self {
        bands.sort_by(|a, b| b.min_probability.total_cmp(&a.min_probability));
        Self { bands, fallback }
    }

    pub fn select(&self, pass_probability: f64) -> &Band {
        self.bands
            .iter()
            .find(|band| pass_probability >= band.min_probability)
            .unwrap_or(&self.fallback)
    }

    pub fn recommend(&self, pass_probability: f64) -> Recommendation {
        let band = self.select(pass_probability);
        Recommendation {
            label: band.label.clone(),
            message: band.message.clone(),
        }
    }

    /// Labels in check order, fallback last.
    pub fn labels(&self) -> Vec<&str> {
        self.bands
            .iter()
            .chain(std::iter::once(&self.fallback))
            .map(|band| band.label.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_policy_boundaries() {
        let t = Thresholds::default();
        assert_eq!(decide(DecisionPolicy::Simple, &t, 0.5, 0.0), Verdict::Pass);
        assert_eq!(decide(DecisionPolicy::Simple, &t, 0.5000001, 0.0), Verdict::Pass);
        assert_eq!(decide(DecisionPolicy::Simple, &t, 0.4999999, 100.0), Verdict::Fail);
    }

    #[test]
    fn test_hybrid_policy_boundaries() {
        let t = Thresholds::default();
        assert_eq!(decide(DecisionPolicy::Hybrid, &t, 0.5, 40.0), Verdict::Pass);
        assert_eq!(decide(DecisionPolicy::Hybrid, &t, 0.5000001, 40.0), Verdict::Pass);
        assert_eq!(decide(DecisionPolicy::Hybrid, &t, 0.4999999, 90.0), Verdict::Fail);
        assert_eq!(decide(DecisionPolicy::Hybrid, &t, 0.9, 39.9999), Verdict::Fail);
    }

    #[test]
    fn test_policies_disagree_on_low_marks() {
        let t = Thresholds::default();
        assert_eq!(decide(DecisionPolicy::Simple, &t, 0.6, 35.0), Verdict::Pass);
        assert_eq!(decide(DecisionPolicy::Hybrid, &t, 0.6, 35.0), Verdict::Fail);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds {
            pass_probability: 0.7,
            marks: 50.0,
        };
        assert_eq!(decide(DecisionPolicy::Simple, &t, 0.65, 80.0), Verdict::Fail);
        assert_eq!(decide(DecisionPolicy::Hybrid, &t, 0.7, 50.0), Verdict::Pass);
    }

    #[test]
    fn test_default_bands() {
        let bands = RecommendationBands::default();
        assert_eq!(bands.select(0.95).label, "Excellent");
        assert_eq!(bands.select(0.8).label, "Excellent");
        assert_eq!(bands.select(0.7999).label, "Safe");
        assert_eq!(bands.select(0.5).label, "Safe");
        assert_eq!(bands.select(0.4999999).label, "Warning");
        assert_eq!(bands.select(0.0).label, "Warning");
    }

    #[test]
    fn test_bands_are_checked_highest_first() {
        let bands = RecommendationBands::new(
            vec![
                Band::new(0.6, "Good", "Good progress."),
                Band::new(0.9, "Outstanding", "Outstanding."),
                Band::new(0.75, "Very good", "Very good."),
            ],
            Band::new(0.0, "Needs improvement", "Needs improvement."),
        );
        assert_eq!(
            bands.labels(),
            vec!["Outstanding", "Very good", "Good", "Needs improvement"]
        );
        assert_eq!(bands.recommend(0.8).label, "Very good");
        assert_eq!(bands.recommend(0.59).message, "Needs improvement.");
    }

    #[test]
    fn test_deserialized_bands_are_sorted() {
        let json = r#"{
            "bands": [
                {"min_probability": 0.5, "label": "Good", "message": "ok"},
                {"min_probability": 0.8, "label": "Excellent", "message": "great"}
            ],
            "fallback": {"min_probability": 0.0, "label": "Needs improvement", "message": "work"}
        }"#;
        let bands: RecommendationBands = serde_json::from_str(json).unwrap();
        assert_eq!(bands.select(0.85).label, "Excellent");
        assert_eq!(bands.select(0.6).label, "Good");
    }

    #[test]
    fn test_verdict_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Verdict::Pass).unwrap(), "\"PASS\"");
        assert_eq!(Verdict::Fail.to_string(), "FAIL");
    }
}
