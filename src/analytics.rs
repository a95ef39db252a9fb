use serde::Serialize;

use crate::data::TrainingSample;
use crate::error::Result;
use crate::kernel::{PredictionKernel, PredictionResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub pass_count: usize,
    pub fail_count: usize,
    pub pass_rate: f64,
    pub avg_probability: f64,
    pub avg_marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceCategory {
    pub range: String,
    pub count: usize,
    /// Observed pass rate of the training rows in this band.
    pub pass_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsData {
    pub total_students: usize,
    pub pass_rate: f64,
    pub avg_study_hours: f64,
    pub avg_attendance: f64,
    pub avg_marks: f64,
    pub performance_breakdown: Vec<PerformanceCategory>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total > 0 {
        part as f64 / total as f64
    } else {
        0.0
    }
}

pub fn summarize_batch<'a>(results: impl IntoIterator<Item = &'a PredictionResult>) -> BatchSummary {
    let results: Vec<&PredictionResult> = results.into_iter().collect();
    let pass_count = results.iter().filter(|r| r.verdict.is_pass()).count();

    BatchSummary {
        pass_count,
        fail_count: results.len() - pass_count,
        pass_rate: ratio(pass_count, results.len()),
        avg_probability: mean(results.iter().map(|r| r.pass_probability)),
        avg_marks: mean(results.iter().map(|r| r.estimated_marks)),
    }
}

/// Training-set overview, grouping rows by the recommendation band the kernel puts them in.
pub fn analyze_training_set(
    kernel: &PredictionKernel,
    samples: &[TrainingSample],
) -> Result<AnalyticsData> {
    let bands = &kernel.config().bands;
    let mut breakdown: Vec<PerformanceCategory> = bands
        .labels()
        .into_iter()
        .map(|label| PerformanceCategory {
            range: label.to_string(),
            count: 0,
            pass_rate: 0.0,
        })
        .collect();
    let mut passes = vec![0usize; breakdown.len()];

    for sample in samples {
        let result = kernel.predict(&sample.features())?;
        if let Some(idx) = breakdown
            .iter()
            .position(|c| c.range == result.recommendation.label)
        {
            breakdown[idx].count += 1;
            if sample.passed {
                passes[idx] += 1;
            }
        }
    }
    for (category, passed) in breakdown.iter_mut().zip(passes) {
        category.pass_rate = ratio(passed, category.count);
    }

    Ok(AnalyticsData {
        total_students: samples.len(),
        pass_rate: ratio(samples.iter().filter(|s| s.passed).count(), samples.len()),
        avg_study_hours: mean(samples.iter().map(|s| s.study_hours)),
        avg_attendance: mean(samples.iter().map(|s| s.attendance)),
        avg_marks: mean(samples.iter().map(|s| s.total_marks)),
        performance_breakdown: breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::built_in_samples;
    use crate::decision::{RecommendationBands, Verdict};
    use crate::kernel::{build_kernel, KernelConfig};

    fn result(p: f64, marks: f64, verdict: Verdict) -> PredictionResult {
        PredictionResult {
            pass_probability: p,
            estimated_marks: marks,
            verdict,
            recommendation: RecommendationBands::default().recommend(p),
        }
    }

    #[test]
    fn test_summarize_batch() {
        let results = vec![
            result(0.9, 85.0, Verdict::Pass),
            result(0.7, 60.0, Verdict::Pass),
            result(0.2, 30.0, Verdict::Fail),
            result(0.6, 35.0, Verdict::Fail),
        ];
        let summary = summarize_batch(&results);
        assert_eq!(summary.pass_count, 2);
        assert_eq!(summary.fail_count, 2);
        assert!((summary.pass_rate - 0.5).abs() < 1e-12);
        assert!((summary.avg_probability - 0.6).abs() < 1e-12);
        assert!((summary.avg_marks - 52.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_batch() {
        let summary = summarize_batch(&[]);
        assert_eq!(summary.pass_count, 0);
        assert_eq!(summary.pass_rate, 0.0);
        assert_eq!(summary.avg_marks, 0.0);
    }

    #[test]
    fn test_training_set_analytics() {
        let samples = built_in_samples();
        let kernel = build_kernel(&samples, KernelConfig::default()).unwrap();
        let analytics = analyze_training_set(&kernel, &samples).unwrap();

        assert_eq!(analytics.total_students, 10);
        assert!((analytics.pass_rate - 0.6).abs() < 1e-12);
        assert!((analytics.avg_study_hours - 5.5).abs() < 1e-12);
        assert!((analytics.avg_attendance - 68.5).abs() < 1e-12);
        assert!((analytics.avg_marks - 60.1).abs() < 1e-9);

        let labels: Vec<&str> = analytics
            .performance_breakdown
            .iter()
            .map(|c| c.range.as_str())
            .collect();
        assert_eq!(labels, vec!["Excellent", "Safe", "Warning"]);
        let counted: usize = analytics.performance_breakdown.iter().map(|c| c.count).sum();
        assert_eq!(counted, 10);
        // Every row the kernel calls "Warning" is a historical fail.
        assert_eq!(analytics.performance_breakdown[2].pass_rate, 0.0);
    }
}
