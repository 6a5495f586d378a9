use serde::{Deserialize, Serialize};

use crate::aggregate::CombinationMode;
use crate::error::{MetricError, Result};
use crate::feature::Feature;
use crate::metrics::{MetricKind, MetricSummary};
use crate::plottable::{steps_as_f64, Marker, Plottable};

/// 姿勢推定が欠けたフレームの位置と補間値
///
/// steps は生の値がセンチネルだったフレーム、values は補間済み系列の
/// 同位置の値。件数は特徴量ごとに同一になるため集約モードは
/// `SingleSum`（代表1本の値をそのまま使う）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingPoseEstimations {
    pub name: String,
    pub steps: Vec<usize>,
    pub values: Vec<f64>,
    pub count: usize,
}

impl MissingPoseEstimations {
    pub fn calculate(feature: &Feature) -> Result<Self> {
        let positions = feature.missing_positions();

        let values = if positions.is_empty() {
            Vec::new()
        } else {
            let interp = feature.values_interp.as_ref().ok_or_else(|| {
                MetricError::data(format!(
                    "feature '{}': interpolation required before missing-estimation metric",
                    feature.name
                ))
            })?;
            positions.iter().map(|&i| interp[i]).collect()
        };

        let steps: Vec<usize> = positions.iter().map(|&i| feature.steps[i]).collect();
        let count = steps.len();

        Ok(Self {
            name: MetricKind::MissingPoseEstimations.display_name().to_string(),
            steps,
            values,
            count,
        })
    }

    pub fn summary(&self) -> MetricSummary {
        MetricSummary {
            display_name: self.name.clone(),
            display_modes: vec![CombinationMode::SingleSum],
            display_values: vec![self.count as f64],
        }
    }

    pub fn list_name(&self) -> String {
        format!("{} ({})", self.name, self.count)
    }

    pub fn plottables(&self, name: Option<&str>, legend: Option<&str>) -> Option<Vec<Plottable>> {
        if self.steps.is_empty() {
            return None;
        }
        Some(vec![Plottable::points(
            name.unwrap_or(&self.name),
            steps_as_f64(&self.steps),
            self.values.clone(),
            Marker::Cross,
            10.0,
            legend.unwrap_or(&self.name),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::NO_ESTIMATION;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn feature_with(values: &[f64]) -> Feature {
        let mut f = Feature::new("left_wrist_x", 25.0);
        for (i, &v) in values.iter().enumerate() {
            let score = if v == NO_ESTIMATION { NO_ESTIMATION } else { 0.9 };
            f.add(i, v, score);
        }
        f.interpolate_values().unwrap();
        f
    }

    #[test]
    fn test_missing_steps_and_interpolated_values() {
        let f = feature_with(&[10.0, -1.0, 30.0, -1.0, 50.0]);
        let metric = MissingPoseEstimations::calculate(&f).unwrap();
        assert_eq!(metric.steps, vec![1, 3]);
        assert!(approx_eq(metric.values[0], 20.0, 1e-12));
        assert!(approx_eq(metric.values[1], 40.0, 1e-12));
        assert_eq!(metric.count, 2);
    }

    #[test]
    fn test_no_missing_estimations() {
        let f = feature_with(&[10.0, 20.0, 30.0]);
        let metric = MissingPoseEstimations::calculate(&f).unwrap();
        assert_eq!(metric.count, 0);
        assert!(metric.steps.is_empty());
        assert!(metric.plottables(None, None).is_none());
    }

    #[test]
    fn test_requires_interpolation_when_missing_present() {
        let mut f = Feature::new("left_wrist_x", 25.0);
        f.add(0, 10.0, 0.9);
        f.add(1, -1.0, -1.0);
        f.add(2, 30.0, 0.9);
        assert!(MissingPoseEstimations::calculate(&f).is_err());
    }

    #[test]
    fn test_summary_mode_is_single_sum() {
        let f = feature_with(&[10.0, -1.0, 30.0]);
        let summary = MissingPoseEstimations::calculate(&f).unwrap().summary();
        assert_eq!(summary.display_modes, vec![CombinationMode::SingleSum]);
        assert_eq!(summary.display_values, vec![1.0]);
    }

    #[test]
    fn test_end_to_end_scenario_count() {
        let f = feature_with(&[100.0, 102.0, -1.0, -1.0, 110.0, 112.0, 111.0, -1.0, 108.0, 107.0]);
        let metric = MissingPoseEstimations::calculate(&f).unwrap();
        assert_eq!(metric.count, 3);
        assert_eq!(metric.steps, vec![2, 3, 7]);
        assert_eq!(metric.list_name(), "Missing Pose Estimations (3)");
    }
}
