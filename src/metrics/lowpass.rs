use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::{MetricKind, MetricSummary, Parameters, SeriesSource};
use crate::plottable::{steps_as_f64, Plottable, PlottableKind};
use crate::signal::butterworth::{butter, filtfilt, Band};

pub const PARAMETER_NAMES: [&str; 3] = ["Order", "Cutoff Freq.", "Sample Freq."];

pub const DEFAULT_ORDER: usize = 4;
pub const DEFAULT_CUTOFF: f64 = 0.5;

/// ゼロ位相バターワースローパスフィルタ
///
/// 前進・後退の2パス適用で位相遅れを持たない。下流のピーク・差分
/// 解析が位相に敏感なため、片方向フィルタは使わない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lowpass {
    pub name: String,
    pub steps: Vec<usize>,
    pub values: Vec<f64>,
    pub order: usize,
    pub cutoff: f64,
    pub sample_freq: f64,
}

impl Lowpass {
    pub fn calculate(source: &impl SeriesSource, parameters: &Parameters) -> Result<Self> {
        let order = parameters.integer("Order")?.unwrap_or(DEFAULT_ORDER);
        let cutoff = parameters.scalar("Cutoff Freq.")?.unwrap_or(DEFAULT_CUTOFF);
        let sample_freq = parameters.scalar("Sample Freq.")?.unwrap_or(source.fps());

        let coeffs = butter(order, cutoff, sample_freq, Band::Lowpass)?;
        let values = filtfilt(&coeffs, source.series())?;

        Ok(Self {
            name: MetricKind::Lowpass.display_name().to_string(),
            steps: source.steps().to_vec(),
            values,
            order,
            cutoff,
            sample_freq,
        })
    }

    pub fn summary(&self) -> MetricSummary {
        MetricSummary::empty(&self.name)
    }

    pub fn list_name(&self) -> String {
        self.name.clone()
    }

    pub fn plottables(&self, name: Option<&str>, legend: Option<&str>) -> Option<Vec<Plottable>> {
        if self.steps.is_empty() {
            return None;
        }
        Some(vec![Plottable::line(
            name.unwrap_or(&self.name),
            steps_as_f64(&self.steps),
            self.values.clone(),
            legend.unwrap_or(&self.name),
            PlottableKind::ContinuousMetric,
        )])
    }
}

impl SeriesSource for Lowpass {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn steps(&self) -> &[usize] {
        &self.steps
    }

    fn series(&self) -> &[f64] {
        &self.values
    }

    fn fps(&self) -> f64 {
        self.sample_freq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::metrics::Deltas;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn feature_with(values: &[f64]) -> Feature {
        let mut f = Feature::new("left_wrist_x", 25.0);
        for (i, &v) in values.iter().enumerate() {
            f.add(i, v, 0.9);
        }
        f.interpolate_values().unwrap();
        f
    }

    #[test]
    fn test_lowpass_defaults() {
        let f = feature_with(&vec![1.0; 100]);
        let lp = Lowpass::calculate(&f, &Parameters::new()).unwrap();
        assert_eq!(lp.order, 4);
        assert_eq!(lp.cutoff, 0.5);
        // サンプリング周波数は特徴量のフレームレートを引き継ぐ
        assert_eq!(lp.sample_freq, 25.0);
        assert_eq!(lp.values.len(), 100);
    }

    #[test]
    fn test_lowpass_preserves_constant_signal() {
        let f = feature_with(&vec![42.0; 80]);
        let lp = Lowpass::calculate(&f, &Parameters::new()).unwrap();
        for &v in &lp.values {
            assert!(approx_eq(v, 42.0, 1e-7), "got {v}");
        }
    }

    #[test]
    fn test_lowpass_zero_phase_on_symmetric_pulse() {
        // 対称なパルスはフィルタ後も対称のまま（ピーク位置が動かない）
        let n = 201;
        let center = 100;
        let values: Vec<f64> = (0..n)
            .map(|i| (-((i as f64 - center as f64) / 10.0).powi(2)).exp())
            .collect();
        let f = feature_with(&values);
        let params = Parameters::new().set("Cutoff Freq.", "2.0");
        let lp = Lowpass::calculate(&f, &params).unwrap();

        let peak_index = lp
            .values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_index, center);
        for offset in 1..50 {
            assert!(
                approx_eq(lp.values[center - offset], lp.values[center + offset], 1e-6),
                "asymmetry at offset {offset}"
            );
        }
    }

    #[test]
    fn test_lowpass_invalid_cutoff_is_parameter_error() {
        let f = feature_with(&vec![1.0; 50]);
        let params = Parameters::new().set("Cutoff Freq.", "13.0");
        assert!(Lowpass::calculate(&f, &params).is_err());
    }

    #[test]
    fn test_lowpass_output_feeds_other_metrics() {
        let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.3).sin()).collect();
        let f = feature_with(&values);
        let lp = Lowpass::calculate(&f, &Parameters::new()).unwrap();
        let deltas = Deltas::calculate(&lp);
        assert_eq!(deltas.values.len(), lp.values.len());
    }

    #[test]
    fn test_lowpass_has_no_display_values() {
        let f = feature_with(&vec![1.0; 50]);
        let summary = Lowpass::calculate(&f, &Parameters::new()).unwrap().summary();
        assert!(summary.display_modes.is_empty());
        assert!(summary.display_values.is_empty());
    }
}
