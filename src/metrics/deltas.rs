use serde::{Deserialize, Serialize};

use crate::aggregate::CombinationMode;
use crate::metrics::{round3, MetricKind, MetricSummary, SeriesSource};
use crate::plottable::{steps_as_f64, Plottable, PlottableKind};

/// 補間済み系列の一階差分
///
/// 出力長を入力長に揃えるため先頭に0を挿入する。統計量（絶対差分和、
/// 平均、母標準偏差）は挿入前の差分に対して計算する。空入力はエラー
/// ではなく空系列とゼロ統計を返す。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deltas {
    pub name: String,
    pub steps: Vec<usize>,
    pub values: Vec<f64>,
    pub sum_abs: f64,
    pub mean: f64,
    pub stdd: f64,
    pub fps: f64,
}

impl Deltas {
    pub fn calculate(source: &impl SeriesSource) -> Self {
        let series = source.series();
        let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

        let (sum_abs, mean, stdd) = if diffs.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let n = diffs.len() as f64;
            let sum_abs = diffs.iter().map(|d| d.abs()).sum();
            let mean = diffs.iter().sum::<f64>() / n;
            let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
            (sum_abs, mean, variance.sqrt())
        };

        let mut values = Vec::with_capacity(series.len());
        if !series.is_empty() {
            values.push(0.0);
            values.extend(diffs);
        }

        Self {
            name: MetricKind::Deltas.display_name().to_string(),
            steps: source.steps().to_vec(),
            values,
            sum_abs,
            mean,
            stdd,
            fps: source.fps(),
        }
    }

    pub fn summary(&self) -> MetricSummary {
        MetricSummary {
            display_name: format!("{} (sum abs/mean/std. deviation)", self.name),
            display_modes: vec![
                CombinationMode::Mean,
                CombinationMode::Mean,
                CombinationMode::Mean,
            ],
            display_values: vec![self.sum_abs, self.mean, self.stdd],
        }
    }

    pub fn list_name(&self) -> String {
        format!(
            "{} ({}/{}/{})",
            self.name,
            round3(self.sum_abs),
            round3(self.mean),
            round3(self.stdd)
        )
    }

    pub fn plottables(&self, name: Option<&str>, legend: Option<&str>) -> Option<Vec<Plottable>> {
        if self.steps.is_empty() {
            return None;
        }
        let mut plottable = Plottable::line(
            name.unwrap_or(&self.name),
            steps_as_f64(&self.steps),
            self.values.clone(),
            legend.unwrap_or(&self.name),
            PlottableKind::ContinuousMetric,
        );
        plottable.step_plot = true;
        Some(vec![plottable])
    }
}

impl SeriesSource for Deltas {
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
        self.fps
    }
}
