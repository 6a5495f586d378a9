use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::{MetricKind, MetricSummary, SeriesSource};
use crate::plottable::{steps_as_f64, Plottable, PlottableKind};
use crate::signal::spectrum::hilbert;

/// 瞬時周波数
///
/// ヒルベルト変換で解析信号を作り、アンラップした位相の一階差分に
/// fs/2π を掛ける。差分のため出力は入力より1サンプル短く、steps は
/// 先頭を除いた元の steps。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantaneousFrequency {
    pub name: String,
    pub steps: Vec<usize>,
    pub values: Vec<f64>,
    pub fps: f64,
}

impl InstantaneousFrequency {
    pub fn calculate(source: &impl SeriesSource) -> Result<Self> {
        let analytic = hilbert(source.series())?;
        let phases: Vec<f64> = analytic.iter().map(|c| c.im.atan2(c.re)).collect();
        let unwrapped = unwrap_phase(&phases);

        let fps = source.fps();
        let values: Vec<f64> = unwrapped
            .windows(2)
            .map(|w| (w[1] - w[0]) / (2.0 * std::f64::consts::PI) * fps)
            .collect();
        let steps = source.steps().iter().skip(1).copied().collect();

        Ok(Self {
            name: MetricKind::InstantaneousFrequency.display_name().to_string(),
            steps,
            values,
            fps,
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

/// 位相のアンラップ: 隣接差分が±πを超えないよう2πの倍数を足し込む
fn unwrap_phase(phases: &[f64]) -> Vec<f64> {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut unwrapped = Vec::with_capacity(phases.len());
    let mut offset = 0.0;
    for (i, &phase) in phases.iter().enumerate() {
        if i > 0 {
            let delta = phase - phases[i - 1];
            if delta > std::f64::consts::PI {
                offset -= two_pi;
            } else if delta < -std::f64::consts::PI {
                offset += two_pi;
            }
        }
        unwrapped.push(phase + offset);
    }
    unwrapped
}
