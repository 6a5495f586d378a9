use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::{MetricKind, MetricSummary, Parameters, SeriesSource};
use crate::plottable::{steps_as_f64, Plottable, PlottableKind};
use crate::signal::butterworth::{butter, filtfilt, Band};
use crate::signal::interp::interp_linear;
use crate::signal::savgol::savgol_filter;

pub const PARAMETER_NAMES: [&str; 4] = ["Order", "Cutoff Freq.", "Sample Freq.", "Zeroing Thr."];

pub const DEFAULT_ORDER: usize = 4;
pub const DEFAULT_CUTOFF: f64 = 0.5;
pub const DEFAULT_ZEROING_THRESHOLD: f64 = 5.0;

const SMOOTHING_WINDOW: usize = 25;
const SMOOTHING_POLYORDER: usize = 5;

/// ゼロ位相バターワースハイパスフィルタと高周波イベント抽出
///
/// フィルタ出力の絶対値を閾値でゼロ化し、残った連続区間
/// （イベント区間）を片側1サンプルずつ拡張する。イベント区間を
/// 制御点として、静穏区間を元系列から線形補間で置き換えた系列が
/// `values_non_zero_interp`、それをSavitzky-Golayで平滑化した系列が
/// `values_smoothed`。閾値を超えるサンプルがなければ両者とも `None`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highpass {
    pub name: String,
    pub steps: Vec<usize>,
    pub values: Vec<f64>,
    pub values_abs: Vec<f64>,
    pub values_zeroed: Vec<f64>,
    pub values_non_zero_interp: Option<Vec<f64>>,
    pub values_smoothed: Option<Vec<f64>>,
    pub order: usize,
    pub cutoff: f64,
    pub sample_freq: f64,
    pub zeroing_threshold: f64,
}

impl Highpass {
    pub fn calculate(source: &impl SeriesSource, parameters: &Parameters) -> Result<Self> {
        let order = parameters.integer("Order")?.unwrap_or(DEFAULT_ORDER);
        let cutoff = parameters.scalar("Cutoff Freq.")?.unwrap_or(DEFAULT_CUTOFF);
        let sample_freq = parameters.scalar("Sample Freq.")?.unwrap_or(source.fps());
        let zeroing_threshold = parameters
            .scalar("Zeroing Thr.")?
            .unwrap_or(DEFAULT_ZEROING_THRESHOLD);

        let coeffs = butter(order, cutoff, sample_freq, Band::Highpass)?;
        let values = filtfilt(&coeffs, source.series())?;

        let values_abs: Vec<f64> = values.iter().map(|v| v.abs()).collect();
        let values_zeroed: Vec<f64> = values_abs
            .iter()
            .map(|&v| if v >= zeroing_threshold { v } else { 0.0 })
            .collect();

        let (values_non_zero_interp, values_smoothed) =
            match active_mask(&values_zeroed) {
                None => (None, None),
                Some(active) => {
                    let steps = source.steps();
                    let series = source.series();

                    // イベント区間を制御点にして静穏区間を補間し直す
                    let mut control_x = Vec::new();
                    let mut control_y = Vec::new();
                    for (i, &is_active) in active.iter().enumerate() {
                        if is_active {
                            control_x.push(steps[i] as f64);
                            control_y.push(series[i]);
                        }
                    }

                    let mut interp = series.to_vec();
                    for (i, &is_active) in active.iter().enumerate() {
                        if !is_active {
                            interp[i] = interp_linear(steps[i] as f64, &control_x, &control_y);
                        }
                    }

                    let smoothed =
                        savgol_filter(&interp, SMOOTHING_WINDOW, SMOOTHING_POLYORDER)?;
                    (Some(interp), Some(smoothed))
                }
            };

        Ok(Self {
            name: MetricKind::Highpass.display_name().to_string(),
            steps: source.steps().to_vec(),
            values,
            values_abs,
            values_zeroed,
            values_non_zero_interp,
            values_smoothed,
            order,
            cutoff,
            sample_freq,
            zeroing_threshold,
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
        let name = name.unwrap_or(&self.name);
        let legend = legend.unwrap_or(&self.name);
        let steps = steps_as_f64(&self.steps);

        let line = |suffix: &str, values: &[f64]| {
            Plottable::line(
                format!("{name}{suffix}"),
                steps.clone(),
                values.to_vec(),
                format!("{legend}{suffix}"),
                PlottableKind::ContinuousMetric,
            )
        };

        let mut plottables = vec![
            line("", &self.values),
            line("_ABS", &self.values_abs),
            line("_ZEROED", &self.values_zeroed),
        ];
        if let Some(interp) = &self.values_non_zero_interp {
            plottables.push(line("_INTERPOLATED", interp));
        }
        if let Some(smoothed) = &self.values_smoothed {
            plottables.push(line("_SMOOTHED", smoothed));
        }
        Some(plottables)
    }
}

impl SeriesSource for Highpass {
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

/// 非ゼロ連続区間を片側1サンプル拡張したマスク
/// 非ゼロサンプルがなければ `None`
fn active_mask(zeroed: &[f64]) -> Option<Vec<bool>> {
    if zeroed.iter().all(|&v| v == 0.0) {
        return None;
    }
    let n = zeroed.len();
    let mut mask = vec![false; n];
    for (i, &v) in zeroed.iter().enumerate() {
        if v != 0.0 {
            mask[i.saturating_sub(1)] = true;
            mask[i] = true;
            mask[(i + 1).min(n - 1)] = true;
        }
    }
    Some(mask)
}
