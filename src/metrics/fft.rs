use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::{MetricKind, MetricSummary, Parameters, SeriesSource};
use crate::plottable::{Plottable, PlottableKind};
use crate::signal::spectrum::amplitude_spectrum;

pub const PARAMETER_NAMES: [&str; 1] = ["Sample Freq."];

/// 撮影フレームレートの既定値 (Hz)。参照データセットは25Hz撮影。
pub const DEFAULT_SAMPLE_FREQ: f64 = 25.0;

/// 振幅スペクトル
///
/// steps は周波数 (Hz)、ゼロ周波数を中央に置いた並び。values は
/// `2/N * |FFT|` の正規化振幅。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fft {
    pub name: String,
    pub steps: Vec<f64>,
    pub values: Vec<f64>,
    pub sample_freq: f64,
}

impl Fft {
    pub fn calculate(source: &impl SeriesSource, parameters: &Parameters) -> Result<Self> {
        let sample_freq = parameters
            .scalar("Sample Freq.")?
            .unwrap_or(DEFAULT_SAMPLE_FREQ);

        let (steps, values) = amplitude_spectrum(source.series(), 1.0 / sample_freq)?;

        Ok(Self {
            name: MetricKind::Fft.display_name().to_string(),
            steps,
            values,
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
            self.steps.clone(),
            self.values.clone(),
            legend.unwrap_or(&self.name),
            PlottableKind::ContinuousMetric,
        )])
    }
}
