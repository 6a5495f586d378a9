use serde::{Deserialize, Serialize};

use crate::aggregate::CombinationMode;
use crate::error::Result;
use crate::metrics::{MetricKind, MetricSummary, Parameters, SeriesSource};
use crate::plottable::{steps_as_f64, Marker, Plottable};
use crate::signal::peak_finding::{find_peaks, PeakParams};

pub const PARAMETER_NAMES: [&str; 8] = [
    "Height",
    "Threshold",
    "Distance",
    "Prominence",
    "Width",
    "Window Len.",
    "Rel. Height",
    "Plateau Size",
];

/// 局所極値の検出
///
/// 系列の局所極大と、符号反転した系列の局所極大（= 極小）を同じ
/// 制約で検出し、インデックス集合の和をソート・重複除去して返す。
/// 値は元の系列のもの。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peaks {
    pub name: String,
    pub steps: Vec<usize>,
    pub values: Vec<f64>,
    pub count: usize,
}

impl Peaks {
    pub fn calculate(source: &impl SeriesSource, parameters: &Parameters) -> Result<Self> {
        let params = parse_peak_params(parameters)?;
        let series = source.series();

        let maxima = find_peaks(series, &params)?;
        let negated: Vec<f64> = series.iter().map(|v| -v).collect();
        let minima = find_peaks(&negated, &params)?;

        let mut indices: Vec<usize> = maxima.into_iter().chain(minima).collect();
        indices.sort_unstable();
        indices.dedup();

        let steps: Vec<usize> = indices.iter().map(|&i| source.steps()[i]).collect();
        let values: Vec<f64> = indices.iter().map(|&i| series[i]).collect();
        let count = steps.len();

        Ok(Self {
            name: MetricKind::Peaks.display_name().to_string(),
            steps,
            values,
            count,
        })
    }

    pub fn summary(&self) -> MetricSummary {
        MetricSummary {
            display_name: self.name.clone(),
            display_modes: vec![CombinationMode::Sum],
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
            Marker::Circle,
            6.0,
            legend.unwrap_or(&self.name),
        )])
    }
}

fn parse_peak_params(parameters: &Parameters) -> Result<PeakParams> {
    let mut params = PeakParams {
        height: parameters.bound("Height")?,
        threshold: parameters.bound("Threshold")?,
        distance: parameters.scalar("Distance")?,
        prominence: parameters.bound("Prominence")?,
        width: parameters.bound("Width")?,
        wlen: parameters.integer("Window Len.")?,
        plateau_size: parameters.bound("Plateau Size")?,
        ..Default::default()
    };
    if let Some(rel_height) = parameters.scalar("Rel. Height")? {
        params.rel_height = rel_height;
    }
    Ok(params)
}
