pub mod deltas;
pub mod fft;
pub mod highpass;
pub mod instantaneous_frequency;
pub mod lowpass;
pub mod missing_pose_estimations;
pub mod parameters;
pub mod peaks;

use serde::{Deserialize, Serialize};

use crate::aggregate::CombinationMode;
use crate::feature::Feature;
use crate::plottable::Plottable;

pub use deltas::Deltas;
pub use fft::Fft;
pub use highpass::Highpass;
pub use instantaneous_frequency::InstantaneousFrequency;
pub use lowpass::Lowpass;
pub use missing_pose_estimations::MissingPoseEstimations;
pub use parameters::Parameters;
pub use peaks::Peaks;

/// 全メトリクス種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    MissingPoseEstimations,
    Deltas,
    Peaks,
    Lowpass,
    Highpass,
    Fft,
    InstantaneousFrequency,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        Self::MissingPoseEstimations,
        Self::Deltas,
        Self::Peaks,
        Self::Lowpass,
        Self::Highpass,
        Self::Fft,
        Self::InstantaneousFrequency,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MissingPoseEstimations => "Missing Pose Estimations",
            Self::Deltas => "Deltas",
            Self::Peaks => "Peaks",
            Self::Lowpass => "Low-Pass (Butterw.)",
            Self::Highpass => "High-Pass (Butterw.)",
            Self::Fft => "FFT",
            Self::InstantaneousFrequency => "Instantaneous Frequency",
        }
    }
}

/// 集約層へ渡す表示値の組
///
/// `display_modes` と `display_values` は同じ長さで、位置で対応する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub display_name: String,
    pub display_modes: Vec<CombinationMode>,
    pub display_values: Vec<f64>,
}

impl MetricSummary {
    /// 表示値を持たないメトリクス（フィルタ、FFTなど）
    pub fn empty(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            display_modes: Vec::new(),
            display_values: Vec::new(),
        }
    }
}

/// メトリクス計算の入力系列
///
/// Featureに対しても、フレーム軸を保つ他メトリクスの出力に対しても
/// 計算できるようにする境界（calculate_on相当）。
pub trait SeriesSource {
    fn source_name(&self) -> &str;
    fn steps(&self) -> &[usize];
    /// 計算対象の系列（Featureでは補間済みを優先）
    fn series(&self) -> &[f64];
    fn fps(&self) -> f64;
}

impl SeriesSource for Feature {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn steps(&self) -> &[usize] {
        &self.steps
    }

    fn series(&self) -> &[f64] {
        self.metric_values()
    }

    fn fps(&self) -> f64 {
        self.fps
    }
}

/// Run永続化用の全メトリクス出力のタグ付き直和
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MetricRecord {
    MissingPoseEstimations(MissingPoseEstimations),
    Deltas(Deltas),
    Peaks(Peaks),
    Lowpass(Lowpass),
    Highpass(Highpass),
    Fft(Fft),
    InstantaneousFrequency(InstantaneousFrequency),
}

impl MetricRecord {
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::MissingPoseEstimations(_) => MetricKind::MissingPoseEstimations,
            Self::Deltas(_) => MetricKind::Deltas,
            Self::Peaks(_) => MetricKind::Peaks,
            Self::Lowpass(_) => MetricKind::Lowpass,
            Self::Highpass(_) => MetricKind::Highpass,
            Self::Fft(_) => MetricKind::Fft,
            Self::InstantaneousFrequency(_) => MetricKind::InstantaneousFrequency,
        }
    }

    pub fn summary(&self) -> MetricSummary {
        match self {
            Self::MissingPoseEstimations(m) => m.summary(),
            Self::Deltas(m) => m.summary(),
            Self::Peaks(m) => m.summary(),
            Self::Lowpass(m) => m.summary(),
            Self::Highpass(m) => m.summary(),
            Self::Fft(m) => m.summary(),
            Self::InstantaneousFrequency(m) => m.summary(),
        }
    }

    pub fn list_name(&self) -> String {
        match self {
            Self::MissingPoseEstimations(m) => m.list_name(),
            Self::Deltas(m) => m.list_name(),
            Self::Peaks(m) => m.list_name(),
            Self::Lowpass(m) => m.list_name(),
            Self::Highpass(m) => m.list_name(),
            Self::Fft(m) => m.list_name(),
            Self::InstantaneousFrequency(m) => m.list_name(),
        }
    }

    pub fn plottables(
        &self,
        name: Option<&str>,
        legend: Option<&str>,
    ) -> Option<Vec<Plottable>> {
        match self {
            Self::MissingPoseEstimations(m) => m.plottables(name, legend),
            Self::Deltas(m) => m.plottables(name, legend),
            Self::Peaks(m) => m.plottables(name, legend),
            Self::Lowpass(m) => m.plottables(name, legend),
            Self::Highpass(m) => m.plottables(name, legend),
            Self::Fft(m) => m.plottables(name, legend),
            Self::InstantaneousFrequency(m) => m.plottables(name, legend),
        }
    }
}

/// list_name 表示用の丸め（小数3桁）
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(MetricKind::Deltas.display_name(), "Deltas");
        assert_eq!(
            MetricKind::Highpass.display_name(),
            "High-Pass (Butterw.)"
        );
        assert_eq!(
            MetricKind::MissingPoseEstimations.display_name(),
            "Missing Pose Estimations"
        );
        assert_eq!(MetricKind::ALL.len(), 7);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(26.666666), 26.667);
        assert_eq!(round3(0.1234), 0.123);
    }

    #[test]
    fn test_feature_is_series_source() {
        let mut f = Feature::new("left_wrist_x", 25.0);
        f.add(0, 10.0, 0.9);
        f.add(1, -1.0, -1.0);
        f.add(2, 30.0, 0.9);
        f.interpolate_values().unwrap();
        assert_eq!(f.source_name(), "left_wrist_x");
        assert_eq!(f.series()[1], 20.0);
        assert_eq!(f.fps(), 25.0);
    }
}
