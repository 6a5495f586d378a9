use serde::{Deserialize, Serialize};

/// 描画系列の種別。描画側がスタイル決定に使う分類で、計算には影響しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlottableKind {
    /// 生の特徴量系列
    Feature,
    /// 連続値の派生メトリクス（折れ線）
    ContinuousMetric,
    /// 離散点のメトリクス（マーカーのみ、ピークや欠損位置など）
    DiscreteMetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dashed,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    None,
    Circle,
    Cross,
}

/// チャート描画層へ渡す純粋な (step, value) 系列とスタイルヒント
///
/// 描画ロジックは一切持たない。steps はFFTでは周波数になるためf64。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plottable {
    pub name: String,
    pub steps: Vec<f64>,
    pub values: Vec<f64>,
    pub line_style: LineStyle,
    pub marker: Marker,
    pub marker_size: f64,
    pub line_width: f64,
    pub legend: String,
    pub kind: PlottableKind,
    pub step_plot: bool,
    pub log_x_axis: bool,
    pub log_y_axis: bool,
}

impl Plottable {
    /// 折れ線系列
    pub fn line(
        name: impl Into<String>,
        steps: Vec<f64>,
        values: Vec<f64>,
        legend: impl Into<String>,
        kind: PlottableKind,
    ) -> Self {
        Self {
            name: name.into(),
            steps,
            values,
            line_style: LineStyle::Solid,
            marker: Marker::None,
            marker_size: 10.0,
            line_width: 1.5,
            legend: legend.into(),
            kind,
            step_plot: false,
            log_x_axis: false,
            log_y_axis: false,
        }
    }

    /// マーカーのみの離散点系列
    pub fn points(
        name: impl Into<String>,
        steps: Vec<f64>,
        values: Vec<f64>,
        marker: Marker,
        marker_size: f64,
        legend: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            steps,
            values,
            line_style: LineStyle::None,
            marker,
            marker_size,
            line_width: 1.5,
            legend: legend.into(),
            kind: PlottableKind::DiscreteMetric,
            step_plot: false,
            log_x_axis: false,
            log_y_axis: false,
        }
    }
}

/// usize ステップ列を描画用のf64列へ
pub fn steps_as_f64(steps: &[usize]) -> Vec<f64> {
    steps.iter().map(|&s| s as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_defaults() {
        let p = Plottable::line(
            "left_wrist_x",
            vec![0.0, 1.0],
            vec![10.0, 20.0],
            "left_wrist_x",
            PlottableKind::Feature,
        );
        assert_eq!(p.line_style, LineStyle::Solid);
        assert_eq!(p.marker, Marker::None);
        assert_eq!(p.line_width, 1.5);
        assert!(!p.step_plot);
        assert!(!p.log_y_axis);
    }

    #[test]
    fn test_points_are_discrete() {
        let p = Plottable::points(
            "Peaks",
            vec![3.0],
            vec![7.0],
            Marker::Circle,
            6.0,
            "Peaks",
        );
        assert_eq!(p.kind, PlottableKind::DiscreteMetric);
        assert_eq!(p.line_style, LineStyle::None);
        assert_eq!(p.marker_size, 6.0);
    }

    #[test]
    fn test_steps_as_f64() {
        assert_eq!(steps_as_f64(&[0, 2, 5]), vec![0.0, 2.0, 5.0]);
    }
}
