use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::metrics::Parameters;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
}

/// 撮影設定
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    /// フレームレート (Hz)
    #[serde(default = "default_fps")]
    pub fps: f64,
}

/// 標準メトリクスのデフォルトパラメータ
#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    /// ローパスフィルタ次数
    #[serde(default = "default_filter_order")]
    pub lowpass_order: usize,
    /// ローパスカットオフ周波数 (Hz)
    #[serde(default = "default_lowpass_cutoff")]
    pub lowpass_cutoff: f64,
    /// ハイパスフィルタ次数
    #[serde(default = "default_filter_order")]
    pub highpass_order: usize,
    /// ハイパスカットオフ周波数 (Hz)
    #[serde(default = "default_highpass_cutoff")]
    pub highpass_cutoff: f64,
    /// ハイパスのゼロ化閾値
    #[serde(default = "default_zeroing_threshold")]
    pub zeroing_threshold: f64,
}

/// 推論横断のスペクトル平均で使う共通周波数軸
#[derive(Debug, Deserialize, Clone)]
pub struct SpectrumConfig {
    /// 下限周波数 (Hz)
    #[serde(default = "default_spectrum_low")]
    pub low: f64,
    /// 上限周波数 (Hz)
    #[serde(default = "default_spectrum_high")]
    pub high: f64,
    /// ビン幅 (Hz)
    #[serde(default = "default_spectrum_step")]
    pub step: f64,
}

fn default_fps() -> f64 { 25.0 }
fn default_filter_order() -> usize { 4 }
fn default_lowpass_cutoff() -> f64 { 0.5 }
fn default_highpass_cutoff() -> f64 { 10.0 }
fn default_zeroing_threshold() -> f64 { 5.0 }
fn default_spectrum_low() -> f64 { -12.5 }
fn default_spectrum_high() -> f64 { 12.5 }
fn default_spectrum_step() -> f64 { 0.1 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            lowpass_order: default_filter_order(),
            lowpass_cutoff: default_lowpass_cutoff(),
            highpass_order: default_filter_order(),
            highpass_cutoff: default_highpass_cutoff(),
            zeroing_threshold: default_zeroing_threshold(),
        }
    }
}

impl MetricsConfig {
    /// 標準プリセットのローパスフィルタパラメータ
    pub fn lowpass_parameters(&self) -> Parameters {
        Parameters::new()
            .set("Order", self.lowpass_order.to_string())
            .set("Cutoff Freq.", self.lowpass_cutoff.to_string())
    }

    /// 標準プリセットのハイパスフィルタパラメータ
    pub fn highpass_parameters(&self) -> Parameters {
        Parameters::new()
            .set("Order", self.highpass_order.to_string())
            .set("Cutoff Freq.", self.highpass_cutoff.to_string())
            .set("Zeroing Thr.", self.zeroing_threshold.to_string())
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            low: default_spectrum_low(),
            high: default_spectrum_high(),
            step: default_spectrum_step(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルがなければデフォルト値を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }
}
