use serde::{Deserialize, Serialize};

use crate::error::{MetricError, Result};
use crate::signal::interp::interp_linear;

/// 姿勢推定なしを表すセンチネル値
/// value と score の両方がこの値のとき「そのフレームに推定なし」
pub const NO_ESTIMATION: f64 = -1.0;

/// 単一ランにおける単一キーポイント座標の時系列
///
/// 不変条件: `steps`/`values`/`scores` は同じ長さ、`steps` は0始まりの
/// 狭義単調増加。`interpolate_values` 後は読み取り専用として扱う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub steps: Vec<usize>,
    pub values: Vec<f64>,
    pub scores: Vec<f64>,
    /// 欠損補間済みの系列。`interpolate_values` を呼ぶまで `None`
    pub values_interp: Option<Vec<f64>>,
    /// 撮影フレームレート (Hz)
    pub fps: f64,
}

impl Feature {
    pub fn new(name: impl Into<String>, fps: f64) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            values: Vec::new(),
            scores: Vec::new(),
            values_interp: None,
            fps,
        }
    }

    /// フレームを末尾に追加する。step の単調増加は呼び出し側の責務。
    pub fn add(&mut self, step: usize, value: f64, score: f64) {
        self.steps.push(step);
        self.values.push(value);
        self.scores.push(score);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 推定なしフレームのインデックス（系列内位置）
    pub fn missing_positions(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == NO_ESTIMATION)
            .map(|(i, _)| i)
            .collect()
    }

    /// センチネル値を線形補間で埋めた系列を `values_interp` に書き込む
    ///
    /// 有効値が1つもない場合は `DataError`。有効な値は変更しない。
    pub fn interpolate_values(&mut self) -> Result<()> {
        if self.steps.len() != self.values.len() || self.values.len() != self.scores.len() {
            return Err(MetricError::data(format!(
                "feature '{}': steps/values/scores length mismatch ({}/{}/{})",
                self.name,
                self.steps.len(),
                self.values.len(),
                self.scores.len()
            )));
        }

        let missing = self.missing_positions();
        if missing.is_empty() {
            self.values_interp = Some(self.values.clone());
            return Ok(());
        }

        // 制御点: センチネルでない (step, value) の組
        let mut control_x = Vec::with_capacity(self.values.len() - missing.len());
        let mut control_y = Vec::with_capacity(self.values.len() - missing.len());
        for (i, value) in self.values.iter().enumerate() {
            if *value != NO_ESTIMATION {
                control_x.push(self.steps[i] as f64);
                control_y.push(*value);
            }
        }

        if control_x.is_empty() {
            return Err(MetricError::data(format!(
                "feature '{}': all values missing, nothing to interpolate from",
                self.name
            )));
        }

        let mut interp = self.values.clone();
        for &pos in &missing {
            interp[pos] = interp_linear(self.steps[pos] as f64, &control_x, &control_y);
        }
        self.values_interp = Some(interp);
        Ok(())
    }

    /// メトリクス計算に使う系列（補間済みがあればそちら）
    pub fn metric_values(&self) -> &[f64] {
        self.values_interp.as_deref().unwrap_or(&self.values)
    }
}
