use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SpectrumConfig;
use crate::metrics::{Fft, MetricSummary};

/// 表示値をキーポイント間・ラン間で合成するときの規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationMode {
    /// スコープ内で加算
    Sum,
    /// 加算して件数で割る
    Mean,
    /// 代表1件の値をそのまま使う（特徴量間で同値になる統計用）
    SingleSum,
}

/// 集約から除外されたメトリクスの記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedMetric {
    pub feature: String,
    pub metric: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEntry {
    pub modes: Vec<CombinationMode>,
    pub values: Vec<f64>,
}

/// ラン単位・推論単位の集約結果
///
/// 計算に失敗した特徴量は結果から抜くだけでなく `skipped` に理由ごと
/// 残す。集約自体は失敗したメトリクスがあっても中断しない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationRecord {
    pub entries: BTreeMap<String, AggregatedEntry>,
    pub skipped: Vec<SkippedMetric>,
}

/// 表示値ベクトルの集合をモード列に従って1本に合成する
///
/// モード列と長さの合わない（または空の）ベクトルは黙って除外する。
/// 使えるベクトルが1つもなければ `None`。
pub fn combine_values(modes: &[CombinationMode], value_sets: &[&[f64]]) -> Option<Vec<f64>> {
    let usable: Vec<&[f64]> = value_sets
        .iter()
        .copied()
        .filter(|set| set.len() == modes.len() && !set.is_empty())
        .collect();
    if usable.is_empty() {
        return None;
    }

    let combined = modes
        .iter()
        .enumerate()
        .map(|(j, mode)| match mode {
            CombinationMode::Sum => usable.iter().map(|set| set[j]).sum(),
            CombinationMode::Mean => {
                usable.iter().map(|set| set[j]).sum::<f64>() / usable.len() as f64
            }
            CombinationMode::SingleSum => usable[0][j],
        })
        .collect();
    Some(combined)
}

/// ラン単位の集約: 特徴量ごとのサマリーを表示名でまとめて合成する
pub fn aggregate_summaries(
    summaries: &[MetricSummary],
    skipped: Vec<SkippedMetric>,
) -> AggregationRecord {
    let mut grouped: BTreeMap<String, (Vec<CombinationMode>, Vec<Vec<f64>>)> = BTreeMap::new();
    for summary in summaries {
        if summary.display_modes.is_empty() {
            continue;
        }
        let entry = grouped
            .entry(summary.display_name.clone())
            .or_insert_with(|| (summary.display_modes.clone(), Vec::new()));
        entry.1.push(summary.display_values.clone());
    }

    let mut entries = BTreeMap::new();
    for (name, (modes, sets)) in grouped {
        let set_refs: Vec<&[f64]> = sets.iter().map(|s| s.as_slice()).collect();
        match combine_values(&modes, &set_refs) {
            Some(values) => {
                entries.insert(name, AggregatedEntry { modes, values });
            }
            None => {
                warn!(metric = %name, "no usable display values, dropping from aggregation");
            }
        }
    }

    AggregationRecord { entries, skipped }
}

/// 推論単位の集約: ランごとの集約済みベクトルに同じ合成をもう一度
/// 適用する。Mean はラン平均の平均になる。
pub fn aggregate_records(records: &[&AggregationRecord]) -> AggregationRecord {
    let mut grouped: BTreeMap<String, (Vec<CombinationMode>, Vec<Vec<f64>>)> = BTreeMap::new();
    let mut skipped = Vec::new();

    for record in records {
        skipped.extend(record.skipped.iter().cloned());
        for (name, entry) in &record.entries {
            let slot = grouped
                .entry(name.clone())
                .or_insert_with(|| (entry.modes.clone(), Vec::new()));
            slot.1.push(entry.values.clone());
        }
    }

    let mut entries = BTreeMap::new();
    for (name, (modes, sets)) in grouped {
        let set_refs: Vec<&[f64]> = sets.iter().map(|s| s.as_slice()).collect();
        if let Some(values) = combine_values(&modes, &set_refs) {
            entries.insert(name, AggregatedEntry { modes, values });
        }
    }

    AggregationRecord { entries, skipped }
}

/// 特徴量横断の平均スペクトル
///
/// 共通周波数軸の最近傍ビンへ各特徴量のスペクトルを独立に振り分けて
/// 積算し、特徴量数で割る。
pub fn average_spectrum(spectra: &[&Fft], config: &SpectrumConfig) -> (Vec<f64>, Vec<f64>) {
    let bins = ((config.high - config.low) / config.step).round() as usize + 1;
    let freqs: Vec<f64> = (0..bins).map(|i| config.low + i as f64 * config.step).collect();
    let mut accumulated = vec![0.0; bins];

    if spectra.is_empty() {
        return (freqs, accumulated);
    }

    for fft in spectra {
        for (&freq, &magnitude) in fft.steps.iter().zip(&fft.values) {
            let index = ((freq - config.low) / config.step).round();
            let index = index.clamp(0.0, (bins - 1) as f64) as usize;
            accumulated[index] += magnitude;
        }
    }

    for value in &mut accumulated {
        *value /= spectra.len() as f64;
    }
    (freqs, accumulated)
}
