use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::feature::Feature;
use crate::metrics::MetricRecord;

/// フレームごとの検出バウンディングボックス (ピクセル)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 特徴量1本に対するメトリクス計算結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedMetric {
    pub feature_name: String,
    pub record: MetricRecord,
}

/// 1回の登攀試技
///
/// フレーム列に対する全Feature、検出ボックス、スコア、計算済み
/// メトリクスを持つ。JSONで保存・復元でき、系列（メトリクスの派生
/// 配列を含む）はラウンドトリップで完全に一致する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: u32,
    pub features: Vec<Feature>,
    /// フレームごとの検出ボックス。検出なしフレームは `None`
    pub bboxes: Vec<Option<BoundingBox>>,
    pub detection_scores: Vec<f64>,
    pub pose_estimation_scores: Vec<f64>,
    pub metrics: Vec<ComputedMetric>,
}

impl Run {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            features: Vec::new(),
            bboxes: Vec::new(),
            detection_scores: Vec::new(),
            pose_estimation_scores: Vec::new(),
            metrics: Vec::new(),
        }
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let run = serde_json::from_reader(BufReader::new(file))?;
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Deltas, MissingPoseEstimations, Parameters, Peaks};

    fn sample_run() -> Run {
        let mut run = Run::new(3);
        let mut feature = Feature::new("left_wrist_x", 25.0);
        for (i, &v) in [100.0, 102.0, -1.0, -1.0, 110.0, 112.0, 111.0].iter().enumerate() {
            let score = if v < 0.0 { -1.0 } else { 0.9 };
            feature.add(i, v, score);
        }
        feature.interpolate_values().unwrap();

        run.metrics.push(ComputedMetric {
            feature_name: feature.name.clone(),
            record: MetricRecord::Deltas(Deltas::calculate(&feature)),
        });
        run.metrics.push(ComputedMetric {
            feature_name: feature.name.clone(),
            record: MetricRecord::Peaks(
                Peaks::calculate(&feature, &Parameters::new()).unwrap(),
            ),
        });
        run.metrics.push(ComputedMetric {
            feature_name: feature.name.clone(),
            record: MetricRecord::MissingPoseEstimations(
                MissingPoseEstimations::calculate(&feature).unwrap(),
            ),
        });

        run.features.push(feature);
        run.bboxes.push(Some(BoundingBox {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 200.0,
        }));
        run.bboxes.push(None);
        run.detection_scores.push(0.95);
        run.pose_estimation_scores.push(0.88);
        run
    }

    #[test]
    fn test_save_load_round_trip() {
        let run = sample_run();
        let path = std::env::temp_dir().join(format!("ascent_run_{}.json", std::process::id()));
        run.save(&path).unwrap();
        let loaded = Run::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // 補間済み系列とメトリクス派生配列を含めて完全一致
        assert_eq!(run, loaded);
        // 104.666... のような循環小数もビット単位で復元される
        let saved = run.features[0].values_interp.as_ref().unwrap();
        let restored = loaded.features[0].values_interp.as_ref().unwrap();
        for (a, b) in saved.iter().zip(restored) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(Run::load("/nonexistent/run_00.json").is_err());
    }

    #[test]
    fn test_feature_lookup_by_name() {
        let run = sample_run();
        assert!(run.feature("left_wrist_x").is_some());
        assert!(run.feature("right_wrist_x").is_none());
    }
}
