use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::{
    aggregate_records, aggregate_summaries, AggregationRecord, SkippedMetric,
};
use crate::error::StoreError;
use crate::feature::KeypointIndex;
use crate::metrics::{
    Deltas, Fft, MetricRecord, MetricSummary, MissingPoseEstimations, Parameters, Peaks,
};
use crate::run::{ComputedMetric, Run};

const METADATA_FILE: &str = "metadata.json";

/// ラン完了時に計算する標準メトリクススイート
///
/// 顔キーポイントを除く全特徴量に対して Missing Pose Estimations、
/// Deltas、Peaks をデフォルトパラメータで計算する。フィルタ・FFT・
/// 瞬時周波数は対話的にパラメータを与えて計算するためここには
/// 含めない。失敗した特徴量はスキップして理由を記録する。
pub struct StandardMetrics;

impl StandardMetrics {
    pub fn calculate(run: &mut Run) -> Vec<SkippedMetric> {
        let mut skipped = Vec::new();
        let mut computed = Vec::new();
        let parameters = Parameters::new();

        for feature in &mut run.features {
            if is_excluded(&feature.name) {
                continue;
            }

            if feature.values_interp.is_none() {
                if let Err(err) = feature.interpolate_values() {
                    warn!(feature = %feature.name, %err, "interpolation failed, skipping feature");
                    skipped.push(SkippedMetric {
                        feature: feature.name.clone(),
                        metric: "interpolation".to_string(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            }

            match MissingPoseEstimations::calculate(feature) {
                Ok(metric) => computed.push(ComputedMetric {
                    feature_name: feature.name.clone(),
                    record: MetricRecord::MissingPoseEstimations(metric),
                }),
                Err(err) => {
                    warn!(feature = %feature.name, %err, "missing-estimation metric skipped");
                    skipped.push(SkippedMetric {
                        feature: feature.name.clone(),
                        metric: "Missing Pose Estimations".to_string(),
                        reason: err.to_string(),
                    });
                }
            }

            computed.push(ComputedMetric {
                feature_name: feature.name.clone(),
                record: MetricRecord::Deltas(Deltas::calculate(feature)),
            });

            match Peaks::calculate(feature, &parameters) {
                Ok(metric) => computed.push(ComputedMetric {
                    feature_name: feature.name.clone(),
                    record: MetricRecord::Peaks(metric),
                }),
                Err(err) => {
                    warn!(feature = %feature.name, %err, "peak metric skipped");
                    skipped.push(SkippedMetric {
                        feature: feature.name.clone(),
                        metric: "Peaks".to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        debug!(
            run = run.id,
            metrics = computed.len(),
            skipped = skipped.len(),
            "standard metric suite computed"
        );
        run.metrics.extend(computed);
        skipped
    }
}

fn is_excluded(feature_name: &str) -> bool {
    KeypointIndex::from_feature_name(feature_name)
        .map_or(false, |keypoint| keypoint.excluded_from_metrics())
}

/// ラン内の各特徴量の振幅スペクトル
///
/// 補間済み系列を持つ特徴量だけを対象にする。除外キーポイントや
/// 補間に失敗した特徴量はセンチネル値を含んだままなので、スペクトル
/// には入れない。
pub fn run_spectra(run: &Run) -> Vec<Fft> {
    run.features
        .iter()
        .filter(|f| f.values_interp.is_some())
        .filter_map(|f| Fft::calculate(f, &Parameters::new()).ok())
        .collect()
}

/// ラン単位の集約
pub fn aggregate_run(run: &Run, skipped: Vec<SkippedMetric>) -> AggregationRecord {
    let summaries: Vec<MetricSummary> =
        run.metrics.iter().map(|m| m.record.summary()).collect();
    aggregate_summaries(&summaries, skipped)
}

/// 推論メタデータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub detection_model: String,
    pub pose_model: String,
    pub timestamp: DateTime<Utc>,
}

/// 1つの検出+姿勢推定構成でまとめて処理したランの束
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub metadata: InferenceMetadata,
    pub runs: Vec<Run>,
}

impl Inference {
    pub fn new(metadata: InferenceMetadata) -> Self {
        Self {
            metadata,
            runs: Vec::new(),
        }
    }

    /// メタデータと全ランをディレクトリから読む
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        let file = File::open(dir.join(METADATA_FILE))?;
        let metadata: InferenceMetadata = serde_json::from_reader(BufReader::new(file))?;

        let mut run_paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_run_file = path.extension().map_or(false, |ext| ext == "json")
                && path.file_name().map_or(false, |name| name != METADATA_FILE);
            if is_run_file {
                run_paths.push(path);
            }
        }
        run_paths.sort();

        let mut runs = Vec::with_capacity(run_paths.len());
        for path in run_paths {
            runs.push(Run::load(path)?);
        }

        Ok(Self { metadata, runs })
    }

    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<(), StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let file = File::create(dir.join(METADATA_FILE))?;
        serde_json::to_writer(BufWriter::new(file), &self.metadata)?;

        for run in &self.runs {
            run.save(dir.join(format!("run_{:02}.json", run.id)))?;
        }
        Ok(())
    }

    pub fn run(&self, id: u32) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == id)
    }

    /// 推論単位の集約: 各ランの集約結果にもう一度同じ合成を適用する
    pub fn aggregate(&self) -> AggregationRecord {
        let per_run: Vec<AggregationRecord> = self
            .runs
            .iter()
            .map(|run| aggregate_run(run, Vec::new()))
            .collect();
        let refs: Vec<&AggregationRecord> = per_run.iter().collect();
        aggregate_records(&refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;

    fn run_with_features(id: u32, specs: &[(&str, &[f64])]) -> Run {
        let mut run = Run::new(id);
        for (name, values) in specs {
            let mut f = Feature::new(*name, 25.0);
            for (i, &v) in values.iter().enumerate() {
                let score = if v < 0.0 { -1.0 } else { 0.9 };
                f.add(i, v, score);
            }
            run.features.push(f);
        }
        run
    }

    #[test]
    fn test_standard_suite_covers_non_excluded_features() {
        let mut run = run_with_features(
            0,
            &[
                ("left_wrist_x", &[10.0, 12.0, 11.0, 13.0]),
                ("nose_x", &[5.0, 5.0, 5.0, 5.0]),
            ],
        );
        let skipped = StandardMetrics::calculate(&mut run);
        assert!(skipped.is_empty());
        // 顔キーポイントは除外され、残る1特徴量に3メトリクス
        assert_eq!(run.metrics.len(), 3);
        assert!(run
            .metrics
            .iter()
            .all(|m| m.feature_name == "left_wrist_x"));
    }

    #[test]
    fn test_standard_suite_interpolates_lazily() {
        let mut run = run_with_features(0, &[("left_wrist_x", &[10.0, -1.0, 30.0])]);
        assert!(run.features[0].values_interp.is_none());
        StandardMetrics::calculate(&mut run);
        assert_eq!(
            run.features[0].values_interp.as_ref().unwrap()[1],
            20.0
        );
    }

    #[test]
    fn test_standard_suite_skips_all_missing_feature() {
        let mut run = run_with_features(
            0,
            &[
                ("left_wrist_x", &[-1.0, -1.0, -1.0]),
                ("right_wrist_x", &[1.0, 2.0, 3.0]),
            ],
        );
        let skipped = StandardMetrics::calculate(&mut run);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].feature, "left_wrist_x");
        assert_eq!(skipped[0].metric, "interpolation");
        // 他の特徴量は影響を受けない
        assert_eq!(run.metrics.len(), 3);
    }

    #[test]
    fn test_run_spectra_skips_features_without_interpolation() {
        let mut run = run_with_features(
            0,
            &[
                ("left_wrist_x", &[10.0, 12.0, -1.0, 13.0, 11.0]),
                ("right_wrist_x", &[-1.0, -1.0, -1.0, -1.0, -1.0]),
                ("nose_x", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            ],
        );
        StandardMetrics::calculate(&mut run);
        // 全欠損の特徴量と除外キーポイントは補間済み系列を持たない
        let spectra = run_spectra(&run);
        assert_eq!(spectra.len(), 1);
        // スペクトルは補間済み系列から計算される（センチネルを含まない）
        let dc_index = spectra[0]
            .steps
            .iter()
            .position(|&f| f == 0.0)
            .unwrap();
        let interp_mean = run.features[0]
            .values_interp
            .as_ref()
            .unwrap()
            .iter()
            .sum::<f64>()
            / 5.0;
        assert!((spectra[0].values[dc_index] - 2.0 * interp_mean).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_run_combines_peak_counts() {
        let mut run = run_with_features(
            0,
            &[
                ("left_wrist_x", &[0.0, 1.0, 0.0, 1.0, 0.0]),
                ("right_wrist_x", &[0.0, 2.0, 0.0]),
            ],
        );
        let skipped = StandardMetrics::calculate(&mut run);
        let record = aggregate_run(&run, skipped);
        // 3 + 1 ピーク
        assert_eq!(record.entries["Peaks"].values, vec![4.0]);
    }

    #[test]
    fn test_inference_round_trip_and_aggregation() {
        let mut run_a = run_with_features(0, &[("left_wrist_x", &[0.0, 1.0, 0.0])]);
        let mut run_b = run_with_features(1, &[("left_wrist_x", &[0.0, 1.0, 0.0, 1.0, 0.0])]);
        StandardMetrics::calculate(&mut run_a);
        StandardMetrics::calculate(&mut run_b);

        let mut inference = Inference::new(InferenceMetadata {
            id: "inf_01".to_string(),
            name: "baseline".to_string(),
            description: "test batch".to_string(),
            detection_model: "det-model".to_string(),
            pose_model: "pose-model".to_string(),
            timestamp: Utc::now(),
        });
        inference.runs.push(run_a);
        inference.runs.push(run_b);

        let dir = std::env::temp_dir().join(format!("ascent_inf_{}", std::process::id()));
        inference.save(&dir).unwrap();
        let loaded = Inference::load(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, inference);

        // 推論集約: ピーク数はラン横断の和 1 + 3 = 4
        let record = loaded.aggregate();
        assert_eq!(record.entries["Peaks"].values, vec![4.0]);
    }

    #[test]
    fn test_run_lookup_by_id() {
        let mut inference = Inference::new(InferenceMetadata {
            id: "inf_02".to_string(),
            name: "lookup".to_string(),
            description: String::new(),
            detection_model: String::new(),
            pose_model: String::new(),
            timestamp: Utc::now(),
        });
        inference.runs.push(Run::new(7));
        assert!(inference.run(7).is_some());
        assert!(inference.run(8).is_none());
    }
}
