use std::path::Path;

use csv::Writer;

use crate::aggregate::AggregationRecord;
use crate::error::StoreError;
use crate::metrics::round3;

/// 集約結果のCSVエクスポート
///
/// 1行 = (スコープ, メトリクス表示名, 丸めた値のカンマ結合)。
/// スキップされた特徴量は理由つきで別の行種別として続ける。
pub fn export_summary_csv<P: AsRef<Path>>(
    path: P,
    records: &[(&str, &AggregationRecord)],
) -> Result<(), StoreError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["scope", "metric", "values"])?;

    for (scope, record) in records {
        for (name, entry) in &record.entries {
            let values = entry
                .values
                .iter()
                .map(|&v| round3(v).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            writer.write_record([*scope, name.as_str(), values.as_str()])?;
        }
        for skip in &record.skipped {
            let label = format!("skipped: {} ({})", skip.metric, skip.feature);
            writer.write_record([*scope, label.as_str(), skip.reason.as_str()])?;
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregatedEntry, CombinationMode, SkippedMetric};
    use std::collections::BTreeMap;

    fn sample_record() -> AggregationRecord {
        let mut entries = BTreeMap::new();
        entries.insert(
            "Peaks".to_string(),
            AggregatedEntry {
                modes: vec![CombinationMode::Sum],
                values: vec![3.0],
            },
        );
        entries.insert(
            "Deltas (sum abs/mean/std. deviation)".to_string(),
            AggregatedEntry {
                modes: vec![CombinationMode::Mean; 3],
                values: vec![26.666666, 0.5, 1.23456],
            },
        );
        AggregationRecord {
            entries,
            skipped: vec![SkippedMetric {
                feature: "left_wrist_x".to_string(),
                metric: "Peaks".to_string(),
                reason: "invalid parameter 'Distance': 'abc' is not a number".to_string(),
            }],
        }
    }

    #[test]
    fn test_export_summary_rows() {
        let record = sample_record();
        let path = std::env::temp_dir().join(format!("ascent_csv_{}.csv", std::process::id()));
        export_summary_csv(&path, &[("run 0", &record)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "scope,metric,values");
        // BTreeMapのキー順 (Deltas... が先)
        assert!(lines[1].contains("26.667, 0.5, 1.235"));
        assert!(lines[2].contains("Peaks"));
        assert!(lines[2].contains("3"));
        assert!(lines[3].contains("skipped: Peaks (left_wrist_x)"));
    }
}
