use thiserror::Error;

/// メトリクス計算のエラー分類
///
/// `Data`: 入力系列が不正（長さ不一致、補間の制御点ゼロ、空系列など）
/// `Parameter`: メトリクスパラメータが不正（次数0、カットオフ≧ナイキストなど）
///
/// どちらも単一メトリクス計算のハードストップ。リトライもログ続行もしない。
/// 集約層はエラーを記録してその特徴量をスキップする。
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("invalid series data: {0}")]
    Data(String),

    #[error("invalid parameter '{name}': {reason}")]
    Parameter { name: String, reason: String },
}

impl MetricError {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetricError>;

/// Run・推論メタデータ永続化のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
