use serde::{Deserialize, Serialize};

/// COCO 17 キーポイントインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

/// キーポイント座標軸 (画像X/Y)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coord {
    X,
    Y,
}

impl Coord {
    pub const ALL: [Coord; 2] = [Coord::X, Coord::Y];

    pub fn suffix(&self) -> &'static str {
        match self {
            Coord::X => "x",
            Coord::Y => "y",
        }
    }
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    pub const ALL: [KeypointIndex; Self::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// 特徴量名 (例: "left_wrist_x")
    pub fn feature_name(&self, coord: Coord) -> String {
        format!("{}_{}", self.name(), coord.suffix())
    }

    /// メトリクス計算から除外するキーポイント
    /// 顔のキーポイントは登攀動作の解析に寄与しないため除外する
    pub fn excluded_from_metrics(&self) -> bool {
        matches!(
            self,
            Self::Nose | Self::LeftEye | Self::RightEye | Self::LeftEar | Self::RightEar
        )
    }

    /// 特徴量名からキーポイントを逆引き（"_x"/"_y" を除いた部分で照合）
    pub fn from_feature_name(feature_name: &str) -> Option<Self> {
        let base = feature_name
            .strip_suffix("_x")
            .or_else(|| feature_name.strip_suffix("_y"))?;
        Self::ALL.into_iter().find(|k| k.name() == base)
    }
}

/// 単一フレームの単一キーポイント推定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// X座標 (ピクセル)
    pub x: f64,
    /// Y座標 (ピクセル)
    pub y: f64,
    /// 信頼度スコア (0.0〜1.0)
    pub score: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, score: f64) -> Self {
        Self { x, y, score }
    }

    pub fn coord(&self, coord: Coord) -> f64 {
        match coord {
            Coord::X => self.x,
            Coord::Y => self.y,
        }
    }
}
