use crate::feature::keypoint::{Coord, Keypoint, KeypointIndex};
use crate::feature::series::{Feature, NO_ESTIMATION};

/// 1フレーム分の姿勢推定結果
/// `None` はそのフレームで人物検出がなかったことを表す
pub type FrameEstimation = Option<[Keypoint; KeypointIndex::COUNT]>;

/// 姿勢推定結果パーサとの境界
///
/// フレームごとのキーポイント出力から、キーポイント座標ごとに1本の
/// Feature を構築する。検出なしフレームはリスト欠落ではなく
/// `(-1, -1)` のセンチネル対として必ず現れる。
pub struct FeatureBuilder {
    features: Vec<Feature>,
    next_step: usize,
}

impl FeatureBuilder {
    pub fn new(fps: f64) -> Self {
        let mut features = Vec::with_capacity(KeypointIndex::COUNT * 2);
        for keypoint in KeypointIndex::ALL {
            for coord in Coord::ALL {
                features.push(Feature::new(keypoint.feature_name(coord), fps));
            }
        }
        Self {
            features,
            next_step: 0,
        }
    }

    /// フレームを1つ追加する。フレーム順に呼ぶこと。
    pub fn push_frame(&mut self, estimation: &FrameEstimation) {
        let step = self.next_step;
        self.next_step += 1;

        let mut slot = 0;
        for (kp_idx, _) in KeypointIndex::ALL.iter().enumerate() {
            for coord in Coord::ALL {
                let feature = &mut self.features[slot];
                slot += 1;
                match estimation {
                    Some(keypoints) => {
                        let kp = &keypoints[kp_idx];
                        feature.add(step, kp.coord(coord), kp.score);
                    }
                    None => feature.add(step, NO_ESTIMATION, NO_ESTIMATION),
                }
            }
        }
    }

    /// 全Featureを取り出す（キーポイント順、座標 x, y の順）
    pub fn finish(self) -> Vec<Feature> {
        self.features
    }
}
