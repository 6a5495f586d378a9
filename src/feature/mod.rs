pub mod builder;
pub mod keypoint;
pub mod series;

pub use builder::{FeatureBuilder, FrameEstimation};
pub use keypoint::{Coord, Keypoint, KeypointIndex};
pub use series::{Feature, NO_ESTIMATION};
