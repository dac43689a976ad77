use crate::{recenter_intrinsics, DirectionDistortion, LfSize, Mat5};
use serde::{Deserialize, Serialize};

/// Light-field camera: 5×5 intrinsic matrix plus optional direction distortion.
///
/// A missing distortion behaves like zero coefficients but is kept distinct so
/// that a model refined without distortion stores none.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LfCameraModel {
    pub intrinsics: Mat5,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distortion: Option<DirectionDistortion>,
}

impl LfCameraModel {
    pub fn new(intrinsics: Mat5, distortion: Option<DirectionDistortion>) -> Self {
        Self {
            intrinsics,
            distortion,
        }
    }

    pub fn without_distortion(intrinsics: Mat5) -> Self {
        Self::new(intrinsics, None)
    }

    /// Copy of the model with its offset column recentered for `size`.
    pub fn recentered(&self, size: &LfSize) -> Self {
        let mut out = self.clone();
        recenter_intrinsics(&mut out.intrinsics, size);
        out
    }
}
