use lfcal_core::{DirectionDistortion, LfCameraModel, FREE_INTRINSIC_ENTRIES};
use serde::{Deserialize, Serialize};

/// Which distortion coefficients a refinement pass optimizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementPass {
    /// Intrinsics and poses only; any existing distortion stays fixed.
    #[default]
    WithoutDistortion,
    /// Intrinsics, poses and all five distortion coefficients.
    WithDistortion,
}

/// Parameters of the camera model exposed to the optimizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeParameters {
    /// Intrinsic matrix entries `(row, col)`.
    pub intrinsics: Vec<(usize, usize)>,
    /// Indices into `[b1, b2, k1, k2, k3]`.
    pub distortion: Vec<usize>,
}

impl FreeParameters {
    /// Select the free parameters of `pass`.
    ///
    /// When distortion becomes free on a model without one, zero coefficients
    /// are installed on `camera`.
    pub fn select(pass: RefinementPass, camera: &mut LfCameraModel) -> Self {
        let distortion = match pass {
            RefinementPass::WithoutDistortion => Vec::new(),
            RefinementPass::WithDistortion => {
                camera
                    .distortion
                    .get_or_insert_with(DirectionDistortion::zeros);
                (0..DirectionDistortion::DIM).collect()
            }
        };
        Self {
            intrinsics: FREE_INTRINSIC_ENTRIES.to_vec(),
            distortion,
        }
    }

    /// Number of free camera scalars.
    pub fn len(&self) -> usize {
        self.intrinsics.len() + self.distortion.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lfcal_core::{intrinsics_from_free, LfSize};

    fn camera() -> LfCameraModel {
        let size = LfSize::new(5, 5, 64, 64);
        LfCameraModel::without_distortion(intrinsics_from_free(&[1.0; 8], &size))
    }

    #[test]
    fn without_distortion_leaves_camera_alone() {
        let mut cam = camera();
        let free = FreeParameters::select(RefinementPass::WithoutDistortion, &mut cam);
        assert_eq!(free.intrinsics.len(), 8);
        assert!(free.distortion.is_empty());
        assert_eq!(cam, camera());
    }

    #[test]
    fn with_distortion_installs_zero_coefficients() {
        let mut cam = camera();
        let free = FreeParameters::select(RefinementPass::WithDistortion, &mut cam);
        assert_eq!(free.len(), 13);
        assert_eq!(cam.distortion, Some(DirectionDistortion::zeros()));

        let existing = DirectionDistortion::from_array([0.1, 0.2, 0.3, 0.4, 0.5]);
        cam.distortion = Some(existing);
        FreeParameters::select(RefinementPass::WithDistortion, &mut cam);
        assert_eq!(cam.distortion, Some(existing));
    }
}
