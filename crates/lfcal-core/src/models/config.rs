use serde::{Deserialize, Serialize};

use super::{FreeIntrinH, ObsToRay};
use crate::{Columns4, LfCameraModel, Samples5};

/// Serializable choice of ray model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RayModel {
    #[default]
    FreeIntrinH,
}

impl RayModel {
    pub fn build(&self) -> AnyRayModel {
        match self {
            RayModel::FreeIntrinH => AnyRayModel::FreeIntrinH(FreeIntrinH),
        }
    }
}

#[derive(Clone, Debug)]
pub enum AnyRayModel {
    FreeIntrinH(FreeIntrinH),
}

impl ObsToRay for AnyRayModel {
    fn obs_to_ray(&self, obs: &Samples5, camera: &LfCameraModel) -> Columns4 {
        match self {
            AnyRayModel::FreeIntrinH(m) => m.obs_to_ray(obs, camera),
        }
    }
}
