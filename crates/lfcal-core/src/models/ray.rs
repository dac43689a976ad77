use crate::{Columns4, LfCameraModel, Points3, Samples5, Vec2};

/// Maps homogeneous light-field samples to rays.
pub trait ObsToRay {
    /// Convert the 5×K samples `[i, j, k, l, 1]` into 4×K rays `[s, t, u, v]`.
    fn obs_to_ray(&self, obs: &Samples5, camera: &LfCameraModel) -> Columns4;
}

/// Ray model with a free 5×5 intrinsic matrix followed by the camera's
/// direction distortion (if any).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreeIntrinH;

impl ObsToRay for FreeIntrinH {
    fn obs_to_ray(&self, obs: &Samples5, camera: &LfCameraModel) -> Columns4 {
        let rays = camera.intrinsics * obs;
        let mut out: Columns4 = rays.fixed_rows::<4>(0).into_owned();
        if let Some(dist) = &camera.distortion {
            for mut col in out.column_iter_mut() {
                let d = dist.apply(&Vec2::new(col[2], col[3]));
                col[2] = d.x;
                col[3] = d.y;
            }
        }
        out
    }
}

/// Split 4×K rays `[s, t, u, v]` into origins `(s, t, 0)` and directions
/// `(u, v, 1)`.
pub fn ray_lines(rays: &Columns4) -> (Points3, Points3) {
    let k = rays.ncols();
    let mut origins = Points3::zeros(k);
    let mut directions = Points3::zeros(k);
    for c in 0..k {
        origins[(0, c)] = rays[(0, c)];
        origins[(1, c)] = rays[(1, c)];
        directions[(0, c)] = rays[(2, c)];
        directions[(1, c)] = rays[(3, c)];
        directions[(2, c)] = 1.0;
    }
    (origins, directions)
}
