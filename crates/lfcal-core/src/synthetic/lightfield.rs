//! Synthetic light-field scenes: reference camera, poses and exact corners.

use crate::{
    intrinsics_from_free, isometry_from_pose_vector, CalibrationTarget, CheckerObservations,
    Iso3, LfCameraModel, LfSize, ObsToRay, PoseSet, Pt2, Real, Samples5, Vec2, Vec3,
};
use anyhow::{Context, Result};
use nalgebra::{Matrix2, Translation3, UnitQuaternion};

/// Free intrinsic entries of the reference camera, in
/// [`crate::FREE_INTRINSIC_ENTRIES`] order.
///
/// Baseline of 0.4 mm per sub-aperture, 2 mrad per pixel, focused at about
/// 0.4 m.
pub const REFERENCE_FREE_INTRINSICS: [Real; 8] = [
    4.0e-4, -1.0e-3, 4.1e-4, -1.0e-3, -2.0e-6, 2.0e-3, -2.0e-6, 2.05e-3,
];

const MAX_NEWTON_ITERS: usize = 50;
const NEWTON_FD_STEP: Real = 1e-3;

/// Reference camera for `size`, without distortion.
pub fn reference_camera(size: &LfSize) -> LfCameraModel {
    LfCameraModel::without_distortion(intrinsics_from_free(&REFERENCE_FREE_INTRINSICS, size))
}

/// `n` poses placing the target centroid on the optical axis.
///
/// Pose `p` sits at depth `depth + p * depth_step`, tilts by `±tilt` about
/// `x` (alternating), by `p * tilt / 2` about `y` and by `0.05 p` about `z`.
pub fn poses_facing_target(
    target: &CalibrationTarget,
    n: usize,
    depth: Real,
    depth_step: Real,
    tilt: Real,
) -> PoseSet {
    let centroid = target.centroid().coords;
    let isos: Vec<Iso3> = (0..n)
        .map(|p| {
            let pf = p as Real;
            let sign = if p % 2 == 0 { 1.0 } else { -1.0 };
            let rot = UnitQuaternion::from_scaled_axis(Vec3::new(
                sign * tilt,
                0.5 * tilt * pf,
                0.05 * pf,
            ));
            let t = Vec3::new(0.0, 0.0, depth + depth_step * pf) - rot * centroid;
            Iso3::from_parts(Translation3::from(t), rot)
        })
        .collect();
    PoseSet::from_isometries(&isos)
}

/// Sample `(k, l)` in sub-aperture `(i, j)` whose ray passes through `point`
/// (camera frame).
///
/// Newton iteration on the two lateral ray/point offsets at the point's depth,
/// with a central-difference Jacobian. Returns `None` if the iteration is
/// singular or does not converge.
pub fn solve_sample<R: ObsToRay>(
    ray_model: &R,
    camera: &LfCameraModel,
    i: Real,
    j: Real,
    point: &Vec3,
    initial: Pt2,
) -> Option<Pt2> {
    let offset = |kl: &Vec2| -> Vec2 {
        let obs = Samples5::from_column_slice(&[i, j, kl.x, kl.y, 1.0]);
        let ray = ray_model.obs_to_ray(&obs, camera);
        Vec2::new(
            ray[(0, 0)] + ray[(2, 0)] * point.z - point.x,
            ray[(1, 0)] + ray[(3, 0)] * point.z - point.y,
        )
    };

    let mut kl = initial.coords;
    for _ in 0..MAX_NEWTON_ITERS {
        let f = offset(&kl);
        let mut jac = Matrix2::<Real>::zeros();
        for c in 0..2 {
            let mut step = Vec2::zeros();
            step[c] = NEWTON_FD_STEP;
            let col = (offset(&(kl + step)) - offset(&(kl - step))) / (2.0 * NEWTON_FD_STEP);
            jac.set_column(c, &col);
        }
        let delta = jac.try_inverse()? * f;
        kl -= delta;
        if !kl.iter().all(|v| v.is_finite()) {
            return None;
        }
        if delta.norm() <= 1e-12 * (1.0 + kl.norm()) {
            return Some(Pt2::from(kl));
        }
    }
    None
}

/// Exact observations of every target corner in every sub-aperture image.
///
/// The grid covers all `size.i × size.j` sub-apertures, so cells outside a
/// refinement border are populated as well.
pub fn observe_target<R: ObsToRay>(
    ray_model: &R,
    camera: &LfCameraModel,
    size: &LfSize,
    target: &CalibrationTarget,
    poses: &PoseSet,
) -> Result<CheckerObservations> {
    let mut obs = CheckerObservations::new(poses.len(), size.j, size.i);
    let center = size.center_sample();
    let initial = Pt2::new(center[2], center[3]);
    let target_h = target.homogeneous();

    for (p, pose) in poses.iter().enumerate() {
        let in_camera = isometry_from_pose_vector(pose).to_homogeneous() * &target_h;
        for j in 0..size.j {
            for i in 0..size.i {
                let mut corners = Vec::with_capacity(target.len());
                for c in 0..target.len() {
                    let point = in_camera.fixed_view::<3, 1>(0, c).into_owned();
                    let kl = solve_sample(ray_model, camera, i as Real, j as Real, &point, initial)
                        .with_context(|| {
                            format!("corner {c} of pose {p} unreachable from view ({i}, {j})")
                        })?;
                    corners.push(kl);
                }
                obs.set_cell(p, j, i, corners)?;
            }
        }
    }
    log::debug!(
        "synthesized {} corners over {} poses",
        obs.total_corners(),
        poses.len()
    );
    Ok(obs)
}
