//! Rigid-motion and point/ray geometry.

use super::{Iso3, Mat3, Points3, Real, Vec3, Vec6};
use nalgebra::{DVector, Rotation3, Translation3, UnitQuaternion};

/// Rotation matrix of an axis-angle vector; `|v|` is the angle in radians.
///
/// A zero vector yields the identity.
pub fn rotation_from_vector(v: &Vec3) -> Mat3 {
    Rotation3::from_scaled_axis(*v).into_inner()
}

/// Rigid transform of a pose vector `[rx, ry, rz, tx, ty, tz]`.
pub fn isometry_from_pose_vector(pose: &Vec6) -> Iso3 {
    let rot = Rotation3::from_matrix_unchecked(rotation_from_vector(&Vec3::new(
        pose[0], pose[1], pose[2],
    )));
    Iso3::from_parts(
        Translation3::new(pose[3], pose[4], pose[5]),
        UnitQuaternion::from_rotation_matrix(&rot),
    )
}

/// Pose vector `[rx, ry, rz, tx, ty, tz]` of a rigid transform.
pub fn pose_vector_from_isometry(iso: &Iso3) -> Vec6 {
    let r = iso.rotation.scaled_axis();
    let t = iso.translation.vector;
    Vec6::new(r.x, r.y, r.z, t.x, t.y, t.z)
}

/// Distance from each point to the line through the matching origin along the
/// matching direction: `|(p - o) × d| / |d|`.
///
/// Columns are paired one-to-one and the result has one entry per column.
/// A zero-length direction degenerates to the point-to-origin distance.
pub fn point_ray_distance(
    origins: &Points3,
    directions: &Points3,
    points: &Points3,
) -> DVector<Real> {
    debug_assert_eq!(origins.ncols(), directions.ncols());
    debug_assert_eq!(origins.ncols(), points.ncols());

    let distances = origins
        .column_iter()
        .zip(directions.column_iter())
        .zip(points.column_iter())
        .map(|((o, d), p)| {
            let op: Vec3 = p - o;
            let d_norm = d.norm();
            if d_norm > 0.0 {
                op.cross(&d).norm() / d_norm
            } else {
                op.norm()
            }
        });
    DVector::from_iterator(points.ncols(), distances)
}
