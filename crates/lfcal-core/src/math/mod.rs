//! Mathematical utilities and type definitions.
//!
//! This module provides the fundamental types used throughout the workspace
//! and the geometric primitives consumed by the ray models and the residual
//! assembler.

use nalgebra::{
    Isometry3, Matrix3, Matrix3xX, Matrix4, Matrix4xX, Matrix5, Matrix5xX, Point2, Point3,
    Vector2, Vector3, Vector5, Vector6,
};

pub mod geometry;

pub use geometry::{
    isometry_from_pose_vector, point_ray_distance, pose_vector_from_isometry,
    rotation_from_vector,
};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 5D vector with [`Real`] components (homogeneous light-field sample).
pub type Vec5 = Vector5<Real>;
/// 6D vector with [`Real`] components (rotation vector + translation).
pub type Vec6 = Vector6<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 5×5 matrix with [`Real`] entries (light-field intrinsic matrix).
pub type Mat5 = Matrix5<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// 3×N column set of points or directions.
pub type Points3 = Matrix3xX<Real>;
/// 4×N column set (homogeneous points, or `[s, t, u, v]` rays).
pub type Columns4 = Matrix4xX<Real>;
/// 5×N column set of homogeneous light-field samples `[i, j, k, l, 1]`.
pub type Samples5 = Matrix5xX<Real>;
