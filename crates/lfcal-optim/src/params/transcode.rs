use super::FreeParameters;
use crate::codec::{flatten, flatten_bounds, Bounds, ParamBundle, ParamLayout};
use crate::error::CodecError;
use lfcal_core::{recenter_intrinsics, LfCameraModel, LfSize, PoseSet, Real, Vec6};
use nalgebra::{DMatrix, DVector};

pub const POSES_BLOCK: &str = "poses";
pub const INTRINSICS_BLOCK: &str = "intrinsics";
pub const DISTORTION_BLOCK: &str = "distortion";

/// Which residuals a parameter can influence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamScope {
    /// Camera parameters: every residual.
    Shared,
    /// Extrinsics of one pose: that pose's residuals only.
    Pose(usize),
}

impl ParamScope {
    /// Numeric tag: 0 for shared, `p + 1` for pose `p`.
    pub fn tag(self) -> usize {
        match self {
            ParamScope::Shared => 0,
            ParamScope::Pose(p) => p + 1,
        }
    }

    /// Whether residuals of `pose` depend on this parameter.
    pub fn affects(self, pose: usize) -> bool {
        match self {
            ParamScope::Shared => true,
            ParamScope::Pose(p) => p == pose,
        }
    }
}

/// Everything needed to map a parameter vector back to a model.
///
/// Carries the camera the vector was encoded from: fixed entries are taken
/// from it on every decode.
#[derive(Clone, Debug)]
pub struct ModelCodec {
    pub layout: ParamLayout,
    pub free: FreeParameters,
    pub base_camera: LfCameraModel,
    pub lf_size: LfSize,
}

/// Result of [`encode`].
#[derive(Clone, Debug)]
pub struct EncodedModel {
    pub x0: DVector<Real>,
    pub sensitivity: DVector<ParamScope>,
    pub bounds: Bounds,
    pub codec: ModelCodec,
}

impl EncodedModel {
    pub fn layout(&self) -> &ParamLayout {
        &self.codec.layout
    }
}

/// Encode poses and the free camera parameters into a flat vector.
pub fn encode(
    poses: &PoseSet,
    camera: &LfCameraModel,
    free: &FreeParameters,
    lf_size: &LfSize,
) -> Result<EncodedModel, CodecError> {
    let n = poses.len();
    let coeffs = camera.distortion.unwrap_or_default().to_array();

    let values = ParamBundle::new()
        .with(POSES_BLOCK, poses.to_matrix())
        .with(
            INTRINSICS_BLOCK,
            DMatrix::from_iterator(
                free.intrinsics.len(),
                1,
                free.intrinsics.iter().map(|&(r, c)| camera.intrinsics[(r, c)]),
            ),
        )
        .with(
            DISTORTION_BLOCK,
            DMatrix::from_iterator(
                free.distortion.len(),
                1,
                free.distortion.iter().map(|&d| coeffs[d]),
            ),
        );
    let (x0, layout) = flatten(&values);

    let scopes = ParamBundle::new()
        .with(POSES_BLOCK, DMatrix::from_fn(n, 6, |p, _| ParamScope::Pose(p)))
        .with(
            INTRINSICS_BLOCK,
            DMatrix::from_element(free.intrinsics.len(), 1, ParamScope::Shared),
        )
        .with(
            DISTORTION_BLOCK,
            DMatrix::from_element(free.distortion.len(), 1, ParamScope::Shared),
        );
    let sensitivity = layout.flatten(&scopes)?;

    let unbounded = (Real::NEG_INFINITY, Real::INFINITY);
    let limits = ParamBundle::new()
        .with(POSES_BLOCK, DMatrix::from_element(n, 6, unbounded))
        .with(
            INTRINSICS_BLOCK,
            DMatrix::from_element(free.intrinsics.len(), 1, unbounded),
        )
        .with(
            DISTORTION_BLOCK,
            DMatrix::from_element(free.distortion.len(), 1, unbounded),
        );
    let bounds = flatten_bounds(&limits, &layout)?;

    Ok(EncodedModel {
        x0,
        sensitivity,
        bounds,
        codec: ModelCodec {
            layout,
            free: free.clone(),
            base_camera: camera.clone(),
            lf_size: *lf_size,
        },
    })
}

fn column_block<'a>(
    bundle: &'a ParamBundle<Real>,
    name: &str,
    len: usize,
) -> Result<&'a DMatrix<Real>, CodecError> {
    let block = bundle.require(name)?;
    if block.len() != len {
        return Err(CodecError::ShapeMismatch {
            expected: len,
            actual: block.len(),
        });
    }
    Ok(block)
}

/// Decode a parameter vector into poses and a recentered camera model.
pub fn decode(x: &DVector<Real>, codec: &ModelCodec) -> Result<(PoseSet, LfCameraModel), CodecError> {
    let bundle = codec.layout.unflatten(x)?;

    let pose_block = bundle.require(POSES_BLOCK)?;
    if pose_block.ncols() != 6 {
        return Err(CodecError::BlockMismatch {
            index: 0,
            expected: format!("{POSES_BLOCK} Nx6"),
            found: format!("{POSES_BLOCK} {}x{}", pose_block.nrows(), pose_block.ncols()),
        });
    }
    let poses = PoseSet::new(
        pose_block
            .row_iter()
            .map(|row| Vec6::from_iterator(row.iter().copied()))
            .collect(),
    );

    let mut camera = codec.base_camera.clone();
    let intrinsics = column_block(&bundle, INTRINSICS_BLOCK, codec.free.intrinsics.len())?;
    for (&(r, c), &v) in codec.free.intrinsics.iter().zip(intrinsics.iter()) {
        camera.intrinsics[(r, c)] = v;
    }

    let distortion = column_block(&bundle, DISTORTION_BLOCK, codec.free.distortion.len())?;
    if !codec.free.distortion.is_empty() {
        let mut coeffs = camera.distortion.unwrap_or_default().to_array();
        for (&d, &v) in codec.free.distortion.iter().zip(distortion.iter()) {
            coeffs[d] = v;
        }
        camera.distortion = Some(lfcal_core::DirectionDistortion::from_array(coeffs));
    }

    recenter_intrinsics(&mut camera.intrinsics, &codec.lf_size);
    Ok((poses, camera))
}
