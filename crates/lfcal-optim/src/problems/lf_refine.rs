//! Light-field calibration refinement by point-to-ray distance minimization.
//!
//! Every complete observation cell `(pose, j, i)` contributes one residual per
//! target corner: the distance between the corner (moved into the camera
//! frame by the pose) and the ray its detection induces. Poses, the free
//! intrinsic entries and optionally the direction distortion are refined
//! jointly with a bounded Levenberg-Marquardt solve.

use crate::codec::Bounds;
use crate::error::RefineError;
use crate::jacobian_fd::GroupedJacobian;
use crate::params::{decode, encode, EncodedModel, FreeParameters, ModelCodec, RefinementPass};
use crate::sparsity::SparsityPattern;
use crate::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
use lfcal_core::{
    isometry_from_pose_vector, point_ray_distance, ray_lines, CalibrationTarget,
    CheckerObservations, Columns4, LfCameraModel, LfSize, ObsToRay, Points3, PoseSet, Real,
    Samples5,
};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Per-corner error of one observation cell.
pub trait ObservationErrorModel {
    /// One non-negative error per column of `obs` (samples `[i, j, k, l, 1]`),
    /// matched with the columns of `target_in_camera`.
    fn observation_errors(
        &self,
        obs: &Samples5,
        camera: &LfCameraModel,
        target_in_camera: &Points3,
    ) -> DVector<Real>;
}

/// Distance between each target corner and the ray of its detection.
#[derive(Debug, Clone, Default)]
pub struct PointRayErrorModel<R: ObsToRay> {
    pub ray_model: R,
}

impl<R: ObsToRay> PointRayErrorModel<R> {
    pub fn new(ray_model: R) -> Self {
        Self { ray_model }
    }
}

impl<R: ObsToRay> ObservationErrorModel for PointRayErrorModel<R> {
    fn observation_errors(
        &self,
        obs: &Samples5,
        camera: &LfCameraModel,
        target_in_camera: &Points3,
    ) -> DVector<Real> {
        let rays = self.ray_model.obs_to_ray(obs, camera);
        let (origins, directions) = ray_lines(&rays);
        point_ray_distance(&origins, &directions, target_in_camera)
    }
}

/// Refinement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    pub lf_size: LfSize,
    /// Sub-apertures skipped at each edge of the `(i, j)` grid.
    pub border: usize,
    /// Corner grid of the target, `[cols, rows]`.
    pub expected_checker_size: [usize; 2],
    pub pass: RefinementPass,
    pub solve: SolveOptions,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            lf_size: LfSize::default(),
            border: 1,
            expected_checker_size: [19, 19],
            pass: RefinementPass::default(),
            solve: SolveOptions::default(),
        }
    }
}

impl RefineConfig {
    /// Corners in one complete cell.
    pub fn expected_corners(&self) -> usize {
        self.expected_checker_size[0] * self.expected_checker_size[1]
    }

    /// Interior range along `i`.
    pub fn i_range(&self) -> Range<usize> {
        self.border..self.lf_size.i.saturating_sub(self.border)
    }

    /// Interior range along `j`.
    pub fn j_range(&self) -> Range<usize> {
        self.border..self.lf_size.j.saturating_sub(self.border)
    }
}

/// Residuals and, on request, their Jacobian sparsity.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub residuals: DVector<Real>,
    pub sparsity: Option<SparsityPattern>,
}

#[derive(Debug, Clone)]
struct Cell {
    pose: usize,
    samples: Samples5,
}

/// Evaluates the residual vector of a parameter vector.
///
/// Complete cells of the interior range are collected once, in
/// `(pose, j, i)` order; cells whose corner count differs from the expected
/// checker size are skipped. Construction fails with
/// [`RefineError::InvalidInput`] if the configuration does not fit the
/// observation grid or the target.
pub struct ResidualAssembler<'a, M: ObservationErrorModel> {
    error_model: &'a M,
    codec: &'a ModelCodec,
    target_h: Columns4,
    cells: Vec<Cell>,
    pose_columns: Vec<Vec<usize>>,
    expected_total: usize,
    num_params: usize,
}

impl<'a, M: ObservationErrorModel> ResidualAssembler<'a, M> {
    pub fn new(
        error_model: &'a M,
        observations: &CheckerObservations,
        target: &CalibrationTarget,
        encoded: &'a EncodedModel,
        config: &RefineConfig,
    ) -> Result<Self, RefineError> {
        check_layout(observations, target, config)?;

        let expected = config.expected_corners();
        let mut cells = Vec::new();
        let mut expected_total = 0;
        for pose in 0..observations.num_poses() {
            for j in config.j_range() {
                for i in config.i_range() {
                    let count = observations.count(pose, j, i).map_err(invalid_input)?;
                    expected_total += count;
                    if count == expected {
                        cells.push(Cell {
                            pose,
                            samples: observations
                                .homogeneous_cell(pose, j, i)
                                .map_err(invalid_input)?,
                        });
                    }
                }
            }
        }

        let pose_columns = (0..observations.num_poses())
            .map(|p| {
                encoded
                    .sensitivity
                    .iter()
                    .enumerate()
                    .filter(|(_, scope)| scope.affects(p))
                    .map(|(c, _)| c)
                    .collect()
            })
            .collect();

        Ok(Self {
            error_model,
            codec: &encoded.codec,
            target_h: target.homogeneous(),
            cells,
            pose_columns,
            expected_total,
            num_params: encoded.x0.len(),
        })
    }

    /// Sum of corner counts over every cell of the interior range, complete or not.
    pub fn expected_total(&self) -> usize {
        self.expected_total
    }

    /// Number of residuals emitted per evaluation.
    pub fn emitted_total(&self) -> usize {
        self.cells.iter().map(|c| c.samples.ncols()).sum()
    }

    /// Structural Jacobian pattern; independent of the parameter values.
    pub fn sparsity_pattern(&self) -> SparsityPattern {
        let mut pattern = SparsityPattern::new(self.num_params);
        for cell in &self.cells {
            pattern.push_rows(cell.samples.ncols(), &self.pose_columns[cell.pose]);
        }
        pattern
    }

    /// Residuals at `x`.
    ///
    /// Returns an empty vector when no cell is complete. Fails when the
    /// emitted residual count differs from [`ResidualAssembler::expected_total`].
    pub fn assemble(&self, x: &DVector<Real>, want_sparsity: bool) -> Result<Assembled, RefineError> {
        let sparsity = want_sparsity.then(|| self.sparsity_pattern());
        let emitted = self.emitted_total();
        if emitted == 0 {
            return Ok(Assembled {
                residuals: DVector::zeros(0),
                sparsity,
            });
        }
        if emitted != self.expected_total {
            return Err(RefineError::ObservationCountMismatch {
                expected: self.expected_total,
                actual: emitted,
            });
        }

        let (poses, camera) = decode(x, self.codec)?;

        let mut residuals = Vec::with_capacity(self.expected_total);
        let mut current: Option<(usize, Points3)> = None;
        for cell in &self.cells {
            if current.as_ref().map_or(true, |(p, _)| *p != cell.pose) {
                let pose = poses.get(cell.pose).ok_or_else(|| {
                    RefineError::InvalidInput(format!("pose {} missing from parameters", cell.pose))
                })?;
                let in_camera = isometry_from_pose_vector(pose).to_homogeneous() * &self.target_h;
                current = Some((cell.pose, in_camera.fixed_rows::<3>(0).into_owned()));
            }
            if let Some((_, points)) = &current {
                let errors = self
                    .error_model
                    .observation_errors(&cell.samples, &camera, points);
                residuals.extend(errors.iter().copied());
            }
        }

        debug_assert_eq!(residuals.len(), emitted);
        Ok(Assembled {
            residuals: DVector::from_vec(residuals),
            sparsity,
        })
    }
}

/// Sum of squared errors and RMSE of a residual vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub sse: Real,
    pub rmse: Real,
    pub num_residuals: usize,
}

impl ErrorStats {
    pub fn from_residuals(r: &DVector<Real>) -> Self {
        let sse = r.norm_squared();
        let rmse = if r.is_empty() {
            0.0
        } else {
            (sse / r.len() as Real).sqrt()
        };
        Self {
            sse,
            rmse,
            num_residuals: r.len(),
        }
    }
}

struct RefinementProblem<'a, M: ObservationErrorModel> {
    assembler: &'a ResidualAssembler<'a, M>,
    jacobian: GroupedJacobian,
    bounds: &'a Bounds,
    num_residuals: usize,
}

impl<'a, M: ObservationErrorModel> NllsProblem for RefinementProblem<'a, M> {
    fn num_params(&self) -> usize {
        self.bounds.len()
    }

    fn num_residuals(&self) -> usize {
        self.num_residuals
    }

    fn residuals(&self, x: &DVector<Real>) -> Option<DVector<Real>> {
        match self.assembler.assemble(x, false) {
            Ok(a) => Some(a.residuals),
            Err(e) => {
                log::warn!("residual evaluation failed: {e}");
                None
            }
        }
    }

    fn jacobian(&self, x: &DVector<Real>) -> Option<DMatrix<Real>> {
        let r0 = self.residuals(x)?;
        self.jacobian
            .evaluate(|xp| self.residuals(xp), x, &r0, Some(self.bounds))
    }

    fn bounds(&self) -> Option<&Bounds> {
        Some(self.bounds)
    }
}

/// Inputs of [`refine`].
#[derive(Debug, Clone, Copy)]
pub struct RefineInput<'a> {
    pub camera: &'a LfCameraModel,
    pub poses: &'a PoseSet,
    pub observations: &'a CheckerObservations,
    pub target: &'a CalibrationTarget,
}

/// Refined model, solver report and error statistics.
#[derive(Debug, Clone)]
pub struct RefineOutput {
    pub camera: LfCameraModel,
    pub poses: PoseSet,
    pub report: SolveReport,
    pub start: ErrorStats,
    pub finish: ErrorStats,
}

fn invalid_input(err: impl std::fmt::Display) -> RefineError {
    RefineError::InvalidInput(err.to_string())
}

fn validate(input: &RefineInput<'_>) -> Result<(), RefineError> {
    if input.poses.is_empty() {
        return Err(invalid_input("no poses to refine"));
    }
    if input.observations.num_poses() != input.poses.len() {
        return Err(invalid_input(format!(
            "{} poses but observations for {}",
            input.poses.len(),
            input.observations.num_poses()
        )));
    }
    Ok(())
}

/// Observation grid, interior range and target size against `config`.
fn check_layout(
    obs: &CheckerObservations,
    target: &CalibrationTarget,
    config: &RefineConfig,
) -> Result<(), RefineError> {
    let invalid = |msg: String| Err(invalid_input(msg));
    if obs.cols() != config.lf_size.i || obs.rows() != config.lf_size.j {
        return invalid(format!(
            "observation grid {}x{} (i x j) does not match light field size {}x{}",
            obs.cols(),
            obs.rows(),
            config.lf_size.i,
            config.lf_size.j
        ));
    }
    if config.i_range().is_empty() || config.j_range().is_empty() {
        return invalid(format!(
            "border {} leaves no sub-apertures in a {}x{} grid",
            config.border, config.lf_size.i, config.lf_size.j
        ));
    }
    if target.len() != config.expected_corners() {
        return invalid(format!(
            "target has {} points, checker size {:?} implies {}",
            target.len(),
            config.expected_checker_size,
            config.expected_corners()
        ));
    }
    Ok(())
}

/// Refine poses and camera parameters of one pass.
///
/// Fails with [`RefineError::NoValidObservations`] before solving if no cell
/// of the interior range is complete.
pub fn refine<R: ObsToRay, B: NllsSolverBackend>(
    input: &RefineInput<'_>,
    config: &RefineConfig,
    ray_model: R,
    backend: &B,
) -> Result<RefineOutput, RefineError> {
    validate(input)?;

    let mut camera = input.camera.clone();
    let free = FreeParameters::select(config.pass, &mut camera);
    let encoded = encode(input.poses, &camera, &free, &config.lf_size)?;
    encoded
        .bounds
        .validate()
        .map_err(invalid_input)?;

    let error_model = PointRayErrorModel::new(ray_model);
    let assembler = ResidualAssembler::new(
        &error_model,
        input.observations,
        input.target,
        &encoded,
        config,
    )?;

    let initial = assembler.assemble(&encoded.x0, true)?;
    if initial.residuals.is_empty() {
        return Err(RefineError::NoValidObservations);
    }
    let pattern = initial
        .sparsity
        .unwrap_or_else(|| assembler.sparsity_pattern());
    let start = ErrorStats::from_residuals(&initial.residuals);

    let jacobian = GroupedJacobian::new(&pattern, &encoded.x0);
    log::debug!(
        "refine ({:?}): {} parameters, {} residuals, {} non-zeros, {} column groups",
        config.pass,
        encoded.x0.len(),
        start.num_residuals,
        pattern.nnz(),
        jacobian.num_groups()
    );

    let problem = RefinementProblem {
        assembler: &assembler,
        jacobian,
        bounds: &encoded.bounds,
        num_residuals: start.num_residuals,
    };
    let (x, report) = backend.solve(&problem, encoded.x0.clone(), &config.solve);
    if !report.converged {
        log::warn!(
            "solver stopped without convergence after {} evaluations: {}",
            report.evaluations,
            report.termination
        );
    }

    let finish = ErrorStats::from_residuals(&assembler.assemble(&x, false)?.residuals);
    let (poses, camera) = decode(&x, &encoded.codec)?;
    log::info!(
        "start SSE {:.6e} m^2, RMSE {:.6e} m",
        start.sse,
        start.rmse
    );
    log::info!(
        "finish SSE {:.6e} m^2, RMSE {:.6e} m",
        finish.sse,
        finish.rmse
    );

    Ok(RefineOutput {
        camera,
        poses,
        report,
        start,
        finish,
    })
}
