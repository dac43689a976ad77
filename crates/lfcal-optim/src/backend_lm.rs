use crate::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
use lfcal_core::Real;
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};

/// Adapter exposing an [`NllsProblem`] to `levenberg_marquardt`.
///
/// Trial parameters are projected onto the problem's bounds before every
/// evaluation; Jacobian columns of parameters held at a bound are zeroed so
/// the solver stops pushing them outward. Evaluations whose shape disagrees
/// with the problem's declared sizes are reported as failures.
struct LmWrapper<'a, P: NllsProblem> {
    problem: &'a P,
    params: DVector<Real>,
    projected: DVector<Real>,
    verbose: bool,
}

impl<'a, P: NllsProblem> LmWrapper<'a, P> {
    fn new(problem: &'a P, x0: DVector<Real>, verbose: bool) -> Self {
        let mut wrapper = Self {
            problem,
            params: DVector::zeros(0),
            projected: DVector::zeros(0),
            verbose,
        };
        wrapper.set_params(&x0);
        wrapper
    }
}

impl<'a, P: NllsProblem> LeastSquaresProblem<Real, Dyn, Dyn> for LmWrapper<'a, P> {
    type ResidualStorage = Owned<Real, Dyn>;
    type JacobianStorage = Owned<Real, Dyn, Dyn>;
    type ParameterStorage = Owned<Real, Dyn>;

    fn set_params(&mut self, x: &DVector<Real>) {
        self.params.clone_from(x);
        self.projected = match self.problem.bounds() {
            Some(bounds) => bounds.project(x),
            None => x.clone(),
        };
    }

    fn params(&self) -> DVector<Real> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<Real>> {
        let r = self.problem.residuals(&self.projected)?;
        if r.len() != self.problem.num_residuals() {
            log::warn!(
                "problem returned {} residuals, declared {}",
                r.len(),
                self.problem.num_residuals()
            );
            return None;
        }
        if self.verbose {
            log::trace!("lm evaluation: cost = {:.6e}", 0.5 * r.norm_squared());
        }
        Some(r)
    }

    fn jacobian(&self) -> Option<DMatrix<Real>> {
        let mut jac = self.problem.jacobian(&self.projected)?;
        if jac.shape() != (self.problem.num_residuals(), self.problem.num_params()) {
            log::warn!(
                "problem returned a {}x{} Jacobian, declared {}x{}",
                jac.nrows(),
                jac.ncols(),
                self.problem.num_residuals(),
                self.problem.num_params()
            );
            return None;
        }
        for (c, (raw, proj)) in self.params.iter().zip(self.projected.iter()).enumerate() {
            if raw != proj {
                jac.column_mut(c).fill(0.0);
            }
        }
        Some(jac)
    }
}

#[derive(Debug, Default, Clone)]
pub struct LmBackend;

impl NllsSolverBackend for LmBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport) {
        let lm = LevenbergMarquardt::new()
            .with_ftol(opts.ftol)
            .with_xtol(opts.xtol)
            .with_gtol(opts.gtol)
            .with_patience(opts.max_iters.max(1));

        debug_assert_eq!(x0.len(), problem.num_params());
        log::debug!(
            "lm solve: {} parameters, {} residuals",
            problem.num_params(),
            problem.num_residuals()
        );
        let wrapper = LmWrapper::new(problem, x0, opts.verbose);
        let (wrapper, report) = lm.minimize(wrapper);

        (
            wrapper.projected,
            SolveReport {
                evaluations: report.number_of_evaluations,
                final_cost: report.objective_function,
                converged: report.termination.was_successful(),
                termination: format!("{:?}", report.termination),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LmBackend;
    use crate::codec::Bounds;
    use crate::{NllsProblem, NllsSolverBackend, SolveOptions};
    use lfcal_core::Real;
    use nalgebra::{DMatrix, DVector};

    #[derive(Debug)]
    struct OneDimProblem {
        bounds: Option<Bounds>,
        declared_residuals: usize,
    }

    impl OneDimProblem {
        fn new(bounds: Option<Bounds>) -> Self {
            Self {
                bounds,
                declared_residuals: 1,
            }
        }
    }

    impl NllsProblem for OneDimProblem {
        fn num_params(&self) -> usize {
            1
        }

        fn num_residuals(&self) -> usize {
            self.declared_residuals
        }

        fn residuals(&self, x: &DVector<Real>) -> Option<DVector<Real>> {
            Some(DVector::from_element(1, x[0] - 3.0))
        }

        fn jacobian(&self, _x: &DVector<Real>) -> Option<DMatrix<Real>> {
            Some(DMatrix::from_element(1, 1, 1.0))
        }

        fn bounds(&self) -> Option<&Bounds> {
            self.bounds.as_ref()
        }
    }

    #[test]
    fn lm_backend_solves_trivial_problem() {
        let backend = LmBackend;
        let problem = OneDimProblem::new(None);
        let x0 = DVector::from_element(1, 10.0);
        let opts = SolveOptions::default();

        let (x_opt, report) = backend.solve(&problem, x0, &opts);
        let x_final = x_opt[0];

        assert!(
            (x_final - 3.0).abs() < 1e-6,
            "expected optimizer to reach 3.0, got {}",
            x_final
        );
        assert!(
            report.final_cost.abs() < 1e-12,
            "final cost too high: {}",
            report.final_cost
        );
        assert!(
            report.converged,
            "LM backend did not report convergence: {:?}",
            report
        );
        assert!(
            report.evaluations > 0,
            "expected positive evaluations, got {}",
            report.evaluations
        );
    }

    #[test]
    fn lm_backend_stays_inside_bounds() {
        let problem = OneDimProblem::new(Some(Bounds {
            lower: DVector::from_element(1, 5.0),
            upper: DVector::from_element(1, 20.0),
        }));
        let x0 = DVector::from_element(1, 10.0);
        let (x_opt, report) = LmBackend.solve(&problem, x0, &SolveOptions::default());

        assert_eq!(x_opt[0], 5.0, "report: {report:?}");
        assert!((report.final_cost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn residual_count_disagreeing_with_declaration_stops_solver() {
        let problem = OneDimProblem {
            bounds: None,
            declared_residuals: 2,
        };
        let x0 = DVector::from_element(1, 10.0);
        let (x_opt, report) = LmBackend.solve(&problem, x0, &SolveOptions::default());

        assert_eq!(x_opt[0], 10.0);
        assert!(!report.converged, "report: {report:?}");
    }
}
