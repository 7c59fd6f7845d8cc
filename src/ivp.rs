//! An initial value problem: a [`ConstrainedProblem`] paired with a time
//! interval and an initial condition (grounded in
//! `original_source/core/initial_value_problem.py`).

use std::sync::Arc;

use ndarray::ArrayD;

use crate::error::{Error, Result};
use crate::initial_condition::InitialCondition;
use crate::problem::ConstrainedProblem;

/// An optional closed-form solution, used only for convergence checks in
/// tests and examples; never consulted by the solvers themselves.
pub type ExactSolutionFn = Box<dyn Fn(&InitialValueProblem, f64, Option<&ArrayD<f64>>) -> ArrayD<f64> + Send + Sync>;

pub struct InitialValueProblem {
    problem: Arc<ConstrainedProblem>,
    t0: f64,
    t1: f64,
    initial_condition: InitialCondition,
    exact_y: Option<ExactSolutionFn>,
}

impl InitialValueProblem {
    pub fn new(
        problem: Arc<ConstrainedProblem>,
        t0: f64,
        t1: f64,
        initial_condition: InitialCondition,
    ) -> Result<Self> {
        if t1 <= t0 {
            return Err(Error::InvalidParameter(format!(
                "t1 ({t1}) must be greater than t0 ({t0})"
            )));
        }
        Ok(Self {
            problem,
            t0,
            t1,
            initial_condition,
            exact_y: None,
        })
    }

    pub fn with_exact_solution(mut self, exact_y: ExactSolutionFn) -> Self {
        self.exact_y = Some(exact_y);
        self
    }

    pub fn problem(&self) -> &Arc<ConstrainedProblem> {
        &self.problem
    }

    pub fn t_interval(&self) -> (f64, f64) {
        (self.t0, self.t1)
    }

    pub fn initial_condition(&self) -> &InitialCondition {
        &self.initial_condition
    }

    pub fn initial_y(&self, vertex_oriented: bool) -> Result<ArrayD<f64>> {
        self.initial_condition.discrete_y_0(
            self.problem.mesh(),
            self.problem.equation().y_dimension(),
            vertex_oriented,
        )
    }

    pub fn exact_y(&self, t: f64, x: Option<&ArrayD<f64>>) -> Option<ArrayD<f64>> {
        self.exact_y.as_ref().map(|f| f(self, t, x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::equation::DifferentialEquation;
    use crate::mesh::{Axis, CoordinateSystem, Mesh};

    fn sample_ivp() -> InitialValueProblem {
        let mesh = Mesh::new(vec![Axis::new(0.0, 1.0, 0.25).unwrap()], CoordinateSystem::Cartesian).unwrap();
        let equation = DifferentialEquation::diffusion(1, 1.0).unwrap();
        let bc = BoundaryCondition::dirichlet(true, Box::new(|_x, _t| vec![Some(0.0)]));
        let problem = Arc::new(ConstrainedProblem::new(mesh, equation, vec![[Some(bc), None]]).unwrap());
        InitialValueProblem::new(problem, 0.0, 1.0, InitialCondition::Discrete(ArrayD::zeros(vec![5, 1]))).unwrap()
    }

    #[test]
    fn rejects_non_positive_time_interval() {
        let mesh = Mesh::new(vec![Axis::new(0.0, 1.0, 0.25).unwrap()], CoordinateSystem::Cartesian).unwrap();
        let equation = DifferentialEquation::diffusion(1, 1.0).unwrap();
        let problem = Arc::new(ConstrainedProblem::new(mesh, equation, vec![[None, None]]).unwrap());
        let ic = InitialCondition::Discrete(ArrayD::zeros(vec![5, 1]));
        assert!(InitialValueProblem::new(Arc::clone(&problem), 1.0, 1.0, ic).is_err());
    }

    #[test]
    fn initial_y_matches_the_problem_shape() {
        let ivp = sample_ivp();
        assert_eq!(ivp.initial_y(true).unwrap().shape(), ivp.problem().y_vertices_shape());
    }
}
