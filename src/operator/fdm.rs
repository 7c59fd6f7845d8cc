use ndarray::{Array, ArrayD, Axis as NdAxis, IxDyn};
use rayon::prelude::*;

use crate::config::JacobiSettings;
use crate::constraint::Constraint;
use crate::differentiator::{select_component_boundary, DerivativeBoundaryConstraints, Differentiator};
use crate::equation::{FieldContext, Lhs, SymbolicEquationSystem};
use crate::error::Result;
use crate::integrator::Integrator;
use crate::ivp::InitialValueProblem;
use crate::mesh::Mesh;
use crate::operator::{step_count, Operator};
use crate::problem::ConstrainedProblem;
use crate::solution::Solution;

/// Solves mesh-based problems by composing [`Differentiator`] (spatial
/// operators, substituted into the symbolic right-hand side) with an
/// [`Integrator`] (the time-stepping rule).
pub struct FdmOperator {
    d_t: f64,
    integrator: Box<dyn Integrator + Send + Sync>,
    jacobi_settings: JacobiSettings,
    vertex_oriented: bool,
}

impl FdmOperator {
    pub fn new(
        d_t: f64,
        integrator: Box<dyn Integrator + Send + Sync>,
        jacobi_settings: JacobiSettings,
        vertex_oriented: bool,
    ) -> Self {
        Self { d_t, integrator, jacobi_settings, vertex_oriented }
    }

    /// Brings every `Y` and `YLaplacian` left-hand-side component of `y`
    /// into algebraic consistency with the current `DyOverDt` state, by
    /// substituting their defining expression directly (`Y`) or solving
    /// the anti-Laplacian problem for it (`YLaplacian`).
    fn synthesize_algebraic_components(
        &self,
        problem: &ConstrainedProblem,
        system: &SymbolicEquationSystem,
        mesh: &Mesh,
        mut y: ArrayD<f64>,
        t: f64,
        d_y_boundary: &DerivativeBoundaryConstraints,
        y_vertex_constraints: &[Constraint],
    ) -> Result<ArrayD<f64>> {
        for index in system.equation_indices_by_type(Lhs::Y) {
            let ctx = FieldContext { y: &y, t, mesh, d_y_boundary };
            let field = system.rhs()[index].eval_field(&ctx)?;
            write_component(&mut y, index, &field);
        }

        for index in system.equation_indices_by_type(Lhs::YLaplacian) {
            let ctx = FieldContext { y: &y, t, mesh, d_y_boundary };
            let target = system.rhs()[index].eval_field(&ctx)?.insert_axis(NdAxis(mesh.rank()));
            let component_boundary = select_component_boundary(d_y_boundary, index);
            let component_constraint = y_vertex_constraints[index].clone();
            let solved = Differentiator::anti_laplacian(
                &target,
                mesh,
                &[component_constraint],
                &component_boundary,
                self.jacobi_settings,
                None,
            )?;
            write_component(&mut y, index, &solved.index_axis(NdAxis(solved.ndim() - 1), 0).to_owned());
        }

        let _ = problem;
        Ok(y)
    }
}

fn write_component(y: &mut ArrayD<f64>, index: usize, field: &ArrayD<f64>) {
    let last = y.ndim() - 1;
    y.index_axis_mut(NdAxis(last), index).assign(field);
}

impl Operator for FdmOperator {
    fn d_t(&self) -> f64 {
        self.d_t
    }

    fn vertex_oriented(&self) -> Option<bool> {
        Some(self.vertex_oriented)
    }

    fn solve(&self, ivp: &InitialValueProblem, parallel_enabled: bool) -> Result<Solution> {
        let problem = ivp.problem().clone();
        let mesh = problem.mesh().clone();
        let system = problem.equation().symbolic_equation_system()?;
        let (t0, t1) = ivp.t_interval();
        let steps = step_count(t0, t1, self.d_t);

        let mut y = ivp.initial_y(self.vertex_oriented)?;
        let d_y_boundary0 = problem.d_y_boundary_vertex_constraints(t0)?;
        let y_constraints0 = problem.y_vertex_constraints(t0)?;
        y = self.synthesize_algebraic_components(&problem, &system, &mesh, y, t0, &d_y_boundary0, &y_constraints0)?;

        let mut snapshots = Vec::with_capacity(steps);
        let mut t = t0;

        let dy_over_dt_indices = system.equation_indices_by_type(Lhs::DyOverDt);

        for _ in 0..steps {
            let d_y_boundary = problem.d_y_boundary_vertex_constraints(t)?;
            let combined_constraint = problem.y_vertex_constraint_combined(t)?;

            let rhs = |eval_t: f64, eval_y: &ArrayD<f64>| -> Result<ArrayD<f64>> {
                let ctx = FieldContext { y: eval_y, t: eval_t, mesh: &mesh, d_y_boundary: &d_y_boundary };
                let mut out = ArrayD::zeros(eval_y.shape());
                let fields: Vec<(usize, ArrayD<f64>)> = if parallel_enabled {
                    dy_over_dt_indices
                        .par_iter()
                        .map(|&i| Ok::<_, crate::error::Error>((i, system.rhs()[i].eval_field(&ctx)?)))
                        .collect::<std::result::Result<Vec<_>, _>>()?
                } else {
                    dy_over_dt_indices
                        .iter()
                        .map(|&i| Ok::<_, crate::error::Error>((i, system.rhs()[i].eval_field(&ctx)?)))
                        .collect::<std::result::Result<Vec<_>, _>>()?
                };
                for (index, field) in fields {
                    write_component(&mut out, index, &field);
                }
                Ok(out)
            };

            y = self.integrator.step(&rhs, t, &y, self.d_t, Some(&combined_constraint))?;
            t += self.d_t;

            let d_y_boundary_next = problem.d_y_boundary_vertex_constraints(t)?;
            let y_constraints_next = problem.y_vertex_constraints(t)?;
            y = self.synthesize_algebraic_components(&problem, &system, &mesh, y, t, &d_y_boundary_next, &y_constraints_next)?;

            snapshots.push(y.clone());
        }

        let time_points: Vec<f64> = (1..=steps).map(|i| t0 + i as f64 * self.d_t).collect();
        let mut full_shape = vec![steps];
        full_shape.extend_from_slice(&y.shape().to_vec());
        let flat: Vec<f64> = snapshots.iter().flat_map(|s| s.iter().copied()).collect();
        let tensor = Array::from_shape_vec(IxDyn(&full_shape), flat).expect("every snapshot shares y's shape");

        Solution::new(problem, time_points, tensor, self.vertex_oriented, self.d_t)
    }
}
