//! The time-parallel predictor-corrector coordinator: a cheap coarse
//! [`Operator`] `G` keeps every sub-interval roughly in sync while an
//! expensive fine `Operator` `F` refines each sub-interval independently,
//! the two combined by the Parareal update rule.

use std::sync::Arc;

use ndarray::{concatenate, ArrayD, Axis as NdAxis};
use rayon::prelude::*;

use crate::collective::Collective;
use crate::config::PararealSettings;
use crate::error::{Error, Result};
use crate::initial_condition::InitialCondition;
use crate::ivp::InitialValueProblem;
use crate::operator::Operator;
use crate::solution::Solution;

pub struct Parareal<F: Operator, G: Operator> {
    fine: F,
    coarse: G,
    settings: PararealSettings,
}

impl<F: Operator, G: Operator> Parareal<F, G> {
    pub fn new(fine: F, coarse: G, settings: PararealSettings) -> Self {
        Self { fine, coarse, settings }
    }

    /// Builds the sub-interval IVP handed to one operator, reorienting
    /// `y_start` (held in the shared `vertex_oriented` convention) to
    /// whatever orientation that operator natively expects.
    fn sub_ivp_for(
        &self,
        ivp: &InitialValueProblem,
        t_start: f64,
        t_end: f64,
        y_start: &ArrayD<f64>,
        shared_vertex_oriented: bool,
        operator_vertex_oriented: Option<bool>,
    ) -> Result<InitialValueProblem> {
        let target = operator_vertex_oriented.unwrap_or(shared_vertex_oriented);
        let reoriented = crate::solution::reorient_y(ivp.problem().mesh(), y_start, shared_vertex_oriented, target);
        InitialValueProblem::new(Arc::clone(ivp.problem()), t_start, t_end, InitialCondition::Discrete(reoriented))
    }

    /// One full coarse sweep of every sub-interval, sequential since
    /// `Y_k` depends on `Y_{k-1}`. Returns the end-state of each
    /// sub-interval (`Y_0 .. Y_{W-1}`).
    fn coarse_sweep(
        &self,
        ivp: &InitialValueProblem,
        boundaries: &[f64],
        y0: &ArrayD<f64>,
        parallel_enabled: bool,
        vertex_oriented: bool,
    ) -> Result<Vec<ArrayD<f64>>> {
        let mut ends = Vec::with_capacity(boundaries.len() - 1);
        let mut input = y0.clone();
        for k in 0..boundaries.len() - 1 {
            let sub_ivp = self.sub_ivp_for(
                ivp,
                boundaries[k],
                boundaries[k + 1],
                &input,
                vertex_oriented,
                self.coarse.vertex_oriented(),
            )?;
            let solution = self.coarse.solve(&sub_ivp, parallel_enabled)?;
            let end = solution.final_y(vertex_oriented);
            input = end.clone();
            ends.push(end);
        }
        Ok(ends)
    }
}

impl<F: Operator, G: Operator> Operator for Parareal<F, G> {
    fn d_t(&self) -> f64 {
        self.fine.d_t()
    }

    fn vertex_oriented(&self) -> Option<bool> {
        self.fine.vertex_oriented()
    }

    fn solve(&self, ivp: &InitialValueProblem, parallel_enabled: bool) -> Result<Solution> {
        let (t0, t1) = ivp.t_interval();
        let workers = self.settings.workers.max(1);
        let sub_len = (t1 - t0) / workers as f64;
        let boundaries: Vec<f64> = (0..=workers).map(|k| t0 + k as f64 * sub_len).collect();
        let vertex_oriented = self.fine.vertex_oriented().or(self.coarse.vertex_oriented()).unwrap_or(true);

        let y0 = ivp.initial_y(vertex_oriented)?;

        // n = 0: purely serial coarse sweep seeds both Y and the G
        // baseline the first real iteration corrects against.
        let mut y_states = self.coarse_sweep(ivp, &boundaries, &y0, parallel_enabled, vertex_oriented)?;
        let mut g_prev = y_states.clone();

        let collective = Collective::<ArrayD<f64>>::new(workers);

        for _ in 1..=self.settings.max_iterations {
            let inputs: Vec<ArrayD<f64>> = std::iter::once(y0.clone())
                .chain(y_states.iter().take(workers - 1).cloned())
                .collect();

            let fine_ends: Vec<ArrayD<f64>> = std::thread::scope(|scope| -> Result<Vec<ArrayD<f64>>> {
                let handles: Vec<_> = (0..workers)
                    .map(|rank| {
                        let collective = Arc::clone(&collective);
                        let sub_ivp = self.sub_ivp_for(
                            ivp,
                            boundaries[rank],
                            boundaries[rank + 1],
                            &inputs[rank],
                            vertex_oriented,
                            self.fine.vertex_oriented(),
                        );
                        scope.spawn(move || -> Result<Vec<ArrayD<f64>>> {
                            let sub_ivp = sub_ivp?;
                            let solution = self.fine.solve(&sub_ivp, parallel_enabled)?;
                            let end = solution.final_y(vertex_oriented);
                            Ok(collective.all_gather(rank, end))
                        })
                    })
                    .collect();
                // Every rank's all_gather returns the identical, fully
                // ordered vector; rank 0's is as good as any.
                let mut gathered = None;
                for handle in handles {
                    let result = handle.join().expect("fine-solve worker thread panicked")?;
                    gathered.get_or_insert(result);
                }
                Ok(gathered.expect("at least one worker runs"))
            })?;

            for end in &fine_ends {
                if end.iter().any(|v| !v.is_finite()) {
                    return Err(Error::Divergence { sub_interval: None });
                }
            }

            // The corrector sweep is inherently sequential: `G_k^{n+1}`
            // must start from `Y_{k-1}^{n+1}`, the *already corrected*
            // state, not the previous iteration's.
            let mut new_y_states = Vec::with_capacity(workers);
            let mut new_g = Vec::with_capacity(workers);
            let mut max_diff = 0.0_f64;
            let mut corrected_input = y0.clone();
            for k in 0..workers {
                let sub_ivp = self.sub_ivp_for(
                    ivp,
                    boundaries[k],
                    boundaries[k + 1],
                    &corrected_input,
                    vertex_oriented,
                    self.coarse.vertex_oriented(),
                )?;
                let g_k_new = self.coarse.solve(&sub_ivp, parallel_enabled)?.final_y(vertex_oriented);
                let corrected = &g_k_new + &fine_ends[k] - &g_prev[k];
                let diff = (&corrected - &y_states[k]).mapv(f64::abs).fold(0.0_f64, |acc, &v| acc.max(v));
                max_diff = max_diff.max(diff);
                corrected_input = corrected.clone();
                new_y_states.push(corrected);
                new_g.push(g_k_new);
            }

            y_states = new_y_states;
            g_prev = new_g;

            if max_diff < self.settings.tolerance {
                break;
            }
        }

        // Final stitch: one more fine pass per sub-interval, started
        // from the converged Y states, kept as full trajectories.
        let final_inputs: Vec<ArrayD<f64>> =
            std::iter::once(y0.clone()).chain(y_states.iter().take(workers - 1).cloned()).collect();
        let sub_solutions: Vec<Solution> = if parallel_enabled {
            (0..workers)
                .into_par_iter()
                .map(|k| -> Result<Solution> {
                    let sub_ivp = self.sub_ivp_for(
                        ivp,
                        boundaries[k],
                        boundaries[k + 1],
                        &final_inputs[k],
                        vertex_oriented,
                        self.fine.vertex_oriented(),
                    )?;
                    self.fine.solve(&sub_ivp, parallel_enabled)
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..workers)
                .map(|k| -> Result<Solution> {
                    let sub_ivp = self.sub_ivp_for(
                        ivp,
                        boundaries[k],
                        boundaries[k + 1],
                        &final_inputs[k],
                        vertex_oriented,
                        self.fine.vertex_oriented(),
                    )?;
                    self.fine.solve(&sub_ivp, parallel_enabled)
                })
                .collect::<Result<Vec<_>>>()?
        };

        let mut time_points = Vec::new();
        let mut tensors = Vec::with_capacity(workers);
        for sub in &sub_solutions {
            time_points.extend_from_slice(sub.time_points());
            tensors.push(sub.discrete_y(vertex_oriented));
        }
        let views: Vec<_> = tensors.iter().map(|t| t.view()).collect();
        let stitched = concatenate(NdAxis(0), &views).expect("every sub-solution shares the same spatial shape");

        Solution::new(Arc::clone(ivp.problem()), time_points, stitched, vertex_oriented, self.fine.d_t())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::equation::DifferentialEquation;
    use crate::integrator::{ForwardEuler, Rk4};
    use crate::mesh::{Axis, CoordinateSystem, Mesh};
    use crate::operator::{FdmOperator, OdeOperator};
    use crate::problem::ConstrainedProblem;

    fn ode_ivp() -> (Arc<ConstrainedProblem>, InitialValueProblem) {
        let mesh = Mesh::point();
        let equation = DifferentialEquation::population_growth(0.5).unwrap();
        let problem = Arc::new(ConstrainedProblem::new(mesh, equation, vec![]).unwrap());
        let ic = InitialCondition::Discrete(ArrayD::from_elem(vec![1], 2.0));
        let ivp = InitialValueProblem::new(Arc::clone(&problem), 0.0, 1.0, ic).unwrap();
        (problem, ivp)
    }

    #[test]
    fn parareal_matches_serial_fine_solve_for_a_scalar_ode() {
        let (_problem, ivp) = ode_ivp();
        let fine = OdeOperator::new(0.01, Box::new(Rk4));
        let coarse = OdeOperator::new(0.1, Box::new(ForwardEuler));
        let settings = PararealSettings { tolerance: 1e-6, max_iterations: 8, workers: 2 };
        let parareal = Parareal::new(fine, coarse, settings);
        let parareal_solution = parareal.solve(&ivp, false).unwrap();

        let serial_fine = OdeOperator::new(0.01, Box::new(Rk4));
        let serial_solution = serial_fine.solve(&ivp, false).unwrap();

        let diff = parareal_solution.diff(&serial_solution).unwrap();
        assert!(diff.iter().all(|&d| d < 1e-3));
    }

    #[test]
    fn fdm_solves_multi_component_wave_equation() {
        // Regression test: Wave has y_dimension == 2 (displacement and
        // velocity), so its Laplacian(0) term exercises the derivative
        // boundary constraint plumbing with a y_dimension > 1 equation.
        let mesh = Mesh::new(vec![Axis::new(0.0, 1.0, 0.25).unwrap()], CoordinateSystem::Cartesian).unwrap();
        let equation = DifferentialEquation::wave(1, 1.0).unwrap();
        let bc = BoundaryCondition::dirichlet(true, Box::new(|_x, _t| vec![Some(0.0), None]));
        let problem = Arc::new(ConstrainedProblem::new(mesh, equation, vec![[Some(bc), None]]).unwrap());

        let n_vertices = problem.mesh().vertex_shape()[0];
        let initial: Vec<f64> = (0..n_vertices)
            .flat_map(|i| {
                let x = i as f64 * 0.25;
                vec![(std::f64::consts::PI * x).sin(), 0.0]
            })
            .collect();
        let ic = InitialCondition::Discrete(ArrayD::from_shape_vec(vec![n_vertices, 2], initial).unwrap());
        let ivp = InitialValueProblem::new(Arc::clone(&problem), 0.0, 0.1, ic).unwrap();

        let operator = FdmOperator::new(0.01, Box::new(ForwardEuler), Default::default(), true);
        let solution = operator.solve(&ivp, false).unwrap();

        assert_eq!(solution.time_points().len(), 10);
        assert!(solution.raw_discrete_y().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn parareal_reports_divergence_on_non_finite_fine_output() {
        let mesh = Mesh::new(vec![Axis::new(0.0, 1.0, 0.25).unwrap()], CoordinateSystem::Cartesian).unwrap();
        let equation = DifferentialEquation::diffusion(1, 1.0).unwrap();
        let bc = BoundaryCondition::dirichlet(true, Box::new(|_x, _t| vec![Some(0.0)]));
        let problem = Arc::new(ConstrainedProblem::new(mesh, equation, vec![[Some(bc), None]]).unwrap());
        let ic = InitialCondition::Discrete(ArrayD::from_elem(vec![5, 1], f64::NAN));
        let ivp = InitialValueProblem::new(Arc::clone(&problem), 0.0, 1.0, ic).unwrap();

        let fine = FdmOperator::new(0.01, Box::new(ForwardEuler), Default::default(), true);
        let coarse = FdmOperator::new(0.05, Box::new(ForwardEuler), Default::default(), true);
        let settings = PararealSettings { tolerance: 1e-6, max_iterations: 2, workers: 2 };
        let parareal = Parareal::new(fine, coarse, settings);
        assert!(matches!(parareal.solve(&ivp, false), Err(Error::Divergence { .. })));
    }
}
