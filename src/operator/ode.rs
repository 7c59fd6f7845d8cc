use ndarray::{arr1, Array2, ArrayD};

use crate::equation::Expr;
use crate::error::Result;
use crate::integrator::Integrator;
use crate::ivp::InitialValueProblem;
use crate::operator::{step_count, Operator};
use crate::solution::Solution;

/// Solves `x_dimension == 0` problems: a flat state vector, no mesh, no
/// spatial operators.
pub struct OdeOperator {
    d_t: f64,
    integrator: Box<dyn Integrator + Send + Sync>,
}

impl OdeOperator {
    pub fn new(d_t: f64, integrator: Box<dyn Integrator + Send + Sync>) -> Self {
        Self { d_t, integrator }
    }
}

impl Operator for OdeOperator {
    fn d_t(&self) -> f64 {
        self.d_t
    }

    fn solve(&self, ivp: &InitialValueProblem, _parallel_enabled: bool) -> Result<Solution> {
        let (t0, t1) = ivp.t_interval();
        let steps = step_count(t0, t1, self.d_t);
        let y0 = ivp.initial_y(true)?;
        let y_dim = *y0.shape().last().unwrap();
        let rhs_exprs = ivp.problem().equation().symbolic_equation_system()?.rhs().to_vec();

        let mut y = y0.into_raw_vec();
        let mut trajectory = Array2::zeros((steps, y_dim));

        let rhs = |t: f64, y: &ArrayD<f64>| -> Result<ArrayD<f64>> {
            let flat = y.as_slice().expect("ODE state is always contiguous");
            let mut out = vec![0.0; flat.len()];
            for (i, expr) in rhs_exprs.iter().enumerate() {
                out[i] = eval(expr, flat, t)?;
            }
            Ok(ArrayD::from_shape_vec(y.shape(), out).expect("shape preserved"))
        };

        let mut t = t0;
        for step in 0..steps {
            let y_tensor = ArrayD::from_shape_vec(vec![y_dim], y.clone()).expect("y_dim matches state length");
            let next = self.integrator.step(&rhs, t, &y_tensor, self.d_t, None)?;
            y = next.into_raw_vec();
            t += self.d_t;
            trajectory.row_mut(step).assign(&arr1(&y));
        }

        let time_points: Vec<f64> = (1..=steps).map(|i| t0 + i as f64 * self.d_t).collect();
        Solution::new(ivp.problem().clone(), time_points, trajectory.into_dyn(), true, self.d_t)
    }
}

fn eval(expr: &Expr, y: &[f64], t: f64) -> Result<f64> {
    expr.eval_scalar(y, t)
}
