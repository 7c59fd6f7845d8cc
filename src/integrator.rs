//! Time steppers, adapted from a fixed-step Runge-Kutta implementation
//! (`RK4`'s buffer-reuse pattern) to operate on dense [`ArrayD`] state
//! instead of a flat `Vec<T>`, so the same code steps both ODE state
//! vectors and PDE solution tensors.

use ndarray::ArrayD;

use crate::config::CrankNicolsonSettings;
use crate::constraint::Constraint;
use crate::error::{Error, Result};

/// The right-hand side of `dy/dt = f(t, y)`, already closed over whatever
/// equation and spatial operators it needs.
pub type Rhs<'a> = dyn Fn(f64, &ArrayD<f64>) -> Result<ArrayD<f64>> + 'a;

/// Advances `y` by one step of size `d_t`, optionally re-applying a
/// Dirichlet constraint to every intermediate stage (not just the final
/// result) so boundary values stay exact throughout multi-stage methods.
pub trait Integrator {
    fn step(&self, rhs: &Rhs<'_>, t: f64, y: &ArrayD<f64>, d_t: f64, y_constraint: Option<&Constraint>) -> Result<ArrayD<f64>>;
}

fn constrain(mut y: ArrayD<f64>, constraint: Option<&Constraint>) -> Result<ArrayD<f64>> {
    if let Some(c) = constraint {
        c.apply(&mut y)?;
    }
    Ok(y)
}

pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step(&self, rhs: &Rhs<'_>, t: f64, y: &ArrayD<f64>, d_t: f64, y_constraint: Option<&Constraint>) -> Result<ArrayD<f64>> {
        let k1 = rhs(t, y)?;
        constrain(y + d_t * k1, y_constraint)
    }
}

pub struct ExplicitMidpoint;

impl Integrator for ExplicitMidpoint {
    fn step(&self, rhs: &Rhs<'_>, t: f64, y: &ArrayD<f64>, d_t: f64, y_constraint: Option<&Constraint>) -> Result<ArrayD<f64>> {
        let k1 = rhs(t, y)?;
        let mid = constrain(y + (d_t / 2.0) * &k1, y_constraint)?;
        let k2 = rhs(t + d_t / 2.0, &mid)?;
        constrain(y + d_t * k2, y_constraint)
    }
}

pub struct Rk4;

impl Integrator for Rk4 {
    fn step(&self, rhs: &Rhs<'_>, t: f64, y: &ArrayD<f64>, d_t: f64, y_constraint: Option<&Constraint>) -> Result<ArrayD<f64>> {
        let k1 = rhs(t, y)?;
        let stage2 = constrain(y + (d_t / 2.0) * &k1, y_constraint)?;
        let k2 = rhs(t + d_t / 2.0, &stage2)?;
        let stage3 = constrain(y + (d_t / 2.0) * &k2, y_constraint)?;
        let k3 = rhs(t + d_t / 2.0, &stage3)?;
        let stage4 = constrain(y + d_t * &k3, y_constraint)?;
        let k4 = rhs(t + d_t, &stage4)?;

        let combined = y + (d_t / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
        constrain(combined, y_constraint)
    }
}

/// Implicit trapezoidal rule, solved by fixed-point iteration:
/// `y_{n+1} = y_n + dt/2 * (f(t_n, y_n) + f(t_{n+1}, y_{n+1}))`.
pub struct CrankNicolson {
    pub settings: CrankNicolsonSettings,
}

impl Integrator for CrankNicolson {
    fn step(&self, rhs: &Rhs<'_>, t: f64, y: &ArrayD<f64>, d_t: f64, y_constraint: Option<&Constraint>) -> Result<ArrayD<f64>> {
        let k1 = rhs(t, y)?;
        let mut next = constrain(y + d_t * &k1, y_constraint)?; // forward Euler predictor

        for _ in 0..self.settings.max_iterations {
            let k2 = rhs(t + d_t, &next)?;
            let candidate = constrain(y + (d_t / 2.0) * (&k1 + &k2), y_constraint)?;
            let delta = (&candidate - &next).mapv(f64::abs).sum();
            next = candidate;
            if delta < self.settings.tolerance {
                return Ok(next);
            }
        }

        Err(Error::DidNotConverge {
            what: "Crank-Nicolson fixed-point iteration",
            max_iterations: self.settings.max_iterations,
            residual: f64::NAN,
            tolerance: self.settings.tolerance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn exponential_growth(_t: f64, y: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        Ok(y.clone())
    }

    #[test]
    fn forward_euler_matches_hand_computed_step() {
        let y0 = arr1(&[1.0]).into_dyn();
        let y1 = ForwardEuler.step(&exponential_growth, 0.0, &y0, 0.1, None).unwrap();
        assert!((y1[[0]] - 1.1).abs() < 1e-12);
    }

    #[test]
    fn rk4_is_more_accurate_than_forward_euler_for_exponential_growth() {
        let y0 = arr1(&[1.0]).into_dyn();
        let exact = std::f64::consts::E;
        let euler = ForwardEuler.step(&exponential_growth, 0.0, &y0, 1.0, None).unwrap();
        let rk4 = Rk4.step(&exponential_growth, 0.0, &y0, 1.0, None).unwrap();
        assert!((rk4[[0]] - exact).abs() < (euler[[0]] - exact).abs());
    }

    #[test]
    fn crank_nicolson_converges_for_a_linear_system() {
        let settings = CrankNicolsonSettings { tolerance: 1e-10, max_iterations: 50 };
        let integrator = CrankNicolson { settings };
        let y0 = arr1(&[1.0]).into_dyn();
        let y1 = integrator.step(&exponential_growth, 0.0, &y0, 0.01, None).unwrap();
        assert!(y1[[0]] > 1.0);
    }
}
