use crate::error::Result;
use crate::ivp::InitialValueProblem;
use crate::operator::Operator;
use crate::solution::Solution;

/// A contract for operators backed by a trained model (regression, a
/// physics-informed network, DeepONet) rather than a numerical scheme.
/// Training itself is out of scope here: this only describes how a
/// fitted model plugs into [`crate::parareal::Parareal`] as the cheap
/// coarse operator, so the corrector sees genuinely independent coarse
/// and fine physics regardless of what produced the coarse one.
pub trait SurrogateOperator: Operator {
    /// Fits the surrogate against data on its own terms; `inputs` and
    /// `targets` are whatever tensor pairs the concrete model expects
    /// (e.g. `(t, y)` pairs and next-step `y`, or `(t, x)` pairs and
    /// pointwise `y`). Left unconstrained deliberately: a regression
    /// surrogate trains on trajectories, a PINN on collocation points,
    /// a DeepONet on operator input/output function pairs.
    fn fit(&mut self, inputs: &[f64], targets: &[f64]) -> Result<()>;

    /// Whether `fit` has been called successfully at least once.
    fn is_fitted(&self) -> bool;
}

/// A [`SurrogateOperator`] that always reports unfitted and refuses to
/// solve, giving external integrations something concrete to implement
/// against before a real model backend exists.
pub struct UnfittedSurrogateOperator {
    d_t: f64,
}

impl UnfittedSurrogateOperator {
    pub fn new(d_t: f64) -> Self {
        Self { d_t }
    }
}

impl Operator for UnfittedSurrogateOperator {
    fn d_t(&self) -> f64 {
        self.d_t
    }

    fn solve(&self, _ivp: &InitialValueProblem, _parallel_enabled: bool) -> Result<Solution> {
        Err(crate::error::Error::InvalidParameter(
            "surrogate operator has not been fitted".to_string(),
        ))
    }
}

impl SurrogateOperator for UnfittedSurrogateOperator {
    fn fit(&mut self, _inputs: &[f64], _targets: &[f64]) -> Result<()> {
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfitted_surrogate_refuses_to_solve() {
        let op = UnfittedSurrogateOperator::new(0.1);
        assert!(!op.is_fitted());
        assert_eq!(op.d_t(), 0.1);
    }
}
