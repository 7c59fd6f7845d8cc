//! Boundary conditions: predicates that map a boundary point and time to a
//! (possibly partial) vector of constrained values.

/// A boundary-condition value function: `(x, t) -> values`, one entry per
/// `y` component. `None` marks "no constraint on this component at this
/// face" (a NaN/None sentinel).
pub type BoundaryFn = Box<dyn Fn(&[f64], f64) -> Vec<Option<f64>> + Send + Sync>;

pub enum BoundaryCondition {
    Dirichlet { value: BoundaryFn, is_static: bool },
    Neumann { derivative: BoundaryFn, is_static: bool },
    Cauchy {
        value: BoundaryFn,
        derivative: BoundaryFn,
        is_static: bool,
    },
}

impl BoundaryCondition {
    pub fn dirichlet(is_static: bool, value: BoundaryFn) -> Self {
        Self::Dirichlet { value, is_static }
    }

    pub fn neumann(is_static: bool, derivative: BoundaryFn) -> Self {
        Self::Neumann { derivative, is_static }
    }

    pub fn cauchy(is_static: bool, value: BoundaryFn, derivative: BoundaryFn) -> Self {
        Self::Cauchy {
            value,
            derivative,
            is_static,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Self::Dirichlet { is_static, .. } => *is_static,
            Self::Neumann { is_static, .. } => *is_static,
            Self::Cauchy { is_static, .. } => *is_static,
        }
    }

    pub fn has_y_condition(&self) -> bool {
        matches!(self, Self::Dirichlet { .. } | Self::Cauchy { .. })
    }

    pub fn has_d_y_condition(&self) -> bool {
        matches!(self, Self::Neumann { .. } | Self::Cauchy { .. })
    }

    /// Evaluate the Dirichlet (y-value) component of this condition, if any.
    pub fn y_value(&self, x: &[f64], t: f64) -> Option<Vec<Option<f64>>> {
        match self {
            Self::Dirichlet { value, .. } => Some(value(x, t)),
            Self::Cauchy { value, .. } => Some(value(x, t)),
            Self::Neumann { .. } => None,
        }
    }

    /// Evaluate the Neumann (normal-derivative) component of this
    /// condition, if any.
    pub fn d_y_value(&self, x: &[f64], t: f64) -> Option<Vec<Option<f64>>> {
        match self {
            Self::Neumann { derivative, .. } => Some(derivative(x, t)),
            Self::Cauchy { derivative, .. } => Some(derivative(x, t)),
            Self::Dirichlet { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirichlet_reports_y_condition_only() {
        let bc = BoundaryCondition::dirichlet(true, Box::new(|_x, _t| vec![Some(0.0)]));
        assert!(bc.has_y_condition());
        assert!(!bc.has_d_y_condition());
        assert_eq!(bc.y_value(&[0.0], 0.0), Some(vec![Some(0.0)]));
        assert_eq!(bc.d_y_value(&[0.0], 0.0), None);
    }

    #[test]
    fn neumann_reports_derivative_condition_only() {
        let bc = BoundaryCondition::neumann(true, Box::new(|_x, _t| vec![Some(0.0)]));
        assert!(!bc.has_y_condition());
        assert!(bc.has_d_y_condition());
    }

    #[test]
    fn cauchy_reports_both() {
        let bc = BoundaryCondition::cauchy(
            false,
            Box::new(|_x, _t| vec![Some(1.0)]),
            Box::new(|_x, _t| vec![Some(2.0)]),
        );
        assert!(bc.has_y_condition());
        assert!(bc.has_d_y_condition());
        assert!(!bc.is_static());
    }
}
