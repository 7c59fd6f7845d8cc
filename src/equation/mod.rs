//! Differential equations as sum types, each owning its coefficients and
//! building its own [`SymbolicEquationSystem`] on demand.

pub mod expr;

pub use expr::{Expr, FieldContext};

use crate::error::{Error, Result};

/// What a row of a [`SymbolicEquationSystem`] defines: the time derivative
/// of a `y` component, the component's direct value, or its spatial
/// Laplacian (used by equations that are naturally elliptic in one
/// component, e.g. Cahn-Hilliard's chemical potential).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lhs {
    DyOverDt,
    Y,
    YLaplacian,
}

/// A system of symbolic right-hand sides, one per `y` component, each
/// tagged with what its left-hand side means.
#[derive(Debug, Clone)]
pub struct SymbolicEquationSystem {
    rhs: Vec<Expr>,
    lhs_types: Vec<Lhs>,
}

impl SymbolicEquationSystem {
    pub fn new(rhs: Vec<Expr>, lhs_types: Vec<Lhs>) -> Result<Self> {
        if rhs.is_empty() {
            return Err(Error::InvalidParameter(
                "a symbolic equation system needs at least one equation".into(),
            ));
        }
        if rhs.len() != lhs_types.len() {
            return Err(Error::InvalidParameter(format!(
                "rhs has {} entries but lhs_types has {}",
                rhs.len(),
                lhs_types.len()
            )));
        }
        Ok(Self { rhs, lhs_types })
    }

    /// All equations' left-hand side is the time derivative.
    pub fn homogeneous(rhs: Vec<Expr>) -> Result<Self> {
        let lhs_types = vec![Lhs::DyOverDt; rhs.len()];
        Self::new(rhs, lhs_types)
    }

    pub fn rhs(&self) -> &[Expr] {
        &self.rhs
    }

    pub fn lhs_types(&self) -> &[Lhs] {
        &self.lhs_types
    }

    pub fn equation_indices_by_type(&self, lhs_type: Lhs) -> Vec<usize> {
        self.lhs_types
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == lhs_type)
            .map(|(i, _)| i)
            .collect()
    }
}

fn dot(a: &[usize], b_gradient_row: usize, dims: usize) -> Expr {
    let mut total = Expr::c(0.0);
    for (axis, &y_index) in a.iter().enumerate().take(dims) {
        total = total.add(Expr::y(y_index).mul(Expr::Grad(b_gradient_row, axis)));
    }
    total
}

/// Sum of `y[indices[axis]] * Grad(component, axis)` for `axis` in
/// `0..dims` — the convective term `(v . grad) y_component` that recurs
/// across the PDE equations below.
fn advect(indices: &[usize], component: usize, dims: usize) -> Expr {
    dot(indices, component, dims)
}

fn velocity_dot_gradient(velocity: &[f64], component: usize) -> Expr {
    let mut total = Expr::c(0.0);
    for (axis, &v) in velocity.iter().enumerate() {
        total = total.add(Expr::c(v).mul(Expr::Grad(component, axis)));
    }
    total
}

/// A time-dependent differential equation: either an ODE (`x_dimension ==
/// 0`) or a PDE posed over a mesh of 1-3 spatial dimensions.
#[derive(Debug, Clone)]
pub enum DifferentialEquation {
    PopulationGrowth { r: f64 },
    LotkaVolterra { alpha: f64, beta: f64, gamma: f64, delta: f64 },
    Lorenz { sigma: f64, rho: f64, beta: f64 },
    NBodyGravitational { dims: usize, masses: Vec<f64>, g: f64 },
    Diffusion { x_dimension: usize, d: f64 },
    ConvectionDiffusion { x_dimension: usize, velocity: Vec<f64>, d: f64 },
    Wave { x_dimension: usize, c: f64 },
    CahnHilliard { x_dimension: usize, d: f64, gamma: f64 },
    Burgers { x_dimension: usize, re: f64 },
    ShallowWater { mean_height: f64, drag: f64, viscosity: f64, coriolis: f64, gravity: f64 },
    NavierStokesStreamFunctionVorticity { re: f64 },
}

impl DifferentialEquation {
    pub fn population_growth(r: f64) -> Result<Self> {
        Ok(Self::PopulationGrowth { r })
    }

    pub fn lotka_volterra(alpha: f64, beta: f64, gamma: f64, delta: f64) -> Result<Self> {
        if alpha < 0.0 || beta < 0.0 || gamma < 0.0 || delta < 0.0 {
            return Err(Error::InvalidParameter(
                "Lotka-Volterra coefficients must be non-negative".into(),
            ));
        }
        Ok(Self::LotkaVolterra { alpha, beta, gamma, delta })
    }

    /// Canonical (not the source's miscopied) Lorenz system.
    pub fn lorenz(sigma: f64, rho: f64, beta: f64) -> Result<Self> {
        if sigma < 0.0 || rho < 0.0 || beta < 0.0 {
            return Err(Error::InvalidParameter("Lorenz coefficients must be non-negative".into()));
        }
        Ok(Self::Lorenz { sigma, rho, beta })
    }

    pub fn n_body_gravitational(dims: usize, masses: Vec<f64>, g: f64) -> Result<Self> {
        if !(2..=3).contains(&dims) {
            return Err(Error::InvalidParameter(format!(
                "n-body spatial dimension must be 2 or 3, got {dims}"
            )));
        }
        if masses.len() < 2 || masses.iter().any(|&m| m <= 0.0) {
            return Err(Error::InvalidParameter(
                "n-body needs at least two objects, all with positive mass".into(),
            ));
        }
        Ok(Self::NBodyGravitational { dims, masses, g })
    }

    pub fn diffusion(x_dimension: usize, d: f64) -> Result<Self> {
        if x_dimension == 0 {
            return Err(Error::InvalidParameter("diffusion requires x_dimension > 0".into()));
        }
        Ok(Self::Diffusion { x_dimension, d })
    }

    pub fn convection_diffusion(x_dimension: usize, velocity: Vec<f64>, d: f64) -> Result<Self> {
        if x_dimension == 0 {
            return Err(Error::InvalidParameter(
                "convection-diffusion requires x_dimension > 0".into(),
            ));
        }
        if velocity.len() != x_dimension {
            return Err(Error::InvalidParameter(format!(
                "velocity has {} components but x_dimension is {x_dimension}",
                velocity.len()
            )));
        }
        Ok(Self::ConvectionDiffusion { x_dimension, velocity, d })
    }

    pub fn wave(x_dimension: usize, c: f64) -> Result<Self> {
        if x_dimension == 0 {
            return Err(Error::InvalidParameter("wave requires x_dimension > 0".into()));
        }
        Ok(Self::Wave { x_dimension, c })
    }

    pub fn cahn_hilliard(x_dimension: usize, d: f64, gamma: f64) -> Result<Self> {
        if x_dimension == 0 {
            return Err(Error::InvalidParameter("Cahn-Hilliard requires x_dimension > 0".into()));
        }
        Ok(Self::CahnHilliard { x_dimension, d, gamma })
    }

    pub fn burgers(x_dimension: usize, re: f64) -> Result<Self> {
        if x_dimension == 0 {
            return Err(Error::InvalidParameter("Burgers requires x_dimension > 0".into()));
        }
        Ok(Self::Burgers { x_dimension, re })
    }

    pub fn shallow_water(mean_height: f64, drag: f64, viscosity: f64, coriolis: f64, gravity: f64) -> Result<Self> {
        Ok(Self::ShallowWater {
            mean_height,
            drag,
            viscosity,
            coriolis,
            gravity,
        })
    }

    pub fn navier_stokes_stream_function_vorticity(re: f64) -> Result<Self> {
        Ok(Self::NavierStokesStreamFunctionVorticity { re })
    }

    pub fn x_dimension(&self) -> usize {
        match self {
            Self::PopulationGrowth { .. }
            | Self::LotkaVolterra { .. }
            | Self::Lorenz { .. }
            | Self::NBodyGravitational { .. } => 0,
            Self::Diffusion { x_dimension, .. }
            | Self::ConvectionDiffusion { x_dimension, .. }
            | Self::Wave { x_dimension, .. }
            | Self::CahnHilliard { x_dimension, .. }
            | Self::Burgers { x_dimension, .. } => *x_dimension,
            Self::ShallowWater { .. } => 2,
            Self::NavierStokesStreamFunctionVorticity { .. } => 2,
        }
    }

    pub fn y_dimension(&self) -> usize {
        match self {
            Self::PopulationGrowth { .. } => 1,
            Self::LotkaVolterra { .. } => 2,
            Self::Lorenz { .. } => 3,
            Self::NBodyGravitational { dims, masses, .. } => 2 * masses.len() * dims,
            Self::Diffusion { .. } => 1,
            Self::ConvectionDiffusion { .. } => 1,
            Self::Wave { .. } => 2,
            Self::CahnHilliard { .. } => 2,
            Self::Burgers { x_dimension, .. } => *x_dimension,
            Self::ShallowWater { .. } => 3,
            Self::NavierStokesStreamFunctionVorticity { .. } => 2,
        }
    }

    pub fn symbolic_equation_system(&self) -> Result<SymbolicEquationSystem> {
        let system = match self {
            Self::PopulationGrowth { r } => SymbolicEquationSystem::homogeneous(vec![Expr::c(*r).mul(Expr::y(0))])?,

            Self::LotkaVolterra { alpha, beta, gamma, delta } => {
                let prey = Expr::y(0);
                let predator = Expr::y(1);
                SymbolicEquationSystem::homogeneous(vec![
                    Expr::c(*alpha)
                        .mul(prey.clone())
                        .sub(Expr::c(*beta).mul(prey.clone()).mul(predator.clone())),
                    Expr::c(*delta)
                        .mul(prey)
                        .mul(predator.clone())
                        .sub(Expr::c(*gamma).mul(predator)),
                ])?
            }

            Self::Lorenz { sigma, rho, beta } => {
                let c = Expr::y(0);
                let h = Expr::y(1);
                let v = Expr::y(2);
                SymbolicEquationSystem::homogeneous(vec![
                    Expr::c(*sigma).mul(h.clone().sub(c.clone())),
                    c.clone()
                        .mul(Expr::c(*rho).sub(v.clone()))
                        .sub(h.clone()),
                    c.mul(h).sub(Expr::c(*beta).mul(v)),
                ])?
            }

            Self::NBodyGravitational { dims, masses, g } => {
                let n = masses.len();
                let n_obj_by_dims = n * dims;
                let mut rhs = vec![Expr::c(0.0); 2 * n_obj_by_dims];
                for i in 0..n {
                    let pos_i = i * dims;
                    let vel_i = n_obj_by_dims + pos_i;
                    for k in 0..*dims {
                        rhs[pos_i + k] = Expr::y(vel_i + k);
                    }

                    let mut accel = vec![Expr::c(0.0); *dims];
                    for j in 0..n {
                        if i == j {
                            continue;
                        }
                        let pos_j = j * dims;
                        let mut distance_sq = Expr::c(0.0);
                        let mut disp = Vec::with_capacity(*dims);
                        for k in 0..*dims {
                            let d = Expr::y(pos_j + k).sub(Expr::y(pos_i + k));
                            distance_sq = distance_sq.add(d.clone().pow(2.0));
                            disp.push(d);
                        }
                        let distance_cubed = distance_sq.pow(1.5);
                        for k in 0..*dims {
                            accel[k] = accel[k].clone().add(
                                Expr::c(g * masses[j])
                                    .mul(disp[k].clone())
                                    .div(distance_cubed.clone()),
                            );
                        }
                    }
                    for (k, a) in accel.into_iter().enumerate() {
                        rhs[vel_i + k] = a;
                    }
                }
                SymbolicEquationSystem::homogeneous(rhs)?
            }

            Self::Diffusion { d, .. } => SymbolicEquationSystem::homogeneous(vec![Expr::c(*d).mul(Expr::Laplacian(0))])?,

            Self::ConvectionDiffusion { velocity, d, .. } => SymbolicEquationSystem::homogeneous(vec![Expr::c(*d)
                .mul(Expr::Laplacian(0))
                .sub(velocity_dot_gradient(velocity, 0))])?,

            Self::Wave { c, .. } => SymbolicEquationSystem::homogeneous(vec![
                Expr::y(1),
                Expr::c(c * c).mul(Expr::Laplacian(0)),
            ])?,

            Self::CahnHilliard { d, gamma, .. } => SymbolicEquationSystem::new(
                vec![
                    Expr::y(1)
                        .pow(3.0)
                        .sub(Expr::y(1))
                        .sub(Expr::c(*gamma).mul(Expr::Laplacian(1))),
                    Expr::c(*d).mul(Expr::Laplacian(0)),
                ],
                vec![Lhs::Y, Lhs::DyOverDt],
            )?,

            Self::Burgers { x_dimension, re } => {
                let y_indices: Vec<usize> = (0..*x_dimension).collect();
                let rhs = (0..*x_dimension)
                    .map(|i| {
                        Expr::c(1.0 / re)
                            .mul(Expr::Laplacian(i))
                            .sub(advect(&y_indices, i, *x_dimension))
                    })
                    .collect();
                SymbolicEquationSystem::homogeneous(rhs)?
            }

            Self::ShallowWater { mean_height, drag, viscosity, coriolis, gravity } => {
                let velocity_indices = [1usize, 2usize];
                SymbolicEquationSystem::homogeneous(vec![
                    Expr::c(-mean_height)
                        .mul(Expr::Divergence(vec![1, 2]))
                        .sub(Expr::y(0).mul(Expr::Grad(1, 0)))
                        .sub(Expr::y(1).mul(Expr::Grad(0, 0)))
                        .sub(Expr::y(0).mul(Expr::Grad(2, 1)))
                        .sub(Expr::y(2).mul(Expr::Grad(0, 1))),
                    advect(&velocity_indices, 1, 2)
                        .neg()
                        .add(Expr::c(*coriolis).mul(Expr::y(2)))
                        .sub(Expr::c(*gravity).mul(Expr::Grad(0, 0)))
                        .sub(Expr::c(*drag).mul(Expr::y(1)))
                        .add(Expr::c(*viscosity).mul(Expr::Laplacian(1))),
                    advect(&velocity_indices, 2, 2)
                        .neg()
                        .sub(Expr::c(*coriolis).mul(Expr::y(1)))
                        .sub(Expr::c(*gravity).mul(Expr::Grad(0, 1)))
                        .sub(Expr::c(*drag).mul(Expr::y(2)))
                        .add(Expr::c(*viscosity).mul(Expr::Laplacian(2))),
                ])?
            }

            Self::NavierStokesStreamFunctionVorticity { re } => SymbolicEquationSystem::new(
                vec![
                    Expr::c(1.0 / re)
                        .mul(Expr::Laplacian(0))
                        .sub(Expr::Curl2(0, 1)),
                    Expr::y(0).neg(),
                ],
                vec![Lhs::DyOverDt, Lhs::YLaplacian],
            )?,
        };
        self.validate(&system)?;
        Ok(system)
    }

    /// Free-symbol scope and left-hand-side combination checks: every
    /// `Y`/`Grad`/etc. index referenced by the system must be within
    /// `0..y_dimension`, and ODEs must not use `Y`/`YLaplacian` left-hand
    /// sides (no spatial structure to make them meaningful) while PDEs must
    /// provide at least one `DyOverDt` equation.
    fn validate(&self, system: &SymbolicEquationSystem) -> Result<()> {
        let y_dim = self.y_dimension();
        if system.rhs().len() != y_dim {
            return Err(Error::LhsCombination(format!(
                "equation system has {} rows but y_dimension is {y_dim}",
                system.rhs().len()
            )));
        }
        for expr in system.rhs() {
            let mut indices = Vec::new();
            expr.referenced_y_indices(&mut indices);
            if let Some(&bad) = indices.iter().find(|&&i| i >= y_dim) {
                return Err(Error::SymbolOutOfScope {
                    symbol: format!("y[{bad}]"),
                });
            }
        }
        if self.x_dimension() == 0 {
            if system.lhs_types().iter().any(|t| *t != Lhs::DyOverDt) {
                return Err(Error::LhsCombination(
                    "an ODE (x_dimension == 0) cannot use Y or YLaplacian left-hand sides".into(),
                ));
            }
        } else if !system.lhs_types().contains(&Lhs::DyOverDt) {
            return Err(Error::LhsCombination(
                "a PDE must define at least one d(y)/dt equation".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_growth_is_first_order_linear() {
        let eq = DifferentialEquation::population_growth(0.03).unwrap();
        let system = eq.symbolic_equation_system().unwrap();
        assert_eq!(system.rhs().len(), 1);
        assert_eq!(eq.x_dimension(), 0);
        assert_eq!(eq.y_dimension(), 1);
    }

    #[test]
    fn lotka_volterra_rejects_negative_coefficients() {
        assert!(DifferentialEquation::lotka_volterra(-1.0, 0.04, 1.06, 0.02).is_err());
    }

    #[test]
    fn lorenz_uses_the_canonical_rhs_not_the_buggy_variant() {
        let eq = DifferentialEquation::lorenz(10.0, 28.0, 8.0 / 3.0).unwrap();
        let system = eq.symbolic_equation_system().unwrap();
        // c' = sigma(h - c); at y = (1, 2, 3) that's 10*(2-1) = 10.
        assert_eq!(system.rhs()[0].eval_scalar(&[1.0, 2.0, 3.0], 0.0).unwrap(), 10.0);
    }

    #[test]
    fn n_body_requires_at_least_two_positive_masses() {
        assert!(DifferentialEquation::n_body_gravitational(3, vec![1.0], 6.6743e-11).is_err());
        assert!(DifferentialEquation::n_body_gravitational(3, vec![1.0, -1.0], 6.6743e-11).is_err());
    }

    #[test]
    fn n_body_velocity_rows_equal_the_velocity_state() {
        let eq = DifferentialEquation::n_body_gravitational(2, vec![1.0, 1.0], 1.0).unwrap();
        let system = eq.symbolic_equation_system().unwrap();
        // y_dimension = 2 * 2 objects * 2 dims = 8; positions 0..4, velocities 4..8.
        let y = [0.0, 0.0, 1.0, 0.0, 0.5, 0.25, -0.5, 0.25];
        assert_eq!(system.rhs()[0].eval_scalar(&y, 0.0).unwrap(), y[4]);
        assert_eq!(system.rhs()[1].eval_scalar(&y, 0.0).unwrap(), y[5]);
    }

    #[test]
    fn cahn_hilliard_uses_a_direct_y_left_hand_side_for_the_potential() {
        let eq = DifferentialEquation::cahn_hilliard(1, 0.1, 0.01).unwrap();
        let system = eq.symbolic_equation_system().unwrap();
        assert_eq!(system.lhs_types(), &[Lhs::Y, Lhs::DyOverDt]);
    }

    #[test]
    fn navier_stokes_sfv_uses_a_laplacian_left_hand_side_for_the_stream_function() {
        let eq = DifferentialEquation::navier_stokes_stream_function_vorticity(4000.0).unwrap();
        let system = eq.symbolic_equation_system().unwrap();
        assert_eq!(system.lhs_types()[1], Lhs::YLaplacian);
    }

    #[test]
    fn ode_equations_reject_spatial_left_hand_sides() {
        // An ODE whose system (incorrectly) claims a Y left-hand side
        // should fail validation.
        let bogus = SymbolicEquationSystem::new(vec![Expr::y(0)], vec![Lhs::Y]).unwrap();
        let eq = DifferentialEquation::PopulationGrowth { r: 0.1 };
        assert!(eq.validate(&bogus).is_err());
    }
}
