//! A time-parallel solver for initial-boundary value problems: ordinary and
//! partial differential equations over a shared symbolic equation
//! representation, stepped either directly (finite differences in space,
//! an explicit/implicit integrator in time) or accelerated across workers
//! with the Parareal algorithm.
//!
//! Key components:
//! - **Equation**: a tagged-enum AST (`equation::Expr`) evaluated over
//!   `ndarray` tensors, shared by every operator.
//! - **Mesh / Boundary / Constraint**: the spatial discretization and the
//!   Dirichlet/Neumann constraints imposed on it.
//! - **Differentiator**: stencil-based spatial derivatives and the Jacobi
//!   anti-Laplacian solve.
//! - **Integrator**: time-stepping rules (forward Euler, explicit
//!   midpoint, RK4, Crank-Nicolson).
//! - **Operator**: `OdeOperator` and `FdmOperator`, the two concrete
//!   solvers, plus `Parareal`, which composes a fine and a coarse operator
//!   into a time-parallel one.
//! - **Collective**: barrier/all-gather primitives used to coordinate
//!   Parareal's worker threads.
pub mod boundary;
pub mod collective;
pub mod config;
pub mod constraint;
pub mod differentiator;
pub mod equation;
pub mod error;
pub mod initial_condition;
pub mod integrator;
pub mod ivp;
pub mod mesh;
pub mod operator;
pub mod parareal;
pub mod problem;
pub mod solution;

pub use error::{Error, Result};
pub use parareal::Parareal;
