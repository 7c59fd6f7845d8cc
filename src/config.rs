//! Solver tunables, kept as plain serializable settings structs so a caller
//! can load them from a config file without the core ever touching one.

use serde::{Deserialize, Serialize};

/// Controls the Jacobi anti-Laplacian iteration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JacobiSettings {
    pub tolerance: f64,
    /// No default is prescribed by the source; 10_000 is a generous finite
    /// bound for the mesh sizes this crate's test scenarios use. Callers
    /// solving much larger meshes should raise this explicitly.
    pub max_iterations: usize,
}

impl Default for JacobiSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_iterations: 10_000,
        }
    }
}

/// Controls the Crank-Nicolson fixed-point corrector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CrankNicolsonSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for CrankNicolsonSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_iterations: 50,
        }
    }
}

/// Controls a `Parareal` run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PararealSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub workers: usize,
}

impl Default for PararealSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-2,
            max_iterations: 10,
            workers: 4,
        }
    }
}
