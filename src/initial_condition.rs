//! Ways to seed the initial value of `y` over a mesh.

use ndarray::{ArrayD, Dimension};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::Result;
use crate::mesh::Mesh;

/// A function of physical position producing one value per `y` component.
pub type ContinuousFn = Box<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;

pub enum InitialCondition {
    /// Evaluate a closed-form function at every mesh vertex or cell
    /// center.
    Continuous(ContinuousFn),
    /// A Gaussian bump centered at `center` with standard deviation
    /// `std_dev`, scaled by `amplitude`, added to `offset` for each
    /// component.
    Gaussian {
        center: Vec<f64>,
        std_dev: f64,
        amplitude: Vec<f64>,
        offset: Vec<f64>,
    },
    /// A pre-computed discrete tensor, used as-is (or for ODEs, where
    /// there is no spatial structure to evaluate a function over).
    Discrete(ArrayD<f64>),
    /// Independent uniform noise per vertex/cell and component, used by
    /// e.g. Cahn-Hilliard's phase-separation scenarios.
    UniformNoise { low: Vec<f64>, high: Vec<f64> },
}

impl InitialCondition {
    pub fn discrete_y_0(&self, mesh: &Mesh, y_dimension: usize, vertex_oriented: bool) -> Result<ArrayD<f64>> {
        let shape = if vertex_oriented {
            mesh.y_vertices_shape(y_dimension)
        } else {
            mesh.y_cells_shape(y_dimension)
        };

        Ok(match self {
            InitialCondition::Discrete(y0) => y0.clone(),
            InitialCondition::Continuous(f) => {
                ArrayD::from_shape_fn(shape.as_slice(), |idx| {
                    let component = idx[idx.ndim() - 1];
                    let mut x = Vec::with_capacity(mesh.rank());
                    for axis in 0..mesh.rank() {
                        x.push(mesh.axes()[axis].lower + mesh.axes()[axis].step * idx[axis] as f64);
                    }
                    f(&x)[component]
                })
            }
            InitialCondition::Gaussian { center, std_dev, amplitude, offset } => {
                ArrayD::from_shape_fn(shape.as_slice(), |idx| {
                    let component = idx[idx.ndim() - 1];
                    let mut squared_distance = 0.0;
                    for axis in 0..mesh.rank() {
                        let coordinate = mesh.axes()[axis].lower + mesh.axes()[axis].step * idx[axis] as f64;
                        let d = coordinate - center[axis];
                        squared_distance += d * d;
                    }
                    offset[component]
                        + amplitude[component] * (-squared_distance / (2.0 * std_dev * std_dev)).exp()
                })
            }
            InitialCondition::UniformNoise { low, high } => {
                let mut rng = rand::thread_rng();
                ArrayD::from_shape_fn(shape.as_slice(), |idx| {
                    let component = idx[idx.ndim() - 1];
                    rng.gen_range(low[component]..high[component])
                })
            }
        })
    }
}

/// Independent Gaussian-distributed noise per entry, with shared mean and
/// standard deviation across components (used by a handful of continuous
/// scenarios that want small perturbations rather than a hard uniform
/// bound).
pub fn gaussian_noise(shape: &[usize], mean: f64, std_dev: f64) -> ArrayD<f64> {
    let mut rng = rand::thread_rng();
    let normal = Normal::new(mean, std_dev).expect("std_dev must be positive");
    ArrayD::from_shape_fn(shape, |_| normal.sample(&mut rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Axis, CoordinateSystem};

    fn line_mesh() -> Mesh {
        Mesh::new(vec![Axis::new(0.0, 1.0, 0.25).unwrap()], CoordinateSystem::Cartesian).unwrap()
    }

    #[test]
    fn discrete_initial_condition_is_returned_verbatim() {
        let mesh = line_mesh();
        let shape = mesh.y_vertices_shape(1);
        let y0 = ArrayD::from_elem(shape, 7.0);
        let ic = InitialCondition::Discrete(y0.clone());
        assert_eq!(ic.discrete_y_0(&mesh, 1, true).unwrap(), y0);
    }

    #[test]
    fn gaussian_peaks_at_its_center() {
        let mesh = line_mesh();
        let ic = InitialCondition::Gaussian {
            center: vec![0.5],
            std_dev: 0.1,
            amplitude: vec![1.0],
            offset: vec![0.0],
        };
        let y0 = ic.discrete_y_0(&mesh, 1, true).unwrap();
        let peak_index = 2; // x = 0.5 is the 3rd of 5 vertices.
        let peak = y0.as_slice().unwrap()[peak_index];
        assert!(y0.iter().all(|&v| v <= peak + 1e-12));
    }
}
