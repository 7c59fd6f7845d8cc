//! A rectangular, uniformly-spaced discretization of a 1-3 dimensional
//! spatial domain.

use ndarray::{Array, ArrayD, IxDyn};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    Cartesian,
    Polar,
    Cylindrical,
    Spherical,
}

/// A single spatial axis: a half-open interval `[a, b)` discretized with
/// uniform step `dx`.
#[derive(Debug, Clone, Copy)]
pub struct Axis {
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
}

impl Axis {
    pub fn new(lower: f64, upper: f64, step: f64) -> Result<Self> {
        if step <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "axis step must be positive, got {step}"
            )));
        }
        if upper <= lower {
            return Err(Error::InvalidParameter(format!(
                "axis upper bound {upper} must exceed lower bound {lower}"
            )));
        }
        Ok(Self { lower, upper, step })
    }

    /// Number of vertices along this axis: `round((b - a) / dx) + 1`.
    pub fn vertex_count(&self) -> usize {
        (((self.upper - self.lower) / self.step).round() as usize) + 1
    }

    pub fn cell_count(&self) -> usize {
        self.vertex_count() - 1
    }
}

/// A rectangular mesh of rank 1-3, coordinate-system aware.
#[derive(Debug, Clone)]
pub struct Mesh {
    axes: Vec<Axis>,
    coordinate_system: CoordinateSystem,
}

impl Mesh {
    pub fn new(axes: Vec<Axis>, coordinate_system: CoordinateSystem) -> Result<Self> {
        if axes.is_empty() || axes.len() > 3 {
            return Err(Error::InvalidParameter(format!(
                "mesh rank must be in 1..=3, got {}",
                axes.len()
            )));
        }
        Ok(Self {
            axes,
            coordinate_system,
        })
    }

    /// The degenerate rank-0 mesh backing `x_dimension == 0` (ODE)
    /// problems, which have no spatial structure at all: `y` is a flat
    /// state vector, not a field over a mesh.
    pub fn point() -> Self {
        Self {
            axes: Vec::new(),
            coordinate_system: CoordinateSystem::Cartesian,
        }
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }

    /// Shape of a scalar field living on mesh vertices: one entry per axis.
    pub fn vertex_shape(&self) -> Vec<usize> {
        self.axes.iter().map(Axis::vertex_count).collect()
    }

    /// Shape of a scalar field living on mesh cells (one fewer point per
    /// axis than `vertex_shape`).
    pub fn cell_shape(&self) -> Vec<usize> {
        self.axes.iter().map(Axis::cell_count).collect()
    }

    /// The `y_dimension`-appended vertex shape used for solution tensors.
    pub fn y_vertices_shape(&self, y_dimension: usize) -> Vec<usize> {
        let mut shape = self.vertex_shape();
        shape.push(y_dimension);
        shape
    }

    pub fn y_cells_shape(&self, y_dimension: usize) -> Vec<usize> {
        let mut shape = self.cell_shape();
        shape.push(y_dimension);
        shape
    }

    /// Physical coordinates of the vertex at `index` (one component per
    /// axis): `offset + dx * index`.
    pub fn vertex_coordinate(&self, index: &[usize]) -> Vec<f64> {
        debug_assert_eq!(index.len(), self.axes.len());
        self.axes
            .iter()
            .zip(index)
            .map(|(axis, &i)| axis.lower + axis.step * i as f64)
            .collect()
    }

    /// A dense grid, shaped like `vertex_shape`, holding the physical
    /// coordinate of axis `axis` at every vertex. Used to apply curvilinear
    /// corrections element-wise.
    pub fn vertex_coordinate_grid(&self, axis: usize) -> ArrayD<f64> {
        let shape = self.vertex_shape();
        Array::from_shape_fn(IxDyn(&shape), |idx| {
            let i = idx[axis];
            self.axes[axis].lower + self.axes[axis].step * i as f64
        })
    }

    pub fn vertex_coordinate_grids(&self) -> Vec<ArrayD<f64>> {
        (0..self.rank())
            .map(|axis| self.vertex_coordinate_grid(axis))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_count_matches_round_formula() {
        let axis = Axis::new(0.0, 1.0, 0.1).unwrap();
        assert_eq!(axis.vertex_count(), 11);
        assert_eq!(axis.cell_count(), 10);
    }

    #[test]
    fn rejects_non_positive_step() {
        assert!(Axis::new(0.0, 1.0, 0.0).is_err());
        assert!(Axis::new(0.0, 1.0, -1.0).is_err());
    }

    #[test]
    fn rejects_empty_or_oversized_rank() {
        assert!(Mesh::new(vec![], CoordinateSystem::Cartesian).is_err());
        let axis = Axis::new(0.0, 1.0, 0.25).unwrap();
        assert!(Mesh::new(vec![axis; 4], CoordinateSystem::Cartesian).is_err());
    }

    #[test]
    fn vertex_coordinate_is_offset_plus_step_times_index() {
        let mesh = Mesh::new(
            vec![
                Axis::new(0.0, 1.0, 0.5).unwrap(),
                Axis::new(-1.0, 1.0, 1.0).unwrap(),
            ],
            CoordinateSystem::Cartesian,
        )
        .unwrap();
        assert_eq!(mesh.vertex_coordinate(&[2, 1]), vec![1.0, 0.0]);
    }
}
