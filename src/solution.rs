//! The outcome of a solve: every discretized `y` snapshot at every time
//! point visited, plus enough metadata to interpolate between vertex and
//! cell orientation and to diff two solutions against each other.

use std::sync::Arc;

use ndarray::{ArrayD, Axis as NdAxis, Dimension, IxDyn};

use crate::error::{Error, Result};
use crate::problem::ConstrainedProblem;

/// A dense time series of discretized `y`. Every solver excludes `t0`
/// itself from its output, so `discrete_y[i]` is the state at
/// `time_points[i]`, the first of which is strictly after `t0`.
pub struct Solution {
    problem: Arc<ConstrainedProblem>,
    time_points: Vec<f64>,
    discrete_y: ArrayD<f64>,
    vertex_oriented: bool,
    d_t: f64,
}

impl Solution {
    pub fn new(
        problem: Arc<ConstrainedProblem>,
        time_points: Vec<f64>,
        discrete_y: ArrayD<f64>,
        vertex_oriented: bool,
        d_t: f64,
    ) -> Result<Self> {
        let expected_points_shape = if vertex_oriented {
            problem.y_vertices_shape()
        } else {
            problem.y_cells_shape()
        };
        let mut expected = vec![time_points.len()];
        expected.extend_from_slice(&expected_points_shape);
        if discrete_y.shape() != expected.as_slice() {
            return Err(Error::ShapeMismatch {
                expected,
                found: discrete_y.shape().to_vec(),
            });
        }
        Ok(Self {
            problem,
            time_points,
            discrete_y,
            vertex_oriented,
            d_t,
        })
    }

    pub fn problem(&self) -> &Arc<ConstrainedProblem> {
        &self.problem
    }

    pub fn time_points(&self) -> &[f64] {
        &self.time_points
    }

    pub fn d_t(&self) -> f64 {
        self.d_t
    }

    pub fn vertex_oriented(&self) -> bool {
        self.vertex_oriented
    }

    /// The raw tensor as produced by the solver, shaped `[time, ...y_shape]`.
    pub fn raw_discrete_y(&self) -> &ArrayD<f64> {
        &self.discrete_y
    }

    /// Every snapshot, interpolated to `vertex_oriented` orientation if it
    /// differs from how the solution was produced. Cell-to-vertex
    /// interpolation averages the (up to two) adjacent cells per axis;
    /// vertex-to-cell interpolation averages the two adjacent vertices.
    pub fn discrete_y(&self, vertex_oriented: bool) -> ArrayD<f64> {
        if vertex_oriented == self.vertex_oriented {
            return self.discrete_y.clone();
        }
        let rank = self.problem.mesh().rank();
        let mut out = self.discrete_y.clone();
        for axis in 0..rank {
            out = if vertex_oriented {
                interpolate_cells_to_vertices(&out, axis + 1)
            } else {
                interpolate_vertices_to_cells(&out, axis + 1)
            };
        }
        out
    }

    /// The last snapshot, at `time_points().last()`.
    pub fn final_y(&self, vertex_oriented: bool) -> ArrayD<f64> {
        let y = self.discrete_y(vertex_oriented);
        y.index_axis(NdAxis(0), y.shape()[0] - 1).to_owned()
    }

    /// Root-mean-square difference between this solution and `other` at
    /// every shared time point, per y-component. Both solutions must share
    /// a mesh and y-dimension; `other` is reoriented to match `self` first.
    pub fn diff(&self, other: &Solution) -> Result<Vec<f64>> {
        if self.problem.y_vertices_shape() != other.problem.y_vertices_shape() {
            return Err(Error::ShapeMismatch {
                expected: self.problem.y_vertices_shape(),
                found: other.problem.y_vertices_shape(),
            });
        }
        let mine = self.discrete_y(self.vertex_oriented);
        let theirs = other.discrete_y(self.vertex_oriented);
        if mine.shape() != theirs.shape() {
            return Err(Error::ShapeMismatch {
                expected: mine.shape().to_vec(),
                found: theirs.shape().to_vec(),
            });
        }

        let y_dim = *mine.shape().last().unwrap();
        let mut sums = vec![0.0; y_dim];
        let mut counts = vec![0usize; y_dim];
        for (idx, &a) in mine.indexed_iter() {
            let b = theirs[&idx];
            let component = idx[idx.ndim() - 1];
            let diff = a - b;
            sums[component] += diff * diff;
            counts[component] += 1;
        }
        Ok(sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| (sum / count.max(1) as f64).sqrt())
            .collect())
    }
}

/// Reinterpolates a single (timeless) `y` tensor between vertex and cell
/// orientation, for callers (Parareal's cross-operator handoff) that only
/// have a bare state tensor rather than a whole [`Solution`].
pub fn reorient_y(mesh: &crate::mesh::Mesh, y: &ArrayD<f64>, from_vertex_oriented: bool, to_vertex_oriented: bool) -> ArrayD<f64> {
    if from_vertex_oriented == to_vertex_oriented {
        return y.clone();
    }
    let mut out = y.clone().insert_axis(NdAxis(0));
    for axis in 0..mesh.rank() {
        out = if to_vertex_oriented {
            interpolate_cells_to_vertices(&out, axis + 1)
        } else {
            interpolate_vertices_to_cells(&out, axis + 1)
        };
    }
    out.index_axis(NdAxis(0), 0).to_owned()
}

fn interpolate_vertices_to_cells(y: &ArrayD<f64>, axis: usize) -> ArrayD<f64> {
    let len = y.shape()[axis];
    let lower = y.slice_axis(NdAxis(axis), (0..len - 1).into());
    let upper = y.slice_axis(NdAxis(axis), (1..len).into());
    (&lower + &upper) * 0.5
}

fn interpolate_cells_to_vertices(y: &ArrayD<f64>, axis: usize) -> ArrayD<f64> {
    let len = y.shape()[axis];
    let mut shape = y.shape().to_vec();
    shape[axis] = len + 1;
    let mut out = ArrayD::zeros(IxDyn(&shape));

    out.slice_axis_mut(NdAxis(axis), (0..1).into())
        .assign(&y.slice_axis(NdAxis(axis), (0..1).into()));
    out.slice_axis_mut(NdAxis(axis), (len..len + 1).into())
        .assign(&y.slice_axis(NdAxis(axis), (len - 1..len).into()));
    if len > 1 {
        let lower = y.slice_axis(NdAxis(axis), (0..len - 1).into());
        let upper = y.slice_axis(NdAxis(axis), (1..len).into());
        let averaged = (&lower + &upper) * 0.5;
        out.slice_axis_mut(NdAxis(axis), (1..len).into()).assign(&averaged);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::equation::DifferentialEquation;
    use crate::mesh::{Axis, CoordinateSystem, Mesh};
    use ndarray::Array;

    fn sample_problem() -> Arc<ConstrainedProblem> {
        let mesh = Mesh::new(vec![Axis::new(0.0, 1.0, 0.25).unwrap()], CoordinateSystem::Cartesian).unwrap();
        let equation = DifferentialEquation::diffusion(1, 1.0).unwrap();
        let bc = BoundaryCondition::dirichlet(true, Box::new(|_x, _t| vec![Some(0.0)]));
        Arc::new(ConstrainedProblem::new(mesh, equation, vec![[Some(bc), None]]).unwrap())
    }

    #[test]
    fn rejects_mismatched_tensor_shape() {
        let problem = sample_problem();
        let bad = Array::zeros(vec![2, 3, 1]).into_dyn();
        assert!(Solution::new(problem, vec![0.0, 1.0], bad, true, 1.0).is_err());
    }

    #[test]
    fn vertex_to_cell_round_trip_preserves_interior_mean() {
        let problem = sample_problem();
        let y = Array::from_shape_vec(vec![1, 5, 1], vec![0.0, 1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .into_dyn();
        let solution = Solution::new(problem, vec![0.0], y, true, 1.0).unwrap();
        let cells = solution.discrete_y(false);
        assert_eq!(cells.shape(), &[1, 4, 1]);
        assert!((cells[[0, 0, 0]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn diff_is_zero_against_itself() {
        let problem = sample_problem();
        let y = Array::from_shape_vec(vec![1, 5, 1], vec![0.0, 1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .into_dyn();
        let solution = Solution::new(problem, vec![0.0], y.clone(), true, 1.0).unwrap();
        let other_problem = sample_problem();
        let other = Solution::new(other_problem, vec![0.0], y, true, 1.0).unwrap();
        let diff = solution.diff(&other).unwrap();
        assert!(diff.iter().all(|&d| d.abs() < 1e-12));
    }
}
