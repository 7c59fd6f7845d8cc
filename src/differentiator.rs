//! Stencil-based spatial operators and the Jacobi anti-Laplacian. All
//! operations are pure functions over dense tensors whose last axis is the
//! `y`-component; none mutate their input.

use ndarray::{ArrayD, Axis as NdAxis, IxDyn, Zip};
use rand::Rng;
use rayon::prelude::*;

use crate::config::JacobiSettings;
use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::mesh::{CoordinateSystem, Mesh};

/// A `(lower, upper)` pair of optional derivative-boundary constraints for
/// one axis/y-component combination.
pub type BoundaryConstraintPair = (Option<Constraint>, Option<Constraint>);

/// `derivative_boundary_constraints[axis][y_index]` is the pair of
/// (possibly absent) Neumann constraints bounding that axis for that
/// component.
pub type DerivativeBoundaryConstraints = Vec<Vec<Option<BoundaryConstraintPair>>>;

fn check_axis_width(y: &ArrayD<f64>, axis: usize) -> Result<()> {
    let len = y.shape()[axis];
    if len < 3 {
        return Err(Error::InsufficientStencilWidth { axis, len });
    }
    Ok(())
}

/// Restricts `full` (indexed `[axis][y_index]`, one entry per component of
/// the whole equation) down to the boundary data for a single y-component,
/// producing a `DerivativeBoundaryConstraints` whose per-axis list has
/// exactly one entry, with the mask/values sliced to just that component's
/// slot. Used whenever a single-component field (last axis of length 1) is
/// differentiated on its own, so the boundary list passed to
/// `derivative_with_step` et al. matches the field's actual width.
pub fn select_component_boundary(full: &DerivativeBoundaryConstraints, component: usize) -> DerivativeBoundaryConstraints {
    full.iter()
        .map(|per_component| {
            let entry: Option<BoundaryConstraintPair> = per_component.get(component).cloned().flatten();
            vec![entry.map(|(lower, upper)| {
                (
                    lower.map(|c| slice_constraint_to_component(&c, component)),
                    upper.map(|c| slice_constraint_to_component(&c, component)),
                )
            })]
        })
        .collect()
}

fn slice_constraint_to_component(c: &Constraint, component: usize) -> Constraint {
    let last = c.mask().ndim() - 1;
    let mask = c.mask().index_axis(NdAxis(last), component).to_owned().insert_axis(NdAxis(last));
    let values = c.values().index_axis(NdAxis(last), component).to_owned().insert_axis(NdAxis(last));
    Constraint::new(mask, values).expect("slicing a valid constraint keeps matching shapes")
}

fn broadcast_grid_to_y(grid: &ArrayD<f64>, y_dim: usize) -> ArrayD<f64> {
    let widened = grid.clone().insert_axis(NdAxis(grid.ndim()));
    let mut target_shape = grid.shape().to_vec();
    target_shape.push(y_dim);
    widened
        .broadcast(IxDyn(&target_shape))
        .expect("grid broadcast shape is always compatible")
        .to_owned()
}

/// Stateless, pure-function numerical differentiator using a three-point
/// (second order) central difference stencil.
pub struct Differentiator;

impl Differentiator {
    /// `derivative_boundary_constraints` has one entry per y-component; a
    /// `None` entry means "no Neumann data for this component on this
    /// axis", in which case the one-sided stencil estimate is kept as-is.
    /// Parameterized by the step size along `axis` (pulled from the mesh by
    /// higher-level callers).
    pub fn derivative_with_step(
        y: &ArrayD<f64>,
        d_x: f64,
        axis: usize,
        boundary_constraints: &[Option<BoundaryConstraintPair>],
    ) -> Result<ArrayD<f64>> {
        check_axis_width(y, axis)?;
        let y_dim = *y.shape().last().unwrap();
        if boundary_constraints.len() != y_dim {
            return Err(Error::ShapeMismatch {
                expected: vec![y_dim],
                found: vec![boundary_constraints.len()],
            });
        }

        let n = y.shape()[axis];
        let two_dx = 2.0 * d_x;
        let mut derivative = ArrayD::zeros(y.shape());

        // Interior points: (y[i+1] - y[i-1]) / (2dx).
        {
            let upper = y.slice_axis(NdAxis(axis), (2..n).into());
            let lower = y.slice_axis(NdAxis(axis), (0..n - 2).into());
            let mut mid = derivative.slice_axis_mut(NdAxis(axis), (1..n - 1).into());
            Zip::from(&mut mid).and(&upper).and(&lower).for_each(|d, &u, &l| {
                *d = (u - l) / two_dx;
            });
        }

        // One-sided boundary placeholders.
        {
            let next = y.slice_axis(NdAxis(axis), (1..2).into());
            let mut lower_slot = derivative.slice_axis_mut(NdAxis(axis), (0..1).into());
            Zip::from(&mut lower_slot).and(&next).for_each(|d, &n| *d = n / two_dx);
        }
        {
            let prev = y.slice_axis(NdAxis(axis), (n - 2..n - 1).into());
            let mut upper_slot = derivative.slice_axis_mut(NdAxis(axis), (n - 1..n).into());
            Zip::from(&mut upper_slot).and(&prev).for_each(|d, &p| *d = -p / two_dx);
        }

        // Derivative boundary constraints directly overwrite the boundary
        // slot they cover, bypassing the stencil entirely. Each constraint
        // is shaped like the full boundary slice (every y-component) but
        // masks only its own component, so applying it in sequence is
        // safe even though every entry shares the same slot.
        for pair in boundary_constraints.iter() {
            let Some((lower, upper)) = pair else { continue };
            if let Some(lower) = lower {
                let mut slot = derivative.slice_axis_mut(NdAxis(axis), (0..1).into());
                let mut owned = slot.to_owned();
                lower.apply(&mut owned)?;
                slot.assign(&owned);
            }
            if let Some(upper) = upper {
                let mut slot = derivative.slice_axis_mut(NdAxis(axis), (n - 1..n).into());
                let mut owned = slot.to_owned();
                upper.apply(&mut owned)?;
                slot.assign(&owned);
            }
        }

        Ok(derivative)
    }

    pub fn second_derivative(
        y: &ArrayD<f64>,
        d_x1: f64,
        d_x2: f64,
        axis1: usize,
        axis2: usize,
        boundary_constraints: &[Option<BoundaryConstraintPair>],
    ) -> Result<ArrayD<f64>> {
        if axis1 != axis2 {
            let first = Self::derivative_with_step(y, d_x1, axis1, boundary_constraints)?;
            let y_dim = *y.shape().last().unwrap();
            let no_constraints = vec![None; y_dim];
            return Self::derivative_with_step(&first, d_x2, axis2, &no_constraints);
        }

        check_axis_width(y, axis1)?;
        let n = y.shape()[axis1];
        let d_x_sq = d_x1 * d_x2;
        let mut result = ArrayD::zeros(y.shape());

        let adjacent_lower = y.slice_axis(NdAxis(axis1), (1..2).into()).to_owned();
        let adjacent_upper = y.slice_axis(NdAxis(axis1), (n - 2..n - 1).into()).to_owned();
        let (halo_lower, halo_upper) = halos_from_derivative_boundary_constraints(
            &adjacent_lower,
            &adjacent_upper,
            d_x1,
            boundary_constraints,
        )?;

        {
            let curr = y.slice_axis(NdAxis(axis1), (0..1).into());
            let mut slot = result.slice_axis_mut(NdAxis(axis1), (0..1).into());
            Zip::from(&mut slot)
                .and(&adjacent_lower)
                .and(&curr)
                .and(&halo_lower)
                .for_each(|o, &adj, &c, &h| *o = (adj - 2.0 * c + h) / d_x_sq);
        }
        {
            let prev = y.slice_axis(NdAxis(axis1), (0..n - 2).into());
            let curr = y.slice_axis(NdAxis(axis1), (1..n - 1).into());
            let next = y.slice_axis(NdAxis(axis1), (2..n).into());
            let mut slot = result.slice_axis_mut(NdAxis(axis1), (1..n - 1).into());
            Zip::from(&mut slot)
                .and(&prev)
                .and(&curr)
                .and(&next)
                .for_each(|o, &p, &c, &nx| *o = (nx - 2.0 * c + p) / d_x_sq);
        }
        {
            let curr = y.slice_axis(NdAxis(axis1), (n - 1..n).into());
            let mut slot = result.slice_axis_mut(NdAxis(axis1), (n - 1..n).into());
            Zip::from(&mut slot)
                .and(&halo_upper)
                .and(&curr)
                .and(&adjacent_upper)
                .for_each(|o, &h, &c, &adj| *o = (h - 2.0 * c + adj) / d_x_sq);
        }

        Ok(result)
    }

    /// Coordinate-system-corrected first derivative along `axis`.
    pub fn gradient(
        y: &ArrayD<f64>,
        mesh: &Mesh,
        axis: usize,
        boundary_constraints: &[Option<BoundaryConstraintPair>],
    ) -> Result<ArrayD<f64>> {
        let raw = Self::derivative_with_step(y, mesh.axes()[axis].step, axis, boundary_constraints)?;
        let y_dim = *y.shape().last().unwrap();
        match (mesh.coordinate_system(), axis) {
            (CoordinateSystem::Polar, 1) | (CoordinateSystem::Cylindrical, 1) => {
                let r = broadcast_grid_to_y(&mesh.vertex_coordinate_grid(0), y_dim);
                Ok(raw / r)
            }
            (CoordinateSystem::Spherical, 1) => {
                // axis 1 = theta; correction is 1/(r sin(phi)).
                let r = broadcast_grid_to_y(&mesh.vertex_coordinate_grid(0), y_dim);
                let phi = broadcast_grid_to_y(&mesh.vertex_coordinate_grid(2), y_dim);
                Ok(raw / (&r * phi.mapv(f64::sin)))
            }
            (CoordinateSystem::Spherical, 2) => {
                let r = broadcast_grid_to_y(&mesh.vertex_coordinate_grid(0), y_dim);
                Ok(raw / r)
            }
            _ => Ok(raw),
        }
    }

    /// Full Hessian column `d2y/(dx_a1 dx_a2)`, curvilinear-corrected.
    /// For Cartesian meshes this is simply the raw second derivative; for
    /// other coordinate systems the correction is approximated by
    /// composing two `gradient` passes, consistent with how `gradient`
    /// itself folds the curvilinear factor in.
    pub fn hessian(
        y: &ArrayD<f64>,
        mesh: &Mesh,
        axis1: usize,
        axis2: usize,
        boundary_constraints: &[Option<BoundaryConstraintPair>],
    ) -> Result<ArrayD<f64>> {
        if mesh.coordinate_system() == CoordinateSystem::Cartesian {
            return Self::second_derivative(
                y,
                mesh.axes()[axis1].step,
                mesh.axes()[axis2].step,
                axis1,
                axis2,
                boundary_constraints,
            );
        }
        let first = Self::gradient(y, mesh, axis1, boundary_constraints)?;
        let y_dim = *y.shape().last().unwrap();
        let no_constraints = vec![None; y_dim];
        Self::gradient(&first, mesh, axis2, &no_constraints)
    }

    /// Divergence of a vector field whose last axis has `mesh.rank()`
    /// components (one per spatial axis): `sum_axis d(v_axis)/d(x_axis)`.
    /// `component_indices[k]` is the equation's y-index backing `v`'s `k`-th
    /// component, used to look up that component's own boundary data out of
    /// `boundary_constraints` (indexed `[axis][y_index]` over the whole
    /// equation, not just `v`'s components).
    pub fn divergence(
        v: &ArrayD<f64>,
        mesh: &Mesh,
        component_indices: &[usize],
        boundary_constraints: &DerivativeBoundaryConstraints,
    ) -> Result<ArrayD<f64>> {
        let x_dim = mesh.rank();
        if *v.shape().last().unwrap() != x_dim {
            return Err(Error::ShapeMismatch {
                expected: vec![x_dim],
                found: vec![*v.shape().last().unwrap()],
            });
        }
        let mut scalar_shape = v.shape().to_vec();
        scalar_shape.pop();
        let mut total = ArrayD::zeros(scalar_shape);
        for axis in 0..x_dim {
            let component = v.index_axis(NdAxis(v.ndim() - 1), axis).to_owned();
            let component_ndim = component.ndim();
            let component = component.insert_axis(NdAxis(component_ndim));
            let component_boundary = select_component_boundary(boundary_constraints, component_indices[axis]);
            let d = Self::gradient(&component, mesh, axis, &component_boundary[axis])?;
            total += &d.index_axis(NdAxis(d.ndim() - 1), 0);
        }
        Ok(total)
    }

    /// Component `curl_ind` of the curl of a vector field (2D: scalar,
    /// `curl_ind` ignored; 3D: `curl_ind` in `0..3`). `component_indices` is
    /// as in [`Differentiator::divergence`].
    pub fn curl(
        v: &ArrayD<f64>,
        mesh: &Mesh,
        curl_ind: usize,
        component_indices: &[usize],
        boundary_constraints: &DerivativeBoundaryConstraints,
    ) -> Result<ArrayD<f64>> {
        let x_dim = mesh.rank();
        if *v.shape().last().unwrap() != x_dim {
            return Err(Error::ShapeMismatch {
                expected: vec![x_dim],
                found: vec![*v.shape().last().unwrap()],
            });
        }
        let component_field = |idx: usize| -> ArrayD<f64> {
            let c = v.index_axis(NdAxis(v.ndim() - 1), idx).to_owned();
            let c_ndim = c.ndim();
            c.insert_axis(NdAxis(c_ndim))
        };
        let grad_of = |idx: usize, axis: usize| -> Result<ArrayD<f64>> {
            let field = component_field(idx);
            let component_boundary = select_component_boundary(boundary_constraints, component_indices[idx]);
            let d = Self::gradient(&field, mesh, axis, &component_boundary[axis])?;
            Ok(d.index_axis(NdAxis(d.ndim() - 1), 0).to_owned())
        };
        match x_dim {
            2 => {
                // curl = dv/dx - du/dy.
                let dv_dx = grad_of(1, 0)?;
                let du_dy = grad_of(0, 1)?;
                Ok(dv_dx - du_dy)
            }
            3 => match curl_ind {
                0 => Ok(grad_of(2, 1)? - grad_of(1, 2)?),
                1 => Ok(grad_of(0, 2)? - grad_of(2, 0)?),
                2 => Ok(grad_of(1, 0)? - grad_of(0, 1)?),
                other => Err(Error::InvalidParameter(format!(
                    "curl component index must be in 0..3 for a 3D field, got {other}"
                ))),
            },
            other => Err(Error::InvalidParameter(format!(
                "curl is only defined for x_dimension in {{2, 3}}, got {other}"
            ))),
        }
    }

    /// Curvilinear-corrected Laplacian of every `y`-component.
    pub fn laplacian(
        y: &ArrayD<f64>,
        mesh: &Mesh,
        boundary_constraints: &DerivativeBoundaryConstraints,
    ) -> Result<ArrayD<f64>> {
        let y_dim = *y.shape().last().unwrap();
        match mesh.coordinate_system() {
            CoordinateSystem::Cartesian => {
                let mut total = ArrayD::zeros(y.shape());
                for axis in 0..mesh.rank() {
                    let d_x = mesh.axes()[axis].step;
                    total += &Self::second_derivative(
                        y,
                        d_x,
                        d_x,
                        axis,
                        axis,
                        &boundary_constraints[axis],
                    )?;
                }
                Ok(total)
            }
            CoordinateSystem::Polar => {
                let d_x = mesh.axes();
                let d2r = Self::second_derivative(y, d_x[0].step, d_x[0].step, 0, 0, &boundary_constraints[0])?;
                let dr = Self::derivative_with_step(y, d_x[0].step, 0, &boundary_constraints[0])?;
                let d2theta =
                    Self::second_derivative(y, d_x[1].step, d_x[1].step, 1, 1, &boundary_constraints[1])?;
                let r = broadcast_grid_to_y(&mesh.vertex_coordinate_grid(0), y_dim);
                Ok(d2r + &dr / &r + d2theta / r.mapv(|v| v * v))
            }
            CoordinateSystem::Cylindrical => {
                let d_x = mesh.axes();
                let d2r = Self::second_derivative(y, d_x[0].step, d_x[0].step, 0, 0, &boundary_constraints[0])?;
                let dr = Self::derivative_with_step(y, d_x[0].step, 0, &boundary_constraints[0])?;
                let d2theta =
                    Self::second_derivative(y, d_x[1].step, d_x[1].step, 1, 1, &boundary_constraints[1])?;
                let d2z = Self::second_derivative(y, d_x[2].step, d_x[2].step, 2, 2, &boundary_constraints[2])?;
                let r = broadcast_grid_to_y(&mesh.vertex_coordinate_grid(0), y_dim);
                Ok(d2r + &dr / &r + d2theta / r.mapv(|v| v * v) + d2z)
            }
            CoordinateSystem::Spherical => {
                let d_x = mesh.axes();
                let d2r = Self::second_derivative(y, d_x[0].step, d_x[0].step, 0, 0, &boundary_constraints[0])?;
                let dr = Self::derivative_with_step(y, d_x[0].step, 0, &boundary_constraints[0])?;
                let d2theta =
                    Self::second_derivative(y, d_x[1].step, d_x[1].step, 1, 1, &boundary_constraints[1])?;
                let d2phi = Self::second_derivative(y, d_x[2].step, d_x[2].step, 2, 2, &boundary_constraints[2])?;
                let dphi = Self::derivative_with_step(y, d_x[2].step, 2, &boundary_constraints[2])?;
                let r = broadcast_grid_to_y(&mesh.vertex_coordinate_grid(0), y_dim);
                let phi = broadcast_grid_to_y(&mesh.vertex_coordinate_grid(2), y_dim);
                let r2 = r.mapv(|v| v * v);
                let sin_phi = phi.mapv(f64::sin);
                let cot_phi = &phi.mapv(f64::cos) / &sin_phi;
                Ok(d2r + 2.0 * &dr / &r
                    + &d2phi / &r2
                    + &cot_phi * &dphi / &r2
                    + d2theta / (&r2 * sin_phi.mapv(|v| v * v)))
            }
        }
    }

    /// Jacobi iteration solving `Δy ≈ target` for `y`, subject to the
    /// Dirichlet `y_constraints` re-applied after every sweep. `y0` seeds
    /// the iteration; if `None`, a small random field is used.
    ///
    /// Only `CoordinateSystem::Cartesian` meshes are supported: the update
    /// uses the Cartesian stencil coefficients directly, and curvilinear
    /// corrections (as applied by [`Differentiator::laplacian`]) are not
    /// derived for the anti-Laplacian solve.
    pub fn anti_laplacian(
        target: &ArrayD<f64>,
        mesh: &Mesh,
        y_constraints: &[Constraint],
        d_y_boundary_constraints: &DerivativeBoundaryConstraints,
        settings: JacobiSettings,
        y0: Option<ArrayD<f64>>,
    ) -> Result<ArrayD<f64>> {
        if mesh.coordinate_system() != CoordinateSystem::Cartesian {
            return Err(Error::InvalidParameter(format!(
                "anti_laplacian only supports Cartesian meshes, got {:?}",
                mesh.coordinate_system()
            )));
        }

        let y_dim = *target.shape().last().unwrap();
        let expected_shape = mesh.y_vertices_shape(y_dim);
        if target.shape() != expected_shape.as_slice() {
            return Err(Error::ShapeMismatch {
                expected: expected_shape,
                found: target.shape().to_vec(),
            });
        }
        for axis_len in &mesh.vertex_shape() {
            if *axis_len < 3 {
                return Err(Error::InsufficientStencilWidth {
                    axis: 0,
                    len: *axis_len,
                });
            }
        }

        let mut y = match y0 {
            Some(y0) => y0,
            None => {
                let mut rng = rand::thread_rng();
                ArrayD::from_shape_fn(target.shape(), |_| rng.gen_range(-1e-3..1e-3))
            }
        };
        for constraint in y_constraints {
            constraint.apply(&mut y)?;
        }

        let mut last_residual = f64::INFINITY;
        let d_x: Vec<f64> = mesh.axes().iter().map(|a| a.step).collect();
        let d_x_sq: Vec<f64> = d_x.iter().map(|d| d * d).collect();

        let step_size_coefficients: Vec<f64> = (0..mesh.rank())
            .map(|axis| {
                let before: f64 = d_x_sq[..axis].iter().product();
                let after: f64 = d_x_sq[axis + 1..].iter().product();
                before * after
            })
            .collect();
        let coefficient_sum: f64 = step_size_coefficients.iter().sum::<f64>() * 2.0;

        for iteration in 0..settings.max_iterations {
            let mut next = ArrayD::zeros(y.shape());

            for axis in 0..mesh.rank() {
                let n = y.shape()[axis];
                let coefficient = step_size_coefficients[axis];

                let adjacent_lower = y.slice_axis(NdAxis(axis), (1..2).into()).to_owned();
                let adjacent_upper = y.slice_axis(NdAxis(axis), (n - 2..n - 1).into()).to_owned();
                let (halo_lower, halo_upper) = halos_from_derivative_boundary_constraints(
                    &adjacent_lower,
                    &adjacent_upper,
                    d_x[axis],
                    &d_y_boundary_constraints[axis],
                )?;

                {
                    let mut slot = next.slice_axis_mut(NdAxis(axis), (0..1).into());
                    Zip::from(&mut slot)
                        .and(&halo_lower)
                        .and(&adjacent_lower)
                        .for_each(|s, &h, &a| *s += coefficient * (h + a));
                }
                {
                    let prev = y.slice_axis(NdAxis(axis), (0..n - 2).into());
                    let next_slice = y.slice_axis(NdAxis(axis), (2..n).into());
                    let mut mid = next.slice_axis_mut(NdAxis(axis), (1..n - 1).into());
                    Zip::from(&mut mid).and(&prev).and(&next_slice).for_each(|s, &p, &nx| {
                        *s += coefficient * (p + nx);
                    });
                }
                {
                    let mut slot = next.slice_axis_mut(NdAxis(axis), (n - 1..n).into());
                    Zip::from(&mut slot)
                        .and(&halo_upper)
                        .and(&adjacent_upper)
                        .for_each(|s, &h, &a| *s += coefficient * (h + a));
                }
            }

            Zip::from(&mut next).and(target).for_each(|n, &t| {
                *n = (*n - d_x_sq.iter().product::<f64>() * t) / coefficient_sum;
            });

            for constraint in y_constraints {
                constraint.apply(&mut next)?;
            }

            let residual = squared_diff_norm(&next, &y).sqrt();
            log::debug!("jacobi iteration {iteration}: residual = {residual:e}");
            last_residual = residual;
            if residual < settings.tolerance {
                return Ok(next);
            }
            y = next;
        }

        Err(Error::DidNotConverge {
            what: "anti-Laplacian (Jacobi)",
            max_iterations: settings.max_iterations,
            residual: last_residual,
            tolerance: settings.tolerance,
        })
    }
}

fn squared_diff_norm(a: &ArrayD<f64>, b: &ArrayD<f64>) -> f64 {
    a.as_slice()
        .unwrap_or(&[])
        .par_iter()
        .zip(b.as_slice().unwrap_or(&[]).par_iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

fn halos_from_derivative_boundary_constraints(
    adjacent_lower: &ArrayD<f64>,
    adjacent_upper: &ArrayD<f64>,
    d_x: f64,
    boundary_constraints: &[Option<BoundaryConstraintPair>],
) -> Result<(ArrayD<f64>, ArrayD<f64>)> {
    let mut halo_lower = ArrayD::zeros(adjacent_lower.shape());
    let mut halo_upper = ArrayD::zeros(adjacent_upper.shape());

    for pair in boundary_constraints.iter() {
        let Some((lower, upper)) = pair else { continue };
        if let Some(lower) = lower {
            lower.multiply_and_add(adjacent_lower, -2.0 * d_x, &mut halo_lower)?;
        }
        if let Some(upper) = upper {
            upper.multiply_and_add(adjacent_upper, 2.0 * d_x, &mut halo_upper)?;
        }
    }

    Ok((halo_lower, halo_upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Axis;
    use ndarray::Array;

    fn cartesian_mesh() -> Mesh {
        Mesh::new(vec![Axis::new(0.0, 1.0, 0.25).unwrap()], CoordinateSystem::Cartesian).unwrap()
    }

    fn polar_mesh() -> Mesh {
        Mesh::new(vec![Axis::new(1.0, 2.0, 0.25).unwrap()], CoordinateSystem::Polar).unwrap()
    }

    #[test]
    fn anti_laplacian_rejects_non_cartesian_mesh() {
        let mesh = polar_mesh();
        let target = ArrayD::zeros(mesh.y_vertices_shape(1));
        let boundary: DerivativeBoundaryConstraints = vec![vec![None]];
        let result = Differentiator::anti_laplacian(&target, &mesh, &[], &boundary, JacobiSettings::default(), None);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn anti_laplacian_converges_on_cartesian_mesh() {
        let mesh = cartesian_mesh();
        let target = ArrayD::zeros(mesh.y_vertices_shape(1));
        let boundary: DerivativeBoundaryConstraints = vec![vec![None]];
        let y0 = Array::from_elem(mesh.y_vertices_shape(1), 0.0).into_dyn();
        let result = Differentiator::anti_laplacian(&target, &mesh, &[], &boundary, JacobiSettings::default(), Some(y0)).unwrap();
        assert!(result.iter().all(|&v| v.abs() < 1e-9));
    }

    #[test]
    fn select_component_boundary_slices_a_single_component() {
        let mask = Array::from_shape_vec(vec![1, 2], vec![true, false]).unwrap().into_dyn();
        let values = Array::from_shape_vec(vec![1, 2], vec![5.0, 9.0]).unwrap().into_dyn();
        let constraint = Constraint::new(mask, values).unwrap();
        let full: DerivativeBoundaryConstraints = vec![vec![Some((Some(constraint), None))]];

        let sliced = select_component_boundary(&full, 0);
        assert_eq!(sliced.len(), 1);
        assert_eq!(sliced[0].len(), 1);
        let (lower, upper) = sliced[0][0].as_ref().unwrap();
        assert!(upper.is_none());
        assert_eq!(lower.as_ref().unwrap().mask().shape(), &[1, 1]);
    }
}
