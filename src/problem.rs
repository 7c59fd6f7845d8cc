//! A differential equation posed over a mesh together with its boundary
//! conditions, and the machinery that turns those conditions into
//! [`Constraint`]s the FDM operator can apply directly.

use ndarray::{indices, ArrayD, Axis as NdAxis, Dimension, IxDyn};

use crate::boundary::BoundaryCondition;
use crate::constraint::Constraint;
use crate::differentiator::DerivativeBoundaryConstraints;
use crate::equation::DifferentialEquation;
use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// The boundary condition pair `[lower, upper]` for one spatial axis.
pub type AxisBoundaryConditions = [Option<BoundaryCondition>; 2];

pub struct ConstrainedProblem {
    mesh: Mesh,
    equation: DifferentialEquation,
    boundary_conditions: Vec<AxisBoundaryConditions>,
}

impl ConstrainedProblem {
    pub fn new(
        mesh: Mesh,
        equation: DifferentialEquation,
        boundary_conditions: Vec<AxisBoundaryConditions>,
    ) -> Result<Self> {
        if equation.x_dimension() != mesh.rank() {
            return Err(Error::InvalidParameter(format!(
                "equation has x_dimension {} but mesh has rank {}",
                equation.x_dimension(),
                mesh.rank()
            )));
        }
        if boundary_conditions.len() != mesh.rank() {
            return Err(Error::InvalidParameter(format!(
                "expected {} axes of boundary conditions, got {}",
                mesh.rank(),
                boundary_conditions.len()
            )));
        }
        equation.symbolic_equation_system()?;
        Ok(Self { mesh, equation, boundary_conditions })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn equation(&self) -> &DifferentialEquation {
        &self.equation
    }

    pub fn boundary_conditions(&self) -> &[AxisBoundaryConditions] {
        &self.boundary_conditions
    }

    pub fn y_vertices_shape(&self) -> Vec<usize> {
        self.mesh.y_vertices_shape(self.equation.y_dimension())
    }

    pub fn y_cells_shape(&self) -> Vec<usize> {
        self.mesh.y_cells_shape(self.equation.y_dimension())
    }

    /// One Dirichlet constraint per `y` component, shaped like
    /// `mesh.vertex_shape()`.
    pub fn y_vertex_constraints(&self, t: f64) -> Result<Vec<Constraint>> {
        let y_dim = self.equation.y_dimension();
        let vertex_shape = self.mesh.vertex_shape();
        let mut masks = vec![ArrayD::from_elem(vertex_shape.clone(), false); y_dim];
        let mut values = vec![ArrayD::zeros(vertex_shape.clone()); y_dim];

        for (axis, pair) in self.boundary_conditions.iter().enumerate() {
            for (end, condition) in pair.iter().enumerate() {
                let Some(condition) = condition else { continue };
                let Some(points) = self.evaluate_face(condition, axis, end, t, BoundaryCondition::y_value) else {
                    continue;
                };
                let axis_index = if end == 0 { 0 } else { vertex_shape[axis] - 1 };
                for (face_point, values_at_point) in points {
                    let mut full_index = face_point;
                    full_index[axis] = axis_index;
                    for (component, value) in values_at_point.into_iter().enumerate() {
                        let Some(value) = value else { continue };
                        masks[component][IxDyn(&full_index)] = true;
                        values[component][IxDyn(&full_index)] = value;
                    }
                }
            }
        }

        masks
            .into_iter()
            .zip(values)
            .map(|(m, v)| Constraint::new(m, v))
            .collect()
    }

    /// The per-component constraints above, OR-combined into a single
    /// constraint covering the whole `y_vertices_shape` tensor (the design note's
    /// "don't silently collapse the two shapes" open question).
    pub fn y_vertex_constraint_combined(&self, t: f64) -> Result<Constraint> {
        let per_component = self.y_vertex_constraints(t)?;
        let shape = self.y_vertices_shape();
        let mut mask = ArrayD::from_elem(shape.clone(), false);
        let mut values = ArrayD::zeros(shape);
        let last_axis = mask.ndim() - 1;
        for (component, constraint) in per_component.iter().enumerate() {
            let mut mask_slot = mask.slice_axis_mut(NdAxis(last_axis), (component..component + 1).into());
            let mut value_slot = values.slice_axis_mut(NdAxis(last_axis), (component..component + 1).into());
            mask_slot.assign(&constraint.mask().clone().insert_axis(NdAxis(last_axis)));
            value_slot.assign(&constraint.values().clone().insert_axis(NdAxis(last_axis)));
        }
        Constraint::new(mask, values)
    }

    /// `d_y_boundary_vertex_constraints[axis]` is a list with one entry per
    /// `y` component; each entry is `None` if neither boundary end of that
    /// axis carries Neumann data for that component, or
    /// `Some((lower, upper))` with each side an optional [`Constraint`]
    /// shaped like the full `y` tensor with `axis`'s extent collapsed to 1,
    /// masking only its own component.
    pub fn d_y_boundary_vertex_constraints(&self, t: f64) -> Result<DerivativeBoundaryConstraints> {
        let y_dim = self.equation.y_dimension();
        let mut face_shape = self.mesh.y_vertices_shape(y_dim);
        let mut per_axis = Vec::with_capacity(self.mesh.rank());

        for (axis, pair) in self.boundary_conditions.iter().enumerate() {
            face_shape[axis] = 1;
            let mut entries = vec![None; y_dim];

            let mut sides_by_component: Vec<[Option<(ArrayD<bool>, ArrayD<f64>)>; 2]> =
                vec![[None, None]; y_dim];

            for (end, condition) in pair.iter().enumerate() {
                let Some(condition) = condition else { continue };
                let Some(points) = self.evaluate_face(condition, axis, end, t, BoundaryCondition::d_y_value) else {
                    continue;
                };
                for component in 0..y_dim {
                    let mut mask = ArrayD::from_elem(face_shape.clone(), false);
                    let mut vals = ArrayD::zeros(face_shape.clone());
                    let mut any = false;
                    for (mut face_point, values_at_point) in points.clone() {
                        face_point[axis] = 0;
                        if let Some(value) = values_at_point.get(component).copied().flatten() {
                            face_point.push(component);
                            mask[IxDyn(&face_point)] = true;
                            vals[IxDyn(&face_point)] = value;
                            any = true;
                        }
                    }
                    if any {
                        sides_by_component[component][end] = Some((mask, vals));
                    }
                }
            }

            for (component, sides) in sides_by_component.into_iter().enumerate() {
                let [lower, upper] = sides;
                if lower.is_none() && upper.is_none() {
                    continue;
                }
                let to_constraint = |side: Option<(ArrayD<bool>, ArrayD<f64>)>| -> Result<Option<Constraint>> {
                    side.map(|(m, v)| Constraint::new(m, v)).transpose()
                };
                entries[component] = Some((to_constraint(lower)?, to_constraint(upper)?));
            }
            per_axis.push(entries);
            face_shape[axis] = self.mesh.vertex_shape()[axis];
        }
        Ok(per_axis)
    }

    /// Evaluates `eval` at every point of the boundary face `(axis, end)`,
    /// returning `(index_within_vertex_shape, per_component_values)` pairs.
    fn evaluate_face(
        &self,
        condition: &BoundaryCondition,
        axis: usize,
        end: usize,
        t: f64,
        eval: impl Fn(&BoundaryCondition, &[f64], f64) -> Option<Vec<Option<f64>>>,
    ) -> Option<Vec<(Vec<usize>, Vec<Option<f64>>)>> {
        let vertex_shape = self.mesh.vertex_shape();
        let mut face_shape = vertex_shape.clone();
        face_shape[axis] = 1;
        let axis_index = if end == 0 { 0 } else { vertex_shape[axis] - 1 };

        let mut out = Vec::new();
        for point in indices(IxDyn(&face_shape)) {
            let mut full_index = point.slice().to_vec();
            full_index[axis] = axis_index;
            let x = self.mesh.vertex_coordinate(&full_index);
            out.push((full_index, eval(condition, &x, t)?));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation::DifferentialEquation;
    use crate::mesh::{Axis, CoordinateSystem};

    fn line_mesh() -> Mesh {
        Mesh::new(vec![Axis::new(0.0, 1.0, 0.25).unwrap()], CoordinateSystem::Cartesian).unwrap()
    }

    #[test]
    fn dirichlet_boundary_constrains_only_its_endpoints() {
        let mesh = line_mesh();
        let equation = DifferentialEquation::diffusion(1, 1.0).unwrap();
        let lower = BoundaryCondition::dirichlet(true, Box::new(|_x, _t| vec![Some(1.0)]));
        let upper = BoundaryCondition::dirichlet(true, Box::new(|_x, _t| vec![Some(-1.0)]));
        let problem = ConstrainedProblem::new(mesh, equation, vec![[Some(lower), Some(upper)]]).unwrap();

        let constraints = problem.y_vertex_constraints(0.0).unwrap();
        assert_eq!(constraints.len(), 1);
        let mask = constraints[0].mask();
        assert!(mask[IxDyn(&[0])]);
        assert!(mask[IxDyn(&[4])]);
        assert!(!mask[IxDyn(&[2])]);
        assert_eq!(constraints[0].values()[IxDyn(&[0])], 1.0);
        assert_eq!(constraints[0].values()[IxDyn(&[4])], -1.0);
    }

    #[test]
    fn mismatched_x_dimension_is_rejected() {
        let mesh = line_mesh();
        let bad_equation = DifferentialEquation::wave(2, 1.0).unwrap();
        assert!(ConstrainedProblem::new(mesh, bad_equation, vec![[None, None]]).is_err());
    }

    #[test]
    fn combined_constraint_matches_per_component_masks() {
        let mesh = line_mesh();
        let equation = DifferentialEquation::wave(1, 1.0).unwrap();
        let lower = BoundaryCondition::dirichlet(true, Box::new(|_x, _t| vec![Some(0.0), Some(0.0)]));
        let problem = ConstrainedProblem::new(mesh, equation, vec![[Some(lower), None]]).unwrap();
        let combined = problem.y_vertex_constraint_combined(0.0).unwrap();
        assert!(combined.mask()[IxDyn(&[0, 0])]);
        assert!(combined.mask()[IxDyn(&[0, 1])]);
        assert!(!combined.mask()[IxDyn(&[4, 0])]);
    }
}
