//! A tagged-enum AST for the right-hand side of a differential equation,
//! generalized from a scalar stack-machine interpreter into a tree
//! interpreter over `ndarray` tensors.

use std::ops::{Add as _, Div as _, Mul as _, Sub as _};

use ndarray::ArrayD;

use crate::differentiator::{DerivativeBoundaryConstraints, Differentiator};
use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// A symbolic expression evaluating to a scalar field (PDE case, one value
/// per mesh vertex) or a bare scalar (ODE case, `x_dimension == 0`).
#[derive(Debug, Clone)]
pub enum Expr {
    Const(f64),
    /// The current time.
    T,
    /// The `i`-th `y` component, as a whole field/scalar.
    Y(usize),
    /// `d y_i / d x_axis`, coordinate-system-corrected.
    Grad(usize, usize),
    /// `d2 y_i / (d x_a1 d x_a2)`, coordinate-system-corrected.
    Hessian(usize, usize, usize),
    /// `Delta y_i`.
    Laplacian(usize),
    /// Divergence of the vector field formed by `y[indices]` (one
    /// component per spatial axis).
    Divergence(Vec<usize>),
    /// Curl of a 2D vector field `(y[i], y[j])`; always scalar.
    Curl2(usize, usize),
    /// Component `component` of the curl of a 3D vector field
    /// `(y[i], y[j], y[k])`.
    Curl3(usize, usize, usize, usize),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Pow(Box<Expr>, f64),
    /// Dot product of two equal-length symbolic vectors.
    Dot(Vec<Expr>, Vec<Expr>),
}

impl Expr {
    pub fn c(value: f64) -> Self {
        Expr::Const(value)
    }

    pub fn y(i: usize) -> Self {
        Expr::Y(i)
    }

    pub fn add(self, other: Expr) -> Self {
        Expr::Add(Box::new(self), Box::new(other))
    }

    pub fn sub(self, other: Expr) -> Self {
        Expr::Sub(Box::new(self), Box::new(other))
    }

    pub fn mul(self, other: Expr) -> Self {
        Expr::Mul(Box::new(self), Box::new(other))
    }

    pub fn div(self, other: Expr) -> Self {
        Expr::Div(Box::new(self), Box::new(other))
    }

    pub fn neg(self) -> Self {
        Expr::Neg(Box::new(self))
    }

    pub fn pow(self, exponent: f64) -> Self {
        Expr::Pow(Box::new(self), exponent)
    }

    /// Every `Y` index this expression reads, used by
    /// `DifferentialEquation` to validate that an equation stays within
    /// its declared `y_dimension`.
    pub fn referenced_y_indices(&self, out: &mut Vec<usize>) {
        match self {
            Expr::Const(_) | Expr::T => {}
            Expr::Y(i) | Expr::Laplacian(i) => out.push(*i),
            Expr::Grad(i, _) => out.push(*i),
            Expr::Hessian(i, _, _) => out.push(*i),
            Expr::Divergence(indices) => out.extend(indices.iter().copied()),
            Expr::Curl2(i, j) => {
                out.push(*i);
                out.push(*j);
            }
            Expr::Curl3(i, j, k, _) => {
                out.push(*i);
                out.push(*j);
                out.push(*k);
            }
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.referenced_y_indices(out);
                b.referenced_y_indices(out);
            }
            Expr::Neg(a) | Expr::Pow(a, _) => a.referenced_y_indices(out),
            Expr::Dot(a, b) => {
                for e in a.iter().chain(b.iter()) {
                    e.referenced_y_indices(out);
                }
            }
        }
    }

    /// Evaluate this expression in the ODE setting (`x_dimension == 0`),
    /// where `y` is a flat state vector and no spatial leaves are legal.
    pub fn eval_scalar(&self, y: &[f64], t: f64) -> Result<f64> {
        Ok(match self {
            Expr::Const(v) => *v,
            Expr::T => t,
            Expr::Y(i) => *y.get(*i).ok_or_else(|| Error::SymbolOutOfScope {
                symbol: format!("y[{i}]"),
            })?,
            Expr::Add(a, b) => a.eval_scalar(y, t)?.add(b.eval_scalar(y, t)?),
            Expr::Sub(a, b) => a.eval_scalar(y, t)?.sub(b.eval_scalar(y, t)?),
            Expr::Mul(a, b) => a.eval_scalar(y, t)?.mul(b.eval_scalar(y, t)?),
            Expr::Div(a, b) => a.eval_scalar(y, t)?.div(b.eval_scalar(y, t)?),
            Expr::Neg(a) => -a.eval_scalar(y, t)?,
            Expr::Pow(a, exp) => a.eval_scalar(y, t)?.powf(*exp),
            Expr::Dot(a, b) => {
                let mut total = 0.0;
                for (ea, eb) in a.iter().zip(b.iter()) {
                    total += ea.eval_scalar(y, t)? * eb.eval_scalar(y, t)?;
                }
                total
            }
            spatial => {
                return Err(Error::SymbolOutOfScope {
                    symbol: format!("{spatial:?} is a spatial operator, illegal in an ODE (x_dimension == 0)"),
                })
            }
        })
    }

    /// Evaluate this expression in the PDE setting, returning a scalar
    /// field shaped like `mesh.vertex_shape()`.
    pub fn eval_field(&self, ctx: &FieldContext<'_>) -> Result<ArrayD<f64>> {
        match self {
            Expr::Const(v) => Ok(ArrayD::from_elem(ctx.mesh.vertex_shape(), *v)),
            Expr::T => Ok(ArrayD::from_elem(ctx.mesh.vertex_shape(), ctx.t)),
            Expr::Y(i) => Ok(ctx.component(*i)),
            Expr::Grad(i, axis) => {
                let field = ctx.component_with_y_axis(*i);
                let boundary = crate::differentiator::select_component_boundary(ctx.d_y_boundary, *i);
                let d = Differentiator::gradient(&field, ctx.mesh, *axis, &boundary[*axis])?;
                Ok(squeeze_last(&d))
            }
            Expr::Hessian(i, a1, a2) => {
                let field = ctx.component_with_y_axis(*i);
                let boundary = crate::differentiator::select_component_boundary(ctx.d_y_boundary, *i);
                let h = Differentiator::hessian(&field, ctx.mesh, *a1, *a2, &boundary[*a1])?;
                Ok(squeeze_last(&h))
            }
            Expr::Laplacian(i) => {
                let field = ctx.component_with_y_axis(*i);
                let boundary = crate::differentiator::select_component_boundary(ctx.d_y_boundary, *i);
                let l = Differentiator::laplacian(&field, ctx.mesh, &boundary)?;
                Ok(squeeze_last(&l))
            }
            Expr::Divergence(indices) => {
                let v = ctx.vector_field(indices);
                Differentiator::divergence(&v, ctx.mesh, indices, ctx.d_y_boundary)
            }
            Expr::Curl2(i, j) => {
                let v = ctx.vector_field(&[*i, *j]);
                Differentiator::curl(&v, ctx.mesh, 0, &[*i, *j], ctx.d_y_boundary)
            }
            Expr::Curl3(i, j, k, component) => {
                let v = ctx.vector_field(&[*i, *j, *k]);
                Differentiator::curl(&v, ctx.mesh, *component, &[*i, *j, *k], ctx.d_y_boundary)
            }
            Expr::Add(a, b) => Ok(a.eval_field(ctx)? + b.eval_field(ctx)?),
            Expr::Sub(a, b) => Ok(a.eval_field(ctx)? - b.eval_field(ctx)?),
            Expr::Mul(a, b) => Ok(a.eval_field(ctx)? * b.eval_field(ctx)?),
            Expr::Div(a, b) => Ok(a.eval_field(ctx)? / b.eval_field(ctx)?),
            Expr::Neg(a) => Ok(-a.eval_field(ctx)?),
            Expr::Pow(a, exp) => Ok(a.eval_field(ctx)?.mapv(|v| v.powf(*exp))),
            Expr::Dot(a, b) => {
                let mut total = ArrayD::zeros(ctx.mesh.vertex_shape());
                for (ea, eb) in a.iter().zip(b.iter()) {
                    total += &(ea.eval_field(ctx)? * eb.eval_field(ctx)?);
                }
                Ok(total)
            }
        }
    }
}

fn squeeze_last(a: &ArrayD<f64>) -> ArrayD<f64> {
    a.index_axis(ndarray::Axis(a.ndim() - 1), 0).to_owned()
}

/// Everything needed to evaluate a field-valued `Expr`: the current `y`
/// tensor, time, mesh, and the derivative-boundary constraints used to
/// synthesize halos at mesh edges.
pub struct FieldContext<'a> {
    pub y: &'a ArrayD<f64>,
    pub t: f64,
    pub mesh: &'a Mesh,
    pub d_y_boundary: &'a DerivativeBoundaryConstraints,
}

impl<'a> FieldContext<'a> {
    fn component(&self, i: usize) -> ArrayD<f64> {
        self.y.index_axis(ndarray::Axis(self.y.ndim() - 1), i).to_owned()
    }

    fn component_with_y_axis(&self, i: usize) -> ArrayD<f64> {
        self.component(i).insert_axis(ndarray::Axis(self.mesh.rank()))
    }

    fn vector_field(&self, indices: &[usize]) -> ArrayD<f64> {
        let components: Vec<ArrayD<f64>> = indices.iter().map(|&i| self.component(i)).collect();
        let views: Vec<_> = components.iter().map(|c| c.view().insert_axis(ndarray::Axis(c.ndim()))).collect();
        ndarray::concatenate(ndarray::Axis(self.mesh.rank()), &views).expect("component shapes agree by construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_eval_handles_arithmetic_and_time() {
        let expr = Expr::y(0).mul(Expr::c(2.0)).add(Expr::T);
        assert_eq!(expr.eval_scalar(&[3.0], 1.5).unwrap(), 7.5);
    }

    #[test]
    fn scalar_eval_rejects_out_of_range_component() {
        let expr = Expr::y(5);
        assert!(expr.eval_scalar(&[1.0], 0.0).is_err());
    }

    #[test]
    fn scalar_eval_rejects_spatial_leaves() {
        let expr = Expr::Laplacian(0);
        assert!(expr.eval_scalar(&[1.0], 0.0).is_err());
    }

    #[test]
    fn referenced_y_indices_collects_every_leaf() {
        let expr = Expr::Dot(vec![Expr::y(0), Expr::y(1)], vec![Expr::Grad(2, 0), Expr::Laplacian(3)]);
        let mut indices = Vec::new();
        expr.referenced_y_indices(&mut indices);
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
