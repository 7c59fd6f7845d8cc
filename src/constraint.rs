//! A mask-plus-values object that forces selected entries of an array
//! to fixed values.

use ndarray::{ArrayD, Zip};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Constraint {
    mask: ArrayD<bool>,
    values: ArrayD<f64>,
}

impl Constraint {
    pub fn new(mask: ArrayD<bool>, values: ArrayD<f64>) -> Result<Self> {
        if mask.shape() != values.shape() {
            return Err(Error::ShapeMismatch {
                expected: mask.shape().to_vec(),
                found: values.shape().to_vec(),
            });
        }
        Ok(Self { mask, values })
    }

    /// A constraint that forces nothing, shaped like `shape`.
    pub fn empty(shape: &[usize]) -> Self {
        Self {
            mask: ArrayD::from_elem(shape, false),
            values: ArrayD::zeros(shape),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.mask.shape()
    }

    pub fn mask(&self) -> &ArrayD<bool> {
        &self.mask
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// `y[mask] <- values[mask]`.
    pub fn apply(&self, y: &mut ArrayD<f64>) -> Result<()> {
        if y.shape() != self.mask.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.mask.shape().to_vec(),
                found: y.shape().to_vec(),
            });
        }
        Zip::from(y)
            .and(&self.mask)
            .and(&self.values)
            .for_each(|y, &m, &v| {
                if m {
                    *y = v;
                }
            });
        Ok(())
    }

    /// `out[mask] <- y[mask] + alpha * values[mask]`, leaving the rest of
    /// `out` untouched. Used to synthesize halo values from Neumann data.
    pub fn multiply_and_add(&self, y: &ArrayD<f64>, alpha: f64, out: &mut ArrayD<f64>) -> Result<()> {
        if y.shape() != self.mask.shape() || out.shape() != self.mask.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.mask.shape().to_vec(),
                found: y.shape().to_vec(),
            });
        }
        Zip::from(out)
            .and(y)
            .and(&self.mask)
            .and(&self.values)
            .for_each(|out, &y, &m, &v| {
                if m {
                    *out = y + alpha * v;
                }
            });
        Ok(())
    }

    /// The union of two constraints over the same shape: a point is forced
    /// if either constraint forces it, preferring `other`'s value on
    /// overlap. Used to combine per-component constraints into the
    /// whole-`y` shape the design notes call for.
    pub fn or(&self, other: &Constraint) -> Result<Constraint> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_vec(),
                found: other.shape().to_vec(),
            });
        }
        let mut mask = self.mask.clone();
        let mut values = self.values.clone();
        Zip::from(&mut mask)
            .and(&mut values)
            .and(&other.mask)
            .and(&other.values)
            .for_each(|m, v, &om, &ov| {
                if om {
                    *m = true;
                    *v = ov;
                }
            });
        Ok(Constraint { mask, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, IxDyn};

    #[test]
    fn apply_overwrites_only_masked_entries() {
        let mask = ndarray::ArrayD::from_shape_vec(IxDyn(&[3]), vec![true, false, true]).unwrap();
        let values = ndarray::ArrayD::from_shape_vec(IxDyn(&[3]), vec![9.0, 0.0, 7.0]).unwrap();
        let constraint = Constraint::new(mask, values).unwrap();

        let mut y = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        constraint.apply(&mut y).unwrap();
        assert_eq!(y, arr1(&[9.0, 2.0, 7.0]).into_dyn());
    }

    #[test]
    fn multiply_and_add_builds_mirror_halo() {
        // Zero-flux Neumann: halo should mirror the adjacent value.
        let mask = ndarray::ArrayD::from_shape_vec(IxDyn(&[2]), vec![true, true]).unwrap();
        let values = ndarray::ArrayD::from_shape_vec(IxDyn(&[2]), vec![0.0, 0.0]).unwrap();
        let constraint = Constraint::new(mask, values).unwrap();

        let adjacent = arr1(&[5.0, -3.0]).into_dyn();
        let mut halo = ndarray::ArrayD::zeros(IxDyn(&[2]));
        constraint.multiply_and_add(&adjacent, -2.0, &mut halo).unwrap();
        assert_eq!(halo, adjacent);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mask = ndarray::ArrayD::from_elem(IxDyn(&[2]), true);
        let values = ndarray::ArrayD::zeros(IxDyn(&[3]));
        assert!(Constraint::new(mask, values).is_err());
    }
}
