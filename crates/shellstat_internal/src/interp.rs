//! A multilinear interpolant on a regular rectilinear grid.

use crate::element::FieldElement;
use crate::grid::validate_grid_coords;
use ndarray::{Array1, ArrayD, ArrayView1, IxDyn};

/// Locate `p` within the strictly increasing `coords`.
///
/// Returns the index of the lower neighbor and the fractional distance
/// towards the upper neighbor. Points outside of `[coords[0],
/// coords[len-1]]` produce `None`.
fn locate(coords: &Array1<f64>, p: f64) -> Option<(usize, f64)> {
    let n = coords.len();
    if p.is_nan() || p < coords[0] || p > coords[n - 1] {
        return None;
    } else if n == 1 {
        return Some((0, 0.0));
    }

    let slice = coords.as_slice()?;
    // index of the first coordinate that is strictly larger than p
    let upper = slice.partition_point(|&c| c <= p);
    let lower = upper.saturating_sub(1).min(n - 2);
    let t = (p - slice[lower]) / (slice[lower + 1] - slice[lower]);
    Some((lower, t))
}

/// Evaluates a field between grid points by multilinear interpolation.
///
/// Queries outside of the grid evaluate to NaN. Only the corners that
/// contribute with a non-zero interpolation weight are read, so a NaN value
/// (a hole in the field) only spreads to the queries that actually touch it.
pub struct RegularGridInterpolator<T> {
    coords: Vec<Array1<f64>>,
    values: ArrayD<T>,
}

impl<T: FieldElement> RegularGridInterpolator<T> {
    pub fn new(coords: &[ArrayView1<f64>], values: ArrayD<T>) -> Result<Self, &'static str> {
        validate_grid_coords(coords)?;
        if coords.len() != values.ndim() {
            return Err("need one coordinate vector per axis of the field");
        } else if coords
            .iter()
            .zip(values.shape().iter())
            .any(|(c, &len)| c.len() != len)
        {
            return Err("coordinate vector lengths must match the field's shape");
        }
        Ok(Self {
            coords: coords.iter().map(|c| c.to_owned()).collect(),
            values,
        })
    }

    pub fn ndim(&self) -> usize {
        self.coords.len()
    }

    /// Evaluate the interpolant at a single point (one coordinate per axis)
    pub fn evaluate(&self, point: ArrayView1<f64>) -> T {
        let ndim = self.ndim();
        if point.len() != ndim {
            return T::nan();
        }

        let mut lower = Vec::with_capacity(ndim);
        let mut frac = Vec::with_capacity(ndim);
        for (c, &p) in self.coords.iter().zip(point.iter()) {
            match locate(c, p) {
                Some((i, t)) => {
                    lower.push(i);
                    frac.push(t);
                }
                None => return T::nan(),
            }
        }

        let mut re = 0.0;
        let mut im = 0.0;
        let mut index = vec![0_usize; ndim];
        // each bit of `corner` selects the lower or upper neighbor of an axis
        for corner in 0..(1_usize << ndim) {
            let mut weight = 1.0;
            for axis in 0..ndim {
                let upper = (corner >> axis) & 1 == 1;
                weight *= if upper { frac[axis] } else { 1.0 - frac[axis] };
                index[axis] = lower[axis] + upper as usize;
            }
            if weight == 0.0 {
                continue;
            }
            let v = self.values[IxDyn(&index)];
            if v.is_nan() {
                return T::nan();
            }
            re += weight * v.re();
            im += weight * v.im();
        }
        T::from_parts(re, im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, array};
    use num_complex::Complex64;

    #[test]
    fn bilinear_reproduces_plane() {
        let x = array![0.0, 1.0, 3.0];
        let y = array![-1.0, 0.5];
        let values = Array::from_shape_fn(IxDyn(&[3, 2]), |idx| 2.0 * x[idx[0]] - y[idx[1]] + 1.0);
        let interp = RegularGridInterpolator::new(&[x.view(), y.view()], values).unwrap();

        for &(px, py) in &[(0.0, -1.0), (0.25, 0.0), (2.0, 0.2), (3.0, 0.5)] {
            let got = interp.evaluate(array![px, py].view());
            assert!((got - (2.0 * px - py + 1.0)).abs() < 1e-13);
        }
        assert!(interp.evaluate(array![3.1, 0.0].view()).is_nan());
        assert!(interp.evaluate(array![0.0, -1.5].view()).is_nan());
    }

    #[test]
    fn holes_only_affect_neighbors() {
        let x = array![0.0, 1.0, 2.0];
        let values = array![1.0, 2.0, f64::NAN].into_dyn();
        let interp = RegularGridInterpolator::new(&[x.view()], values).unwrap();
        assert_eq!(interp.evaluate(array![0.5].view()), 1.5);
        // exactly on a grid point, the NaN neighbor has zero weight
        assert_eq!(interp.evaluate(array![1.0].view()), 2.0);
        assert!(interp.evaluate(array![1.5].view()).is_nan());
    }

    #[test]
    fn complex_values() {
        let x = array![0.0, 2.0];
        let values = array![Complex64::new(0.0, 2.0), Complex64::new(4.0, 0.0)].into_dyn();
        let interp = RegularGridInterpolator::new(&[x.view()], values).unwrap();
        let value = interp.evaluate(array![0.5].view());
        assert_eq!(value, Complex64::new(1.0, 1.5));
    }

    #[test]
    fn invalid_grids() {
        let x = array![0.0, 1.0];
        let values = ArrayD::<f64>::zeros(IxDyn(&[3]));
        assert!(RegularGridInterpolator::new(&[x.view()], values).is_err());
        let bad = array![1.0, 0.0];
        let values = ArrayD::<f64>::zeros(IxDyn(&[2]));
        assert!(RegularGridInterpolator::new(&[bad.view()], values).is_err());
    }
}
