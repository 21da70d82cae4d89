//! Cell-binning machinery.
//!
//! Every cell of a grid is assigned to (at most) one radial bin by a
//! [`BinAssignment`]. The assignment depends only on the radial grid and the
//! bin edges, so it is computed once and reused for every field that lives
//! on the same grid (e.g. every column handled by the partial-averaging
//! driver).

use crate::bins::{BinEdges, IrregularBinEdges};
use crate::element::FieldElement;
use crate::reducer::{Datum, Reducer, WeightedMean, WeightedTotal, get_output};
use crate::state::StatePack;
use ndarray::ArrayView1;

/// Maps each cell (in flattened, row-major order) to a bin index. `None`
/// marks a cell that falls outside of the bin edges.
#[derive(Clone, Debug)]
pub struct BinAssignment {
    indices: Vec<Option<usize>>,
    n_bins: usize,
}

impl BinAssignment {
    /// assign every radius yielded by `radial` to a bin
    pub fn new<'a>(radial: impl IntoIterator<Item = &'a f64>, edges: &impl BinEdges) -> Self {
        let indices = radial.into_iter().map(|&r| edges.bin_index(r)).collect();
        BinAssignment {
            indices,
            n_bins: edges.n_bins(),
        }
    }

    pub fn indices(&self) -> &[Option<usize>] {
        &self.indices
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn n_cells(&self) -> usize {
        self.indices.len()
    }

    /// the number of cells assigned to each bin
    pub fn counts(&self) -> Vec<usize> {
        let mut out = vec![0; self.n_bins];
        for bin_index in self.indices.iter().flatten() {
            out[*bin_index] += 1;
        }
        out
    }

    /// Feed `(value, weight)` pairs, one per cell, into per-bin accumulator
    /// states. Cells without a bin are skipped.
    pub fn accumulate<R: Reducer>(
        &self,
        reducer: &R,
        data: impl IntoIterator<Item = Datum>,
    ) -> StatePack {
        let mut statepack = StatePack::new(reducer, self.n_bins);
        for (bin_index, datum) in self.indices.iter().zip(data) {
            if let Some(i) = bin_index {
                reducer.consume(&mut statepack.get_state_mut(*i), &datum);
            }
        }
        statepack
    }
}

/// Compute the coordinate that represents each bin.
///
/// When `bin_ave` is `true`, this is the weighted mean radius of the cells
/// in the bin (NaN for a bin without weight). Otherwise, it's the arithmetic
/// midpoint of the bin edges.
pub fn bin_coordinates(
    assignment: &BinAssignment,
    radial: impl IntoIterator<Item = f64>,
    weights: &[f64],
    edges: &IrregularBinEdges,
    bin_ave: bool,
) -> Vec<f64> {
    if !bin_ave {
        return edges.midpoints();
    }
    let reducer = WeightedMean;
    let data = radial
        .into_iter()
        .zip(weights.iter())
        .map(|(value, &weight)| Datum { value, weight });
    let statepack = assignment.accumulate(&reducer, data);
    get_output(&reducer, &statepack)
        .remove("mean")
        .unwrap_or_default()
}

/// The per-bin result of [`field_average`]
#[derive(Clone, Debug)]
pub struct BinnedAverage<T> {
    /// the weighted mean (or weighted sum) of each bin
    pub values: Vec<T>,
    /// the summed weight (or the cell count) of each bin
    pub weights: Vec<f64>,
    /// indices of the bins that didn't receive any weight
    pub empty_bins: Vec<usize>,
}

/// Reduce a single column of field values into bins.
///
/// When `average` is `true`, each bin holds the weighted mean and the summed
/// weight. Otherwise each bin holds the weighted sum and the number of
/// cells. In both cases, a bin whose summed weight is zero holds NaN.
///
/// Complex values are reduced by treating the real and imaginary parts as
/// separate fields.
pub fn field_average<T: FieldElement>(
    assignment: &BinAssignment,
    column: ArrayView1<T>,
    weights: &[f64],
    average: bool,
) -> BinnedAverage<T> {
    let reduce_part = |part: fn(T) -> f64| {
        let data = column
            .iter()
            .zip(weights.iter())
            .map(|(&v, &weight)| Datum {
                value: part(v),
                weight,
            });
        if average {
            let statepack = assignment.accumulate(&WeightedMean, data);
            get_output(&WeightedMean, &statepack)
        } else {
            let statepack = assignment.accumulate(&WeightedTotal, data);
            get_output(&WeightedTotal, &statepack)
        }
    };

    let re_output = reduce_part(T::re);
    // the imaginary part of a real field is identically zero
    let im_output = if T::IS_COMPLEX {
        Some(reduce_part(T::im))
    } else {
        None
    };

    let (value_key, weight_key) = if average {
        ("mean", "weight")
    } else {
        ("total", "count")
    };
    let summed_weight = &re_output["weight"];
    let re_values = &re_output[value_key];

    let mut values = Vec::with_capacity(assignment.n_bins());
    let mut empty_bins = Vec::new();
    for i in 0..assignment.n_bins() {
        if summed_weight[i] == 0.0 {
            empty_bins.push(i);
            values.push(T::nan());
        } else {
            let im = im_output.as_ref().map_or(0.0, |out| out[value_key][i]);
            values.push(T::from_parts(re_values[i], im));
        }
    }

    BinnedAverage {
        values,
        weights: re_output[weight_key].clone(),
        empty_bins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use num_complex::Complex64;

    fn edges() -> IrregularBinEdges {
        IrregularBinEdges::new(vec![0.0, 1.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn assignment_edges() {
        let radial = [0.0, 0.5, 1.0, 2.999, 3.0, -0.1, -0.0];
        let assignment = BinAssignment::new(&radial, &edges());
        assert_eq!(
            assignment.indices(),
            &[Some(0), Some(0), Some(1), Some(2), None, None, Some(0)]
        );
        assert_eq!(assignment.counts(), vec![3, 1, 1]);
        assert_eq!(assignment.n_cells(), 7);
    }

    #[test]
    fn weighted_mean_and_empty_bins() {
        let radial = [0.5, 0.5, 2.5, 4.0];
        let assignment = BinAssignment::new(&radial, &edges());
        let field = array![1.0, 3.0, 5.0, 100.0];
        let weights = [1.0, 3.0, 2.0, 1.0];

        let out = field_average(&assignment, field.view(), &weights, true);
        assert_eq!(out.values[0], 2.5);
        assert!(out.values[1].is_nan());
        assert_eq!(out.values[2], 5.0);
        assert_eq!(out.weights, vec![4.0, 0.0, 2.0]);
        assert_eq!(out.empty_bins, vec![1]);

        let summed = field_average(&assignment, field.view(), &weights, false);
        assert_eq!(summed.values[0], 10.0);
        assert!(summed.values[1].is_nan());
        assert_eq!(summed.values[2], 10.0);
        assert_eq!(summed.weights, vec![2.0, 0.0, 1.0]);
    }

    #[test]
    fn complex_parts_reduced_separately() {
        let radial = [0.2, 0.4];
        let assignment = BinAssignment::new(&radial, &edges());
        let field = array![Complex64::new(1.0, -1.0), Complex64::new(3.0, 5.0)];
        let out = field_average(&assignment, field.view(), &[1.0, 1.0], true);
        assert_eq!(out.values[0], Complex64::new(2.0, 2.0));
    }

    #[test]
    fn coordinates() {
        let radial = [0.2, 0.6, 1.5];
        let edges = edges();
        let assignment = BinAssignment::new(&radial, &edges);
        let weights = [1.0, 3.0, 1.0];

        let averaged = bin_coordinates(&assignment, radial, &weights, &edges, true);
        assert!((averaged[0] - 0.5).abs() < 1e-15);
        assert_eq!(averaged[1], 1.5);
        assert!(averaged[2].is_nan());

        let midpoints = bin_coordinates(&assignment, radial, &weights, &edges, false);
        assert_eq!(midpoints, vec![0.5, 1.5, 2.5]);
    }
}
