use crate::binning::BinAssignment;
use crate::reducer::{Datum, ReliabilityVariance, get_output};
use ndarray::ArrayView1;

/// Estimate the variance of the weighted mean in every bin.
///
/// `means` holds the weighted mean of each bin (as computed by
/// [`crate::field_average`]). The estimate treats the weights as reliability
/// weights; see [`ReliabilityVariance`] for the formula. With uniform
/// weights this reduces to the unbiased sample variance divided by the number
/// of cells in the bin.
///
/// Bins holding fewer than two cells (or no weight) produce a non-finite
/// result.
pub fn field_variance(
    assignment: &BinAssignment,
    column: ArrayView1<f64>,
    means: &[f64],
    weights: &[f64],
) -> Result<Vec<f64>, &'static str> {
    if means.len() != assignment.n_bins() {
        return Err("the number of bin means doesn't match the number of bins");
    } else if column.len() != assignment.n_cells() || weights.len() != assignment.n_cells() {
        return Err("need one field value and weight per assigned cell");
    }

    let reducer = ReliabilityVariance;
    let data = assignment
        .indices()
        .iter()
        .zip(column.iter().zip(weights.iter()))
        .map(|(bin_index, (&x, &weight))| {
            // unassigned cells are skipped during accumulation
            let mean = bin_index.map_or(0.0, |i| means[i]);
            Datum {
                value: (x - mean) * (x - mean),
                weight,
            }
        });
    let statepack = assignment.accumulate(&reducer, data);
    Ok(get_output(&reducer, &statepack)
        .remove("variance")
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::IrregularBinEdges;
    use ndarray::array;

    #[test]
    fn uniform_weights_match_sample_variance() {
        let edges = IrregularBinEdges::new(vec![0.0, 1.0, 2.0]).unwrap();
        let radial = [0.1, 0.2, 0.3, 0.4, 1.5, 1.6];
        let assignment = BinAssignment::new(&radial, &edges);
        let field = array![1.0, 2.0, 3.0, 6.0, 4.0, 8.0];
        let means = [3.0, 6.0];
        let weights = [2.0; 6];

        let var = field_variance(&assignment, field.view(), &means, &weights).unwrap();
        // sample variances are 14/3 and 8, divided by the counts 4 and 2
        assert!((var[0] - 14.0 / 12.0).abs() < 1e-14);
        assert!((var[1] - 4.0).abs() < 1e-14);
    }

    #[test]
    fn single_cell_bin_is_not_finite() {
        let edges = IrregularBinEdges::new(vec![0.0, 1.0]).unwrap();
        let assignment = BinAssignment::new(&[0.5], &edges);
        let var = field_variance(&assignment, array![3.0].view(), &[3.0], &[1.0]).unwrap();
        assert!(!var[0].is_finite());
    }

    #[test]
    fn mismatched_lengths() {
        let edges = IrregularBinEdges::new(vec![0.0, 1.0]).unwrap();
        let assignment = BinAssignment::new(&[0.5, 0.7], &edges);
        let short_column = array![3.0];
        let out = field_variance(&assignment, short_column.view(), &[3.0], &[1.0]);
        assert!(out.is_err());
        let column = array![3.0, 1.0];
        let out = field_variance(&assignment, column.view(), &[], &[1.0, 1.0]);
        assert!(out.is_err());
    }
}
