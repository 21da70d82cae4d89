//! Define basic reducer machinery
//!
//! # Reducer Machinery
//!
//! The architecture of this crate is built upon the concept of accumulation.
//!
//! ## Broader Context
//!
//! The idea is that we want to compute binned statistics for a stream of
//! values, where each value is a vector `𝒗 = [x,y,w]`. Let's define the
//! ith element of the stream as `𝒗ᵢ = [xᵢ, yᵢ, wᵢ]`. In more detail,
//! - `xᵢ` is used for binning (for us, it's always the distance of a cell
//!   from the origin)
//! - `yᵢ` is the quantity that contributes to the statistic
//! - `wᵢ` is the weighting applied to `yᵢ`.
//!
//! In practice, we use [`Datum`] to package together `yᵢ` & `wᵢ`
//!
//! If a statistic just summed the values of `wᵢ` and totally ignored `yᵢ`,
//! that would be equivalent to a normal histogram. Other statistics that we
//! compute can be thought of generalizations of histograms (this idea is also
//! described by scipy's
//! [binned_statistic](https://docs.scipy.org/doc/scipy/reference/generated/scipy.stats.binned_statistic.html)
//! function.)
//!
//! ## Coming back to Reducer Machinery
//!
//! The actual binning is taken care of separately (see
//! [`crate::BinAssignment`]). The reducer machinery is responsible for
//! computing the statistic within a single bin. We draw a distinction between
//! the current state of the reduction and the actual reducer logic.
//! - We refer to the current state of a single reduction as the `accum_state`
//! - The reducer logic is encapsulated by the functions implemented by
//!   the [`Reducer`] trait.
//! - a [`StatePack`] holds the `accum_state` of every bin.

use crate::state::{AccumStateView, AccumStateViewMut, StatePack};
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};
use std::collections::HashMap;

/// Instances of this element are consumed by the Reducer
#[derive(Clone, Copy, Debug)]
pub struct Datum {
    pub value: f64,
    pub weight: f64,
}

/// Reducers operate on individual `accum_state`s.
pub trait Reducer {
    /// the number of f64 elements needed to track the accumulator data
    fn accum_state_size(&self) -> usize;

    /// initializes the storage tracking the accumulator's state.
    ///
    /// This blindly overwrites any existing values, so it can also be used
    /// to reset a state.
    fn init_accum_state(&self, accum_state: &mut AccumStateViewMut);

    /// consume the value and weight to update the accum_state
    fn consume(&self, accum_state: &mut AccumStateViewMut, datum: &Datum);

    /// extract all output-values from a single accum_state. Expects `value` to
    /// have one entry per name in `self.output_names()`
    fn value_from_accum_state(&self, value: &mut ArrayViewMut1<f64>, accum_state: &AccumStateView);

    /// Names the scalar outputs produced from a single accum_state
    fn output_names(&self) -> &'static [&'static str];
}

/// Tracks the weighted mean of the consumed values
#[derive(Clone, Copy, Default)]
pub struct WeightedMean;

impl WeightedMean {
    const TOTAL: usize = 0;
    const WEIGHT: usize = 1;

    const VALUE_MEAN: usize = 0;
    const VALUE_WEIGHT: usize = 1;
    const OUTPUT_COMPONENTS: &'static [&'static str] = &["mean", "weight"];
}

impl Reducer for WeightedMean {
    fn accum_state_size(&self) -> usize {
        2_usize
    }

    fn init_accum_state(&self, accum_state: &mut AccumStateViewMut) {
        accum_state[Self::TOTAL] = 0.0;
        accum_state[Self::WEIGHT] = 0.0;
    }

    #[inline]
    fn consume(&self, accum_state: &mut AccumStateViewMut, datum: &Datum) {
        accum_state[Self::WEIGHT] += datum.weight;
        accum_state[Self::TOTAL] += datum.value * datum.weight;
    }

    fn output_names(&self) -> &'static [&'static str] {
        Self::OUTPUT_COMPONENTS
    }

    fn value_from_accum_state(&self, value: &mut ArrayViewMut1<f64>, accum_state: &AccumStateView) {
        // a bin without weight produces NaN (0/0); callers report it
        value[[Self::VALUE_MEAN]] = accum_state[Self::TOTAL] / accum_state[Self::WEIGHT];
        value[[Self::VALUE_WEIGHT]] = accum_state[Self::WEIGHT];
    }
}

/// Tracks the weighted sum of the consumed values, along with the summed
/// weight and the number of consumed values
#[derive(Clone, Copy, Default)]
pub struct WeightedTotal;

impl WeightedTotal {
    const TOTAL: usize = 0;
    const WEIGHT: usize = 1;
    const COUNT: usize = 2;

    const VALUE_TOTAL: usize = 0;
    const VALUE_WEIGHT: usize = 1;
    const VALUE_COUNT: usize = 2;
    const OUTPUT_COMPONENTS: &'static [&'static str] = &["total", "weight", "count"];
}

impl Reducer for WeightedTotal {
    fn accum_state_size(&self) -> usize {
        3_usize
    }

    fn init_accum_state(&self, accum_state: &mut AccumStateViewMut) {
        accum_state.fill(0.0);
    }

    #[inline]
    fn consume(&self, accum_state: &mut AccumStateViewMut, datum: &Datum) {
        accum_state[Self::TOTAL] += datum.value * datum.weight;
        accum_state[Self::WEIGHT] += datum.weight;
        accum_state[Self::COUNT] += 1.0;
    }

    fn output_names(&self) -> &'static [&'static str] {
        Self::OUTPUT_COMPONENTS
    }

    fn value_from_accum_state(&self, value: &mut ArrayViewMut1<f64>, accum_state: &AccumStateView) {
        value[[Self::VALUE_TOTAL]] = accum_state[Self::TOTAL];
        value[[Self::VALUE_WEIGHT]] = accum_state[Self::WEIGHT];
        value[[Self::VALUE_COUNT]] = accum_state[Self::COUNT];
    }
}

/// Estimates the variance of a weighted mean, treating the weights as
/// reliability weights.
///
/// Each consumed [`Datum`] must hold the squared deviation of a cell from the
/// weighted mean of its bin, `(yᵢ - ȳ)²`. We accumulate:
/// - `Σ wᵢ (yᵢ - ȳ)²`
/// - `V₁ = Σ wᵢ`
/// - `V₂ = Σ wᵢ²`
///
/// The unbiased estimate of the per-cell variance is
/// `Σ wᵢ (yᵢ - ȳ)² / (V₁ - V₂/V₁)`
/// (see [here](https://en.wikipedia.org/wiki/Weighted_arithmetic_mean#Reliability_weights)),
/// and we multiply it by `V₂/V₁²` to get the variance of the weighted mean.
#[derive(Clone, Copy, Default)]
pub struct ReliabilityVariance;

impl ReliabilityVariance {
    const SQ_DEV_TOTAL: usize = 0;
    const V1: usize = 1;
    const V2: usize = 2;

    const VALUE_VARIANCE: usize = 0;
    const VALUE_V1: usize = 1;
    const VALUE_V2: usize = 2;
    const OUTPUT_COMPONENTS: &'static [&'static str] = &["variance", "v1", "v2"];
}

impl Reducer for ReliabilityVariance {
    fn accum_state_size(&self) -> usize {
        3_usize
    }

    fn init_accum_state(&self, accum_state: &mut AccumStateViewMut) {
        accum_state.fill(0.0);
    }

    #[inline]
    fn consume(&self, accum_state: &mut AccumStateViewMut, datum: &Datum) {
        accum_state[Self::SQ_DEV_TOTAL] += datum.weight * datum.value;
        accum_state[Self::V1] += datum.weight;
        accum_state[Self::V2] += datum.weight * datum.weight;
    }

    fn output_names(&self) -> &'static [&'static str] {
        Self::OUTPUT_COMPONENTS
    }

    fn value_from_accum_state(&self, value: &mut ArrayViewMut1<f64>, accum_state: &AccumStateView) {
        let v1 = accum_state[Self::V1];
        let v2 = accum_state[Self::V2];
        let per_cell = accum_state[Self::SQ_DEV_TOTAL] / (v1 - v2 / v1);
        value[[Self::VALUE_VARIANCE]] = per_cell * v2 / (v1 * v1);
        value[[Self::VALUE_V1]] = v1;
        value[[Self::VALUE_V2]] = v2;
    }
}

/// compute the output quantities from the accumulator states in `statepack`
/// and return the result in a HashMap (keyed by output component name).
pub fn get_output(
    reducer: &impl Reducer,
    statepack: &StatePack,
) -> HashMap<&'static str, Vec<f64>> {
    let names = reducer.output_names();
    let n_bins = statepack.n_states();
    let n_comps = names.len();

    let mut buffer = Array2::<f64>::zeros((n_comps, n_bins));
    for i in 0..n_bins {
        reducer.value_from_accum_state(
            &mut buffer.index_axis_mut(Axis(1), i),
            &statepack.get_state(i),
        );
    }

    let _to_vec = |row: ArrayView1<f64>| row.iter().cloned().collect();
    let row_iter = buffer.rows().into_iter().map(_to_vec);
    HashMap::from_iter(names.iter().cloned().zip(row_iter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_output(reducer: &impl Reducer, data: &[Datum]) -> HashMap<&'static str, Vec<f64>> {
        let mut statepack = StatePack::new(reducer, 1);
        for datum in data {
            reducer.consume(&mut statepack.get_state_mut(0), datum);
        }
        get_output(reducer, &statepack)
    }

    #[test]
    fn mean_consume_twice() {
        let data = [
            Datum {
                value: 4.0,
                weight: 1.0,
            },
            Datum {
                value: 8.0,
                weight: 3.0,
            },
        ];
        let out = single_output(&WeightedMean, &data);
        assert_eq!(out["mean"][0], 7.0);
        assert_eq!(out["weight"][0], 4.0);
    }

    #[test]
    fn mean_without_weight_is_nan() {
        let out = single_output(&WeightedMean, &[]);
        assert!(out["mean"][0].is_nan());
        assert_eq!(out["weight"][0], 0.0);
    }

    #[test]
    fn total_tracks_count() {
        let data = [
            Datum {
                value: 2.0,
                weight: 0.5,
            },
            Datum {
                value: 6.0,
                weight: 0.5,
            },
        ];
        let out = single_output(&WeightedTotal, &data);
        assert_eq!(out["total"][0], 4.0);
        assert_eq!(out["weight"][0], 1.0);
        assert_eq!(out["count"][0], 2.0);
    }

    #[test]
    fn variance_uniform_weights() {
        // values 1, 2, 3, 6 -> mean 3, squared deviations 4, 1, 0, 9
        // unbiased sample variance = 14/3; variance of the mean = 14/12
        let data: Vec<Datum> = [4.0, 1.0, 0.0, 9.0]
            .iter()
            .map(|&value| Datum { value, weight: 1.0 })
            .collect();
        let out = single_output(&ReliabilityVariance, &data);
        assert!((out["variance"][0] - 14.0 / 12.0).abs() < 1e-15);
        assert_eq!(out["v1"][0], 4.0);
        assert_eq!(out["v2"][0], 4.0);
    }
}
