// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

#![allow(dead_code)]

use ndarray::{ArrayD, IxDyn};
use rand::distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

pub fn assert_allclose(actual: &[f64], ref_vals: &[f64], rtol: f64, atol: f64) {
    assert_eq!(actual.len(), ref_vals.len(), "lengths differ");
    for (i, (a, r)) in actual.iter().zip(ref_vals.iter()).enumerate() {
        assert!(
            isclose(*a, *r, rtol, atol),
            "element {i}: actual = {a}, expected = {r}"
        );
    }
}

/// uniform noise in `[-0.5, 0.5)` (variance of 1/12)
pub fn white_noise(shape: &[usize], seed: u64) -> ArrayD<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let dist = Uniform::new(-0.5, 0.5).unwrap();
    ArrayD::from_shape_simple_fn(IxDyn(shape), || dist.sample(&mut rng))
}

/// `n` uniformly distributed positions within `[-l/2, l/2)^ndim`, with
/// shape `(n, ndim)`
pub fn random_positions(n: usize, ndim: usize, l: f64, seed: u64) -> ndarray::Array2<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let dist = Uniform::new(-0.5 * l, 0.5 * l).unwrap();
    ndarray::Array2::from_shape_simple_fn((n, ndim), || dist.sample(&mut rng))
}
