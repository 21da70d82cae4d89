//! The forward Fourier transform used by the power spectrum machinery.
//!
//! The orchestrator only talks to the [`ForwardTransform`] trait, so callers
//! may plug in their own transform. [`FftTransform`] is the default.

use crate::Error;
use ndarray::{Array1, ArrayD, ArrayViewD, Axis, Zip};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use shellstat_internal::magnitude_grid;
use std::f64::consts::PI;

/// The output of a forward transform
#[derive(Clone, Debug)]
pub struct TransformOutput {
    /// the transformed field, ordered so that the zero frequency sits at the
    /// centre of each axis
    pub spectrum: ArrayD<Complex64>,
    /// the frequencies along each axis (same ordering as `spectrum`)
    pub freq: Vec<Array1<f64>>,
    /// the magnitude of the frequency vector of every entry in `spectrum`
    pub kmag: ArrayD<f64>,
}

/// Computes the forward Fourier transform of a real field that fills a box.
///
/// `a` and `b` select the Fourier convention: the transform is
/// `F(k) = sqrt(|b| / (2π)^(1-a))^d ∫ f(x) exp(-i b k·x) dᵈx`.
pub trait ForwardTransform {
    fn transform(
        &self,
        field: ArrayViewD<f64>,
        box_lengths: &[f64],
        a: f64,
        b: f64,
        thread_hint: Option<usize>,
    ) -> Result<TransformOutput, Error>;
}

/// Frequencies of an `n`-point transform with sample spacing `dx`, sorted in
/// increasing order and scaled by `2π / b`
pub fn shifted_frequencies(n: usize, dx: f64, b: f64) -> Array1<f64> {
    let half = (n / 2) as f64;
    let step = 2.0 * PI / (b * (n as f64) * dx);
    Array1::from_iter((0..n).map(|i| ((i as f64) - half) * step))
}

/// A transform built on `rustfft`, applied one axis at a time.
///
/// The discrete transform is scaled by the cell volume, so that it
/// approximates the continuous transform, and the phase is adjusted to place
/// the left edge of the box at `-L/2` along every axis. The thread hint is
/// ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct FftTransform;

impl ForwardTransform for FftTransform {
    fn transform(
        &self,
        field: ArrayViewD<f64>,
        box_lengths: &[f64],
        a: f64,
        b: f64,
        _thread_hint: Option<usize>,
    ) -> Result<TransformOutput, Error> {
        let ndim = field.ndim();
        if box_lengths.len() != ndim {
            return Err(Error::integer_range(
                "the number of box lengths",
                box_lengths.len() as i64,
                ndim as i64,
                ndim as i64,
            ));
        } else if field.is_empty() {
            return Err(Error::internal_legacy_adhoc(
                "can't transform an empty field",
            ));
        }

        let dx: Vec<f64> = box_lengths
            .iter()
            .zip(field.shape())
            .map(|(&l, &n)| l / (n as f64))
            .collect();
        let freq: Vec<Array1<f64>> = field
            .shape()
            .iter()
            .zip(dx.iter())
            .map(|(&n, &d)| shifted_frequencies(n, d, b))
            .collect();

        let mut spectrum = field.mapv(|x| Complex64::new(x, 0.0));
        let mut planner = FftPlanner::<f64>::new();
        for axis in 0..ndim {
            let n = spectrum.len_of(Axis(axis));
            let fft = planner.plan_fft_forward(n);
            let mut scratch = vec![Complex64::default(); fft.get_inplace_scratch_len()];
            let mut buffer = vec![Complex64::default(); n];

            // shifting the origin to the left edge of the box (at -L/2)
            let left_edge = -0.5 * box_lengths[axis];
            let phase: Vec<Complex64> = freq[axis]
                .iter()
                .map(|&k| Complex64::from_polar(1.0, -b * k * left_edge))
                .collect();

            for mut lane in spectrum.lanes_mut(Axis(axis)) {
                buffer
                    .iter_mut()
                    .zip(lane.iter())
                    .for_each(|(dst, &src)| *dst = src);
                fft.process_with_scratch(&mut buffer, &mut scratch);
                // move the zero frequency to the centre
                for (i, &v) in buffer.iter().enumerate() {
                    let shifted = (i + n / 2) % n;
                    lane[shifted] = v * phase[shifted];
                }
            }
        }

        let norm = (b.abs() / (2.0 * PI).powf(1.0 - a))
            .sqrt()
            .powi(ndim as i32);
        let scale = dx.iter().product::<f64>() * norm;
        spectrum.mapv_inplace(|v| v * scale);

        let freq_views: Vec<_> = freq.iter().map(|f| f.view()).collect();
        let kmag = magnitude_grid(&freq_views);
        Ok(TransformOutput {
            spectrum,
            freq,
            kmag,
        })
    }
}

/// Real part of `ft1 · conj(ft2)`, elementwise
pub(crate) fn cross_power(ft1: &ArrayD<Complex64>, ft2: &ArrayD<Complex64>) -> ArrayD<f64> {
    Zip::from(ft1)
        .and(ft2)
        .map_collect(|&x, &y| (x * y.conj()).re)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn frequencies() {
        let f = shifted_frequencies(4, 0.5, 1.0);
        let expected = [-2.0, -1.0, 0.0, 1.0].map(|i| i * PI);
        for (got, want) in f.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-14);
        }
        let f = shifted_frequencies(5, 1.0, 2.0 * PI);
        for (got, want) in f.iter().zip([-0.4, -0.2, 0.0, 0.2, 0.4].iter()) {
            assert!((got - want).abs() < 1e-14);
        }
    }

    #[test]
    fn constant_field() {
        // only the zero mode is non-zero, and it equals the integral
        let field = Array::from_elem(IxDyn(&[4, 6]), 3.0);
        let out = FftTransform
            .transform(field.view(), &[2.0, 3.0], 1.0, 1.0, None)
            .unwrap();
        assert_eq!(out.spectrum.shape(), &[4, 6]);
        let zero = out.spectrum[[2, 3]];
        assert!((zero.re - 18.0).abs() < 1e-12 && zero.im.abs() < 1e-12);
        let rest: f64 = out.spectrum.iter().map(|v| v.norm()).sum::<f64>() - zero.norm();
        assert!(rest.abs() < 1e-10);
        assert_eq!(out.kmag[[2, 3]], 0.0);
    }

    #[test]
    fn parseval() {
        // Σ|f|² dx = Σ|F|² dk / (2π) for the default convention
        let n = 16;
        let l = 4.0;
        let field = Array::from_shape_fn(IxDyn(&[n]), |i| ((i[0] * 7 % 5) as f64) - 2.0);
        let out = FftTransform
            .transform(field.view(), &[l], 1.0, 1.0, None)
            .unwrap();
        let dx = l / n as f64;
        let dk = 2.0 * PI / l;
        let real_space: f64 = field.iter().map(|x| x * x).sum::<f64>() * dx;
        let fourier_space: f64 =
            out.spectrum.iter().map(|v| v.norm_sqr()).sum::<f64>() * dk / (2.0 * PI);
        assert!((real_space - fourier_space).abs() < 1e-10);
    }

    #[test]
    fn wrong_box_lengths() {
        let field = Array::from_elem(IxDyn(&[4, 4]), 1.0);
        assert!(
            FftTransform
                .transform(field.view(), &[1.0], 1.0, 1.0, None)
                .is_err()
        );
    }
}
