use crate::element::FieldElement;
use crate::interp::RegularGridInterpolator;
use crate::sampler::AngularSampleSet;
use ndarray::{ArrayView1, ArrayViewD, Axis, Zip};

/// The per-radius result of [`field_average_interpolate`]
#[derive(Clone, Debug)]
pub struct InterpolatedAverage<T> {
    /// mean of the interpolated samples on each shell (NaN for a shell
    /// without any valid sample)
    pub values: Vec<T>,
    /// number of valid (non-NaN) samples on each shell
    pub weights: Vec<f64>,
    /// `true` when every interpolated sample was NaN
    pub all_missing: bool,
}

/// NaN-aware mean and spread of a field, used to rescale it before
/// interpolation. The spread is never smaller than 1.
fn rescaling<T: FieldElement>(field: &ArrayViewD<T>) -> (f64, f64, f64) {
    let (mut n, mut re_sum, mut im_sum) = (0.0, 0.0, 0.0);
    for v in field.iter().filter(|v| !v.is_nan()) {
        n += 1.0;
        re_sum += v.re();
        im_sum += v.im();
    }
    if n == 0.0 {
        return (0.0, 0.0, 1.0);
    }
    let (re_mean, im_mean) = (re_sum / n, im_sum / n);
    let sq_dev: f64 = field
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| (v.re() - re_mean).powi(2) + (v.im() - im_mean).powi(2))
        .sum();
    (re_mean, im_mean, (sq_dev / n).sqrt().max(1.0))
}

/// Average a field over radial shells by interpolating it onto the sample
/// points in `samples`.
///
/// The field is first multiplied by `weights` (which must have the same
/// shape as the field). Cells with zero weight become holes that are never
/// interpolated across. Each shell's value is the mean over its valid
/// samples, and its weight is the number of valid samples.
pub fn field_average_interpolate<T: FieldElement>(
    coords: &[ArrayView1<f64>],
    field: ArrayViewD<T>,
    weights: ArrayViewD<f64>,
    samples: &AngularSampleSet,
) -> Result<InterpolatedAverage<T>, &'static str> {
    if field.shape() != weights.shape() {
        return Err("the field and weights must have the same shape");
    } else if samples.coords.nrows() != coords.len() {
        return Err("the sample points have the wrong dimensionality");
    }

    let weighted = Zip::from(&field).and(&weights).map_collect(|&v, &w| {
        if w == 0.0 { T::nan() } else { v.scale(w) }
    });
    let (re_mean, im_mean, spread) = rescaling(&weighted.view());
    let rescaled = weighted.mapv(|v| {
        T::from_parts((v.re() - re_mean) / spread, (v.im() - im_mean) / spread)
    });
    let interpolator = RegularGridInterpolator::new(coords, rescaled)?;

    let mut re_total = vec![0.0; samples.n_radii];
    let mut im_total = vec![0.0; samples.n_radii];
    let mut counts = vec![0.0; samples.n_radii];
    for (point, &ri) in samples
        .coords
        .axis_iter(Axis(1))
        .zip(samples.radius_index.iter())
    {
        let v = interpolator.evaluate(point);
        if v.is_nan() {
            continue;
        }
        re_total[ri] += v.re() * spread + re_mean;
        im_total[ri] += v.im() * spread + im_mean;
        counts[ri] += 1.0;
    }

    let values = (0..samples.n_radii)
        .map(|i| {
            if counts[i] == 0.0 {
                T::nan()
            } else {
                T::from_parts(re_total[i] / counts[i], im_total[i] / counts[i])
            }
        })
        .collect();
    Ok(InterpolatedAverage {
        values,
        all_missing: counts.iter().all(|&c| c == 0.0),
        weights: counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::magnitude_grid;
    use crate::sampler::{RegularAngularGenerator, sample_coords};
    use ndarray::{Array1, ArrayD, IxDyn};

    #[test]
    fn radial_profile_2d() {
        let x = Array1::linspace(-3.0, 3.0, 61);
        let coords = [x.view(), x.view()];
        let r = magnitude_grid(&coords);
        let field = r.mapv(|r| 2.0 * r + 1.0);
        let weights = ArrayD::<f64>::ones(IxDyn(&[61, 61]));
        let radii = [0.5, 1.0, 2.0];
        let samples =
            sample_coords(&coords, &radii, &RegularAngularGenerator::default()).unwrap();

        let out = field_average_interpolate(&coords, field.view(), weights.view(), &samples)
            .unwrap();
        assert!(!out.all_missing);
        for (i, &radius) in radii.iter().enumerate() {
            // linear interpolation of a cone overestimates slightly
            assert!((out.values[i] - (2.0 * radius + 1.0)).abs() < 0.05);
            assert!(out.weights[i] > 0.0);
        }
    }

    #[test]
    fn zero_weights_are_holes() {
        let x = Array1::linspace(-1.0, 1.0, 3);
        let coords = [x.view(), x.view()];
        let field = ArrayD::<f64>::ones(IxDyn(&[3, 3]));
        let weights = ArrayD::<f64>::zeros(IxDyn(&[3, 3]));
        let samples =
            sample_coords(&coords, &[0.5], &RegularAngularGenerator::default()).unwrap();
        let out = field_average_interpolate(&coords, field.view(), weights.view(), &samples)
            .unwrap();
        assert!(out.all_missing);
        assert!(out.values[0].is_nan());
        assert_eq!(out.weights[0], 0.0);
    }

    #[test]
    fn shape_mismatch() {
        let x = Array1::linspace(-1.0, 1.0, 3);
        let coords = [x.view()];
        let field = ArrayD::<f64>::ones(IxDyn(&[3]));
        let weights = ArrayD::<f64>::ones(IxDyn(&[2]));
        let samples =
            sample_coords(&coords, &[0.5], &RegularAngularGenerator::default()).unwrap();
        assert!(
            field_average_interpolate(&coords, field.view(), weights.view(), &samples).is_err()
        );
    }
}
