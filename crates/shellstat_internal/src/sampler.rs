//! Generate sample points on radial shells.
//!
//! The interpolation-based averager evaluates a field on points that lie on
//! a hypersphere for each requested radius. The points are described in
//! hyperspherical coordinates by an [`AngularSampleGenerator`], converted to
//! Cartesian coordinates by [`spherical_to_cartesian`], and then filtered
//! down to the points that fall within the grid (see [`sample_coords`]).
//!
//! We use the parametrisation from
//! [here](https://en.wikipedia.org/wiki/N-sphere#Spherical_coordinates).
//! For `d` dimensions there are `d - 1` angles: `φ₀ ∈ [0, 2π]` and
//! `φ₁, …, φ_{d-2} ∈ [0, π]`.

use crate::bins::linspace;
use crate::grid::coordinate_bounds;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use std::f64::consts::PI;

/// Hyperspherical sample directions for a collection of radii.
#[derive(Clone, Debug)]
pub struct AngularSamples {
    /// the index (into the radii passed to the generator) of each sample
    pub radius_index: Vec<usize>,
    /// the angles of each sample, with shape `(ndim - 1, n_samples)`
    pub angles: Array2<f64>,
}

impl AngularSamples {
    pub fn n_samples(&self) -> usize {
        self.radius_index.len()
    }

    /// keep the samples for which `keep` returns true. `keep` receives the
    /// angles of a single sample.
    pub fn retain(self, keep: impl Fn(ArrayView1<f64>) -> bool) -> Self {
        let selected: Vec<usize> = self
            .angles
            .axis_iter(Axis(1))
            .enumerate()
            .filter(|(_, angles)| keep(angles.view()))
            .map(|(i, _)| i)
            .collect();
        AngularSamples {
            radius_index: selected.iter().map(|&i| self.radius_index[i]).collect(),
            angles: self.angles.select(Axis(1), &selected),
        }
    }
}

/// A strategy for choosing the directions sampled at each radius.
///
/// This is implemented for closures of the form
/// `Fn(&[f64], usize) -> AngularSamples`, where the second argument is the
/// number of spatial dimensions.
pub trait AngularSampleGenerator {
    fn generate(&self, radii: &[f64], ndim: usize) -> AngularSamples;
}

impl<F> AngularSampleGenerator for F
where
    F: Fn(&[f64], usize) -> AngularSamples,
{
    fn generate(&self, radii: &[f64], ndim: usize) -> AngularSamples {
        self(radii, ndim)
    }
}

/// The number of angular bins used along each angle for radius `r`.
///
/// Larger shells get proportionally more samples, with a floor of 100.
pub fn n_angular_bins(r: f64, angular_resolution: f64) -> usize {
    let n = (2.0 * PI * r / angular_resolution).round();
    if n.is_finite() && n > 100.0 {
        n as usize
    } else {
        100
    }
}

/// Samples every radius on a regular tensor grid of angles.
///
/// For each radius, `n = n_angular_bins(r, angular_resolution)` values are
/// used for every angle, giving `n^(ndim-1)` samples per radius.
#[derive(Clone, Copy, Debug)]
pub struct RegularAngularGenerator {
    pub angular_resolution: f64,
}

impl Default for RegularAngularGenerator {
    fn default() -> Self {
        Self {
            angular_resolution: 0.1,
        }
    }
}

impl AngularSampleGenerator for RegularAngularGenerator {
    fn generate(&self, radii: &[f64], ndim: usize) -> AngularSamples {
        let n_angles = ndim.saturating_sub(1);
        let counts: Vec<usize> = radii
            .iter()
            .map(|&r| n_angular_bins(r, self.angular_resolution))
            .collect();
        let total: usize = counts.iter().map(|&n| n.pow(n_angles as u32)).sum();

        let mut radius_index = Vec::with_capacity(total);
        let mut angles = Array2::<f64>::zeros((n_angles, total));
        let mut col = 0;
        for (ri, &n) in counts.iter().enumerate() {
            let azimuth = linspace(0.0, 2.0 * PI, n);
            let polar = linspace(0.0, PI, n);
            let n_samples = n.pow(n_angles as u32);
            for flat in 0..n_samples {
                // decompose `flat` into one index per angle (last angle
                // varies fastest)
                let mut rem = flat;
                for axis in (0..n_angles).rev() {
                    let j = rem % n;
                    rem /= n;
                    angles[[axis, col]] = if axis == 0 { azimuth[j] } else { polar[j] };
                }
                radius_index.push(ri);
                col += 1;
            }
        }
        AngularSamples {
            radius_index,
            angles,
        }
    }
}

/// Like [`RegularAngularGenerator`], but only keeps directions that lie
/// close to the first axis.
///
/// In 2D, a sample is kept when `sin(φ₀) ≥ mu`. In higher dimensions, it is
/// kept when `sin(φᵢ) ≥ mu` for every polar angle (`i ≥ 1`).
#[derive(Clone, Copy, Debug)]
pub struct AboveMuMinGenerator {
    pub angular_resolution: f64,
    pub mu: f64,
}

impl Default for AboveMuMinGenerator {
    fn default() -> Self {
        Self {
            angular_resolution: 0.1,
            mu: 0.97,
        }
    }
}

impl AngularSampleGenerator for AboveMuMinGenerator {
    fn generate(&self, radii: &[f64], ndim: usize) -> AngularSamples {
        let regular = RegularAngularGenerator {
            angular_resolution: self.angular_resolution,
        };
        let mu = self.mu;
        regular.generate(radii, ndim).retain(|angles| {
            if angles.len() == 1 {
                angles[0].sin() >= mu
            } else {
                angles.iter().skip(1).all(|phi| phi.sin() >= mu)
            }
        })
    }
}

/// Convert hyperspherical coordinates to Cartesian coordinates.
///
/// `angles` has shape `(ndim - 1, n)` and `r` holds one radius per column.
/// The result has shape `(ndim, n)`. Component `j < ndim - 1` is
/// `r · sin(φ₀)⋯sin(φ_{j-1}) · cos(φ_j)` and the last component is
/// `r · sin(φ₀)⋯sin(φ_{ndim-2})`.
pub fn spherical_to_cartesian(r: &[f64], angles: ArrayView2<f64>) -> Array2<f64> {
    let n_angles = angles.nrows();
    let mut out = Array2::<f64>::zeros((n_angles + 1, angles.ncols()));
    for (col, phi) in angles.axis_iter(Axis(1)).enumerate() {
        let mut sines = r[col];
        for (j, angle) in phi.iter().enumerate() {
            out[[j, col]] = sines * angle.cos();
            sines *= angle.sin();
        }
        out[[n_angles, col]] = sines;
    }
    out
}

/// The error returned by [`sample_coords`] when every sample lies outside of
/// the grid
pub const NO_VALID_SAMPLES: &str =
    "no valid sample points: the generated samples are all outside of the coordinate box of the field";

/// Cartesian sample points, grouped by the radius they were generated for.
#[derive(Clone, Debug)]
pub struct AngularSampleSet {
    /// sample positions with shape `(ndim, n_samples)`
    pub coords: Array2<f64>,
    /// index of the radius each sample was generated for
    pub radius_index: Vec<usize>,
    /// number of radii the samples were generated for
    pub n_radii: usize,
}

impl AngularSampleSet {
    pub fn n_samples(&self) -> usize {
        self.radius_index.len()
    }
}

/// Generate the sample points used to average a field over each of the
/// shells with radius given in `radii`.
///
/// For a 1D grid, the radii are used directly as the sample points. Samples
/// that fall outside of the bounding box of `coords` are discarded. An error
/// is returned if no sample survives.
pub fn sample_coords(
    coords: &[ArrayView1<f64>],
    radii: &[f64],
    generator: &dyn AngularSampleGenerator,
) -> Result<AngularSampleSet, &'static str> {
    let ndim = coords.len();
    let (points, radius_index) = match ndim {
        0 => return Err("at least one coordinate axis is required"),
        1 => (
            Array2::from_shape_vec((1, radii.len()), radii.to_vec())
                .map_err(|_| "failed to build 1D sample points")?,
            (0..radii.len()).collect::<Vec<usize>>(),
        ),
        _ => {
            let samples = generator.generate(radii, ndim);
            if samples.angles.nrows() != ndim - 1 {
                return Err("the sample generator returned the wrong number of angles");
            } else if samples.angles.ncols() != samples.n_samples() {
                return Err("the sample generator returned inconsistent sample counts");
            } else if samples.radius_index.iter().any(|&i| i >= radii.len()) {
                return Err("the sample generator referenced an unknown radius");
            }
            let r: Vec<f64> = samples.radius_index.iter().map(|&i| radii[i]).collect();
            (
                spherical_to_cartesian(&r, samples.angles.view()),
                samples.radius_index,
            )
        }
    };

    let bounds = coordinate_bounds(coords);
    let inside: Vec<usize> = points
        .axis_iter(Axis(1))
        .enumerate()
        .filter(|(_, p)| {
            p.iter()
                .zip(bounds.iter())
                .all(|(&x, &(lo, hi))| x >= lo && x <= hi)
        })
        .map(|(i, _)| i)
        .collect();

    if inside.is_empty() {
        return Err(NO_VALID_SAMPLES);
    }

    Ok(AngularSampleSet {
        coords: points.select(Axis(1), &inside),
        radius_index: inside.iter().map(|&i| radius_index[i]).collect(),
        n_radii: radii.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    #[test]
    fn angular_bin_counts() {
        assert_eq!(n_angular_bins(0.5, 0.1), 100);
        assert_eq!(n_angular_bins(10.0, 0.1), 628);
        assert_eq!(n_angular_bins(0.0, 0.1), 100);
    }

    #[test]
    fn regular_generator_shapes() {
        let samples = RegularAngularGenerator::default().generate(&[1.0, 2.0], 3);
        assert_eq!(samples.angles.nrows(), 2);
        assert_eq!(samples.n_samples(), 2 * 100 * 100 + 126 * 126);
        assert_eq!(samples.radius_index[0], 0);
        assert_eq!(*samples.radius_index.last().unwrap(), 1);

        // azimuth spans [0, 2π], polar angles span [0, π]
        let max_azimuth = samples.angles.row(0).fold(0.0_f64, |a, &b| a.max(b));
        let max_polar = samples.angles.row(1).fold(0.0_f64, |a, &b| a.max(b));
        assert_eq!(max_azimuth, 2.0 * PI);
        assert_eq!(max_polar, PI);
    }

    #[test]
    fn mu_generator_filters() {
        let regular = RegularAngularGenerator::default().generate(&[1.0], 2);
        let restricted = AboveMuMinGenerator::default().generate(&[1.0], 2);
        assert!(restricted.n_samples() > 0);
        assert!(restricted.n_samples() < regular.n_samples());
        assert!(restricted.angles.row(0).iter().all(|phi| phi.sin() >= 0.97));
    }

    #[test]
    fn cartesian_conversion() {
        let angles = array![[0.0, PI / 2.0], [PI / 2.0, PI / 2.0]];
        let xyz = spherical_to_cartesian(&[2.0, 1.0], angles.view());
        assert_eq!(xyz.shape(), &[3, 2]);
        assert!((xyz[[0, 0]] - 2.0).abs() < 1e-15);
        assert!(xyz[[1, 0]].abs() < 1e-15 && xyz[[2, 0]].abs() < 1e-15);
        // φ₀ = φ₁ = π/2 points along the last axis
        assert!(xyz[[0, 1]].abs() < 1e-15);
        assert!(xyz[[1, 1]].abs() < 1e-15);
        assert!((xyz[[2, 1]] - 1.0).abs() < 1e-15);

        // the points always lie on the sphere, whatever the dimension
        let angles4 = array![[0.3], [1.1], [2.0]];
        let p = spherical_to_cartesian(&[1.5], angles4.view());
        let norm = p.column(0).iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.5).abs() < 1e-14);
    }

    #[test]
    fn sample_coords_1d_and_filtering() {
        let x = Array1::linspace(0.0, 2.0, 5);
        let generator = RegularAngularGenerator::default();
        let set = sample_coords(&[x.view()], &[0.5, 1.0, 3.0], &generator).unwrap();
        assert_eq!(set.radius_index, vec![0, 1]);
        assert_eq!(set.n_radii, 3);

        // a grid that only covers the first quadrant
        let y = Array1::linspace(0.0, 2.0, 5);
        let set = sample_coords(&[x.view(), y.view()], &[1.0], &generator).unwrap();
        assert!(set.n_samples() > 0 && set.n_samples() < 100);
        assert!(set.coords.iter().all(|&c| c >= 0.0));
    }

    #[test]
    fn no_valid_samples() {
        // mu-restricted directions lie near the y-axis, the grid covers a
        // thin strip along x
        let x = Array1::linspace(-2.0, 2.0, 5);
        let y = Array1::linspace(-0.1, 0.1, 3);
        let err = sample_coords(
            &[x.view(), y.view()],
            &[1.0],
            &AboveMuMinGenerator::default(),
        )
        .unwrap_err();
        assert_eq!(err, NO_VALID_SAMPLES);
    }

    #[test]
    fn closure_generator() {
        let generator = |radii: &[f64], _ndim: usize| AngularSamples {
            radius_index: (0..radii.len()).collect(),
            angles: Array2::zeros((1, radii.len())),
        };
        let x = Array1::linspace(-2.0, 2.0, 5);
        let set = sample_coords(&[x.view(), x.view()], &[0.5, 1.5], &generator).unwrap();
        assert_eq!(set.coords, array![[0.5, 1.5], [0.0, 0.0]]);
    }
}
