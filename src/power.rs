//! Power spectra (and cross-power spectra) of fields and particle samples.
//!
//! [`PowerSpectrumBuilder`] collects the options, and
//! [`PowerSpectrum::compute`] runs the pipeline:
//! 1. particle samples are deposited onto a grid (see [`ParticleBinner`])
//! 2. the inputs are transformed (see [`ForwardTransform`])
//! 3. the power `Re(FT₁·conj(FT₂)) / V²` is formed and optionally scaled
//! 4. the power is averaged over shells of the leading `res_ndim` axes
//! 5. shot noise is removed for particle samples

use crate::average::{Coordinates, Weights, average_leading_axes};
use crate::diagnostics::Diagnostic;
use crate::particles::{HistogramParticleBinner, ParticleBinner};
use crate::transform::{FftTransform, ForwardTransform, cross_power};
use crate::{AverageBuilder, AverageConfig, Error};
use ndarray::{Array1, ArrayD, ArrayView1, ArrayView2, ArrayViewD, Zip};
use shellstat_internal::{AngularSampleGenerator, BinSpec, magnitude_grid};
use std::f64::consts::PI;

/// The input of a power spectrum calculation
#[derive(Clone, Debug)]
pub enum PowerInput<'a> {
    /// a field sampled on a regular grid that fills the box
    Field(ArrayViewD<'a, f64>),
    /// a discrete sample of particles
    Particles {
        /// positions with shape `(n_particles, ndim)`
        positions: ArrayView2<'a, f64>,
        /// optional per-particle weights
        weights: Option<ArrayView1<'a, f64>>,
        /// number of grid cells along each axis
        n_cells: Vec<usize>,
    },
}

/// Maps the leading frequency vectors and their magnitude grid to a weight
/// for every mode.
///
/// Only the first `res_ndim` axes (the averaged ones) are passed. The
/// frequencies of the trailing axes are not available, so the weights can't
/// depend on them. The returned array must have the shape of the magnitude
/// grid and is applied identically to every trailing column.
pub type KWeightFn = dyn Fn(&[Array1<f64>], &ArrayViewD<f64>) -> ArrayD<f64>;

/// Maps the frequency vectors of every axis to a factor for every mode.
pub type PrefactorFn = dyn Fn(&[Array1<f64>]) -> ArrayD<f64>;

/// Weights applied to the modes of the power spectrum during averaging
pub enum KWeights {
    /// every mode has unit weight
    Uniform,
    /// one weight per mode of the averaged axes. The shape is that of the
    /// first `res_ndim` axes, and the weights are shared by every trailing
    /// column.
    Array(ArrayD<f64>),
    /// computes the weights from the frequency vectors of the averaged axes
    /// and their magnitude grid (see [`KWeightFn`] for the restrictions)
    Predicate(Box<KWeightFn>),
}

/// Either a single length shared by every axis or one length per axis
#[derive(Clone, Debug, PartialEq)]
pub enum BoxLengths {
    Uniform(f64),
    PerAxis(Vec<f64>),
}

impl BoxLengths {
    fn resolve(&self, ndim: usize) -> Result<Vec<f64>, Error> {
        let lengths = match self {
            BoxLengths::Uniform(l) => vec![*l; ndim],
            BoxLengths::PerAxis(lengths) => {
                if lengths.len() != ndim {
                    return Err(Error::integer_range(
                        "the number of box lengths",
                        lengths.len() as i64,
                        ndim as i64,
                        ndim as i64,
                    ));
                }
                lengths.clone()
            }
        };
        if lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return Err(Error::internal_legacy_adhoc(
                "box lengths must be positive and finite",
            ));
        }
        Ok(lengths)
    }
}

impl From<f64> for BoxLengths {
    fn from(value: f64) -> Self {
        BoxLengths::Uniform(value)
    }
}

impl From<Vec<f64>> for BoxLengths {
    fn from(value: Vec<f64>) -> Self {
        BoxLengths::PerAxis(value)
    }
}

/// The result of [`PowerSpectrum::compute`]
#[derive(Clone, Debug)]
pub struct PowerSpectrumResult {
    /// the averaged power, with shape `(n_bins, trailing axes...)`
    pub power: ArrayD<f64>,
    /// the wavenumber of each bin
    pub k: Vec<f64>,
    /// the variance of the mean power in each bin, when requested
    pub variance: Option<ArrayD<f64>>,
    /// the weight of each bin, when requested
    pub weights: Option<Vec<f64>>,
    /// the frequency vectors of the axes that weren't averaged
    pub trailing_freq: Vec<Array1<f64>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds a [`PowerSpectrum`].
///
/// ```
/// use ndarray::Array3;
/// use shellstat::{PowerInput, PowerSpectrumBuilder};
///
/// let field = Array3::<f64>::zeros((8, 8, 8));
/// let result = PowerSpectrumBuilder::new(1.0)
///     .ignore_zero_mode(true)
///     .compute(&PowerInput::Field(field.view().into_dyn()), None)
///     .unwrap();
/// assert_eq!(result.power.ndim(), 1);
/// ```
pub struct PowerSpectrumBuilder {
    box_lengths: BoxLengths,
    a: f64,
    b: f64,
    remove_shotnoise: bool,
    vol_normalised_power: bool,
    bins: Option<BinSpec>,
    res_ndim: Option<usize>,
    ignore_zero_mode: bool,
    k_weights: KWeights,
    prefactor: Option<Box<PrefactorFn>>,
    thread_hint: Option<usize>,
    dimensionless: bool,
    average: AverageBuilder,
    transform: Box<dyn ForwardTransform>,
    binner: Box<dyn ParticleBinner>,
}

impl PowerSpectrumBuilder {
    pub fn new(box_lengths: impl Into<BoxLengths>) -> Self {
        PowerSpectrumBuilder {
            box_lengths: box_lengths.into(),
            a: 1.0,
            b: 1.0,
            remove_shotnoise: true,
            vol_normalised_power: true,
            bins: None,
            res_ndim: None,
            ignore_zero_mode: false,
            k_weights: KWeights::Uniform,
            prefactor: None,
            thread_hint: None,
            dimensionless: true,
            average: AverageBuilder::new(),
            transform: Box::new(FftTransform),
            binner: Box::new(HistogramParticleBinner),
        }
    }

    /// the Fourier convention (see [`ForwardTransform`])
    pub fn convention(mut self, a: f64, b: f64) -> Self {
        self.a = a;
        self.b = b;
        self
    }

    pub fn remove_shotnoise(mut self, remove_shotnoise: bool) -> Self {
        self.remove_shotnoise = remove_shotnoise;
        self
    }

    /// When `true` (the default), the power is multiplied by the box volume
    pub fn vol_normalised_power(mut self, vol_normalised_power: bool) -> Self {
        self.vol_normalised_power = vol_normalised_power;
        self
    }

    pub fn bins(mut self, bins: impl Into<BinSpec>) -> Self {
        self.bins = Some(bins.into());
        self
    }

    /// only average over the first `res_ndim` axes
    pub fn res_ndim(mut self, res_ndim: usize) -> Self {
        self.res_ndim = Some(res_ndim);
        self
    }

    pub fn bin_ave(mut self, bin_ave: bool) -> Self {
        self.average = self.average.bin_ave(bin_ave);
        self
    }

    pub fn variance(mut self, get_variance: bool) -> Self {
        self.average = self.average.variance(get_variance);
        self
    }

    pub fn log_bins(mut self, log_bins: bool) -> Self {
        self.average = self.average.log_bins(log_bins);
        self
    }

    pub fn return_weights(mut self, return_weights: bool) -> Self {
        self.average = self.average.return_weights(return_weights);
        self
    }

    pub fn interpolation(mut self, method: &str) -> Self {
        self.average = self.average.interpolation(method);
        self
    }

    pub fn sample_generator(mut self, generator: impl AngularSampleGenerator + 'static) -> Self {
        self.average = self.average.sample_generator(generator);
        self
    }

    /// give the mode(s) with `|k| = 0` zero weight
    pub fn ignore_zero_mode(mut self, ignore_zero_mode: bool) -> Self {
        self.ignore_zero_mode = ignore_zero_mode;
        self
    }

    pub fn k_weights(mut self, k_weights: KWeights) -> Self {
        self.k_weights = k_weights;
        self
    }

    /// multiply the power by a function of the frequencies (e.g.
    /// [`power2delta`])
    pub fn prefactor(
        mut self,
        prefactor: impl Fn(&[Array1<f64>]) -> ArrayD<f64> + 'static,
    ) -> Self {
        self.prefactor = Some(Box::new(prefactor));
        self
    }

    /// passed through to the transform
    pub fn thread_hint(mut self, n_threads: usize) -> Self {
        self.thread_hint = Some(n_threads);
        self
    }

    /// whether particle samples are converted to overdensities (`ρ/ρ̄ - 1`,
    /// the default) or just have their mean subtracted
    pub fn dimensionless(mut self, dimensionless: bool) -> Self {
        self.dimensionless = dimensionless;
        self
    }

    pub fn transform(mut self, transform: impl ForwardTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    pub fn particle_binner(mut self, binner: impl ParticleBinner + 'static) -> Self {
        self.binner = Box::new(binner);
        self
    }

    pub fn build(self) -> Result<PowerSpectrum, Error> {
        if !(self.a.is_finite() && self.b.is_finite() && self.b != 0.0) {
            return Err(Error::internal_legacy_adhoc(
                "the Fourier convention requires finite a and a finite, non-zero b",
            ));
        }
        Ok(PowerSpectrum {
            box_lengths: self.box_lengths,
            a: self.a,
            b: self.b,
            remove_shotnoise: self.remove_shotnoise,
            vol_normalised_power: self.vol_normalised_power,
            bins: self.bins,
            res_ndim: self.res_ndim,
            ignore_zero_mode: self.ignore_zero_mode,
            k_weights: self.k_weights,
            prefactor: self.prefactor,
            thread_hint: self.thread_hint,
            dimensionless: self.dimensionless,
            average: self.average.build()?,
            transform: self.transform,
            binner: self.binner,
        })
    }

    /// shorthand for `self.build()?.compute(input, cross)`
    pub fn compute(
        self,
        input: &PowerInput,
        cross: Option<&PowerInput>,
    ) -> Result<PowerSpectrumResult, Error> {
        self.build()?.compute(input, cross)
    }
}

/// A configured power spectrum calculation. Construct it with
/// [`PowerSpectrumBuilder`].
pub struct PowerSpectrum {
    box_lengths: BoxLengths,
    a: f64,
    b: f64,
    remove_shotnoise: bool,
    vol_normalised_power: bool,
    bins: Option<BinSpec>,
    res_ndim: Option<usize>,
    ignore_zero_mode: bool,
    k_weights: KWeights,
    prefactor: Option<Box<PrefactorFn>>,
    thread_hint: Option<usize>,
    dimensionless: bool,
    average: AverageConfig,
    transform: Box<dyn ForwardTransform>,
    binner: Box<dyn ParticleBinner>,
}

/// a gridded input, along with its particle count (for particle samples)
struct Gridded {
    field: ArrayD<f64>,
    n_particles: Option<usize>,
}

impl PowerSpectrum {
    fn grid_input(&self, input: &PowerInput, box_lengths: &[f64]) -> Result<Gridded, Error> {
        match input {
            PowerInput::Field(field) => Ok(Gridded {
                field: field.to_owned(),
                n_particles: None,
            }),
            PowerInput::Particles {
                positions,
                weights,
                n_cells,
            } => {
                let binned = self.binner.bin_particles(
                    positions.view(),
                    box_lengths,
                    n_cells,
                    *weights,
                    self.dimensionless,
                )?;
                Ok(Gridded {
                    field: binned.field,
                    n_particles: Some(binned.n_particles),
                })
            }
        }
    }

    /// Compute the power spectrum of `input`, or the cross-power spectrum of
    /// `input` and `cross`.
    ///
    /// # Errors
    /// Both inputs must be the same kind (fields or particle samples) and
    /// must have the same shape (or dimensionality, for particles).
    pub fn compute(
        &self,
        input: &PowerInput,
        cross: Option<&PowerInput>,
    ) -> Result<PowerSpectrumResult, Error> {
        let ndim = input_ndim(input);
        if let Some(cross) = cross {
            check_cross_compatible(input, cross)?;
        }
        let box_lengths = self.box_lengths.resolve(ndim)?;
        let volume: f64 = box_lengths.iter().product();

        let first = self.grid_input(input, &box_lengths)?;
        let second = match cross {
            Some(cross) => Some(self.grid_input(cross, &box_lengths)?),
            None => None,
        };
        let shape = first.field.shape().to_vec();

        let ft1 = self.transform.transform(
            first.field.view(),
            &box_lengths,
            self.a,
            self.b,
            self.thread_hint,
        )?;
        let mut power = match second {
            Some(ref second) => {
                let ft2 = self.transform.transform(
                    second.field.view(),
                    &box_lengths,
                    self.a,
                    self.b,
                    self.thread_hint,
                )?;
                cross_power(&ft1.spectrum, &ft2.spectrum)
            }
            None => cross_power(&ft1.spectrum, &ft1.spectrum),
        };
        let freq = ft1.freq;

        let norm = if self.vol_normalised_power {
            1.0 / volume
        } else {
            1.0 / (volume * volume)
        };
        power.mapv_inplace(|p| p * norm);

        if let Some(ref prefactor) = self.prefactor {
            let factor = prefactor(&freq);
            if factor.shape() != power.shape() {
                return Err(Error::shape_mismatch(
                    "the prefactor",
                    power.shape(),
                    factor.shape(),
                ));
            }
            Zip::from(&mut power).and(&factor).for_each(|p, &f| *p *= f);
        }

        let res_ndim = self.res_ndim.unwrap_or(ndim);
        if res_ndim == 0 || res_ndim > ndim {
            return Err(Error::integer_range(
                "res_ndim",
                res_ndim as i64,
                1,
                ndim as i64,
            ));
        }
        let bins = match self.bins {
            Some(ref bins) => bins.clone(),
            None => BinSpec::Count(default_bin_count(&shape[..res_ndim])),
        };

        let leading_freq = &freq[..res_ndim];
        let leading_views: Vec<ArrayView1<f64>> = leading_freq.iter().map(|f| f.view()).collect();
        let kmag = magnitude_grid(&leading_views);
        let mut k_weights = match self.k_weights {
            KWeights::Uniform => ArrayD::<f64>::ones(kmag.raw_dim()),
            KWeights::Array(ref w) => w.clone(),
            KWeights::Predicate(ref f) => f(leading_freq, &kmag.view()),
        };
        if k_weights.shape() != kmag.shape() {
            return Err(Error::shape_mismatch(
                "the k-weights",
                kmag.shape(),
                k_weights.shape(),
            ));
        }
        if self.ignore_zero_mode {
            let mask = ignore_zero_absk(leading_freq, &kmag.view());
            Zip::from(&mut k_weights)
                .and(&mask)
                .for_each(|w, &m| *w *= m);
        }

        let freq_views: Vec<ArrayView1<f64>> = freq.iter().map(|f| f.view()).collect();
        let averaged = average_leading_axes(
            power.view(),
            &Coordinates::Axes(freq_views),
            res_ndim,
            &bins,
            &Weights::Array(k_weights.view()),
            &self.average,
        )?;

        let mut power = averaged.values;
        if self.remove_shotnoise {
            let n1 = first.n_particles;
            let n2 = second.as_ref().map_or(n1, |s| s.n_particles);
            if let (Some(n1), Some(n2)) = (n1, n2) {
                let shot_noise = (volume * volume / (n1 as f64) / (n2 as f64)).sqrt();
                tracing::debug!(shot_noise, "removing shot noise");
                power.mapv_inplace(|p| p - shot_noise);
            }
        }

        Ok(PowerSpectrumResult {
            power,
            k: averaged.bin_coords,
            variance: averaged.variance,
            weights: averaged.weights,
            trailing_freq: freq[res_ndim..].to_vec(),
            diagnostics: averaged.diagnostics,
        })
    }
}

/// Compute the isotropic power spectrum of `input` with the default options.
pub fn power_spectrum(
    input: &PowerInput,
    box_lengths: impl Into<BoxLengths>,
) -> Result<PowerSpectrumResult, Error> {
    PowerSpectrumBuilder::new(box_lengths).compute(input, None)
}

fn input_ndim(input: &PowerInput) -> usize {
    match input {
        PowerInput::Field(field) => field.ndim(),
        PowerInput::Particles { positions, .. } => positions.ncols(),
    }
}

fn check_cross_compatible(input: &PowerInput, cross: &PowerInput) -> Result<(), Error> {
    match (input, cross) {
        (PowerInput::Field(a), PowerInput::Field(b)) => {
            if a.shape() != b.shape() {
                return Err(Error::shape_mismatch(
                    "the second field",
                    a.shape(),
                    b.shape(),
                ));
            }
        }
        (
            PowerInput::Particles {
                positions: p1,
                n_cells: c1,
                ..
            },
            PowerInput::Particles {
                positions: p2,
                n_cells: c2,
                ..
            },
        ) => {
            if p1.ncols() != p2.ncols() {
                return Err(Error::integer_range(
                    "the dimensionality of the second particle sample",
                    p2.ncols() as i64,
                    p1.ncols() as i64,
                    p1.ncols() as i64,
                ));
            } else if c1 != c2 {
                return Err(Error::shape_mismatch("the second particle grid", c1, c2));
            }
        }
        _ => {
            return Err(Error::unsupported(
                "cross power",
                "both inputs must be fields or both must be particle samples",
            ));
        }
    }
    Ok(())
}

/// `round((∏ N)^(1/d) / 2.2)`, but never less than 1
pub fn default_bin_count(shape: &[usize]) -> usize {
    let cells = shape.iter().map(|&n| n as f64).product::<f64>();
    let n = (cells.powf(1.0 / (shape.len() as f64)) / 2.2).round();
    (n as usize).max(1)
}

/// the surface area of the unit sphere in `d` dimensions, `2π^(d/2)/Γ(d/2)`
fn unit_sphere_area(d: usize) -> f64 {
    match d {
        0 => 0.0,
        1 => 2.0,
        2 => 2.0 * PI,
        _ => 2.0 * PI / ((d - 2) as f64) * unit_sphere_area(d - 2),
    }
}

/// The factor `Ω_d |k|^d / (2π)^d` that converts the power `P(k)` to the
/// dimensionless power spectrum, where `Ω_d = 2π^(d/2)/Γ(d/2)`.
///
/// The result has shape `(freq[0].len(), freq[1].len(), ...)`. In 3D, the
/// factor is `|k|³ / (2π²)`.
pub fn power2delta(freq: &[Array1<f64>]) -> ArrayD<f64> {
    let d = freq.len();
    let views: Vec<ArrayView1<f64>> = freq.iter().map(|f| f.view()).collect();
    let solid_angle = unit_sphere_area(d);
    magnitude_grid(&views).mapv_into(|k| solid_angle * (k / (2.0 * PI)).powi(d as i32))
}

/// Weights that are zero where `|k| ≈ 0` (within `1e-8`) and one elsewhere
pub fn ignore_zero_absk(_freq: &[Array1<f64>], kmag: &ArrayViewD<f64>) -> ArrayD<f64> {
    kmag.mapv(|k| if k.abs() <= 1e-8 { 0.0 } else { 1.0 })
}

/// Weights that are zero wherever any component `k_i` is zero, and one
/// elsewhere. Only the leading `kmag.ndim()` frequency vectors are used.
pub fn ignore_zero_ki(freq: &[Array1<f64>], kmag: &ArrayViewD<f64>) -> ArrayD<f64> {
    let mut out = ArrayD::<f64>::ones(kmag.raw_dim());
    for (axis, f) in freq.iter().take(kmag.ndim()).enumerate() {
        for mut lane in out.lanes_mut(ndarray::Axis(axis)) {
            lane.zip_mut_with(f, |w, &k| {
                if k == 0.0 {
                    *w = 0.0
                }
            });
        }
    }
    out
}
