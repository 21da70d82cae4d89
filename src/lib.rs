/*!
Provides routines for averaging gridded fields over radial shells and for
computing (cross-)power spectra of fields and particle samples.

# High-Level: Shell Averages and Power Spectra

Many statistics of a field defined on a regular grid only depend on the
distance from some origin. A classic example is the isotropic power
spectrum in
[cosmology](https://en.wikipedia.org/wiki/Matter_power_spectrum): the
squared amplitude of the Fourier modes is averaged over shells of constant
`|k|`.

The averaging machinery comes in two flavors:
- cells are assigned to bins based on their distance from the origin, and
  the (weighted) mean is taken in each bin (see [`average`])
- the field is interpolated onto points sampled on each shell (enable it
  with [`AverageBuilder::interpolation`])

Averages may also be restricted to the leading axes of a field (see
[`average_leading_axes`]), which yields, for example, a cylindrically
averaged power spectrum.

# User Guide

```
use ndarray::{Array1, Array2};
use shellstat::{AverageBuilder, BinSpec, Coordinates, Weights, average};

let x = Array1::linspace(-1.0, 1.0, 32);
let field = Array2::from_shape_fn((32, 32), |(i, j)| -(x[i] * x[i] + x[j] * x[j]));
let config = AverageBuilder::new().build().unwrap();
let out = average(
    field.view(),
    &Coordinates::from_axes(&[x.view(), x.view()]),
    &BinSpec::Count(8),
    &Weights::default(),
    &config,
)
.unwrap();
assert_eq!(out.values.len(), 8);
```

Power spectra are configured with [`PowerSpectrumBuilder`].

# Developer Guide

The binning and reduction kernels live in [`shellstat_internal`].

*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the crates in this package
mod average;
mod config;
mod diagnostics;
mod error;
mod particles;
mod power;
mod transform;

// pull in symbols that visible outside of the package
pub use average::{AveragedSeries, Coordinates, Weights, average, average_leading_axes};
pub use config::{AverageBuilder, AverageConfig, Interpolation};
pub use diagnostics::Diagnostic;
pub use error::{Error, ErrorCategory};
pub use num_complex::Complex64;
pub use particles::{BinnedParticles, HistogramParticleBinner, ParticleBinner};
pub use power::{
    BoxLengths, KWeightFn, KWeights, PowerInput, PowerSpectrum, PowerSpectrumBuilder,
    PowerSpectrumResult, PrefactorFn, default_bin_count, ignore_zero_absk, ignore_zero_ki,
    power_spectrum, power2delta,
};
pub use shellstat_internal::{
    AboveMuMinGenerator, AngularSampleGenerator, AngularSamples, BinEdges, BinScale, BinSpec,
    FieldElement, IrregularBinEdges, RegularAngularGenerator, magnitude_grid, max_radius_ragged,
    spherical_to_cartesian,
};
pub use transform::{FftTransform, ForwardTransform, TransformOutput, shifted_frequencies};
