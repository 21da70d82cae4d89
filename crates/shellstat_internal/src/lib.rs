mod binning;
mod bins;
mod element;
mod grid;
mod interp;
mod interpolated;
mod reducer;
mod sampler;
mod state;
mod variance;

pub use binning::{BinAssignment, BinnedAverage, bin_coordinates, field_average};
pub use bins::{
    BinEdges, BinScale, BinSpec, IrregularBinEdges, linspace, logspace, resolve_bin_edges,
    validate_bin_edges,
};
pub use element::FieldElement;
pub use grid::{
    coordinate_bounds, magnitude_grid, max_inscribed_radius, max_radius_from_coords,
    max_radius_ragged, validate_grid_coords,
};
pub use interp::RegularGridInterpolator;
pub use interpolated::{InterpolatedAverage, field_average_interpolate};
pub use reducer::{Datum, Reducer, ReliabilityVariance, WeightedMean, WeightedTotal, get_output};
pub use sampler::{
    AboveMuMinGenerator, AngularSampleGenerator, AngularSampleSet, AngularSamples, NO_VALID_SAMPLES,
    RegularAngularGenerator, n_angular_bins, sample_coords, spherical_to_cartesian,
};
pub use state::{AccumStateView, AccumStateViewMut, StatePack};
pub use variance::field_variance;
