//! Averaging a field over radial shells.
//!
//! [`average`] averages over every axis of a field, while
//! [`average_leading_axes`] only averages over the leading axes (e.g. to
//! compute a cylindrically averaged quantity). Both share a single driver:
//! the field is viewed as a `(n1, n2)` array, where `n1` counts the cells of
//! the averaged axes and `n2` counts the columns of the remaining axes. The
//! bin assignment (or the sample set, when interpolating) depends only on
//! the averaged axes, so it is computed once and reused for every column.

use crate::diagnostics::{Diagnostic, report};
use crate::{AverageConfig, Error};
use ndarray::{Array1, Array2, ArrayD, ArrayView, ArrayView1, ArrayViewD, Axis, Dimension, IxDyn};
use shellstat_internal::{
    AngularSampleSet, BinAssignment, BinEdges, BinSpec, FieldElement, NO_VALID_SAMPLES,
    bin_coordinates, field_average, field_average_interpolate, field_variance, magnitude_grid,
    resolve_bin_edges, sample_coords, validate_grid_coords,
};

/// Describes where the cells of a field lie.
#[derive(Clone, Debug)]
pub enum Coordinates<'a> {
    /// one coordinate vector per axis of the field
    Axes(Vec<ArrayView1<'a, f64>>),
    /// the precomputed distance of every cell (of the averaged axes) from
    /// the origin
    Magnitude(ArrayViewD<'a, f64>),
}

impl<'a> Coordinates<'a> {
    pub fn from_axes(axes: &[ArrayView1<'a, f64>]) -> Self {
        Coordinates::Axes(axes.to_vec())
    }
}

/// The weight attached to each cell
#[derive(Clone, Debug)]
pub enum Weights<'a> {
    /// every cell carries the same weight
    Uniform(f64),
    /// one weight per cell of the averaged axes
    Array(ArrayViewD<'a, f64>),
}

impl Default for Weights<'_> {
    fn default() -> Self {
        Weights::Uniform(1.0)
    }
}

/// The result of a radial average.
#[derive(Clone, Debug)]
pub struct AveragedSeries<T> {
    /// the averaged values, with shape `(n_bins, trailing axes...)`
    pub values: ArrayD<T>,
    /// the coordinate of each bin
    pub bin_coords: Vec<f64>,
    /// the variance of the mean of each bin (same shape as `values`), when
    /// requested
    pub variance: Option<ArrayD<f64>>,
    /// the weight of each bin, when requested
    pub weights: Option<Vec<f64>>,
    /// non-fatal problems that were encountered
    pub diagnostics: Vec<Diagnostic>,
}

/// Average `field` over radial shells.
///
/// `coords` describes where the field's cells lie, `bins` specifies either
/// the number of bins (the edges are derived from the grid) or the edges
/// themselves. See [`crate::AverageBuilder`] for the available options.
///
/// The returned values have shape `(n_bins,)`.
///
/// # Errors
/// Returns an error when the shapes of `field`, `coords` and `weights` are
/// inconsistent, when the bins are invalid, or when variance is requested
/// for a complex field.
pub fn average<T, D>(
    field: ArrayView<T, D>,
    coords: &Coordinates,
    bins: &BinSpec,
    weights: &Weights,
    config: &AverageConfig,
) -> Result<AveragedSeries<T>, Error>
where
    T: FieldElement,
    D: Dimension,
{
    let ndim = field.ndim();
    average_leading_axes(field, coords, ndim, bins, weights, config)
}

/// Average `field` over radial shells of its leading `n_axes` axes.
///
/// The averaged values have shape `(n_bins, trailing axes...)`: each
/// column of the trailing axes is averaged independently. `weights` must
/// match the shape of the leading axes (a [`Coordinates::Magnitude`] grid
/// must do the same). Calling this with `n_axes` equal to the number of
/// dimensions of `field` is equivalent to calling [`average`].
pub fn average_leading_axes<T, D>(
    field: ArrayView<T, D>,
    coords: &Coordinates,
    n_axes: usize,
    bins: &BinSpec,
    weights: &Weights,
    config: &AverageConfig,
) -> Result<AveragedSeries<T>, Error>
where
    T: FieldElement,
    D: Dimension,
{
    let field = field.into_dyn();
    let ndim = field.ndim();
    if n_axes == 0 || n_axes > ndim {
        return Err(Error::integer_range(
            "the number of averaged axes",
            n_axes as i64,
            1,
            ndim as i64,
        ));
    }
    let leading_shape = &field.shape()[..n_axes];
    let trailing_shape = &field.shape()[n_axes..];
    let n1: usize = leading_shape.iter().product();
    let n2: usize = trailing_shape.iter().product();

    let (axes, radial) = leading_coordinates(coords, field.shape(), n_axes)?;
    let flat_weights = resolve_weights(weights, leading_shape)?;

    let edges = resolve_bin_edges(bins, config.scale, &radial.view(), axes.as_deref())
        .map_err(|what| Error::bin_edge("bins", what))?;
    tracing::debug!(n_bins = edges.n_bins(), "resolved radial bins");

    let field2 = field
        .to_shape((n1, n2))
        .map_err(|_| Error::internal_legacy_adhoc("failed to view the field as 2D"))?;
    let column_id = |j: usize| (n2 > 1 || n_axes < ndim).then_some(j);

    let mut diagnostics = Vec::new();
    let reduced = match config.interpolation {
        None => {
            let assignment = BinAssignment::new(radial.iter(), &edges);
            let bin_coords = bin_coordinates(
                &assignment,
                radial.iter().copied(),
                &flat_weights,
                &edges,
                config.bin_ave,
            );
            reduce_cells(
                &assignment,
                field2.view(),
                &flat_weights,
                config,
                bin_coords,
                &mut diagnostics,
                column_id,
            )?
        }
        Some(_) => {
            let Some(axes) = axes else {
                return Err(Error::coordinate_axes("interpolation"));
            };
            validate_grid_coords(&axes).map_err(Error::internal_legacy_adhoc)?;
            let radii = edges.centres(config.scale);
            let samples = sample_coords(&axes, &radii, config.generator.as_ref()).map_err(|msg| {
                if msg == NO_VALID_SAMPLES {
                    Error::no_valid_samples()
                } else {
                    Error::internal_legacy_adhoc(msg)
                }
            })?;
            tracing::debug!(n_samples = samples.n_samples(), "generated shell samples");
            reduce_interpolated(
                &axes,
                leading_shape,
                field2.view(),
                &flat_weights,
                &samples,
                radii,
                &mut diagnostics,
                column_id,
            )?
        }
    };

    let mut out_shape = vec![edges.n_bins()];
    out_shape.extend_from_slice(trailing_shape);
    let reshape = |a: Array2<f64>| {
        a.into_shape_with_order(IxDyn(&out_shape))
            .map_err(|_| Error::internal_legacy_adhoc("failed to reshape the averaged output"))
    };
    let values = reduced
        .values
        .into_shape_with_order(IxDyn(&out_shape))
        .map_err(|_| Error::internal_legacy_adhoc("failed to reshape the averaged output"))?;
    let variance = match reduced.variance {
        Some(v) => Some(reshape(v)?),
        None => None,
    };

    Ok(AveragedSeries {
        values,
        bin_coords: reduced.bin_coords,
        variance,
        weights: config.return_weights.then_some(reduced.weights),
        diagnostics,
    })
}

/// the per-column results, before reshaping
struct Reduced<T> {
    values: Array2<T>,
    bin_coords: Vec<f64>,
    variance: Option<Array2<f64>>,
    weights: Vec<f64>,
}

/// Checks the coordinates against the field's shape. Returns the coordinate
/// vectors of the averaged axes (`None` for a magnitude grid) and the radial
/// grid of those axes.
fn leading_coordinates<'a>(
    coords: &Coordinates<'a>,
    field_shape: &[usize],
    n_axes: usize,
) -> Result<(Option<Vec<ArrayView1<'a, f64>>>, ArrayD<f64>), Error> {
    match coords {
        Coordinates::Axes(axes) => {
            if axes.len() != field_shape.len() {
                return Err(Error::integer_range(
                    "the number of coordinate vectors",
                    axes.len() as i64,
                    field_shape.len() as i64,
                    field_shape.len() as i64,
                ));
            }
            let lens: Vec<usize> = axes.iter().map(|a| a.len()).collect();
            if lens != field_shape {
                return Err(Error::shape_mismatch(
                    "the coordinate vectors",
                    field_shape,
                    &lens,
                ));
            }
            let leading = axes[..n_axes].to_vec();
            let radial = magnitude_grid(&leading);
            Ok((Some(leading), radial))
        }
        Coordinates::Magnitude(r) => {
            if r.shape() != &field_shape[..n_axes] {
                return Err(Error::shape_mismatch(
                    "the magnitude grid",
                    &field_shape[..n_axes],
                    r.shape(),
                ));
            }
            Ok((None, r.to_owned()))
        }
    }
}

/// flatten the weights of the averaged axes (row-major order)
fn resolve_weights(weights: &Weights, leading_shape: &[usize]) -> Result<Vec<f64>, Error> {
    let flat: Vec<f64> = match weights {
        Weights::Uniform(w) => vec![*w; leading_shape.iter().product()],
        Weights::Array(w) => {
            if w.shape() != leading_shape {
                return Err(Error::shape_mismatch("weights", leading_shape, w.shape()));
            }
            w.iter().copied().collect()
        }
    };
    if let Some(bad) = flat.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
        return Err(Error::invalid_weight(*bad));
    }
    Ok(flat)
}

fn reduce_cells<T: FieldElement>(
    assignment: &BinAssignment,
    field2: ArrayView<T, ndarray::Ix2>,
    flat_weights: &[f64],
    config: &AverageConfig,
    bin_coords: Vec<f64>,
    diagnostics: &mut Vec<Diagnostic>,
    column_id: impl Fn(usize) -> Option<usize>,
) -> Result<Reduced<T>, Error> {
    if config.get_variance && T::IS_COMPLEX {
        return Err(Error::unsupported("variance", "the field is complex"));
    }
    let n_bins = assignment.n_bins();
    let n2 = field2.ncols();

    let mut values = Array2::<T>::from_elem((n_bins, n2), T::default());
    let mut variance = config
        .get_variance
        .then(|| Array2::<f64>::zeros((n_bins, n2)));
    let mut weights = Vec::new();
    for (j, column) in field2.axis_iter(Axis(1)).enumerate() {
        let binned = field_average(assignment, column, flat_weights, config.average);
        for &bin in binned.empty_bins.iter() {
            report(
                diagnostics,
                Diagnostic::EmptyBin {
                    bin,
                    column: column_id(j),
                },
            );
        }
        values
            .column_mut(j)
            .assign(&Array1::from(binned.values.clone()));

        if let Some(ref mut variance) = variance {
            let real_column: Array1<f64> = column.mapv(|v| v.re());
            // the estimate is always centred on the weighted mean
            let means: Vec<f64> = if config.average {
                binned.values.iter().map(|v| v.re()).collect()
            } else {
                field_average(assignment, real_column.view(), flat_weights, true).values
            };
            let var = field_variance(assignment, real_column.view(), &means, flat_weights)
                .map_err(Error::internal_legacy_adhoc)?;
            variance.column_mut(j).assign(&Array1::from(var));
        }
        weights = binned.weights;
    }

    Ok(Reduced {
        values,
        bin_coords,
        variance,
        weights,
    })
}

#[allow(clippy::too_many_arguments)]
fn reduce_interpolated<T: FieldElement>(
    axes: &[ArrayView1<f64>],
    leading_shape: &[usize],
    field2: ArrayView<T, ndarray::Ix2>,
    flat_weights: &[f64],
    samples: &AngularSampleSet,
    radii: Vec<f64>,
    diagnostics: &mut Vec<Diagnostic>,
    column_id: impl Fn(usize) -> Option<usize>,
) -> Result<Reduced<T>, Error> {
    let n_bins = radii.len();
    let n2 = field2.ncols();
    let weight_grid = ArrayD::from_shape_vec(IxDyn(leading_shape), flat_weights.to_vec())
        .map_err(|_| Error::internal_legacy_adhoc("failed to reshape the weights"))?;

    let mut values = Array2::<T>::from_elem((n_bins, n2), T::default());
    let mut weights = Vec::new();
    for (j, column) in field2.axis_iter(Axis(1)).enumerate() {
        let column_grid = column
            .to_owned()
            .into_shape_with_order(IxDyn(leading_shape))
            .map_err(|_| Error::internal_legacy_adhoc("failed to reshape a field column"))?;
        let averaged =
            field_average_interpolate(axes, column_grid.view(), weight_grid.view(), samples)
                .map_err(Error::internal_legacy_adhoc)?;

        if averaged.all_missing {
            report(
                diagnostics,
                Diagnostic::AllSamplesMissing {
                    column: column_id(j),
                },
            );
        } else {
            let empty_bins = averaged
                .weights
                .iter()
                .enumerate()
                .filter(|(_, w)| **w == 0.0);
            for (bin, _) in empty_bins {
                report(
                    diagnostics,
                    Diagnostic::EmptyBin {
                        bin,
                        column: column_id(j),
                    },
                );
            }
        }
        values.column_mut(j).assign(&Array1::from(averaged.values));
        weights = averaged.weights;
    }

    Ok(Reduced {
        values,
        bin_coords: radii,
        variance: None,
        weights,
    })
}
