//! Machinery for describing the coordinates of a regular rectilinear grid.
//!
//! A grid is described by one 1D coordinate vector per axis. Every other
//! component that needs the distance of a cell from the origin goes through
//! [`magnitude_grid`], so that there is a single radius convention.

use ndarray::{ArrayD, ArrayView1, ArrayViewD, Axis, IxDyn};

/// Computes the Euclidean norm of the coordinates of every cell in the grid
/// described by `coords` (the grid is indexed like `np.meshgrid(...,
/// indexing="ij")`).
///
/// The result has shape `[coords[0].len(), coords[1].len(), ...]`.
pub fn magnitude_grid(coords: &[ArrayView1<f64>]) -> ArrayD<f64> {
    let shape: Vec<usize> = coords.iter().map(|c| c.len()).collect();
    let mut squared = ArrayD::<f64>::zeros(IxDyn(&shape));
    for (axis, c) in coords.iter().enumerate() {
        // each lane along `axis` receives a copy of the squared coordinates
        for mut lane in squared.lanes_mut(Axis(axis)) {
            lane.zip_mut_with(c, |acc, &x| *acc += x * x);
        }
    }
    squared.mapv_into(f64::sqrt)
}

/// Radius of the largest hypersphere (centred on the origin) whose surface
/// is still sampled along every axis.
///
/// In more detail, for each axis we take the maximum radius along every 1D
/// slice parallel to that axis, and return the smallest of those maxima.
/// This keeps the outermost bin inside non-cubic domains.
///
/// This is the general (slow) path that works on an arbitrary radial grid.
/// When the grid was built from coordinate vectors, prefer
/// [`max_radius_from_coords`].
pub fn max_inscribed_radius(radial: &ArrayViewD<f64>) -> Option<f64> {
    let per_axis_maxima: Vec<Vec<f64>> = (0..radial.ndim())
        .map(|axis| {
            radial
                .map_axis(Axis(axis), |lane| lane.fold(f64::NEG_INFINITY, |m, &x| m.max(x)))
                .iter().copied().collect::<Vec<f64>>()
        })
        .collect();
    max_radius_ragged(&per_axis_maxima)
}

/// Smallest value across a ragged collection of per-axis maxima.
///
/// The maxima for different axes generally have different lengths (that is
/// the case whenever the grid isn't a perfect hypercube).
pub fn max_radius_ragged(per_axis_maxima: &[Vec<f64>]) -> Option<f64> {
    per_axis_maxima
        .iter()
        .flat_map(|maxima| maxima.iter().copied())
        .filter(|x| !x.is_nan())
        .reduce(f64::min)
}

/// Equivalent to calling [`max_inscribed_radius`] on
/// `magnitude_grid(coords)`, without materializing the grid.
///
/// The maximum along a slice parallel to axis `i` is
/// `sqrt(max(x_i²) + Σ_{k≠i} x_k²)`, which is smallest when every other
/// coordinate takes its smallest square.
pub fn max_radius_from_coords(coords: &[ArrayView1<f64>]) -> Option<f64> {
    if coords.is_empty() || coords.iter().any(|c| c.is_empty()) {
        return None;
    }
    let min_sq: Vec<f64> = coords
        .iter()
        .map(|c| c.iter().map(|x| x * x).fold(f64::INFINITY, f64::min))
        .collect();
    let max_sq: Vec<f64> = coords
        .iter()
        .map(|c| c.iter().map(|x| x * x).fold(f64::NEG_INFINITY, f64::max))
        .collect();
    let total_min_sq: f64 = min_sq.iter().sum();

    (0..coords.len())
        .map(|i| (max_sq[i] + (total_min_sq - min_sq[i])).sqrt())
        .reduce(f64::min)
}

/// returns the `(min, max)` coordinate along each axis
pub fn coordinate_bounds(coords: &[ArrayView1<f64>]) -> Vec<(f64, f64)> {
    coords
        .iter()
        .map(|c| {
            let lo = c.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = c.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (lo, hi)
        })
        .collect()
}

/// checks that every coordinate vector is non-empty, finite and strictly
/// increasing (a requirement for interpolation)
pub fn validate_grid_coords(coords: &[ArrayView1<f64>]) -> Result<(), &'static str> {
    for c in coords {
        if c.is_empty() {
            return Err("coordinate vectors can't be empty");
        } else if c.iter().any(|x| !x.is_finite()) {
            return Err("coordinates must be finite");
        } else if c.windows(2).into_iter().any(|w| w[1] <= w[0]) {
            return Err("coordinates must be strictly increasing along each axis");
        }
    }
    Ok(())
}
