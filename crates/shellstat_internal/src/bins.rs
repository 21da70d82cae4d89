//! Implements types to represent radial "bin edges". The [`BinEdges`] trait
//! provides a common interface that is implemented by [`IrregularBinEdges`].
//!
//! This module is also home to the logic that resolves a [`BinSpec`] (a bin
//! count or explicit edges) into concrete edges for a given radial grid.

use crate::grid::{max_inscribed_radius, max_radius_from_coords};
use ndarray::{ArrayView1, ArrayViewD};

/// Super simple. This can be expanded as needed.
pub trait BinEdges {
    /// Calculate the bin index for a given value. Values which are equal to
    /// boundary values are considered part of the higher bin, i.e. intervals
    /// do not include the right edge.
    fn bin_index(&self, value: f64) -> Option<usize>;

    fn n_bins(&self) -> usize;
}

/// checks that bin edges are suitable for constructing [`IrregularBinEdges`]
pub fn validate_bin_edges(bin_edges: &[f64]) -> Result<(), &'static str> {
    if bin_edges.len() < 2 {
        return Err("A minimum of two bin edges are required");
    }

    // It may be worth supporting -inf and +inf as first and last bin edges
    if bin_edges.iter().any(|&x| !x.is_finite()) {
        return Err("Bin edges must be finite");
    }

    if bin_edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err("Bin edges must be in strictly increasing order");
    }
    Ok(())
}

/// Bins with arbitrary (strictly increasing) edges
#[derive(Clone, Debug, PartialEq)]
pub struct IrregularBinEdges {
    bin_edges: Vec<f64>,
}

impl IrregularBinEdges {
    pub fn new(bin_edges: Vec<f64>) -> Result<IrregularBinEdges, &'static str> {
        validate_bin_edges(&bin_edges)?;
        Ok(IrregularBinEdges { bin_edges })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.bin_edges
    }

    /// arithmetic midpoint of each bin
    pub fn midpoints(&self) -> Vec<f64> {
        self.bin_edges
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect()
    }

    /// geometric midpoint of each bin (only meaningful for positive edges)
    pub fn log_midpoints(&self) -> Vec<f64> {
        self.bin_edges
            .windows(2)
            .map(|w| (0.5 * (w[0].ln() + w[1].ln())).exp())
            .collect()
    }

    /// the radius that represents each bin when samples are drawn on shells
    pub fn centres(&self, scale: BinScale) -> Vec<f64> {
        match scale {
            BinScale::Linear => self.midpoints(),
            BinScale::Log => self.log_midpoints(),
        }
    }
}

impl BinEdges for IrregularBinEdges {
    fn bin_index(&self, value: f64) -> Option<usize> {
        // NaN fails both comparisons, so check for it explicitly
        if value.is_nan()
            || value < self.bin_edges[0]
            || value >= self.bin_edges[self.bin_edges.len() - 1]
        {
            return None;
        }

        // -0.0 == 0.0 here, unlike under total_cmp. The guard above keeps the
        // partition point at 1 or more
        Some(self.bin_edges.partition_point(|edge| *edge <= value) - 1)
    }

    fn n_bins(&self) -> usize {
        self.bin_edges.len() - 1
    }
}

/// Controls the spacing of bins that are derived from a bin count
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BinScale {
    #[default]
    Linear,
    Log,
}

/// Specifies radial bins, either as a count (the edges are derived from the
/// grid) or as explicit edges (which are used unchanged).
#[derive(Clone, Debug, PartialEq)]
pub enum BinSpec {
    Count(usize),
    Edges(Vec<f64>),
}

impl From<usize> for BinSpec {
    fn from(value: usize) -> Self {
        BinSpec::Count(value)
    }
}

impl From<Vec<f64>> for BinSpec {
    fn from(value: Vec<f64>) -> Self {
        BinSpec::Edges(value)
    }
}

/// `n` evenly spaced values from `start` to `stop` (inclusive)
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / ((n - 1) as f64);
            let mut out: Vec<f64> = (0..n).map(|i| start + (i as f64) * step).collect();
            // avoid roundoff in the final edge
            out[n - 1] = stop;
            out
        }
    }
}

/// `n` values from `start` to `stop` (inclusive) that are evenly spaced in
/// log-space. Both bounds must be positive.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let mut out: Vec<f64> = linspace(start.log10(), stop.log10(), n)
        .into_iter()
        .map(|x| 10f64.powf(x))
        .collect();
    if n > 1 {
        out[0] = start;
        out[n - 1] = stop;
    }
    out
}

/// Resolve a [`BinSpec`] into concrete edges.
///
/// Explicit edges pass through unchanged (after validation). When a count,
/// `n`, is given, we produce `n + 1` edges that span from the smallest
/// radius (smallest positive radius for log-spacing) up to the radius of the
/// largest inscribed hypersphere.
///
/// When `coords` is provided, it must describe the same grid as `radial`;
/// it lets us compute the inscribed radius without scanning every slice.
pub fn resolve_bin_edges(
    spec: &BinSpec,
    scale: BinScale,
    radial: &ArrayViewD<f64>,
    coords: Option<&[ArrayView1<f64>]>,
) -> Result<IrregularBinEdges, &'static str> {
    let n_bins = match spec {
        BinSpec::Edges(edges) => return IrregularBinEdges::new(edges.clone()),
        BinSpec::Count(0) => return Err("the number of bins must be positive"),
        BinSpec::Count(n) => *n,
    };

    let max_radius = match coords {
        Some(coords) => max_radius_from_coords(coords),
        None => max_inscribed_radius(radial),
    }
    .ok_or("can't derive bins from an empty radial grid")?;

    let edges = match scale {
        BinScale::Linear => {
            let min_radius = radial.iter().copied().fold(f64::INFINITY, f64::min);
            if !(max_radius > min_radius) {
                return Err("the radial grid spans a degenerate range");
            }
            linspace(min_radius, max_radius, n_bins + 1)
        }
        BinScale::Log => {
            let min_radius = radial
                .iter()
                .copied()
                .filter(|&r| r > 0.0)
                .fold(f64::INFINITY, f64::min);
            if !min_radius.is_finite() {
                return Err("log-spaced bins require a positive radius");
            } else if !(max_radius > min_radius) {
                return Err("the radial grid spans a degenerate range");
            }
            logspace(min_radius, max_radius, n_bins + 1)
        }
    };
    IrregularBinEdges::new(edges)
}
