//! Conversion of a discrete particle sample into a density grid.

use crate::Error;
use ndarray::{ArrayD, ArrayView1, ArrayView2, IxDyn};

/// A particle sample that was deposited onto a grid
#[derive(Clone, Debug)]
pub struct BinnedParticles {
    /// the (over)density of every cell
    pub field: ArrayD<f64>,
    /// the number of particles in the sample
    pub n_particles: usize,
}

/// Deposits particles onto a regular grid that fills a periodic box.
pub trait ParticleBinner {
    /// `positions` has shape `(n_particles, ndim)`. When `dimensionless` is
    /// `true`, the output is the overdensity `ρ/ρ̄ - 1`. Otherwise, it's
    /// `ρ - ρ̄`.
    fn bin_particles(
        &self,
        positions: ArrayView2<f64>,
        box_lengths: &[f64],
        n_cells: &[usize],
        weights: Option<ArrayView1<f64>>,
        dimensionless: bool,
    ) -> Result<BinnedParticles, Error>;
}

/// Counts the (weighted) particles that fall within each cell.
///
/// Positions are wrapped into the box (`x mod L`) before they are binned.
#[derive(Clone, Copy, Debug, Default)]
pub struct HistogramParticleBinner;

impl ParticleBinner for HistogramParticleBinner {
    fn bin_particles(
        &self,
        positions: ArrayView2<f64>,
        box_lengths: &[f64],
        n_cells: &[usize],
        weights: Option<ArrayView1<f64>>,
        dimensionless: bool,
    ) -> Result<BinnedParticles, Error> {
        let (n_particles, ndim) = positions.dim();
        if ndim > n_particles {
            // the positions were most likely transposed
            return Err(Error::integer_range(
                "the number of spatial dimensions of the particle sample",
                ndim as i64,
                1,
                n_particles as i64,
            ));
        } else if box_lengths.len() != ndim || n_cells.len() != ndim {
            return Err(Error::shape_mismatch(
                "the box lengths and cell counts",
                &[ndim, ndim],
                &[box_lengths.len(), n_cells.len()],
            ));
        } else if n_cells.contains(&0) {
            return Err(Error::internal_legacy_adhoc(
                "the number of cells along each axis must be positive",
            ));
        }
        if let Some(w) = weights {
            if w.len() != n_particles {
                return Err(Error::shape_mismatch(
                    "the particle weights",
                    &[n_particles],
                    &[w.len()],
                ));
            }
        }

        let mut field = ArrayD::<f64>::zeros(IxDyn(n_cells));
        let mut index = vec![0_usize; ndim];
        for (p, position) in positions.rows().into_iter().enumerate() {
            for (axis, &x) in position.iter().enumerate() {
                let l = box_lengths[axis];
                let n = n_cells[axis];
                let i = (x.rem_euclid(l) / l * (n as f64)).floor() as usize;
                // rem_euclid may round up to exactly `l`
                index[axis] = i.min(n - 1);
            }
            field[IxDyn(&index)] += weights.map_or(1.0, |w| w[p]);
        }

        let mean = field.mean().unwrap_or(0.0);
        if dimensionless {
            field.mapv_inplace(|rho| rho / mean - 1.0);
        } else {
            field.mapv_inplace(|rho| rho - mean);
        }
        tracing::debug!(n_particles, mean, "binned particles");
        Ok(BinnedParticles { field, n_particles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn histogram_wraps_positions() {
        let positions = array![[0.1, 0.1], [0.6, 0.1], [1.1, -0.9], [0.9, 0.9]];
        let out = HistogramParticleBinner
            .bin_particles(positions.view(), &[1.0, 1.0], &[2, 2], None, false)
            .unwrap();
        assert_eq!(out.n_particles, 4);
        // counts are [[2, 0], [1, 1]] with a mean of 1
        assert_eq!(out.field, array![[1.0, -1.0], [0.0, 0.0]].into_dyn());

        let overdensity = HistogramParticleBinner
            .bin_particles(positions.view(), &[1.0, 1.0], &[2, 2], None, true)
            .unwrap();
        assert_eq!(
            overdensity.field,
            array![[1.0, -1.0], [0.0, 0.0]].into_dyn()
        );
    }

    #[test]
    fn weighted_particles() {
        let positions = array![[0.25], [0.75], [0.8]];
        let weights = array![2.0, 1.0, 1.0];
        let out = HistogramParticleBinner
            .bin_particles(positions.view(), &[1.0], &[2], Some(weights.view()), true)
            .unwrap();
        assert_eq!(out.field, array![0.0, 0.0].into_dyn());
    }

    #[test]
    fn transposed_positions() {
        let positions = array![[0.1, 0.2, 0.3]];
        let err = HistogramParticleBinner
            .bin_particles(positions.view(), &[1.0; 3], &[2; 3], None, true)
            .unwrap_err();
        assert!(err.to_string().contains("spatial dimensions"));
    }
}
