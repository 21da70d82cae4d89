//! Configuration of radial averaging.
//!
//! Users configure an average through [`AverageBuilder`], which validates
//! the options and produces an [`AverageConfig`].

use crate::Error;
use shellstat_internal::{AngularSampleGenerator, BinScale, RegularAngularGenerator};
use std::{collections::HashMap, sync::LazyLock};

/// The kinds of interpolation supported by the interpolation-based averager
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    /// multilinear interpolation between the corners of the enclosing cell
    Linear,
}

/// returns a hashmap, where keys are the names of the supported
/// interpolation methods
fn build_registry() -> HashMap<String, Interpolation> {
    HashMap::from([("linear".to_owned(), Interpolation::Linear)])
}

/// global registry of the known interpolation methods (lazily initialized,
/// in a threadsafe manner, by [`build_registry`])
static INTERPOLATION_REGISTRY: LazyLock<HashMap<String, Interpolation>> =
    LazyLock::new(build_registry);

/// look up an interpolation method by name
pub(crate) fn interpolation_from_name(name: &str) -> Result<Interpolation, Error> {
    if let Some(method) = INTERPOLATION_REGISTRY.get(name) {
        Ok(*method)
    } else {
        let mut choices: Vec<String> = INTERPOLATION_REGISTRY.keys().cloned().collect();
        choices.sort();
        Err(Error::interpolation_method(name.to_owned(), choices))
    }
}

/// A validated set of averaging options. Construct it with [`AverageBuilder`].
pub struct AverageConfig {
    pub(crate) average: bool,
    pub(crate) bin_ave: bool,
    pub(crate) get_variance: bool,
    pub(crate) scale: BinScale,
    pub(crate) interpolation: Option<Interpolation>,
    pub(crate) generator: Box<dyn AngularSampleGenerator>,
    pub(crate) return_weights: bool,
}

impl AverageConfig {
    pub fn interpolation(&self) -> Option<Interpolation> {
        self.interpolation
    }

    pub fn bin_scale(&self) -> BinScale {
        self.scale
    }

    pub fn computes_variance(&self) -> bool {
        self.get_variance
    }
}

impl Default for AverageConfig {
    fn default() -> Self {
        AverageConfig {
            average: true,
            bin_ave: true,
            get_variance: false,
            scale: BinScale::Linear,
            interpolation: None,
            generator: Box::new(RegularAngularGenerator::default()),
            return_weights: false,
        }
    }
}

/// Builds an [`AverageConfig`].
///
/// ```
/// use shellstat::AverageBuilder;
/// let config = AverageBuilder::new()
///     .log_bins(true)
///     .interpolation("linear")
///     .build()
///     .unwrap();
/// assert!(config.interpolation().is_some());
/// ```
pub struct AverageBuilder {
    average: bool,
    bin_ave: bool,
    get_variance: bool,
    log_bins: bool,
    interpolation: Option<String>,
    generator: Option<Box<dyn AngularSampleGenerator>>,
    return_weights: bool,
}

impl Default for AverageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AverageBuilder {
    pub fn new() -> Self {
        AverageBuilder {
            average: true,
            bin_ave: true,
            get_variance: false,
            log_bins: false,
            interpolation: None,
            generator: None,
            return_weights: false,
        }
    }

    /// When `false`, each bin holds the weighted sum (rather than the
    /// weighted mean) and the reported weights are cell counts
    pub fn average(mut self, average: bool) -> Self {
        self.average = average;
        self
    }

    /// When `true` (the default), the coordinate of each bin is the weighted
    /// mean radius of its cells. Otherwise, it's the midpoint of the edges.
    pub fn bin_ave(mut self, bin_ave: bool) -> Self {
        self.bin_ave = bin_ave;
        self
    }

    pub fn variance(mut self, get_variance: bool) -> Self {
        self.get_variance = get_variance;
        self
    }

    /// use logarithmically spaced bins when the bins are given as a count
    pub fn log_bins(mut self, log_bins: bool) -> Self {
        self.log_bins = log_bins;
        self
    }

    /// average by interpolating onto shells with the named method (rather
    /// than binning cells)
    pub fn interpolation(mut self, method: &str) -> Self {
        self.interpolation = Some(method.to_owned());
        self
    }

    /// override the directions that are sampled on each shell when
    /// interpolating
    pub fn sample_generator(mut self, generator: impl AngularSampleGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn return_weights(mut self, return_weights: bool) -> Self {
        self.return_weights = return_weights;
        self
    }

    pub fn build(self) -> Result<AverageConfig, Error> {
        let interpolation = match self.interpolation {
            Some(ref name) => Some(interpolation_from_name(name)?),
            None => None,
        };
        if interpolation.is_some() && self.get_variance {
            return Err(Error::unsupported(
                "variance",
                "it can't be computed when interpolating",
            ));
        }
        Ok(AverageConfig {
            average: self.average,
            bin_ave: self.bin_ave,
            get_variance: self.get_variance,
            scale: if self.log_bins {
                BinScale::Log
            } else {
                BinScale::Linear
            },
            interpolation,
            generator: self
                .generator
                .unwrap_or_else(|| Box::new(RegularAngularGenerator::default())),
            return_weights: self.return_weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;

    #[test]
    fn unknown_interpolation() {
        let err = AverageBuilder::new()
            .interpolation("cubic")
            .build()
            .err()
            .unwrap();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("linear"));
    }

    #[test]
    fn variance_with_interpolation() {
        let err = AverageBuilder::new()
            .variance(true)
            .interpolation("linear")
            .build()
            .err()
            .unwrap();
        assert_eq!(err.category(), ErrorCategory::UnsupportedOperation);
    }

    #[test]
    fn defaults() {
        let config = AverageBuilder::new().build().unwrap();
        assert!(config.average && config.bin_ave && !config.get_variance);
        assert_eq!(config.bin_scale(), BinScale::Linear);
        assert_eq!(config.interpolation(), None);
    }
}
