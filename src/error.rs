// We define separate error types within the public and internal crates. The
// internal crate returns `&'static str` everywhere and the public crate wraps
// those strings (see `Error::internal_legacy_adhoc`). Errors that users are
// likely to handle programmatically get their own kind.

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// Broad classification of an [`Error`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The inputs or the configuration are inconsistent (mismatched shapes,
    /// unknown names, invalid bins, etc.)
    Configuration,
    /// The configuration is valid, but asks for a combination of features
    /// that isn't supported
    UnsupportedOperation,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// An error that occurs when a problematic bin edge is specified
    BinEdge(BinEdgeError),
    /// An error that occurs when an array's shape doesn't match the shape
    /// it must be consistent with
    ShapeMismatch(ShapeMismatchError),
    /// An error that occurs when an operation needs per-axis coordinate
    /// vectors, but only received a precomputed magnitude grid
    CoordinateAxes(CoordinateAxesError),
    /// An error that occurs when an integer lies outside of the acceptable
    /// range of values
    IntegerRange(IntegerRangeError),
    /// An error that occurs within `shellstat_internal`
    InternalLegacyAdHoc(InternalLegacyAdHocError),
    /// An error that occurs when an unknown interpolation method is named
    InterpolationMethod(InterpolationMethodError),
    /// An error that occurs when weights are negative or not finite
    InvalidWeight(InvalidWeightError),
    /// An error that occurs when none of the generated sample points lie
    /// inside of the field's coordinate box
    NoValidSamples(NoValidSamplesError),
    /// An error that occurs when a combination of options isn't supported
    Unsupported(UnsupportedError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that a problematic bin edge is specified
    pub(crate) fn bin_edge(who: &'static str, what: &'static str) -> Self {
        Error {
            kind: ErrorKind::BinEdge(BinEdgeError { who, what }),
        }
    }

    /// produce an error indicating that an array has the wrong shape
    pub(crate) fn shape_mismatch(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Error {
            kind: ErrorKind::ShapeMismatch(ShapeMismatchError {
                what,
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            }),
        }
    }

    /// produce an error indicating that per-axis coordinates are required
    pub(crate) fn coordinate_axes(operation: &'static str) -> Self {
        Error {
            kind: ErrorKind::CoordinateAxes(CoordinateAxesError { operation }),
        }
    }

    /// produce an error indicating that an integer lies outside the acceptable
    /// range of values
    pub(crate) fn integer_range(
        description: &'static str,
        actual: i64,
        min_val: i64,
        max_val: i64,
    ) -> Self {
        Error {
            kind: ErrorKind::IntegerRange(IntegerRangeError {
                description,
                actual,
                min_val,
                max_val,
            }),
        }
    }

    /// wraps a legacy internal error string
    pub(crate) fn internal_legacy_adhoc(message: &'static str) -> Self {
        Error {
            kind: ErrorKind::InternalLegacyAdHoc(InternalLegacyAdHocError(message)),
        }
    }

    /// produce an error indicating that an unknown interpolation method was
    /// specified
    pub(crate) fn interpolation_method(actual: String, choices: Vec<String>) -> Self {
        Error {
            kind: ErrorKind::InterpolationMethod(InterpolationMethodError { actual, choices }),
        }
    }

    /// produce an error indicating that a weight is negative or not finite
    pub(crate) fn invalid_weight(value: f64) -> Self {
        Error {
            kind: ErrorKind::InvalidWeight(InvalidWeightError { value }),
        }
    }

    /// produce an error indicating that no sample points survived
    pub(crate) fn no_valid_samples() -> Self {
        Error {
            kind: ErrorKind::NoValidSamples(NoValidSamplesError),
        }
    }

    /// produce an error indicating an unsupported combination of options
    pub(crate) fn unsupported(operation: &'static str, reason: &'static str) -> Self {
        Error {
            kind: ErrorKind::Unsupported(UnsupportedError { operation, reason }),
        }
    }

    /// Reports whether the error stems from an inconsistent configuration or
    /// from an unsupported combination of options
    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            ErrorKind::Unsupported(_) => ErrorCategory::UnsupportedOperation,
            _ => ErrorCategory::Configuration,
        }
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ErrorKind {}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::BinEdge(ref err) => err.fmt(f),
            ErrorKind::ShapeMismatch(ref err) => err.fmt(f),
            ErrorKind::CoordinateAxes(ref err) => err.fmt(f),
            ErrorKind::IntegerRange(ref err) => err.fmt(f),
            ErrorKind::InternalLegacyAdHoc(ref msg) => msg.fmt(f),
            ErrorKind::InterpolationMethod(ref err) => err.fmt(f),
            ErrorKind::InvalidWeight(ref err) => err.fmt(f),
            ErrorKind::NoValidSamples(ref err) => err.fmt(f),
            ErrorKind::Unsupported(ref err) => err.fmt(f),
        }
    }
}

/// An error that occurs when a problematic bin edge is specified
#[derive(Clone, Debug)]
struct BinEdgeError {
    who: &'static str,
    what: &'static str,
}

impl std::error::Error for BinEdgeError {}

impl core::fmt::Display for BinEdgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let BinEdgeError { who, what } = self;
        write!(f, "problem with {who}: {what}")
    }
}

/// An error that occurs when an array has the wrong shape
#[derive(Clone, Debug)]
struct ShapeMismatchError {
    what: &'static str,
    expected: Vec<usize>,
    actual: Vec<usize>,
}

impl std::error::Error for ShapeMismatchError {}

impl core::fmt::Display for ShapeMismatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} has shape {:?}. It should have shape {:?}",
            self.what, self.actual, self.expected
        )
    }
}

/// An error that occurs when per-axis coordinates are required
#[derive(Clone, Debug)]
struct CoordinateAxesError {
    operation: &'static str,
}

impl std::error::Error for CoordinateAxesError {}

impl core::fmt::Display for CoordinateAxesError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} requires one coordinate vector per axis, not a magnitude grid",
            self.operation
        )
    }
}

/// An error that occurs when an integer lies outside of the acceptable
/// range of values
#[derive(Clone, Debug)]
struct IntegerRangeError {
    description: &'static str,
    actual: i64,
    min_val: i64,
    max_val: i64,
}

impl std::error::Error for IntegerRangeError {}

impl core::fmt::Display for IntegerRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} has a value of {}. The value should be no less than {} and \
             not exceed {}",
            self.description, self.actual, self.min_val, self.max_val
        )
    }
}

/// A temporary type that wraps the string errors from `shellstat_internal`.
#[derive(Clone)]
struct InternalLegacyAdHocError(&'static str);

impl std::error::Error for InternalLegacyAdHocError {}

impl core::fmt::Display for InternalLegacyAdHocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::fmt::Debug for InternalLegacyAdHocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.0, f)
    }
}

/// An error occurs when an unknown interpolation method is specified
#[derive(Clone, Debug)]
struct InterpolationMethodError {
    actual: String,
    choices: Vec<String>,
}

impl std::error::Error for InterpolationMethodError {}

impl core::fmt::Display for InterpolationMethodError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} is not an interpolation method. Choices include: {:?}",
            self.actual, self.choices
        )
    }
}

/// An error that occurs when a weight is negative or not finite
#[derive(Clone, Debug)]
struct InvalidWeightError {
    value: f64,
}

impl std::error::Error for InvalidWeightError {}

impl core::fmt::Display for InvalidWeightError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "encountered a weight of {}. Weights must be finite and non-negative",
            self.value
        )
    }
}

/// An error that occurs when every generated sample point lies outside of the
/// field's coordinate box
#[derive(Clone, Debug)]
struct NoValidSamplesError;

impl std::error::Error for NoValidSamplesError {}

impl core::fmt::Display for NoValidSamplesError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "no valid sample points: the generated sample points are all outside \
             of the coordinate box of the field. Try a different sample \
             generator or different field coordinates"
        )
    }
}

/// An error that occurs when a combination of options isn't supported
#[derive(Clone, Debug)]
struct UnsupportedError {
    operation: &'static str,
    reason: &'static str,
}

impl std::error::Error for UnsupportedError {}

impl core::fmt::Display for UnsupportedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let UnsupportedError { operation, reason } = self;
        write!(f, "{operation} is not supported: {reason}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let err = Error::unsupported("variance", "the field is complex");
        assert_eq!(err.category(), ErrorCategory::UnsupportedOperation);
        assert_eq!(
            err.to_string(),
            "variance is not supported: the field is complex"
        );

        let err = Error::shape_mismatch("weights", &[2, 3], &[3, 2]);
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(
            err.to_string(),
            "weights has shape [3, 2]. It should have shape [2, 3]"
        );
    }

    #[test]
    fn choices_are_listed() {
        let err = Error::interpolation_method("cubic".to_owned(), vec!["linear".to_owned()]);
        assert!(err.to_string().contains("\"linear\""));
        assert!(
            Error::no_valid_samples()
                .to_string()
                .starts_with("no valid sample points")
        );
    }
}
