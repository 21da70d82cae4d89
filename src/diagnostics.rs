//! Degenerate results that aren't errors.
//!
//! An empty bin or a shell where every interpolated sample is missing still
//! produces a well-defined (NaN) output. We record each occurrence as a
//! [`Diagnostic`] alongside the result and also emit it as a `tracing`
//! warning.

/// A non-fatal problem encountered while averaging
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// The bin received no weight, so its value is NaN. `column` identifies
    /// the trailing-axes column (in row-major order) when only the leading
    /// axes are averaged.
    EmptyBin { bin: usize, column: Option<usize> },
    /// Every interpolated sample was NaN
    AllSamplesMissing { column: Option<usize> },
}

impl core::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Diagnostic::EmptyBin { bin, column: None } => {
                write!(f, "bin {bin} has no weight; its value is NaN")
            }
            Diagnostic::EmptyBin {
                bin,
                column: Some(column),
            } => write!(
                f,
                "bin {bin} of column {column} has no weight; its value is NaN"
            ),
            Diagnostic::AllSamplesMissing { column: None } => {
                write!(f, "the interpolator returned all NaNs")
            }
            Diagnostic::AllSamplesMissing {
                column: Some(column),
            } => write!(f, "the interpolator returned all NaNs for column {column}"),
        }
    }
}

/// log `diagnostic` and record it in `sink`
pub(crate) fn report(sink: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    tracing::warn!(%diagnostic, "degenerate result");
    sink.push(diagnostic);
}
