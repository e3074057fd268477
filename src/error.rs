//! Error types for sampling stored CSV objects.

use thiserror::Error;

/// Failures while reading a sample from the storage collaborator.
///
/// A folder without any matching object is not an error; the sampler reports
/// it as an absent result instead.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Listing or opening objects failed.
    #[error("storage operation failed for {target}: {source}")]
    Storage {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The object decompressed to no rows, or to a banner row alone.
    #[error("object {object} contains no CSV rows")]
    EmptyObject { object: String },

    /// The object is not a valid gzip stream.
    #[error("failed to decompress {object}: {source}")]
    MalformedStream {
        object: String,
        #[source]
        source: std::io::Error,
    },

    /// The decompressed bytes are not parseable UTF-8 CSV.
    #[error("failed to parse CSV in {object}: {source}")]
    Csv {
        object: String,
        #[source]
        source: csv::Error,
    },
}

impl SampleError {
    /// Whether the failure means "nothing to infer from" rather than corruption.
    pub fn is_no_data(&self) -> bool {
        matches!(self, SampleError::EmptyObject { .. })
    }

    /// Object or folder the failure relates to.
    pub fn target(&self) -> &str {
        match self {
            SampleError::Storage { target, .. } => target,
            SampleError::EmptyObject { object }
            | SampleError::MalformedStream { object, .. }
            | SampleError::Csv { object, .. } => object,
        }
    }

    /// Splits CSV reader failures into decompression and parse errors.
    ///
    /// The gzip decoder sits beneath the CSV reader, so its failures surface
    /// as CSV I/O errors.
    pub(crate) fn from_csv(object: &str, err: csv::Error) -> Self {
        let object = object.to_string();
        if err.is_io_error() {
            SampleError::MalformedStream {
                object,
                source: std::io::Error::from(err),
            }
        } else {
            SampleError::Csv {
                object,
                source: err,
            }
        }
    }
}

/// Result type for sampling operations.
pub type SampleResult<T> = Result<T, SampleError>;
