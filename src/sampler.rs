//! Bounded sampling of the first gzip CSV object in a storage folder.
//!
//! The object is decompressed as a stream and only the rows needed for the
//! header and the sample are read; the stream is dropped before returning on
//! every path. Some exports carry a single-cell banner row above the real
//! header, which is skipped.

use log::{debug, error, info, warn};

use crate::{
    error::{SampleError, SampleResult},
    io_utils,
    storage::BlobStore,
};

/// Header and bounded row sample read from one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSet {
    pub object: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub title_row_skipped: bool,
}

impl SampleSet {
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Cells of column `index`; `None` where a row is too short to reach it.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str))
    }
}

pub struct Sampler<S> {
    store: S,
}

impl<S: BlobStore> Sampler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// First gzip CSV object under `folder`, in listing order.
    pub fn first_object(&self, folder: &str) -> SampleResult<Option<String>> {
        let names = self
            .store
            .list(folder)
            .map_err(|source| SampleError::Storage {
                target: folder.to_string(),
                source,
            })?;
        Ok(names.into_iter().find(|name| io_utils::is_gzip_csv(name)))
    }

    /// Reads the header and up to `limit` data rows.
    ///
    /// `Ok(None)` means the folder holds no gzip CSV object.
    pub fn sample(&self, folder: &str, limit: usize) -> SampleResult<Option<SampleSet>> {
        let Some(object) = self.first_object(folder)? else {
            warn!("No {} files found in {folder}", io_utils::GZIP_CSV_SUFFIX);
            return Ok(None);
        };
        info!("Reading header and {limit} rows from: {object}");
        let sample = self.read_object(&object, limit).inspect_err(|err| match err {
            SampleError::MalformedStream { .. } => {
                error!("Failed to decompress {object} - not a valid gzip file: {err}")
            }
            SampleError::EmptyObject { .. } => error!("Empty CSV file: {object}"),
            other => error!("Error reading CSV header and sample: {other}"),
        })?;
        info!(
            "Sampled {} rows with {} columns",
            sample.rows.len(),
            sample.column_count()
        );
        Ok(Some(sample))
    }

    /// Header row only; `Ok(None)` when the folder holds no object.
    pub fn read_header(&self, folder: &str) -> SampleResult<Option<Vec<String>>> {
        Ok(self.sample(folder, 0)?.map(|sample| sample.header))
    }

    fn read_object(&self, object: &str, limit: usize) -> SampleResult<SampleSet> {
        let stream = self
            .store
            .open(object)
            .map_err(|source| SampleError::Storage {
                target: object.to_string(),
                source,
            })?;
        let mut reader = io_utils::open_gzip_csv_reader(stream);
        let mut records = reader.records();
        let mut next_row = || -> SampleResult<Option<Vec<String>>> {
            records
                .next()
                .transpose()
                .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
                .map_err(|err| SampleError::from_csv(object, err))
        };

        let empty = || SampleError::EmptyObject {
            object: object.to_string(),
        };
        let mut header = next_row()?.ok_or_else(empty)?;
        let mut title_row_skipped = false;
        if header.len() == 1 {
            debug!("Skipping single-cell banner row {:?} in {object}", header[0]);
            header = next_row()?.ok_or_else(empty)?;
            title_row_skipped = true;
        }

        let mut rows = Vec::with_capacity(limit.min(1024));
        while rows.len() < limit {
            match next_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }

        Ok(SampleSet {
            object: object.to_string(),
            header,
            rows,
            title_row_skipped,
        })
    }
}
