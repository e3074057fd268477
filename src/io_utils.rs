//! I/O utilities for gzip CSV reading and output sinks.
//!
//! Stored objects are always gzip-compressed, comma-separated UTF-8 with
//! optional double-quote quoting. Rows may be ragged, so readers are built
//! flexible and without header handling; the sampler decides which row is
//! the header. The `-` path convention routes output to stdout.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

pub const CSV_DELIMITER: u8 = b',';
pub const GZIP_CSV_SUFFIX: &str = ".csv.gz";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn is_gzip_csv(name: &str) -> bool {
    name.ends_with(GZIP_CSV_SUFFIX)
}

pub fn open_csv_reader<R>(reader: R) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(CSV_DELIMITER)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Wraps a compressed byte stream in a streaming gzip decoder and CSV reader.
///
/// Concatenated gzip members are decoded as one continuous stream.
pub fn open_gzip_csv_reader<R>(reader: R) -> csv::Reader<MultiGzDecoder<R>>
where
    R: Read,
{
    open_csv_reader(MultiGzDecoder::new(reader))
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compression, write::GzEncoder};

    #[test]
    fn gzip_reader_yields_ragged_rows() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"a,b,c\n1,\"x,y\"\n").unwrap();
        let bytes = encoder.finish().unwrap();

        let mut reader = open_gzip_csv_reader(bytes.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 2);
        assert_eq!(&rows[1][1], "x,y");
    }

    #[test]
    fn recognises_gzip_csv_names() {
        assert!(is_gzip_csv("folder/file.csv.gz"));
        assert!(!is_gzip_csv("folder/file.csv"));
        assert!(!is_gzip_csv("folder/file.csv.gz.tmp"));
    }
}
