//! External table definitions over gzip CSV folders.
//!
//! Builds the definition a warehouse client needs to create an external
//! table: source URIs, CSV options, optional Hive partitioning, and either an
//! explicit schema or provider autodetection. Nothing here talks to the
//! warehouse; the definition is serialized for whoever issues the DDL.

use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::schema::{InferredSchema, SchemaField};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("no schema available for {folder} and autodetect fallback is disabled")]
    NoSchema { folder: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    pub bucket_name: String,
    pub storage_folder_name: String,
    pub table_name: String,
    pub use_hive_partitioning: bool,
    pub use_autodetect_fallback: bool,
}

impl TableOptions {
    pub fn new(
        bucket_name: impl Into<String>,
        storage_folder_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            storage_folder_name: storage_folder_name.into(),
            table_name: table_name.into(),
            use_hive_partitioning: true,
            use_autodetect_fallback: true,
        }
    }

    fn folder_uri(&self) -> String {
        format!(
            "gs://{}/{}",
            self.bucket_name,
            self.storage_folder_name.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HivePartitioning {
    pub mode: &'static str,
    pub source_uri_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvOptions {
    pub skip_leading_rows: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalTableDefinition {
    pub table_name: String,
    pub source_format: &'static str,
    pub compression: &'static str,
    pub source_uris: Vec<String>,
    pub autodetect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<SchemaField>>,
    pub csv_options: CsvOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hive_partitioning: Option<HivePartitioning>,
}

impl ExternalTableDefinition {
    pub fn build(
        options: &TableOptions,
        schema: Option<&InferredSchema>,
    ) -> Result<Self, DefinitionError> {
        let folder_uri = options.folder_uri();
        let source_uris = if options.use_hive_partitioning {
            vec![format!("{folder_uri}/*")]
        } else {
            vec![format!("{folder_uri}/*.csv.gz")]
        };

        let (fields, autodetect, has_title_row) = match schema {
            Some(schema) if !schema.is_empty() => {
                info!("Using explicit schema with {} columns", schema.len());
                (Some(schema.fields.clone()), false, schema.has_title_row)
            }
            _ if options.use_autodetect_fallback => {
                warn!(
                    "Schema inference failed for {}, falling back to autodetect (column names may not be lowercase)",
                    options.storage_folder_name
                );
                (None, true, false)
            }
            _ => {
                return Err(DefinitionError::NoSchema {
                    folder: options.storage_folder_name.clone(),
                });
            }
        };

        let skip_leading_rows = if has_title_row { 2 } else { 1 };
        info!("CSV skip_leading_rows set to {skip_leading_rows} (has_title_row={has_title_row})");

        let hive_partitioning = options.use_hive_partitioning.then(|| HivePartitioning {
            mode: "AUTO",
            source_uri_prefix: folder_uri.clone(),
        });

        Ok(Self {
            table_name: options.table_name.clone(),
            source_format: "CSV",
            compression: "GZIP",
            source_uris,
            autodetect,
            schema: fields,
            csv_options: CsvOptions { skip_leading_rows },
            hive_partitioning,
        })
    }
}

fn partition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/(\w+)=\*").unwrap_or_else(|err| panic!("invalid partition pattern: {err}"))
    })
}

/// Partition keys named by `/key=*` segments of a source URI.
pub fn partition_columns_from_uri(source_uri: &str) -> Vec<String> {
    partition_pattern()
        .captures_iter(source_uri)
        .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Warehouse table name derived from a storage folder (`claim_raw_v1-1` -> `claim_raw_v1_1`).
pub fn table_name_for_folder(folder: &str) -> String {
    let leaf = folder
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(folder);
    leaf.replace(['-', '.', ' '], "_").to_lowercase()
}
