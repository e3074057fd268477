use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::schema::SchemaFormat;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer warehouse schemas from gzip CSV folders",
    long_about = None
)]
pub struct Cli {
    /// Log at debug level (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer a column schema from the first .csv.gz object in a folder
    Infer(InferArgs),
    /// Print the raw and normalized header of the first .csv.gz object in a folder
    Header(HeaderArgs),
    /// Describe an external table over a folder as JSON
    Table(TableArgs),
    /// Route file names to configured sources and show extracted metadata
    Match(MatchArgs),
}

#[derive(Debug, Args)]
pub struct StorageArgs {
    /// Directory acting as the object store (a mounted or staged bucket)
    #[arg(short, long)]
    pub root: PathBuf,
    /// Folder prefix inside the store
    #[arg(short, long)]
    pub folder: String,
}

#[derive(Debug, Args)]
pub struct InferenceArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Number of data rows to sample (default 100)
    #[arg(long)]
    pub sample_size: Option<usize>,
    /// Share of non-null values a type must match, in (0, 1] (default 0.95)
    #[arg(long, value_parser = parse_threshold)]
    pub confidence_threshold: Option<f64>,
    /// Non-null values required before a column is typed (default 10)
    #[arg(long = "min-non-null")]
    pub min_non_null_samples: Option<usize>,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    #[command(flatten)]
    pub storage: StorageArgs,
    #[command(flatten)]
    pub inference: InferenceArgs,
    /// Schema output file (stdout if omitted or '-')
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Schema output format
    #[arg(long, value_enum, default_value_t = SchemaFormat::Json)]
    pub format: SchemaFormat,
}

#[derive(Debug, Args)]
pub struct HeaderArgs {
    #[command(flatten)]
    pub storage: StorageArgs,
}

#[derive(Debug, Args)]
pub struct TableArgs {
    #[command(flatten)]
    pub storage: StorageArgs,
    #[command(flatten)]
    pub inference: InferenceArgs,
    /// Table name (derived from the folder when omitted)
    #[arg(short, long)]
    pub table: Option<String>,
    /// Bucket name used in gs:// URIs (falls back to the config file)
    #[arg(long)]
    pub bucket_name: Option<String>,
    /// Explicit JSON schema file; skips inference
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Reference *.csv.gz objects directly instead of Hive partitions
    #[arg(long)]
    pub no_hive_partitioning: bool,
    /// Fail instead of falling back to autodetect when no schema is available
    #[arg(long)]
    pub no_autodetect_fallback: bool,
    /// Definition output file (stdout if omitted or '-')
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    /// YAML configuration file declaring sources
    #[arg(short, long)]
    pub config: PathBuf,
    /// File names to route
    #[arg(required = true)]
    pub names: Vec<String>,
}

pub fn parse_threshold(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if parsed > 0.0 && parsed <= 1.0 {
        Ok(parsed)
    } else {
        Err("Confidence threshold must be greater than 0 and at most 1".to_string())
    }
}
