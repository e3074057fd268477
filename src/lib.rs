pub mod classify;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod external_table;
pub mod inference;
pub mod io_utils;
pub mod normalize;
pub mod sampler;
pub mod schema;
pub mod storage;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands},
    config::{AppConfig, InferenceSettings},
    external_table::{ExternalTableDefinition, TableOptions},
    inference::SchemaInferer,
    normalize::normalize_column_names,
    sampler::Sampler,
    schema::InferredSchema,
    storage::LocalBlobStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(verbose: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            builder.filter_module("datawagon", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Infer(args) => handle_infer(&args),
        Commands::Header(args) => handle_header(&args),
        Commands::Table(args) => handle_table(&args),
        Commands::Match(args) => handle_match(&args),
    }
}

fn load_settings(args: &cli::InferenceArgs) -> Result<(AppConfig, InferenceSettings)> {
    let config = AppConfig::load_or_default(args.config.as_deref())?;
    let settings = config
        .inference
        .with_overrides(
            args.sample_size,
            args.confidence_threshold,
            args.min_non_null_samples,
        )
        .context("Resolving inference settings")?;
    debug!("Inference settings: {settings:?}");
    Ok((config, settings))
}

fn handle_infer(args: &cli::InferArgs) -> Result<()> {
    let (_, settings) = load_settings(&args.inference)?;
    let storage = &args.storage;
    info!(
        "Inferring schema for '{}' in {:?}",
        storage.folder, storage.root
    );
    let inferer = SchemaInferer::new(LocalBlobStore::new(&storage.root), settings)?;
    let schema = match inferer.try_infer(&storage.folder) {
        Ok(Some(schema)) => schema,
        Ok(None) => {
            warn!("No data to infer a schema from in '{}'", storage.folder);
            return Ok(());
        }
        Err(err) if err.is_no_data() => {
            warn!("No data to infer a schema from: {err}");
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Sampling folder '{}'", storage.folder));
        }
    };
    schema
        .save(args.output.as_deref(), args.format)
        .context("Writing inferred schema")?;
    info!(
        "Inferred schema for {} column(s) from '{}'",
        schema.len(),
        storage.folder
    );
    Ok(())
}

fn handle_header(args: &cli::HeaderArgs) -> Result<()> {
    let storage = &args.storage;
    let sampler = Sampler::new(LocalBlobStore::new(&storage.root));
    let Some(header) = sampler
        .read_header(&storage.folder)
        .with_context(|| format!("Reading header from '{}'", storage.folder))?
    else {
        warn!("No header available in '{}'", storage.folder);
        return Ok(());
    };
    let normalized = normalize_column_names(&header);
    let mut stdout = std::io::stdout().lock();
    for (raw, name) in header.iter().zip(&normalized) {
        writeln!(stdout, "{raw}\t{name}").context("Writing header")?;
    }
    Ok(())
}

fn handle_table(args: &cli::TableArgs) -> Result<()> {
    let (config, settings) = load_settings(&args.inference)?;
    let storage = &args.storage;
    let bucket_name = args
        .bucket_name
        .clone()
        .or(config.bucket_name)
        .ok_or_else(|| anyhow!("A bucket name is required (--bucket-name or bucket_name in config)"))?;
    let table_name = args
        .table
        .clone()
        .unwrap_or_else(|| external_table::table_name_for_folder(&storage.folder));

    let schema = match &args.schema {
        Some(path) => Some(
            InferredSchema::load(path).with_context(|| format!("Loading schema from {path:?}"))?,
        ),
        None => SchemaInferer::new(LocalBlobStore::new(&storage.root), settings)?
            .infer(&storage.folder),
    };

    let mut options = TableOptions::new(bucket_name, storage.folder.clone(), table_name);
    options.use_hive_partitioning = !args.no_hive_partitioning;
    options.use_autodetect_fallback = !args.no_autodetect_fallback;
    let definition = ExternalTableDefinition::build(&options, schema.as_ref())
        .with_context(|| format!("Describing external table {}", options.table_name))?;

    let mut writer = io_utils::open_output(args.output.as_deref())?;
    serde_json::to_writer_pretty(&mut writer, &definition)
        .context("Writing table definition")?;
    writeln!(writer).context("Writing table definition")?;
    writer.flush().context("Flushing table definition")?;
    info!(
        "Described external table {} over {} source URI(s)",
        definition.table_name,
        definition.source_uris.len()
    );
    Ok(())
}

fn handle_match(args: &cli::MatchArgs) -> Result<()> {
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Loading config from {:?}", args.config))?;
    let mut stdout = std::io::stdout().lock();
    for name in &args.names {
        let matched = config.match_file(name);
        if matched.is_none() {
            warn!("No enabled source matches '{name}'");
        }
        let line = serde_json::json!({ "file_name": name, "match": matched });
        writeln!(stdout, "{line}").context("Writing match result")?;
    }
    Ok(())
}
