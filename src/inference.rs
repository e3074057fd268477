//! Schema inference engine: sample, normalize, classify, assemble.
//!
//! Every call re-samples the folder; nothing is cached between runs. Columns
//! are classified independently of each other.

use std::time::Instant;

use anyhow::Result;
use log::{error, info, warn};

use crate::{
    classify::ColumnClassifier,
    config::InferenceSettings,
    error::SampleResult,
    normalize::normalize_column_names,
    sampler::{SampleSet, Sampler},
    schema::{InferredSchema, SchemaField},
    storage::BlobStore,
};

pub struct SchemaInferer<S> {
    sampler: Sampler<S>,
    sample_size: usize,
    classifier: ColumnClassifier,
}

impl<S: BlobStore> SchemaInferer<S> {
    /// Fails when `settings` are out of range.
    pub fn new(store: S, settings: InferenceSettings) -> Result<Self> {
        let classifier = ColumnClassifier::from_settings(&settings)?;
        Ok(Self {
            sampler: Sampler::new(store),
            sample_size: settings.sample_size,
            classifier,
        })
    }

    /// Engine with the default sample size, threshold, and evidence minimum.
    pub fn with_defaults(store: S) -> Self {
        Self {
            sampler: Sampler::new(store),
            sample_size: InferenceSettings::default().sample_size,
            classifier: ColumnClassifier::default(),
        }
    }

    /// Infers a schema for `folder`, or `None` when there is nothing usable.
    ///
    /// Sampling failures are logged and reported as `None` so that table
    /// creation can fall back to provider autodetection.
    pub fn infer(&self, folder: &str) -> Option<InferredSchema> {
        match self.try_infer(folder) {
            Ok(schema) => schema,
            Err(err) if err.is_no_data() => {
                warn!("Cannot infer schema: {err}");
                None
            }
            Err(err) => {
                error!("Cannot infer schema, object may be corrupt: {err}");
                None
            }
        }
    }

    /// Like [`infer`](Self::infer) but surfaces why no schema was produced.
    pub fn try_infer(&self, folder: &str) -> SampleResult<Option<InferredSchema>> {
        let start = Instant::now();
        let Some(sample) = self.sampler.sample(folder, self.sample_size)? else {
            error!(
                "Cannot infer schema after {:.2}s: no data found in {folder}",
                start.elapsed().as_secs_f64()
            );
            return Ok(None);
        };
        let schema = self.infer_from_sample(&sample);
        if schema.is_empty() {
            error!(
                "Cannot infer schema after {:.2}s: no columns in {}",
                start.elapsed().as_secs_f64(),
                sample.object
            );
            return Ok(None);
        }
        log_summary(&schema, sample.rows.len(), start);
        Ok(Some(schema))
    }

    /// Deterministic inference over an already collected sample.
    pub fn infer_from_sample(&self, sample: &SampleSet) -> InferredSchema {
        let names = normalize_column_names(&sample.header);
        if sample.rows.is_empty() {
            warn!(
                "No sample rows available, creating all-STRING schema for {} columns",
                names.len()
            );
            return InferredSchema::all_string(&names, sample.title_row_skipped);
        }

        let fields = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let field_type = self.classifier.classify(&name, sample.column_values(idx));
                SchemaField::nullable(name, field_type)
            })
            .collect();
        InferredSchema::new(fields, sample.title_row_skipped)
    }
}

fn log_summary(schema: &InferredSchema, sampled_rows: usize, start: Instant) {
    let distribution = schema
        .type_distribution()
        .into_iter()
        .map(|(tag, count)| format!("{tag}={count}"))
        .collect::<Vec<_>>()
        .join(", ");
    info!(
        "Schema inference completed in {:.2}s: {} columns from {sampled_rows} samples - {distribution}",
        start.elapsed().as_secs_f64(),
        schema.len()
    );
}

/// Convenience wrapper for one-off inference with default settings.
pub fn infer_schema<S: BlobStore>(store: S, folder: &str) -> Option<InferredSchema> {
    SchemaInferer::with_defaults(store).infer(folder)
}
