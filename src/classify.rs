//! Column type classification from sampled values.
//!
//! Every non-null value is credited to the first detector that matches, in
//! the order INT64, BOOL, EXACT_DECIMAL, then TIMESTAMP/DATE. A column takes
//! the first type, in the order INT64, BOOL, EXACT_DECIMAL, TIMESTAMP, DATE,
//! whose share of the non-null values reaches the confidence threshold, and
//! falls back to STRING otherwise. Columns whose name mentions revenue are
//! promoted to EXACT_DECIMAL whenever integers and decimals together clear
//! the threshold, so monetary columns never collapse to INT64.

use anyhow::Result;
use log::{info, warn};

use crate::{
    config::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MIN_NON_NULL_SAMPLES, InferenceSettings},
    detect::{detect_date_or_timestamp, is_bool, is_exact_decimal, is_int64},
    schema::TypeTag,
};

const NULL_TOKENS: &[&str] = &["", "null", "none"];
const REVENUE_MARKER: &str = "revenue";
const PRIORITY: [TypeTag; 5] = [
    TypeTag::Int64,
    TypeTag::Bool,
    TypeTag::ExactDecimal,
    TypeTag::Timestamp,
    TypeTag::Date,
];

/// Returns the trimmed value, or `None` for blanks and null markers.
pub fn non_null_value(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if NULL_TOKENS.contains(&lowered.as_str()) {
        None
    } else {
        Some(trimmed)
    }
}

/// Per-type match counters for one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCounts {
    non_null: usize,
    int64: usize,
    bool: usize,
    exact_decimal: usize,
    timestamp: usize,
    date: usize,
}

impl TypeCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits an already-filtered, non-null value to its first matching type.
    pub fn update(&mut self, value: &str) {
        self.non_null += 1;
        if is_int64(value) {
            self.int64 += 1;
        } else if is_bool(value) {
            self.bool += 1;
        } else if is_exact_decimal(value) {
            self.exact_decimal += 1;
        } else {
            match detect_date_or_timestamp(value) {
                Some(TypeTag::Timestamp) => self.timestamp += 1,
                Some(TypeTag::Date) => self.date += 1,
                _ => {}
            }
        }
    }

    pub fn non_null(&self) -> usize {
        self.non_null
    }

    /// Matches credited to `tag`; STRING is credited with every non-null value.
    pub fn count(&self, tag: TypeTag) -> usize {
        match tag {
            TypeTag::Int64 => self.int64,
            TypeTag::Bool => self.bool,
            TypeTag::ExactDecimal => self.exact_decimal,
            TypeTag::Timestamp => self.timestamp,
            TypeTag::Date => self.date,
            TypeTag::String => self.non_null,
        }
    }

    pub fn confidence(&self, tag: TypeTag) -> f64 {
        ratio(self.count(tag), self.non_null)
    }

    /// Share of values that are integers or decimals.
    pub fn numeric_confidence(&self) -> f64 {
        ratio(self.int64 + self.exact_decimal, self.non_null)
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnClassifier {
    confidence_threshold: f64,
    min_non_null_samples: usize,
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_non_null_samples: DEFAULT_MIN_NON_NULL_SAMPLES,
        }
    }
}

impl ColumnClassifier {
    pub fn new(confidence_threshold: f64, min_non_null_samples: usize) -> Result<Self> {
        Self::from_settings(&InferenceSettings {
            confidence_threshold,
            min_non_null_samples,
            ..InferenceSettings::default()
        })
    }

    /// Rejects a threshold outside (0, 1] or a zero evidence minimum.
    pub fn from_settings(settings: &InferenceSettings) -> Result<Self> {
        settings.ensure_valid()?;
        Ok(Self {
            confidence_threshold: settings.confidence_threshold,
            min_non_null_samples: settings.min_non_null_samples,
        })
    }

    /// Tallies the non-null values of a column. Absent cells are skipped.
    pub fn count<'a, I>(values: I) -> TypeCounts
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut counts = TypeCounts::new();
        for value in values.into_iter().flatten().filter_map(non_null_value) {
            counts.update(value);
        }
        counts
    }

    pub fn classify<'a, I>(&self, column_name: &str, values: I) -> TypeTag
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let counts = Self::count(values);
        self.decide(column_name, &counts)
    }

    pub fn decide(&self, column_name: &str, counts: &TypeCounts) -> TypeTag {
        let total = counts.non_null();
        if total < self.min_non_null_samples {
            warn!(
                "Column '{column_name}': Only {total} non-null samples, using STRING (need {})",
                self.min_non_null_samples
            );
            return TypeTag::String;
        }

        if column_name.to_lowercase().contains(REVENUE_MARKER) {
            let confidence = counts.numeric_confidence();
            if confidence >= self.confidence_threshold {
                info!(
                    "Column '{column_name}': Inferred {} (revenue column) ({}+{}/{total} = {:.1}%)",
                    TypeTag::ExactDecimal,
                    counts.count(TypeTag::Int64),
                    counts.count(TypeTag::ExactDecimal),
                    confidence * 100.0
                );
                return TypeTag::ExactDecimal;
            }
        }

        for tag in PRIORITY {
            let confidence = counts.confidence(tag);
            if confidence >= self.confidence_threshold {
                info!(
                    "Column '{column_name}': Inferred {tag} ({}/{total} = {:.1}%)",
                    counts.count(tag),
                    confidence * 100.0
                );
                return tag;
            }
        }

        info!(
            "Column '{column_name}': No type meets {:.0}% threshold, using STRING",
            self.confidence_threshold * 100.0
        );
        TypeTag::String
    }
}
