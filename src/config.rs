//! YAML configuration: inference knobs, bucket label, and file sources.
//!
//! A source pairs fixed routing fields with an optional filename pattern
//! whose capture groups become a typed side map of extra metadata.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow, ensure};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_SIZE: usize = 100;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.95;
pub const DEFAULT_MIN_NON_NULL_SAMPLES: usize = 10;

/// The complete tuning surface of the inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceSettings {
    pub sample_size: usize,
    pub confidence_threshold: f64,
    pub min_non_null_samples: usize,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_non_null_samples: DEFAULT_MIN_NON_NULL_SAMPLES,
        }
    }
}

impl InferenceSettings {
    pub fn ensure_valid(&self) -> Result<()> {
        ensure!(
            self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0,
            "Confidence threshold must be in (0, 1], got {}",
            self.confidence_threshold
        );
        ensure!(
            self.min_non_null_samples >= 1,
            "Minimum non-null samples must be at least 1"
        );
        Ok(())
    }

    /// Applies command-line overrides on top of file or default values.
    pub fn with_overrides(
        mut self,
        sample_size: Option<usize>,
        confidence_threshold: Option<f64>,
        min_non_null_samples: Option<usize>,
    ) -> Result<Self> {
        if let Some(value) = sample_size {
            self.sample_size = value;
        }
        if let Some(value) = confidence_threshold {
            self.confidence_threshold = value;
        }
        if let Some(value) = min_non_null_samples {
            self.min_non_null_samples = value;
        }
        self.ensure_valid()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendOrReplace {
    Append,
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_folder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(
        default,
        with = "optional_regex",
        skip_serializing_if = "Option::is_none"
    )]
    pub regex_pattern: Option<Regex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_group_names: Option<Vec<String>>,
    pub table_append_or_replace: AppendOrReplace,
}

impl SourceConfig {
    pub fn ensure_valid(&self, key: &str) -> Result<()> {
        match (&self.regex_pattern, &self.regex_group_names) {
            (None, None) => Ok(()),
            (Some(pattern), Some(names)) => {
                let groups = pattern.captures_len() - 1;
                ensure!(
                    groups == names.len(),
                    "Source '{key}': regex pattern has {groups} groups but regex_group_names has {} names (pattern: {}, names: {:?})",
                    names.len(),
                    pattern.as_str(),
                    names
                );
                Ok(())
            }
            _ => Err(anyhow!(
                "Source '{key}': regex_pattern and regex_group_names must both be set or both be omitted"
            )),
        }
    }

    pub fn table_name_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.table_name.as_deref().unwrap_or(key)
    }

    pub fn storage_folder_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.storage_folder_name
            .as_deref()
            .unwrap_or_else(|| self.table_name_or(key))
    }

    /// Extra metadata captured from `file_name`.
    ///
    /// Returns `None` when a pattern is configured but does not match, and an
    /// empty map when the source has no pattern. Groups that did not
    /// participate in the match are omitted.
    pub fn extract_metadata(&self, file_name: &str) -> Option<BTreeMap<String, String>> {
        let (Some(pattern), Some(names)) = (&self.regex_pattern, &self.regex_group_names) else {
            return Some(BTreeMap::new());
        };
        let captures = pattern.captures(file_name)?;
        let extras = names
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                captures
                    .get(idx + 1)
                    .map(|group| (name.clone(), group.as_str().to_string()))
            })
            .collect();
        Some(extras)
    }
}

mod optional_regex {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(value: &Option<Regex>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(pattern) => serializer.serialize_str(pattern.as_str()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Regex>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|pattern| {
            Regex::new(&pattern)
                .map_err(|err| de::Error::custom(format!("Invalid regex pattern: {err}")))
        })
        .transpose()
    }
}

/// A file name routed to a configured source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMatch {
    pub source: String,
    pub table_name: String,
    pub storage_folder_name: String,
    pub table_append_or_replace: AppendOrReplace,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub inference: InferenceSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    pub sources: BTreeMap<String, SourceConfig>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: AppConfig = serde_yaml::from_reader(reader)
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.ensure_valid()?;
        debug!(
            "Loaded config {:?} with {} source(s)",
            path,
            config.sources.len()
        );
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn ensure_valid(&self) -> Result<()> {
        self.inference.ensure_valid()?;
        for (key, source) in &self.sources {
            source.ensure_valid(key)?;
        }
        Ok(())
    }

    /// First enabled source, in key order, whose pattern matches `file_name`.
    pub fn match_file(&self, file_name: &str) -> Option<SourceMatch> {
        self.sources
            .iter()
            .filter(|(_, source)| source.is_enabled)
            .find_map(|(key, source)| {
                let metadata = source.extract_metadata(file_name)?;
                Some(SourceMatch {
                    source: key.clone(),
                    table_name: source.table_name_or(key).to_string(),
                    storage_folder_name: source.storage_folder_or(key).to_string(),
                    table_append_or_replace: source.table_append_or_replace,
                    metadata,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
inference:
  confidence_threshold: 0.9
bucket_name: analytics-raw
sources:
  youtube:
    is_enabled: true
    storage_folder_name: youtube_analytics
    regex_pattern: 'YouTube_(.+)_M_(\d{8})'
    regex_group_names: [content_owner, file_date_key]
    table_append_or_replace: append
  legacy:
    is_enabled: false
    table_append_or_replace: replace
"#;

    #[test]
    fn parses_sources_and_partial_inference_settings() {
        let config: AppConfig = serde_yaml::from_str(SAMPLE).unwrap();
        config.ensure_valid().unwrap();
        assert_eq!(config.inference.confidence_threshold, 0.9);
        assert_eq!(config.inference.sample_size, DEFAULT_SAMPLE_SIZE);
        assert_eq!(config.bucket_name.as_deref(), Some("analytics-raw"));
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn extracts_named_groups_into_side_map() {
        let config: AppConfig = serde_yaml::from_str(SAMPLE).unwrap();
        let matched = config
            .match_file("YouTube_Acme_M_20230601_claim_raw_v1-1.csv.gz")
            .unwrap();
        assert_eq!(matched.source, "youtube");
        assert_eq!(matched.table_name, "youtube");
        assert_eq!(matched.storage_folder_name, "youtube_analytics");
        assert_eq!(matched.table_append_or_replace, AppendOrReplace::Append);
        assert_eq!(matched.metadata["content_owner"], "Acme");
        assert_eq!(matched.metadata["file_date_key"], "20230601");
    }

    #[test]
    fn disabled_sources_never_match() {
        let config: AppConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(config.match_file("unrelated.csv").is_none());
    }

    #[test]
    fn group_count_mismatch_is_rejected() {
        let yaml = r#"
sources:
  broken:
    is_enabled: true
    regex_pattern: '(a)(b)'
    regex_group_names: [only_one]
    table_append_or_replace: append
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("2 groups"));
    }

    #[test]
    fn pattern_without_names_is_rejected() {
        let yaml = r#"
sources:
  broken:
    is_enabled: true
    regex_pattern: '(a)'
    table_append_or_replace: append
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.ensure_valid().is_err());
    }

    #[test]
    fn invalid_regex_fails_to_parse() {
        let yaml = r#"
sources:
  broken:
    is_enabled: true
    regex_pattern: '(unclosed'
    regex_group_names: [x]
    table_append_or_replace: append
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml).is_err());
    }

    #[test]
    fn overrides_are_validated() {
        let settings = InferenceSettings::default();
        assert!(settings.with_overrides(None, Some(1.5), None).is_err());
        let tuned = settings.with_overrides(Some(20), None, Some(3)).unwrap();
        assert_eq!(tuned.sample_size, 20);
        assert_eq!(tuned.min_non_null_samples, 3);
        assert_eq!(tuned.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
    }
}
