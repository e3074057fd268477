//! Inferred schema model and persistence.
//!
//! [`TypeTag`] is the closed set of column types the engine can infer. There is no
//! floating-point tag: fractional and scientific values map to
//! [`TypeTag::ExactDecimal`], which the warehouse stores as an arbitrary
//! precision decimal. [`InferredSchema`] is the ordered field list handed to
//! the external table builder.

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::{BufReader, Write},
    path::Path,
    str::FromStr,
};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::io_utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Bool,
    Int64,
    ExactDecimal,
    Date,
    Timestamp,
    String,
}

impl TypeTag {
    pub const ALL: [TypeTag; 6] = [
        TypeTag::Bool,
        TypeTag::Int64,
        TypeTag::ExactDecimal,
        TypeTag::Date,
        TypeTag::Timestamp,
        TypeTag::String,
    ];

    /// Warehouse-native type name used in schema files and table definitions.
    pub fn warehouse_type(&self) -> &'static str {
        match self {
            TypeTag::Bool => "BOOL",
            TypeTag::Int64 => "INT64",
            TypeTag::ExactDecimal => "BIGNUMERIC",
            TypeTag::Date => "DATE",
            TypeTag::Timestamp => "TIMESTAMP",
            TypeTag::String => "STRING",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["BOOL", "INT64", "BIGNUMERIC", "DATE", "TIMESTAMP", "STRING"]
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.warehouse_type())
    }
}

impl FromStr for TypeTag {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "bool" | "boolean" => Ok(TypeTag::Bool),
            "int64" | "integer" | "int" => Ok(TypeTag::Int64),
            "bignumeric" | "numeric" | "decimal" | "exact_decimal" => Ok(TypeTag::ExactDecimal),
            "date" => Ok(TypeTag::Date),
            "timestamp" | "datetime" => Ok(TypeTag::Timestamp),
            "string" => Ok(TypeTag::String),
            _ => Err(anyhow!(
                "Unknown column type '{value}'. Supported types: {}",
                TypeTag::variants().join(", ")
            )),
        }
    }
}

impl Serialize for TypeTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.warehouse_type())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        TypeTag::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: TypeTag,
    #[serde(rename = "mode", with = "field_mode", default = "SchemaField::default_nullable")]
    pub nullable: bool,
}

impl SchemaField {
    /// CSV cells may be empty in any column, so inferred fields are always nullable.
    pub fn nullable(name: impl Into<String>, field_type: TypeTag) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
        }
    }

    fn default_nullable() -> bool {
        true
    }
}

mod field_mode {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(nullable: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *nullable { "NULLABLE" } else { "REQUIRED" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        match token.trim().to_ascii_uppercase().as_str() {
            "NULLABLE" => Ok(true),
            "REQUIRED" => Ok(false),
            other => Err(de::Error::custom(format!(
                "Unsupported field mode '{other}' (expected NULLABLE or REQUIRED)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredSchema {
    pub fields: Vec<SchemaField>,
    /// A single-cell banner row preceded the header in the sampled object.
    pub has_title_row: bool,
}

impl InferredSchema {
    pub fn new(fields: Vec<SchemaField>, has_title_row: bool) -> Self {
        Self {
            fields,
            has_title_row,
        }
    }

    pub fn all_string<S>(names: &[S], has_title_row: bool) -> Self
    where
        S: AsRef<str>,
    {
        let fields = names
            .iter()
            .map(|name| SchemaField::nullable(name.as_ref(), TypeTag::String))
            .collect();
        Self::new(fields, has_title_row)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    /// Number of columns per inferred type; every tag is present.
    pub fn type_distribution(&self) -> BTreeMap<TypeTag, usize> {
        let mut distribution: BTreeMap<TypeTag, usize> =
            TypeTag::ALL.iter().map(|tag| (*tag, 0)).collect();
        for field in &self.fields {
            *distribution.entry(field.field_type).or_insert(0) += 1;
        }
        distribution
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.fields).context("Serializing schema JSON")
    }

    /// Writes the field list to `path`, or stdout for `None`/`-`.
    pub fn save(&self, path: Option<&Path>, format: SchemaFormat) -> Result<()> {
        let mut writer = io_utils::open_output(path)?;
        match format {
            SchemaFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, &self.fields)
                    .context("Writing schema JSON")?;
                writeln!(writer).context("Writing schema JSON")?;
            }
            SchemaFormat::Yaml => {
                serde_yaml::to_writer(&mut writer, &self.fields).context("Writing schema YAML")?;
            }
        }
        writer.flush().context("Flushing schema output")
    }

    /// Reads a JSON field list. Explicit schemas never carry a title row.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let fields: Vec<SchemaField> =
            serde_json::from_reader(reader).context("Parsing schema JSON")?;
        Ok(Self::new(fields, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_parses_aliases() {
        assert_eq!("BIGNUMERIC".parse::<TypeTag>().unwrap(), TypeTag::ExactDecimal);
        assert_eq!("integer".parse::<TypeTag>().unwrap(), TypeTag::Int64);
        assert_eq!(" Boolean ".parse::<TypeTag>().unwrap(), TypeTag::Bool);
        assert!("float64".parse::<TypeTag>().is_err());
    }

    #[test]
    fn fields_serialize_in_warehouse_layout() {
        let schema = InferredSchema::new(
            vec![
                SchemaField::nullable("asset_id", TypeTag::String),
                SchemaField::nullable("revenue", TypeTag::ExactDecimal),
            ],
            false,
        );
        let json = schema.to_json_string().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["name"], "asset_id");
        assert_eq!(parsed[0]["type"], "STRING");
        assert_eq!(parsed[0]["mode"], "NULLABLE");
        assert_eq!(parsed[1]["type"], "BIGNUMERIC");
    }

    #[test]
    fn field_mode_defaults_to_nullable() {
        let field: SchemaField = serde_json::from_str(r#"{"name":"views","type":"INT64"}"#).unwrap();
        assert!(field.nullable);
        assert_eq!(field.field_type, TypeTag::Int64);
    }

    #[test]
    fn distribution_counts_every_tag() {
        let schema = InferredSchema::all_string(&["a", "b"], false);
        let distribution = schema.type_distribution();
        assert_eq!(distribution.len(), TypeTag::ALL.len());
        assert_eq!(distribution[&TypeTag::String], 2);
        assert_eq!(distribution[&TypeTag::Int64], 0);
    }
}
