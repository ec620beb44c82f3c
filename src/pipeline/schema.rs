//! Reference schema used as the validation baseline

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One entry of the `columns` list.
///
/// Either a bare name (`- having_IP_Address`) or a single-key mapping of
/// name to declared dtype (`- having_IP_Address: int64`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnEntry {
    Name(String),
    Typed(BTreeMap<String, String>),
}

impl ColumnEntry {
    /// Column name (the first key for the mapping form)
    pub fn name(&self) -> Option<&str> {
        match self {
            ColumnEntry::Name(name) => Some(name),
            ColumnEntry::Typed(map) => map.keys().next().map(|k| k.as_str()),
        }
    }
}

/// Expected dataset layout. Only the column count is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub columns: Vec<ColumnEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numerical_columns: Vec<String>,
}

impl SchemaDescriptor {
    /// Build a schema from bare column names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: names
                .into_iter()
                .map(|n| ColumnEntry::Name(n.into()))
                .collect(),
            numerical_columns: Vec::new(),
        }
    }

    /// Load a schema descriptor from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        let schema: SchemaDescriptor = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse schema file: {}", path.display()))?;
        Ok(schema)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().filter_map(|c| c.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_and_typed_entries() {
        let yaml = "columns:\n  - having_IP_Address: int64\n  - URL_Length\n  - Result: int64\nnumerical_columns:\n  - URL_Length\n";
        let schema: SchemaDescriptor = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(schema.column_count(), 3);
        assert_eq!(
            schema.column_names(),
            vec!["having_IP_Address", "URL_Length", "Result"]
        );
        assert_eq!(schema.numerical_columns, vec!["URL_Length"]);
    }

    #[test]
    fn test_missing_columns_key_is_an_error() {
        let result: std::result::Result<SchemaDescriptor, _> =
            serde_yaml::from_str("numerical_columns: []\n");
        assert!(result.is_err());
    }
}
