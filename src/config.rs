//! Runtime configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::store;
use crate::core::types::{FieldType, FormId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cap on source entries fetched per mapped field (before the entry-limit hook)
    #[serde(default = "default_entry_limit")]
    pub entry_limit: usize,

    /// Prepended to `related_fields_<form_id>` option keys
    #[serde(default)]
    pub option_key_prefix: String,

    /// Field types accepted as mapping targets on top of select/multiselect/radio/checkbox
    #[serde(default)]
    pub extra_populateable_types: Vec<String>,
}

fn default_entry_limit() -> usize { 200 }

impl Default for Config {
    fn default() -> Self {
        Self {
            entry_limit: default_entry_limit(),
            option_key_prefix: String::new(),
            extra_populateable_types: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Persisted option key holding one form's mapping collection.
    pub fn option_key(&self, form_id: FormId) -> String {
        store::option_key(&self.option_key_prefix, form_id)
    }

    /// Populateable verdict before hooks run.
    pub fn default_populateable(&self, field_type: &FieldType) -> bool {
        field_type.is_choice_type()
            || self
                .extra_populateable_types
                .iter()
                .any(|t| t == field_type.as_str())
    }
}
