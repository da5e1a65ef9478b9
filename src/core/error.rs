use crate::core::types::FormId;

/// Persistence backend failures. Boolean-contract callers log these and report `false`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on option '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Codec error on option '{key}': {message}")]
    Codec { key: String, message: String },

    #[error("Invalid option key: {0}")]
    InvalidKey(String),
}

/// Field catalog adapter failures. Never surfaced on the render path.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Form {0} not found")]
    FormNotFound(FormId),

    #[error("Catalog backend error: {0}")]
    Backend(String),
}

/// User-correctable problems with a submitted mapping. `Display` is the admin message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("You must select a field to populate.")]
    MissingTargetField,

    #[error("You must select a source Gravity Form.")]
    MissingSourceForm,

    #[error("You must select a source field.")]
    MissingSourceField,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
