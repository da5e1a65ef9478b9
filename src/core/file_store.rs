// file-backed option store: one file per option key
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::core::error::StoreError;
use crate::core::store::OptionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// `<key>.toon`
    Toon,
    /// `<key>.json`
    Json,
}

impl Codec {
    fn extension(self) -> &'static str {
        match self {
            Codec::Toon => "toon",
            Codec::Json => "json",
        }
    }

    fn encode(self, key: &str, value: &Value) -> Result<String, StoreError> {
        let encoded = match self {
            Codec::Toon => toon_format::encode_default(value).map_err(|e| e.to_string()),
            Codec::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|message| StoreError::Codec { key: key.to_string(), message })
    }

    fn decode(self, key: &str, content: &str) -> Result<Value, StoreError> {
        let decoded = match self {
            Codec::Toon => toon_format::decode_default::<Value>(content).map_err(|e| e.to_string()),
            Codec::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        decoded.map_err(|message| StoreError::Codec { key: key.to_string(), message })
    }
}

/// Options persisted as files under `dir`.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// concurrent reader sees either the old collection or the new one.
#[derive(Debug, Clone)]
pub struct FileOptionStore {
    dir: PathBuf,
    codec: Codec,
}

impl FileOptionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_codec(dir, Codec::Toon)
    }

    pub fn with_codec(dir: impl Into<PathBuf>, codec: Codec) -> Self {
        Self { dir: dir.into(), codec }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let bad = key.is_empty()
            || key.starts_with('.')
            || !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if bad {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{}", self.codec.extension())))
    }
}

impl OptionStore for FileOptionStore {
    fn get_option(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key)?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { key: key.to_string(), source }),
        };
        self.codec.decode(key, &content).map(Some)
    }

    fn update_option(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let encoded = self.codec.encode(key, &value)?;
        let io = |source| StoreError::Io { key: key.to_string(), source };

        fs::create_dir_all(&self.dir).map_err(io)?;

        let tmp = self.dir.join(format!(".{key}.{}.tmp", self.codec.extension()));
        {
            let mut file = fs::File::create(&tmp).map_err(io)?;
            file.write_all(encoded.as_bytes()).map_err(io)?;
            file.sync_all().map_err(io)?;
        }
        fs::rename(&tmp, &path).map_err(io)?;

        debug!(key, path = %path.display(), "wrote option");
        Ok(())
    }
}
