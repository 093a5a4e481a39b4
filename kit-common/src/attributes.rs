//! Durable key-value storage for integration attributes.
//!
//! The host keeps a small map of attributes per kit that survives process restarts.
//! Kits read from it when building outbound requests and write back whatever the
//! vendor hands them.
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;
use tracing::warn;

/// Cached vendor cloud id.
pub const MARKETING_CLOUD_ID_KEY: &str = "mid";
/// Cached audience manager region hint.
pub const AUDIENCE_MANAGER_LOCATION_HINT: &str = "aamlh";
/// Cached audience manager blob.
pub const AUDIENCE_MANAGER_BLOB: &str = "aamb";

#[derive(Error, Debug)]
pub enum AttributeStoreError {
    #[error("attribute store lock was poisoned")]
    Poisoned,
    #[error("failed to read or write attribute file: {0}")]
    IoError(#[from] io::Error),
    #[error("attribute file is not a valid string map: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub trait AttributeStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AttributeStoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AttributeStoreError>;

    /// Returns the value for `key` only when it is present and non-empty.
    fn get_non_empty(&self, key: &str) -> Result<Option<String>, AttributeStoreError> {
        Ok(self.get(key)?.filter(|value| !value.is_empty()))
    }
}

/// Process-local store, mostly useful for tests and short-lived hosts.
#[derive(Debug, Default)]
pub struct InMemoryAttributeStore {
    attributes: RwLock<HashMap<String, String>>,
}

impl InMemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attributes<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            attributes: RwLock::new(
                attributes
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl AttributeStore for InMemoryAttributeStore {
    fn get(&self, key: &str) -> Result<Option<String>, AttributeStoreError> {
        let attributes = self
            .attributes
            .read()
            .map_err(|_| AttributeStoreError::Poisoned)?;

        Ok(attributes.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AttributeStoreError> {
        let mut attributes = self
            .attributes
            .write()
            .map_err(|_| AttributeStoreError::Poisoned)?;

        attributes.insert(key.to_owned(), value.to_owned());

        Ok(())
    }
}

/// Store backed by a JSON object on disk. Every write rewrites the whole file.
#[derive(Debug)]
pub struct JsonFileAttributeStore {
    path: PathBuf,
    attributes: RwLock<HashMap<String, String>>,
}

impl JsonFileAttributeStore {
    /// Open the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AttributeStoreError> {
        let path = path.as_ref().to_path_buf();

        let attributes = match fs::read(&path) {
            Ok(contents) if contents.is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_slice(&contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            attributes: RwLock::new(attributes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AttributeStore for JsonFileAttributeStore {
    fn get(&self, key: &str) -> Result<Option<String>, AttributeStoreError> {
        let attributes = self
            .attributes
            .read()
            .map_err(|_| AttributeStoreError::Poisoned)?;

        Ok(attributes.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AttributeStoreError> {
        let mut attributes = self
            .attributes
            .write()
            .map_err(|_| AttributeStoreError::Poisoned)?;

        let previous = attributes.insert(key.to_owned(), value.to_owned());

        let serialized = serde_json::to_vec(&*attributes)?;
        if let Err(e) = fs::write(&self.path, serialized) {
            warn!("failed to persist attribute {}: {}", key, e);
            // Keep memory and disk in agreement.
            match previous {
                Some(previous) => attributes.insert(key.to_owned(), previous),
                None => attributes.remove(key),
            };
            return Err(e.into());
        }

        Ok(())
    }
}
