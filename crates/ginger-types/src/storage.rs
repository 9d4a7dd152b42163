//! Blob objects synchronized from the local storage directory

/// One file to upload. Rebuilt on every run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    /// Slash-separated path relative to the storage directory
    pub key: String,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub size: u64,
}

impl StorageObject {
    pub fn new(key: impl Into<String>, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        let size = data.len() as u64;
        Self {
            key: key.into(),
            data,
            mime_type: mime_type.into(),
            size,
        }
    }
}
