use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use crate::entry::Stats;
use crate::error::FsError;

/// Text encodings a file read can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Base64,
}

impl std::str::FromStr for TextEncoding {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            "base64" => Ok(TextEncoding::Base64),
            other => Err(FsError::InvalidArgument(format!("Unknown encoding: {}", other))),
        }
    }
}

/// Result of a file read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileContents {
    /// Encode raw bytes as requested; `None` keeps them as bytes.
    pub fn encode(bytes: Vec<u8>, encoding: Option<TextEncoding>) -> Self {
        match encoding {
            None => FileContents::Bytes(bytes),
            Some(TextEncoding::Utf8) => match String::from_utf8(bytes) {
                Ok(text) => FileContents::Text(text),
                Err(err) => FileContents::Text(String::from_utf8_lossy(err.as_bytes()).into_owned()),
            },
            Some(TextEncoding::Latin1) => {
                FileContents::Text(bytes.iter().map(|&b| b as char).collect())
            }
            Some(TextEncoding::Base64) => FileContents::Text(BASE64.encode(bytes)),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileContents::Bytes(bytes) => bytes,
            FileContents::Text(text) => text.into_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FileContents::Bytes(bytes) => bytes.len(),
            FileContents::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a mounted filesystem supports.
#[derive(Debug, Clone, Serialize)]
pub struct FsCapabilities {
    pub name: &'static str,
    pub read_only: bool,
    pub supports_links: bool,
    pub supports_sync: bool,
    pub supports_properties: bool,
}

/// The operation contract every mountable filesystem satisfies.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn stat(&self, path: &str) -> Result<Stats, FsError>;

    /// No links exist, so this is `stat`.
    async fn lstat(&self, path: &str) -> Result<Stats, FsError> {
        self.stat(path).await
    }

    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError>;

    async fn read_file(
        &self,
        path: &str,
        encoding: Option<TextEncoding>,
    ) -> Result<FileContents, FsError>;

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError>;

    async fn mkdir(&self, path: &str) -> Result<(), FsError>;

    async fn unlink(&self, path: &str) -> Result<(), FsError>;

    async fn rmdir(&self, path: &str) -> Result<(), FsError>;

    /// Never fails: any error counts as "does not exist".
    async fn exists(&self, path: &str) -> bool;
}
