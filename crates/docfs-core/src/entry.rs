use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::DocumentRecord;

/// Mode bits reported for databases and collections (`drwxr-xr-x`).
pub const DIRECTORY_MODE: u32 = 0o40755;
/// Mode bits reported for documents (`-rw-r--r--`).
pub const FILE_MODE: u32 = 0o100644;

/// The resolved meaning of a virtual path.
#[derive(Debug, Clone, PartialEq)]
pub enum FsEntry {
    /// A database, or the mount root when `name` is empty.
    Database { name: String },
    Collection { database: String, name: String },
    Document {
        identifier: String,
        record: DocumentRecord,
    },
}

impl FsEntry {
    pub fn root() -> Self {
        FsEntry::Database {
            name: String::new(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            FsEntry::Database { name } if name.is_empty() => EntryKind::Root,
            FsEntry::Database { .. } => EntryKind::Database,
            FsEntry::Collection { .. } => EntryKind::Collection,
            FsEntry::Document { .. } => EntryKind::Document,
        }
    }

    pub fn is_directory(&self) -> bool {
        !matches!(self, FsEntry::Document { .. })
    }

    /// Synthetic stats for this entry. Documents report their serialized size.
    pub fn stats(&self) -> Stats {
        match self {
            FsEntry::Document { record, .. } => match record.to_pretty_json() {
                Ok(json) => Stats::file(FileSize::Known(json.len() as u64)),
                Err(_) => Stats::file(FileSize::Unavailable),
            },
            _ => Stats::directory(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Root,
    Database,
    Collection,
    Document,
}

/// Size of a document file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSize {
    Known(u64),
    /// The document is known to exist but its record was not fetched.
    Pending,
    /// Fetching the record to measure it failed.
    Unavailable,
}

impl FileSize {
    /// Numeric form for hosts that expect a plain integer size.
    pub fn as_i64(&self) -> i64 {
        match self {
            FileSize::Known(n) => i64::try_from(*n).unwrap_or(i64::MAX),
            FileSize::Pending => -1,
            FileSize::Unavailable => -2,
        }
    }

    pub fn known(&self) -> Option<u64> {
        match self {
            FileSize::Known(n) => Some(*n),
            _ => None,
        }
    }
}

impl Serialize for FileSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.as_i64())
    }
}

/// POSIX-flavoured metadata for an entry. Timestamps are taken at call time.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub is_directory: bool,
    pub size: FileSize,
    pub mode: u32,
    pub mtime: DateTime<Utc>,
    pub atime: DateTime<Utc>,
    pub ctime: DateTime<Utc>,
    pub birthtime: DateTime<Utc>,
}

impl Stats {
    fn new(is_directory: bool, size: FileSize) -> Self {
        let now = Utc::now();
        Stats {
            is_directory,
            size,
            mode: if is_directory { DIRECTORY_MODE } else { FILE_MODE },
            mtime: now,
            atime: now,
            ctime: now,
            birthtime: now,
        }
    }

    pub fn directory() -> Self {
        Stats::new(true, FileSize::Known(0))
    }

    pub fn file(size: FileSize) -> Self {
        Stats::new(false, size)
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory
    }

    pub fn is_symbolic_link(&self) -> bool {
        false
    }
}
