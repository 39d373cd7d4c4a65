//! Exposes a document store as a three-level filesystem:
//! `/database/collection/document.json`.

mod adapter;
mod cache;
mod entry;
mod error;
mod filter;
mod metrics;
pub mod path;
mod record;
mod resolver;
mod store;
mod traits;

#[cfg(test)]
mod testing;

pub use adapter::{DocumentFs, FsOptions, FS_NAME};
pub use cache::{CacheStats, DirectoryCache, DEFAULT_TTL};
pub use entry::{EntryKind, FileSize, FsEntry, Stats, DIRECTORY_MODE, FILE_MODE};
pub use error::{FsError, StoreError};
pub use filter::{merge_labels, parse_labels, BatchOutcome, CategoryFilter};
pub use metrics::{FsMetrics, MetricsSnapshot};
pub use path::{Depth, ParsedPath};
pub use record::{fields, DocumentMeta, DocumentRecord, ImageRef, UNNAMED};
pub use resolver::EntryResolver;
pub use store::{DocumentFilter, DocumentStore, FindQuery, Projection};
pub use traits::{FileContents, FileSystem, FsCapabilities, TextEncoding};
