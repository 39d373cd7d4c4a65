//! Filesystem view of a document store.
//!
//! ```text
//! /                               databases
//! /<database>                     collections
//! /<database>/<collection>        <identifier>.json per document
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docfs_config::{CacheSettings, FilterSettings};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::cache::{DirectoryCache, DEFAULT_TTL};
use crate::entry::{FileSize, FsEntry, Stats};
use crate::error::FsError;
use crate::metrics::FsMetrics;
use crate::path::{self, Depth, ParsedPath};
use crate::record::{fields, DocumentMeta, DocumentRecord};
use crate::resolver::EntryResolver;
use crate::store::{DocumentFilter, DocumentStore, FindQuery};
use crate::traits::{FileContents, FileSystem, FsCapabilities, TextEncoding};

/// Name the adapter reports to the host.
pub const FS_NAME: &str = "DocFS";

/// Construction options for [`DocumentFs`].
#[derive(Debug, Clone)]
pub struct FsOptions {
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub hide_categorized: bool,
    pub hide_dismissed: bool,
    /// Listed at the root when the store cannot enumerate databases.
    pub fallback_database: Option<String>,
}

impl Default for FsOptions {
    fn default() -> Self {
        FsOptions {
            cache_enabled: true,
            cache_ttl: DEFAULT_TTL,
            hide_categorized: false,
            hide_dismissed: false,
            fallback_database: None,
        }
    }
}

impl FsOptions {
    pub fn from_config(cache: &CacheSettings, filters: &FilterSettings) -> Self {
        FsOptions {
            cache_enabled: cache.enabled,
            cache_ttl: cache.ttl.as_duration(),
            hide_categorized: filters.hide_categorized,
            hide_dismissed: filters.hide_dismissed,
            fallback_database: None,
        }
    }

    /// Take the root fallback from the database named in a connection string.
    pub fn with_connection_string(mut self, connection_string: &str) -> Self {
        self.fallback_database = path::database_from_connection_string(connection_string);
        self
    }
}

/// A document store exposed as a three-level filesystem.
///
/// Owns its directory cache: created empty, cleared by [`DocumentFs::dispose`].
pub struct DocumentFs {
    store: Arc<dyn DocumentStore>,
    cache: DirectoryCache,
    resolver: EntryResolver,
    metrics: Arc<FsMetrics>,
    hide_categorized: AtomicBool,
    hide_dismissed: AtomicBool,
    fallback_database: Option<String>,
}

impl DocumentFs {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_options(store, FsOptions::default())
    }

    pub fn with_options(store: Arc<dyn DocumentStore>, options: FsOptions) -> Self {
        let metrics = Arc::new(FsMetrics::new());
        let cache = if options.cache_enabled {
            DirectoryCache::new(options.cache_ttl)
        } else {
            DirectoryCache::disabled()
        };

        DocumentFs {
            resolver: EntryResolver::new(Arc::clone(&store), Arc::clone(&metrics)),
            store,
            cache,
            metrics,
            hide_categorized: AtomicBool::new(options.hide_categorized),
            hide_dismissed: AtomicBool::new(options.hide_dismissed),
            fallback_database: options.fallback_database,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    pub fn metrics(&self) -> &FsMetrics {
        &self.metrics
    }

    pub fn capabilities(&self) -> FsCapabilities {
        FsCapabilities {
            name: FS_NAME,
            read_only: false,
            supports_links: false,
            supports_sync: false,
            supports_properties: true,
        }
    }

    pub fn hide_categorized(&self) -> bool {
        self.hide_categorized.load(Ordering::Relaxed)
    }

    pub fn set_hide_categorized(&self, hide: bool) {
        self.hide_categorized.store(hide, Ordering::Relaxed);
    }

    pub fn hide_dismissed(&self) -> bool {
        self.hide_dismissed.load(Ordering::Relaxed)
    }

    pub fn set_hide_dismissed(&self, hide: bool) {
        self.hide_dismissed.store(hide, Ordering::Relaxed);
    }

    fn track<T>(&self, result: Result<T, FsError>) -> Result<T, FsError> {
        if result.is_err() {
            self.metrics.record_error();
        }
        result
    }

    /// Whether the directory cache vouches for a document, counting the lookup.
    async fn cached_document(&self, database: &str, collection: &str, document: &str) -> bool {
        if self.cache.contains(database, collection, document).await == Some(true) {
            self.metrics.record_cache_hit();
            debug!(database, collection, document, "answered from directory cache");
            true
        } else {
            self.metrics.record_cache_miss();
            false
        }
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn stat(&self, path: &str) -> Result<Stats, FsError> {
        let result = self.stat_parsed(path, &path::parse(path)).await;
        self.track(result)
    }

    async fn stat_parsed(&self, path: &str, parsed: &ParsedPath) -> Result<Stats, FsError> {
        if parsed.depth() == Depth::TooDeep {
            return Err(FsError::NotFound(path.to_string()));
        }
        if let Some((db, coll, doc)) = parsed.document_parts() {
            if self.cached_document(db, coll, doc).await {
                return Ok(Stats::file(FileSize::Pending));
            }
        } else {
            return Ok(Stats::directory());
        }

        let entry = self.resolver.resolve(parsed).await?;
        Ok(entry.stats())
    }

    /// Same as [`DocumentFs::stat`]; there are no links.
    pub async fn lstat(&self, path: &str) -> Result<Stats, FsError> {
        self.stat(path).await
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        self.metrics.record_listing();
        let result = self.readdir_parsed(path, &path::parse(path)).await;
        self.track(result)
    }

    async fn readdir_parsed(&self, path: &str, parsed: &ParsedPath) -> Result<Vec<String>, FsError> {
        match (parsed.depth(), &parsed.database, &parsed.collection) {
            (Depth::Root, _, _) => self.list_databases().await,
            (Depth::TooDeep, _, _) => Err(FsError::NotFound(path.to_string())),
            (Depth::Database, Some(db), _) => Ok(self.store.list_collections(db).await?),
            (Depth::Collection, Some(db), Some(coll)) => {
                let listing = self.fetch_listing(db, coll).await?;
                Ok(listing
                    .iter()
                    .map(|meta| path::document_filename(&meta.identifier))
                    .collect())
            }
            _ => Err(FsError::InvalidArgument(format!("Not a directory: {}", path))),
        }
    }

    async fn list_databases(&self) -> Result<Vec<String>, FsError> {
        match self.store.list_databases().await {
            Ok(names) if !names.is_empty() => Ok(names),
            Ok(_) => {
                debug!(fallback = ?self.fallback_database, "store listed no databases");
                Ok(self.fallback_database.iter().cloned().collect())
            }
            Err(err) => match &self.fallback_database {
                Some(db) => {
                    warn!(error = %err, database = %db, "listing databases failed, using the connection string database");
                    Ok(vec![db.clone()])
                }
                None => Err(err.into()),
            },
        }
    }

    /// Metadata-only listing of a collection; refreshes the directory cache.
    async fn fetch_listing(&self, database: &str, collection: &str) -> Result<Vec<DocumentMeta>, FsError> {
        let query = FindQuery::metadata().hiding(self.hide_categorized(), self.hide_dismissed());
        let documents = self.store.find(database, collection, &query).await?;
        let listing: Vec<DocumentMeta> = documents.iter().map(DocumentRecord::meta).collect();

        self.cache
            .set_listing(database, collection, listing.clone())
            .await;
        Ok(listing)
    }

    /// Category and dismissed flag of every listed document in a collection,
    /// from the cache when fresh, otherwise fetched.
    pub async fn collection_metadata(&self, path: &str) -> Result<Vec<DocumentMeta>, FsError> {
        let parsed = path::parse(path);
        let result = match (parsed.depth(), parsed.collection_parts()) {
            (Depth::Collection, Some((db, coll))) => match self.cache.metadata(db, coll).await {
                Some(listing) => Ok(listing),
                None => self.fetch_listing(db, coll).await,
            },
            _ => Err(FsError::InvalidArgument(format!("Not a collection: {}", path))),
        };
        self.track(result)
    }

    /// Identifiers with a category in the cached listing of a collection.
    pub async fn cached_categorized(&self, path: &str) -> Option<HashSet<String>> {
        let (db, coll) = collection_of(path)?;
        self.cache.categorized(&db, &coll).await
    }

    /// Identifiers flagged dismissed in the cached listing of a collection.
    pub async fn cached_dismissed(&self, path: &str) -> Option<HashSet<String>> {
        let (db, coll) = collection_of(path)?;
        self.cache.dismissed(&db, &coll).await
    }

    /// Cached category of the document at `path`.
    pub async fn cached_category(&self, path: &str) -> Option<String> {
        let parsed = path::parse(path);
        let (db, coll, doc) = parsed.document_parts()?;
        self.cache.category_of(db, coll, doc).await
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn read_file(
        &self,
        path: &str,
        encoding: Option<TextEncoding>,
    ) -> Result<FileContents, FsError> {
        let result = self.read_record(path).await.and_then(|record| {
            let json = record
                .to_pretty_json()
                .map_err(|e| FsError::Io(format!("Failed to serialize {}: {}", path, e)))?;
            Ok(FileContents::encode(json.into_bytes(), encoding))
        });
        if result.is_ok() {
            self.metrics.record_read();
        }
        self.track(result)
    }

    async fn read_record(&self, path: &str) -> Result<DocumentRecord, FsError> {
        let parsed = path::parse(path);
        if parsed.depth() != Depth::Document {
            return Err(FsError::NotFound(path.to_string()));
        }

        match self.resolver.resolve(&parsed).await? {
            FsEntry::Document { record, .. } => Ok(record),
            _ => Err(FsError::NotFound(path.to_string())),
        }
    }

    #[instrument(skip(self, data), fields(path = %path, size = data.len()))]
    pub async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let result = self.write_parsed(path, data).await;
        if result.is_ok() {
            self.metrics.record_write();
        }
        self.track(result)
    }

    async fn write_parsed(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let parsed = path::parse(path);
        let (db, coll, doc) = parsed
            .document_parts()
            .ok_or_else(|| FsError::InvalidArgument(format!("Not a document path: {}", path)))?;

        let value: Value = serde_json::from_slice(data)
            .map_err(|e| FsError::InvalidArgument(format!("Invalid JSON: {}", e)))?;
        let mut record = DocumentRecord::from_value(value).ok_or_else(|| {
            FsError::InvalidArgument("Document must be a JSON object".to_string())
        })?;

        let id = record.id().filter(|id| !id.is_null()).cloned();
        let filter = match id {
            Some(id) => DocumentFilter::ById(id),
            None => {
                // keep the document reachable under the path it was written to
                if record.name().is_none() {
                    record.insert(fields::NAME, Value::String(doc.to_string()));
                }
                DocumentFilter::ByName(doc.to_string())
            }
        };

        self.store.replace(db, coll, &filter, &record).await?;
        self.cache.invalidate(Some(db), Some(coll)).await;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        let result = self.mkdir_parsed(path::parse(path)).await;
        self.track(result)
    }

    async fn mkdir_parsed(&self, parsed: ParsedPath) -> Result<(), FsError> {
        match (parsed.depth(), &parsed.database, &parsed.collection) {
            (Depth::Document | Depth::TooDeep, _, _) => Err(FsError::InvalidArgument(
                "Cannot create a folder inside a collection".to_string(),
            )),
            (Depth::Database, Some(db), _) => {
                path::validate_name(db)?;
                self.store.create(db, None).await?;
                self.cache.invalidate(Some(db), None).await;
                Ok(())
            }
            (Depth::Collection, Some(db), Some(coll)) => {
                path::validate_name(db)?;
                path::validate_name(coll)?;
                self.store.create(db, Some(coll)).await?;
                self.cache.invalidate(Some(db), Some(coll)).await;
                Ok(())
            }
            _ => Err(FsError::InvalidArgument(
                "Cannot create the filesystem root".to_string(),
            )),
        }
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn unlink(&self, path: &str) -> Result<(), FsError> {
        let result = self.unlink_parsed(path).await;
        if result.is_ok() {
            self.metrics.record_delete();
        }
        self.track(result)
    }

    async fn unlink_parsed(&self, path: &str) -> Result<(), FsError> {
        let parsed = path::parse(path);
        let (db, coll, doc) = parsed
            .document_parts()
            .ok_or_else(|| FsError::InvalidArgument(format!("Not a document path: {}", path)))?;

        let mut deleted = self
            .store
            .delete(db, coll, &DocumentFilter::ByName(doc.to_string()))
            .await?;
        if deleted == 0 && !self.store.addresses_by_key() {
            debug!(document = doc, "no document by that name, deleting by id");
            deleted = self
                .store
                .delete(db, coll, &DocumentFilter::ById(Value::String(doc.to_string())))
                .await?;
        }

        self.cache.invalidate(Some(db), Some(coll)).await;

        if deleted == 0 {
            return Err(FsError::NotFound(path.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn rmdir(&self, path: &str) -> Result<(), FsError> {
        let parsed = path::parse(path);
        let result = match (parsed.depth(), &parsed.database, &parsed.collection) {
            (Depth::Collection, Some(db), Some(coll)) => {
                match self.store.drop_collection(db, coll).await {
                    Ok(()) => {
                        self.cache.invalidate(Some(db), Some(coll)).await;
                        Ok(())
                    }
                    Err(err) => Err(err.into()),
                }
            }
            (Depth::Database, Some(db), _) => match self.store.drop_database(db).await {
                Ok(()) => {
                    self.cache.invalidate(Some(db), None).await;
                    Ok(())
                }
                Err(err) => Err(err.into()),
            },
            (Depth::Root, _, _) => Err(FsError::InvalidArgument(
                "Cannot remove the filesystem root".to_string(),
            )),
            _ => Err(FsError::InvalidArgument(format!("Not a directory: {}", path))),
        };
        self.track(result)
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn exists(&self, path: &str) -> bool {
        let parsed = path::parse(path);
        if parsed.depth() == Depth::TooDeep {
            return false;
        }
        if let Some((db, coll, doc)) = parsed.document_parts() {
            if self.cached_document(db, coll, doc).await {
                return true;
            }
        }

        match self.resolver.resolve(&parsed).await {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "treating as nonexistent");
                false
            }
        }
    }

    /// Image URLs of the document at `path`; empty on any failure.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_document_images(&self, path: &str) -> Vec<String> {
        let parsed = path::parse(path);
        let Some((db, coll, doc)) = parsed.document_parts() else {
            return Vec::new();
        };

        match self.store.images(db, coll, doc).await {
            Ok(urls) => urls,
            Err(err) => {
                warn!(error = %err, "failed to load document images");
                Vec::new()
            }
        }
    }

    /// Whether `path` names a document file.
    pub fn is_document(&self, path: &str) -> bool {
        path::is_document_path(path)
    }

    /// Set fields on a document in place; `null` values remove the field.
    #[instrument(skip(self, updates), fields(path = %path))]
    pub async fn patch_document(
        &self,
        path: &str,
        updates: &Map<String, Value>,
    ) -> Result<u64, FsError> {
        let parsed = path::parse(path);
        let result = match parsed.document_parts() {
            Some((db, coll, doc)) => match self.store.patch(db, coll, doc, updates).await {
                Ok(modified) => {
                    self.cache.invalidate(Some(db), Some(coll)).await;
                    self.metrics.record_patch();
                    Ok(modified)
                }
                Err(err) => Err(err.into()),
            },
            None => Err(FsError::InvalidArgument("Invalid document path".to_string())),
        };
        self.track(result)
    }

    pub async fn rename(&self, _old_path: &str, _new_path: &str) -> Result<(), FsError> {
        Err(FsError::Unsupported("rename".to_string()))
    }

    pub async fn truncate(&self, _path: &str, _len: u64) -> Result<(), FsError> {
        Err(FsError::Unsupported("truncate".to_string()))
    }

    /// Paths are already canonical.
    pub async fn realpath(&self, path: &str) -> Result<String, FsError> {
        Ok(path.to_string())
    }

    /// Connectivity check against the store.
    pub async fn ping(&self) -> Result<(), FsError> {
        let result = self.store.ping().await.map_err(FsError::from);
        self.track(result)
    }

    /// Drop all cached listings. The adapter stays usable.
    pub async fn dispose(&self) {
        self.cache.clear().await;
        debug!(store = self.store.name(), "document filesystem disposed");
    }

    pub fn stat_sync(&self, _path: &str) -> Result<Stats, FsError> {
        Err(sync_unsupported("statSync"))
    }

    pub fn lstat_sync(&self, _path: &str) -> Result<Stats, FsError> {
        Err(sync_unsupported("lstatSync"))
    }

    pub fn readdir_sync(&self, _path: &str) -> Result<Vec<String>, FsError> {
        Err(sync_unsupported("readdirSync"))
    }

    pub fn read_file_sync(&self, _path: &str) -> Result<FileContents, FsError> {
        Err(sync_unsupported("readFileSync"))
    }

    pub fn write_file_sync(&self, _path: &str, _data: &[u8]) -> Result<(), FsError> {
        Err(sync_unsupported("writeFileSync"))
    }

    pub fn mkdir_sync(&self, _path: &str) -> Result<(), FsError> {
        Err(sync_unsupported("mkdirSync"))
    }

    pub fn unlink_sync(&self, _path: &str) -> Result<(), FsError> {
        Err(sync_unsupported("unlinkSync"))
    }

    pub fn rmdir_sync(&self, _path: &str) -> Result<(), FsError> {
        Err(sync_unsupported("rmdirSync"))
    }

    pub fn exists_sync(&self, _path: &str) -> Result<bool, FsError> {
        Err(sync_unsupported("existsSync"))
    }
}

fn sync_unsupported(operation: &str) -> FsError {
    FsError::Unsupported(format!("{} (document stores are asynchronous)", operation))
}

fn collection_of(path: &str) -> Option<(String, String)> {
    let parsed = path::parse(path);
    parsed
        .collection_parts()
        .map(|(db, coll)| (db.to_string(), coll.to_string()))
}

#[async_trait]
impl FileSystem for DocumentFs {
    async fn stat(&self, path: &str) -> Result<Stats, FsError> {
        DocumentFs::stat(self, path).await
    }

    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        DocumentFs::readdir(self, path).await
    }

    async fn read_file(
        &self,
        path: &str,
        encoding: Option<TextEncoding>,
    ) -> Result<FileContents, FsError> {
        DocumentFs::read_file(self, path, encoding).await
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        DocumentFs::write_file(self, path, data).await
    }

    async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        DocumentFs::mkdir(self, path).await
    }

    async fn unlink(&self, path: &str) -> Result<(), FsError> {
        DocumentFs::unlink(self, path).await
    }

    async fn rmdir(&self, path: &str) -> Result<(), FsError> {
        DocumentFs::rmdir(self, path).await
    }

    async fn exists(&self, path: &str) -> bool {
        DocumentFs::exists(self, path).await
    }
}
