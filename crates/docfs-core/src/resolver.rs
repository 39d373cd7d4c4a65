use std::sync::Arc;

use tracing::debug;

use crate::entry::FsEntry;
use crate::error::FsError;
use crate::metrics::FsMetrics;
use crate::path::ParsedPath;
use crate::store::{DocumentFilter, DocumentStore};

/// Turns a parsed path into an entry, asking the store only for documents.
///
/// Databases and collections are not probed: they exist by virtue of being
/// listed. Results are never cached here.
pub struct EntryResolver {
    store: Arc<dyn DocumentStore>,
    metrics: Arc<FsMetrics>,
}

impl EntryResolver {
    pub fn new(store: Arc<dyn DocumentStore>, metrics: Arc<FsMetrics>) -> Self {
        EntryResolver { store, metrics }
    }

    pub async fn resolve(&self, parsed: &ParsedPath) -> Result<FsEntry, FsError> {
        self.metrics.record_resolve();

        if parsed.too_deep {
            return Err(FsError::NotFound(format!(
                "/{}/{}/{}.json/..",
                parsed.database.as_deref().unwrap_or_default(),
                parsed.collection.as_deref().unwrap_or_default(),
                parsed.document.as_deref().unwrap_or_default(),
            )));
        }

        let (database, collection, document) =
            match (&parsed.database, &parsed.collection, &parsed.document) {
                (None, _, _) => return Ok(FsEntry::root()),
                (Some(db), None, _) => {
                    return Ok(FsEntry::Database { name: db.clone() });
                }
                (Some(db), Some(coll), None) => {
                    return Ok(FsEntry::Collection {
                        database: db.clone(),
                        name: coll.clone(),
                    });
                }
                (Some(db), Some(coll), Some(doc)) => (db, coll, doc),
            };

        let filter = DocumentFilter::NameOrId(document.clone());
        match self.store.find_one(database, collection, &filter).await? {
            Some(record) => Ok(FsEntry::Document {
                identifier: document.clone(),
                record,
            }),
            None => {
                debug!(database = %database, collection = %collection, document = %document, "document not found");
                Err(FsError::NotFound(format!(
                    "/{}/{}/{}.json",
                    database, collection, document
                )))
            }
        }
    }
}
