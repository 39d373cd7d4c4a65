use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use docfs_core::{fields, DocumentFilter, DocumentRecord, DocumentStore, FindQuery, Projection, StoreError};
use serde_json::{Map, Value};

/// Collection created to materialise a database that has no collections yet.
pub const PLACEHOLDER_COLLECTION: &str = "_placeholder";

type Collections = BTreeMap<String, Vec<DocumentRecord>>;

/// In-memory document store for testing.
///
/// Mirrors the store semantics the adapter relies on: databases exist only
/// while they hold a collection, every document gets an `_id`, and listings
/// come back sorted by `name`.
pub struct MemoryStore {
    databases: RwLock<BTreeMap<String, Collections>>,
    next_id: AtomicU64,
    refuse_list_databases: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            databases: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            refuse_list_databases: AtomicBool::new(false),
        }
    }

    /// Make `list_databases` fail the way a store without admin rights does.
    pub fn refuse_list_databases(&self, refuse: bool) {
        self.refuse_list_databases.store(refuse, Ordering::SeqCst);
    }

    /// Insert documents, creating the database and collection as needed.
    /// Non-object values are ignored.
    pub fn insert(&self, database: &str, collection: &str, documents: impl IntoIterator<Item = Value>) {
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        let docs = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
        for value in documents {
            if let Some(record) = DocumentRecord::from_value(value) {
                docs.push(self.with_id(record));
            }
        }
    }

    /// Every document of a collection, unprojected.
    pub fn documents(&self, database: &str, collection: &str) -> Vec<DocumentRecord> {
        let databases = self.databases.read().unwrap_or_else(|e| e.into_inner());
        databases
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    fn with_id(&self, mut record: DocumentRecord) -> DocumentRecord {
        if record.id().map_or(true, Value::is_null) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            record.insert(fields::ID, Value::String(format!("{:024x}", id)));
        }
        record
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_key(record: &DocumentRecord) -> Option<String> {
    record.get(fields::NAME).map(|name| match name {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Predicate of an upsert: the body's own `_id` wins over the path filter.
fn upsert_filter(filter: &DocumentFilter, record: &DocumentRecord) -> DocumentFilter {
    match record.id() {
        Some(id) if !id.is_null() => DocumentFilter::ById(id.clone()),
        _ => filter.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        if self.refuse_list_databases.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                status: 500,
                message: "not authorized on admin to execute command { listDatabases: 1 }".to_string(),
            });
        }
        let databases = self.databases.read().unwrap_or_else(|e| e.into_inner());
        Ok(databases.keys().cloned().collect())
    }

    async fn list_collections(&self, database: &str) -> Result<Vec<String>, StoreError> {
        let databases = self.databases.read().unwrap_or_else(|e| e.into_inner());
        Ok(databases
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        query: &FindQuery,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let mut matching: Vec<DocumentRecord> = self
            .documents(database, collection)
            .into_iter()
            .filter(|doc| query.admits(doc))
            .collect();
        // documents without a name sort first, as in the store
        matching.sort_by_key(sort_key);

        Ok(match query.projection {
            Projection::Full => matching,
            Projection::Metadata => matching.iter().map(DocumentRecord::project_metadata).collect(),
        })
    }

    async fn find_one(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(self
            .documents(database, collection)
            .into_iter()
            .find(|doc| filter.matches(doc)))
    }

    async fn replace(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
        record: &DocumentRecord,
    ) -> Result<(), StoreError> {
        let filter = upsert_filter(filter, record);
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        let docs = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        match docs.iter_mut().find(|doc| filter.matches(doc)) {
            Some(existing) => {
                let mut replacement = record.clone();
                if replacement.id().is_none() {
                    if let Some(id) = existing.id() {
                        replacement.insert(fields::ID, id.clone());
                    }
                }
                *existing = replacement;
            }
            None => docs.push(self.with_id(record.clone())),
        }
        Ok(())
    }

    async fn patch(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        updates: &Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        let Some(docs) = databases.get_mut(database).and_then(|c| c.get_mut(collection)) else {
            return Ok(0);
        };

        let filter = DocumentFilter::NameOrId(id.to_string());
        let Some(doc) = docs.iter_mut().find(|doc| filter.matches(doc)) else {
            return Ok(0);
        };

        let mut modified = false;
        for (key, value) in updates {
            if value.is_null() {
                modified |= doc.remove(key).is_some();
            } else if doc.get(key) != Some(value) {
                doc.insert(key.clone(), value.clone());
                modified = true;
            }
        }
        Ok(u64::from(modified))
    }

    async fn delete(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<u64, StoreError> {
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        let Some(docs) = databases.get_mut(database).and_then(|c| c.get_mut(collection)) else {
            return Ok(0);
        };

        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn create(&self, database: &str, collection: Option<&str>) -> Result<(), StoreError> {
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        let collections = databases.entry(database.to_string()).or_default();
        let name = collection.unwrap_or(PLACEHOLDER_COLLECTION);
        if collection.is_some() && collections.contains_key(name) {
            return Err(StoreError::Rejected {
                status: 500,
                message: format!("Collection {}.{} already exists", database, name),
            });
        }
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<(), StoreError> {
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        let Some(collections) = databases.get_mut(database) else {
            return Err(StoreError::NotFound(format!("{}/{}", database, collection)));
        };
        if collections.remove(collection).is_none() {
            return Err(StoreError::NotFound(format!("{}/{}", database, collection)));
        }
        if collections.is_empty() {
            databases.remove(database);
        }
        Ok(())
    }

    async fn drop_database(&self, database: &str) -> Result<(), StoreError> {
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        databases.remove(database);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
