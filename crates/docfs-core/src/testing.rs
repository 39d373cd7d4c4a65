//! In-crate stub store that counts calls.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::record::DocumentRecord;
use crate::store::{DocumentFilter, DocumentStore, FindQuery, Projection};

type Collections = BTreeMap<String, Vec<DocumentRecord>>;

#[derive(Default)]
pub struct StubStore {
    data: Mutex<BTreeMap<String, Collections>>,
    pub refuse_list_databases: AtomicBool,
    pub find_calls: AtomicU64,
    pub find_one_calls: AtomicU64,
    pub patch_calls: AtomicU64,
    pub failing_patches: Mutex<Vec<String>>,
}

impl StubStore {
    pub fn with(database: &str, collection: &str, docs: Vec<Value>) -> Self {
        let store = StubStore::default();
        store.insert(database, collection, docs);
        store
    }

    pub fn insert(&self, database: &str, collection: &str, docs: Vec<Value>) {
        let mut data = self.data.lock().unwrap();
        let coll = data
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
        coll.extend(docs.into_iter().filter_map(DocumentRecord::from_value));
    }

    pub fn docs(&self, database: &str, collection: &str) -> Vec<DocumentRecord> {
        self.data
            .lock()
            .unwrap()
            .get(database)
            .and_then(|colls| colls.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    pub fn finds(&self) -> u64 {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn find_ones(&self) -> u64 {
        self.find_one_calls.load(Ordering::SeqCst)
    }

    pub fn patches(&self) -> u64 {
        self.patch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for StubStore {
    fn name(&self) -> &str {
        "stub"
    }

    async fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        if self.refuse_list_databases.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                status: 500,
                message: "not authorized on admin to execute command".to_string(),
            });
        }
        Ok(self.data.lock().unwrap().keys().cloned().collect())
    }

    async fn list_collections(&self, database: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .get(database)
            .map(|colls| colls.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        query: &FindQuery,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .docs(database, collection)
            .into_iter()
            .filter(|doc| query.admits(doc))
            .map(|doc| match query.projection {
                Projection::Full => doc,
                Projection::Metadata => doc.project_metadata(),
            })
            .collect())
    }

    async fn find_one(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        self.find_one_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .docs(database, collection)
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
        let mut data = self.data.lock().unwrap();
        let coll = data
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
        match coll.iter_mut().find(|doc| filter.matches(doc)) {
            Some(doc) => *doc = record.clone(),
            None => coll.push(record.clone()),
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
        self.patch_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_patches.lock().unwrap().iter().any(|f| f == id) {
            return Err(StoreError::Other(format!("patch of {} failed", id)));
        }

        let mut data = self.data.lock().unwrap();
        let Some(coll) = data.get_mut(database).and_then(|c| c.get_mut(collection)) else {
            return Ok(0);
        };
        let filter = DocumentFilter::NameOrId(id.to_string());
        match coll.iter_mut().find(|doc| filter.matches(doc)) {
            Some(doc) => {
                for (key, value) in updates {
                    if value.is_null() {
                        doc.remove(key);
                    } else {
                        doc.insert(key.clone(), value.clone());
                    }
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<u64, StoreError> {
        let mut data = self.data.lock().unwrap();
        let Some(coll) = data.get_mut(database).and_then(|c| c.get_mut(collection)) else {
            return Ok(0);
        };
        match coll.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                coll.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn create(&self, database: &str, collection: Option<&str>) -> Result<(), StoreError> {
        self.data
            .lock()
            .unwrap()
            .entry(database.to_string())
            .or_default()
            .entry(collection.unwrap_or("_placeholder").to_string())
            .or_default();
        Ok(())
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        if let Some(colls) = data.get_mut(database) {
            colls.remove(collection);
            if colls.is_empty() {
                data.remove(database);
            }
        }
        Ok(())
    }

    async fn drop_database(&self, database: &str) -> Result<(), StoreError> {
        self.data.lock().unwrap().remove(database);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
