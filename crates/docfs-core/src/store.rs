use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::StoreError;
use crate::record::{fields, DocumentRecord};

/// Which documents a point operation targets.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentFilter {
    /// Match the `name` field.
    ByName(String),
    /// Match the store-assigned `_id`.
    ById(Value),
    /// Match either the `name` field or the `_id`.
    NameOrId(String),
}

impl DocumentFilter {
    /// Whether `record` satisfies this filter.
    pub fn matches(&self, record: &DocumentRecord) -> bool {
        match self {
            DocumentFilter::ByName(name) => {
                record.get(fields::NAME).and_then(Value::as_str) == Some(name.as_str())
            }
            DocumentFilter::ById(wanted) => record.id().is_some_and(|id| id_matches(id, wanted)),
            DocumentFilter::NameOrId(key) => {
                DocumentFilter::ByName(key.clone()).matches(record)
                    || DocumentFilter::ById(Value::String(key.clone())).matches(record)
            }
        }
    }

    /// The key a path-addressed store uses for this filter.
    pub fn key(&self) -> String {
        match self {
            DocumentFilter::ByName(key) | DocumentFilter::NameOrId(key) => key.clone(),
            DocumentFilter::ById(id) => id_text(id),
        }
    }
}

/// `_id` equality that also accepts `{"$oid": ..}` ids compared against plain strings.
fn id_matches(id: &Value, wanted: &Value) -> bool {
    if id == wanted {
        return true;
    }
    match wanted {
        Value::String(s) => id_text(id) == *s,
        _ => false,
    }
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(oid)) => oid.clone(),
            _ => id.to_string(),
        },
        other => other.to_string(),
    }
}

/// How much of each document a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    Full,
    /// Only `_id`, `name`, `category` and `dismissed`.
    Metadata,
}

/// A collection query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindQuery {
    pub projection: Projection,
    /// Omit documents carrying a `category` field.
    pub hide_categorized: bool,
    /// Omit documents with `dismissed: true`.
    pub hide_dismissed: bool,
}

impl FindQuery {
    pub fn full() -> Self {
        FindQuery::default()
    }

    pub fn metadata() -> Self {
        FindQuery {
            projection: Projection::Metadata,
            ..Default::default()
        }
    }

    pub fn hiding(mut self, categorized: bool, dismissed: bool) -> Self {
        self.hide_categorized = categorized;
        self.hide_dismissed = dismissed;
        self
    }

    /// Store-side filter document, or `None` when nothing is hidden.
    pub fn filter_document(&self) -> Option<Value> {
        let mut filter = Map::new();
        if self.hide_categorized {
            filter.insert(fields::CATEGORY.to_string(), json!({"$exists": false}));
        }
        if self.hide_dismissed {
            filter.insert(fields::DISMISSED.to_string(), json!({"$ne": true}));
        }
        (!filter.is_empty()).then_some(Value::Object(filter))
    }

    /// In-process evaluation of [`FindQuery::filter_document`].
    pub fn admits(&self, record: &DocumentRecord) -> bool {
        if self.hide_categorized && record.get(fields::CATEGORY).is_some() {
            return false;
        }
        if self.hide_dismissed && record.is_dismissed() {
            return false;
        }
        true
    }
}

/// A remote document store organised as database → collection → document.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Short label used in logs and errors.
    fn name(&self) -> &str;

    /// True when every filter reaches the store as one path key that matches
    /// a name or an id, so a by-name call already covers the by-id case.
    fn addresses_by_key(&self) -> bool {
        false
    }

    async fn list_databases(&self) -> Result<Vec<String>, StoreError>;

    async fn list_collections(&self, database: &str) -> Result<Vec<String>, StoreError>;

    /// Documents of a collection, sorted by `name`.
    async fn find(
        &self,
        database: &str,
        collection: &str,
        query: &FindQuery,
    ) -> Result<Vec<DocumentRecord>, StoreError>;

    async fn find_one(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<Option<DocumentRecord>, StoreError>;

    /// Replace the matching document, inserting `record` if nothing matches.
    async fn replace(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
        record: &DocumentRecord,
    ) -> Result<(), StoreError>;

    /// Set fields on the document named or identified by `id`. `null` values unset.
    /// Returns the number of modified documents.
    async fn patch(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        updates: &Map<String, Value>,
    ) -> Result<u64, StoreError>;

    /// Delete one matching document. Returns the number deleted.
    async fn delete(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<u64, StoreError>;

    /// Image URLs of a document (`images` then `oldImages`).
    async fn images(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let filter = DocumentFilter::NameOrId(id.to_string());
        match self.find_one(database, collection, &filter).await? {
            Some(record) => Ok(record.image_urls()),
            None => Err(StoreError::NotFound(format!("{}/{}/{}", database, collection, id))),
        }
    }

    /// Create a collection, or a database (via a placeholder collection) when
    /// `collection` is `None`.
    async fn create(&self, database: &str, collection: Option<&str>) -> Result<(), StoreError>;

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<(), StoreError>;

    async fn drop_database(&self, database: &str) -> Result<(), StoreError>;

    /// Connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> DocumentRecord {
        DocumentRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_filter_by_name() {
        let doc = record(json!({"_id": "1", "name": "john_doe"}));
        assert!(DocumentFilter::ByName("john_doe".into()).matches(&doc));
        assert!(!DocumentFilter::ByName("1".into()).matches(&doc));
    }

    #[test]
    fn test_filter_by_id() {
        let doc = record(json!({"_id": {"$oid": "64f1c0ffee0000000000abcd"}}));
        assert!(DocumentFilter::ById(json!("64f1c0ffee0000000000abcd")).matches(&doc));
        assert!(DocumentFilter::ById(json!({"$oid": "64f1c0ffee0000000000abcd"})).matches(&doc));
        assert!(!DocumentFilter::ById(json!("other")).matches(&doc));

        let numeric = record(json!({"_id": 7}));
        assert!(DocumentFilter::ById(json!(7)).matches(&numeric));
        assert!(DocumentFilter::ById(json!("7")).matches(&numeric));
    }

    #[test]
    fn test_filter_name_or_id() {
        let doc = record(json!({"_id": "abc", "name": "laptop"}));
        assert!(DocumentFilter::NameOrId("laptop".into()).matches(&doc));
        assert!(DocumentFilter::NameOrId("abc".into()).matches(&doc));
        assert!(!DocumentFilter::NameOrId("book".into()).matches(&doc));
    }

    #[test]
    fn test_filter_key() {
        assert_eq!(DocumentFilter::ById(json!({"$oid": "ff"})).key(), "ff");
        assert_eq!(DocumentFilter::ByName("n".into()).key(), "n");
    }

    #[test]
    fn test_filter_document() {
        assert_eq!(FindQuery::metadata().filter_document(), None);
        assert_eq!(
            FindQuery::metadata().hiding(true, false).filter_document(),
            Some(json!({"category": {"$exists": false}}))
        );
        assert_eq!(
            FindQuery::full().hiding(true, true).filter_document(),
            Some(json!({"category": {"$exists": false}, "dismissed": {"$ne": true}}))
        );
    }

    #[test]
    fn test_admits() {
        let query = FindQuery::metadata().hiding(true, true);
        assert!(query.admits(&record(json!({"name": "a"}))));
        assert!(!query.admits(&record(json!({"name": "b", "category": "red"}))));
        assert!(!query.admits(&record(json!({"name": "c", "dismissed": true}))));
        assert!(query.admits(&record(json!({"name": "d", "dismissed": false}))));
    }
}
