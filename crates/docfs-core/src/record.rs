//! Schema-less document records and the few fields the filesystem understands.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier used when a document has neither `name` nor `_id`.
pub const UNNAMED: &str = "unnamed";

/// Field names with meaning to the filesystem.
pub mod fields {
    pub const ID: &str = "_id";
    pub const NAME: &str = "name";
    pub const IMAGES: &str = "images";
    pub const OLD_IMAGES: &str = "oldImages";
    pub const CATEGORY: &str = "category";
    pub const DISMISSED: &str = "dismissed";
}

/// A document as stored: an open key/value mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRecord(Map<String, Value>);

impl DocumentRecord {
    pub fn new() -> Self {
        DocumentRecord(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        DocumentRecord(map)
    }

    /// Build a record from an arbitrary JSON value; only objects are records.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(DocumentRecord(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// The store-assigned identifier, if any.
    pub fn id(&self) -> Option<&Value> {
        self.0.get(fields::ID)
    }

    /// The `name` field when it is a non-empty string.
    pub fn name(&self) -> Option<&str> {
        self.0
            .get(fields::NAME)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Identifier a document is listed under: `name`, else `_id`, else `"unnamed"`.
    pub fn identifier(&self) -> String {
        self.0
            .get(fields::NAME)
            .and_then(identifier_text)
            .or_else(|| self.id().and_then(identifier_text))
            .unwrap_or_else(|| UNNAMED.to_string())
    }

    /// Raw `category` value as a single label string.
    ///
    /// Array categories are joined with `", "`; empty values count as unset.
    pub fn category(&self) -> Option<String> {
        let text = match self.0.get(fields::CATEGORY)? {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null => return None,
            other => other.to_string(),
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn is_dismissed(&self) -> bool {
        matches!(self.0.get(fields::DISMISSED), Some(Value::Bool(true)))
    }

    /// The navigable image list: `images` followed by `oldImages`.
    pub fn image_urls(&self) -> Vec<String> {
        [fields::IMAGES, fields::OLD_IMAGES]
            .iter()
            .filter_map(|key| self.0.get(*key).and_then(Value::as_array))
            .flatten()
            .filter_map(|raw| ImageRef::from_value(raw).and_then(|img| img.url()))
            .collect()
    }

    /// Metadata-only view used by listings and filters.
    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            identifier: self.identifier(),
            category: self.category(),
            dismissed: self.is_dismissed(),
        }
    }

    /// Keep only `_id`, `name`, `category` and `dismissed`.
    pub fn project_metadata(&self) -> DocumentRecord {
        let mut out = Map::new();
        for key in [fields::ID, fields::NAME, fields::CATEGORY, fields::DISMISSED] {
            if let Some(value) = self.0.get(key) {
                out.insert(key.to_string(), value.clone());
            }
        }
        DocumentRecord(out)
    }

    /// Canonical file form: two-space indented JSON.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }
}

impl From<Map<String, Value>> for DocumentRecord {
    fn from(map: Map<String, Value>) -> Self {
        DocumentRecord(map)
    }
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(oid)) => Some(oid.clone()),
            _ => Some(value.to_string()),
        },
        Value::Array(_) => Some(value.to_string()),
        _ => None,
    }
}

/// One entry of an `images` / `oldImages` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Url(String),
    Sized {
        small: Option<String>,
        medium: Option<String>,
        large: Option<String>,
    },
}

impl ImageRef {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(ImageRef::Url(s.clone())),
            Value::Object(map) => {
                let variant = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };
                Some(ImageRef::Sized {
                    small: variant("small"),
                    medium: variant("medium"),
                    large: variant("large"),
                })
            }
            _ => None,
        }
    }

    /// Preferred URL: bare strings trimmed, objects medium then small then large.
    pub fn url(&self) -> Option<String> {
        match self {
            ImageRef::Url(url) => {
                let url = url.trim();
                (!url.is_empty()).then(|| url.to_string())
            }
            ImageRef::Sized {
                small,
                medium,
                large,
            } => medium.clone().or_else(|| small.clone()).or_else(|| large.clone()),
        }
    }
}

/// What a listing keeps about each document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMeta {
    pub identifier: String,
    pub category: Option<String>,
    pub dismissed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> DocumentRecord {
        DocumentRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_identifier_prefers_name() {
        assert_eq!(record(json!({"_id": "1", "name": "john_doe"})).identifier(), "john_doe");
    }

    #[test]
    fn test_identifier_falls_back_to_id() {
        assert_eq!(record(json!({"_id": "abc", "name": ""})).identifier(), "abc");
        assert_eq!(
            record(json!({"_id": {"$oid": "64f1c0ffee0000000000abcd"}})).identifier(),
            "64f1c0ffee0000000000abcd"
        );
        assert_eq!(record(json!({"_id": 42})).identifier(), "42");
    }

    #[test]
    fn test_identifier_unnamed() {
        assert_eq!(record(json!({"email": "x@y.z"})).identifier(), "unnamed");
        assert_eq!(record(json!({"name": null, "_id": null})).identifier(), "unnamed");
    }

    #[test]
    fn test_image_urls_order_and_resolution() {
        let doc = record(json!({
            "images": [
                " https://cdn/a.jpg ",
                {"small": "https://cdn/b-s.jpg", "medium": "https://cdn/b-m.jpg"},
                "",
                {"large": "https://cdn/c-l.jpg"},
                17
            ],
            "oldImages": [
                {"small": "https://cdn/d-s.jpg", "large": "https://cdn/d-l.jpg"},
                {}
            ]
        }));

        assert_eq!(
            doc.image_urls(),
            vec![
                "https://cdn/a.jpg",
                "https://cdn/b-m.jpg",
                "https://cdn/c-l.jpg",
                "https://cdn/d-s.jpg",
            ]
        );
    }

    #[test]
    fn test_image_urls_missing_or_malformed() {
        assert!(record(json!({"name": "x"})).image_urls().is_empty());
        assert!(record(json!({"images": "not-a-list"})).image_urls().is_empty());
    }

    #[test]
    fn test_category_and_dismissed() {
        let doc = record(json!({"name": "a", "category": "Red, blue", "dismissed": true}));
        assert_eq!(doc.category().as_deref(), Some("Red, blue"));
        assert!(doc.is_dismissed());

        let doc = record(json!({"category": ["red", "blue"], "dismissed": "yes"}));
        assert_eq!(doc.category().as_deref(), Some("red, blue"));
        assert!(!doc.is_dismissed());

        assert_eq!(record(json!({"category": "  "})).category(), None);
        assert_eq!(record(json!({"category": null})).category(), None);
    }

    #[test]
    fn test_project_metadata() {
        let doc = record(json!({
            "_id": "1", "name": "a", "category": "x", "dismissed": false, "payload": [1, 2, 3]
        }));
        let meta = doc.project_metadata();
        assert_eq!(meta.as_map().len(), 4);
        assert!(meta.get("payload").is_none());
    }

    #[test]
    fn test_pretty_json_round_trips() {
        let doc = record(json!({"name": "john_doe", "age": 30}));
        let text = doc.to_pretty_json().unwrap();
        assert!(text.contains("\n  \"name\": \"john_doe\""));
        let back: DocumentRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(DocumentRecord::from_value(json!([1, 2])).is_none());
        assert!(DocumentRecord::from_value(json!("text")).is_none());
    }
}
