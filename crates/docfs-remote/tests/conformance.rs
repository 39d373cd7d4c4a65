//! Store Conformance Test Suite
//!
//! A single `run_conformance` function exercises every `DocumentStore`
//! operation, run against the in-memory store directly and against the HTTP
//! store talking to a proxy over the same in-memory store.

mod common;

use std::sync::Arc;

use docfs_core::{DocumentFilter, DocumentRecord, DocumentStore, FindQuery, StoreError};
use docfs_remote::{MemoryStore, PLACEHOLDER_COLLECTION};
use serde_json::{json, Map, Value};

fn record(value: Value) -> DocumentRecord {
    DocumentRecord::from_value(value).unwrap()
}

fn names(docs: &[DocumentRecord]) -> Vec<String> {
    docs.iter().map(|d| d.identifier()).collect()
}

async fn run_conformance(store: &dyn DocumentStore) {
    // 1. Empty store
    assert!(store.list_databases().await.unwrap().is_empty());
    store.ping().await.unwrap();

    // 2. Upsert by name creates database and collection
    for name in ["laptop", "book", "camera"] {
        store
            .replace(
                "shop",
                "items",
                &DocumentFilter::ByName(name.to_string()),
                &record(json!({"name": name, "price": 10})),
            )
            .await
            .unwrap();
    }
    assert_eq!(store.list_databases().await.unwrap(), vec!["shop"]);
    assert_eq!(store.list_collections("shop").await.unwrap(), vec!["items"]);

    // 3. Listings are sorted by name and carry ids
    let docs = store.find("shop", "items", &FindQuery::full()).await.unwrap();
    assert_eq!(names(&docs), vec!["book", "camera", "laptop"]);
    assert!(docs.iter().all(|d| d.id().is_some()));

    // 4. Point lookups by name and by id
    let laptop = store
        .find_one("shop", "items", &DocumentFilter::NameOrId("laptop".into()))
        .await
        .unwrap()
        .expect("laptop");
    let laptop_id = DocumentFilter::ById(laptop.id().cloned().unwrap()).key();
    let by_id = store
        .find_one("shop", "items", &DocumentFilter::NameOrId(laptop_id.clone()))
        .await
        .unwrap();
    assert_eq!(by_id.map(|d| d.identifier()), Some("laptop".to_string()));
    assert!(store
        .find_one("shop", "items", &DocumentFilter::NameOrId("missing".into()))
        .await
        .unwrap()
        .is_none());

    // 5. Replace an existing document
    store
        .replace(
            "shop",
            "items",
            &DocumentFilter::ByName("laptop".into()),
            &record(json!({"name": "laptop", "price": 12})),
        )
        .await
        .unwrap();
    let docs = store.find("shop", "items", &FindQuery::full()).await.unwrap();
    assert_eq!(docs.len(), 3);
    let laptop = docs.iter().find(|d| d.identifier() == "laptop").unwrap();
    assert_eq!(laptop.get("price"), Some(&json!(12)));

    // 6. Patch sets and unsets
    let mut updates = Map::new();
    updates.insert("category".into(), json!("electronics"));
    assert_eq!(store.patch("shop", "items", "laptop", &updates).await.unwrap(), 1);
    updates.insert("category".into(), Value::Null);
    updates.insert("dismissed".into(), json!(true));
    assert_eq!(store.patch("shop", "items", "camera", &updates).await.unwrap(), 1);
    let mut tag = Map::new();
    tag.insert("category".into(), json!("novel"));
    store.patch("shop", "items", "book", &tag).await.unwrap();

    // 7. Metadata projection and store-side hiding
    let meta = store.find("shop", "items", &FindQuery::metadata()).await.unwrap();
    assert!(meta.iter().all(|d| d.get("price").is_none()));
    assert_eq!(meta.iter().filter(|d| d.category().is_some()).count(), 2);

    let hidden = FindQuery::metadata().hiding(true, false);
    assert_eq!(
        names(&store.find("shop", "items", &hidden).await.unwrap()),
        vec!["camera"]
    );
    let hidden = FindQuery::metadata().hiding(false, true);
    assert_eq!(
        names(&store.find("shop", "items", &hidden).await.unwrap()),
        vec!["book", "laptop"]
    );

    // 8. Images from `images` then `oldImages`
    store
        .replace(
            "shop",
            "items",
            &DocumentFilter::ByName("poster".into()),
            &record(json!({
                "name": "poster",
                "images": ["https://img/a.jpg", {"small": "https://img/b-s.jpg", "medium": "https://img/b-m.jpg"}],
                "oldImages": ["  ", {"large": "https://img/c-l.jpg"}],
            })),
        )
        .await
        .unwrap();
    assert_eq!(
        store.images("shop", "items", "poster").await.unwrap(),
        vec!["https://img/a.jpg", "https://img/b-m.jpg", "https://img/c-l.jpg"]
    );
    let err = store.images("shop", "items", "missing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {:?}", err);

    // 9. Delete by name, then by id
    assert_eq!(
        store
            .delete("shop", "items", &DocumentFilter::ByName("book".into()))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .delete("shop", "items", &DocumentFilter::ById(json!(laptop_id)))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .delete("shop", "items", &DocumentFilter::ByName("book".into()))
            .await
            .unwrap(),
        0
    );

    // 10. Create and drop
    store.create("fresh", None).await.unwrap();
    assert_eq!(
        store.list_collections("fresh").await.unwrap(),
        vec![PLACEHOLDER_COLLECTION]
    );
    store.create("shop", Some("orders")).await.unwrap();
    assert_eq!(
        store.list_collections("shop").await.unwrap(),
        vec!["items", "orders"]
    );
    store.drop_collection("shop", "orders").await.unwrap();
    store.drop_database("fresh").await.unwrap();
    assert_eq!(store.list_databases().await.unwrap(), vec!["shop"]);
}

#[tokio::test]
async fn test_memory_store_conformance() {
    let store = MemoryStore::new();
    run_conformance(&store).await;
}

#[tokio::test]
async fn test_http_store_conformance() {
    let (store, state) = common::http_store(Arc::new(MemoryStore::new()), "mongodb://localhost:27017/shop").await;
    run_conformance(&store).await;

    let connections = state.connections.lock().unwrap();
    assert!(!connections.is_empty());
    assert!(connections.iter().all(|c| c == "mongodb://localhost:27017/shop"));
}

#[tokio::test]
async fn test_http_store_maps_errors() {
    let backing = Arc::new(MemoryStore::new());
    backing.refuse_list_databases(true);
    let (store, _) = common::http_store(Arc::clone(&backing), "mongodb://localhost").await;

    match store.list_databases().await {
        Err(StoreError::Rejected { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.starts_with("Database operation failed"), "{}", message);
        }
        other => panic!("expected Rejected, got {:?}", other),
    }

    let err = store.drop_collection("nope", "nothing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {:?}", err);
}
