//! In-process document-store proxy backed by a `MemoryStore`, speaking the
//! same path-addressed protocol `HttpStore` expects.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{Json, Response};
use axum::routing::{delete, get};
use axum::Router;
use docfs_config::{ProxyConfig, Secret};
use docfs_core::{DocumentFilter, DocumentRecord, DocumentStore, FindQuery, StoreError};
use docfs_remote::{HttpStore, MemoryStore, CONNECTION_HEADER};
use serde::Deserialize;
use serde_json::{json, Map, Value};

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Clone)]
pub struct ProxyState {
    pub store: Arc<MemoryStore>,
    /// Connection header of every request received.
    pub connections: Arc<Mutex<Vec<String>>>,
}

#[derive(Deserialize)]
struct DocumentsQuery {
    meta: Option<String>,
    filter: Option<String>,
}

fn failure(err: StoreError) -> (StatusCode, Json<Value>) {
    match err {
        StoreError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Document not found"})),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Database operation failed", "details": other.to_string()})),
        ),
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

async fn capture_connection(State(state): State<ProxyState>, request: Request, next: Next) -> Response {
    let connection = request
        .headers()
        .get(CONNECTION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.connections.lock().unwrap().push(connection);
    next.run(request).await
}

async fn databases(State(state): State<ProxyState>) -> ApiResult {
    let names = state.store.list_databases().await.map_err(failure)?;
    Ok(Json(json!(names)))
}

async fn collections(State(state): State<ProxyState>, Path(db): Path<String>) -> ApiResult {
    let names = state.store.list_collections(&db).await.map_err(failure)?;
    Ok(Json(json!(names)))
}

async fn drop_collection(
    State(state): State<ProxyState>,
    Path((db, coll)): Path<(String, String)>,
) -> ApiResult {
    state.store.drop_collection(&db, &coll).await.map_err(failure)?;
    Ok(Json(json!({"success": true})))
}

async fn drop_database(State(state): State<ProxyState>, Path(db): Path<String>) -> ApiResult {
    state.store.drop_database(&db).await.map_err(failure)?;
    Ok(Json(json!({"success": true})))
}

async fn documents(
    State(state): State<ProxyState>,
    Path((db, coll)): Path<(String, String)>,
    Query(params): Query<DocumentsQuery>,
) -> ApiResult {
    let mut query = match params.meta.as_deref() {
        Some("1") | Some("true") => FindQuery::metadata(),
        _ => FindQuery::full(),
    };
    if let Some(raw) = params.filter {
        let filter: Value = serde_json::from_str(&raw).map_err(|_| bad_request("Invalid filter JSON"))?;
        query = query.hiding(
            filter.get("category") == Some(&json!({"$exists": false})),
            filter.get("dismissed") == Some(&json!({"$ne": true})),
        );
    }
    let docs = state.store.find(&db, &coll, &query).await.map_err(failure)?;
    Ok(Json(json!(docs)))
}

async fn get_document(
    State(state): State<ProxyState>,
    Path((db, coll, id)): Path<(String, String, String)>,
) -> ApiResult {
    let filter = DocumentFilter::NameOrId(id);
    match state.store.find_one(&db, &coll, &filter).await.map_err(failure)? {
        Some(doc) => Ok(Json(doc.into_value())),
        None => Err(failure(StoreError::NotFound(filter.key()))),
    }
}

async fn patch_document(
    State(state): State<ProxyState>,
    Path((db, coll, id)): Path<(String, String, String)>,
    Json(updates): Json<Map<String, Value>>,
) -> ApiResult {
    let modified = state.store.patch(&db, &coll, &id, &updates).await.map_err(failure)?;
    Ok(Json(json!({"modifiedCount": modified})))
}

async fn put_document(
    State(state): State<ProxyState>,
    Path((db, coll, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> ApiResult {
    let record = DocumentRecord::from_value(body).ok_or_else(|| bad_request("Body must be an object"))?;
    let filter = match record.id() {
        Some(id) => DocumentFilter::ById(id.clone()),
        None => DocumentFilter::ByName(id),
    };
    state.store.replace(&db, &coll, &filter, &record).await.map_err(failure)?;
    Ok(Json(json!({"success": true})))
}

async fn delete_document(
    State(state): State<ProxyState>,
    Path((db, coll, id)): Path<(String, String, String)>,
) -> ApiResult {
    let deleted = state
        .store
        .delete(&db, &coll, &DocumentFilter::NameOrId(id))
        .await
        .map_err(failure)?;
    Ok(Json(json!({"deletedCount": deleted})))
}

async fn images(
    State(state): State<ProxyState>,
    Path((db, coll, id)): Path<(String, String, String)>,
) -> ApiResult {
    let filter = DocumentFilter::NameOrId(id);
    let doc = state
        .store
        .find_one(&db, &coll, &filter)
        .await
        .map_err(failure)?
        .ok_or_else(|| failure(StoreError::NotFound(filter.key())))?;
    Ok(Json(json!({
        "images": doc.image_urls(),
        "document": {"_id": doc.id(), "name": doc.name()},
    })))
}

async fn mkdir_database(State(state): State<ProxyState>, Path(db): Path<String>) -> ApiResult {
    state.store.create(&db, None).await.map_err(failure)?;
    Ok(Json(json!({"success": true})))
}

async fn mkdir_collection(
    State(state): State<ProxyState>,
    Path((db, coll)): Path<(String, String)>,
) -> ApiResult {
    state.store.create(&db, Some(&coll)).await.map_err(failure)?;
    Ok(Json(json!({"success": true})))
}

async fn test_connection() -> ApiResult {
    Ok(Json(json!({"success": true, "message": "Connected"})))
}

pub fn build_proxy(state: ProxyState) -> Router {
    let api = Router::new()
        .route("/databases", get(databases))
        .route("/databases/:db", delete(drop_database))
        .route("/collections/:db", get(collections))
        .route("/collections/:db/:coll", delete(drop_collection))
        .route("/documents/:db/:coll", get(documents))
        .route(
            "/document/:db/:coll/*id",
            get(get_document)
                .patch(patch_document)
                .put(put_document)
                .delete(delete_document),
        )
        .route("/images/:db/:coll/*id", get(images))
        .route("/mkdir/:db", get(mkdir_database))
        .route("/mkdir/:db/:coll", get(mkdir_collection))
        .route("/test", get(test_connection));

    Router::new()
        .nest("/api/mongodb", api)
        .layer(middleware::from_fn_with_state(state.clone(), capture_connection))
        .with_state(state)
}

/// Serve a proxy over `store` on an ephemeral port; returns its base URL.
pub async fn start_proxy(store: Arc<MemoryStore>) -> (String, ProxyState) {
    let state = ProxyState {
        store,
        connections: Arc::new(Mutex::new(Vec::new())),
    };
    let app = build_proxy(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://127.0.0.1:{}/api/mongodb", port), state)
}

/// An `HttpStore` talking to a fresh proxy over `store`.
pub async fn http_store(store: Arc<MemoryStore>, connection_string: &str) -> (HttpStore, ProxyState) {
    let (base, state) = start_proxy(store).await;
    let proxy = ProxyConfig {
        endpoint: base,
        ..Default::default()
    };
    (HttpStore::new(&proxy, Secret::new(connection_string)), state)
}
