use async_trait::async_trait;
use docfs_config::{ProxyConfig, Secret};
use docfs_core::{DocumentFilter, DocumentRecord, DocumentStore, FindQuery, Projection, StoreError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// Header naming the store connection a proxy request is for.
pub const CONNECTION_HEADER: &str = "x-mongodb-connection";

/// A document store reached through the HTTP proxy.
///
/// The proxy owns the database driver; this client only speaks its
/// path-addressed protocol. One pooled `reqwest::Client` per store, built on
/// first use.
pub struct HttpStore {
    endpoint: String,
    connection_string: Secret,
    timeout: Duration,
    connect_timeout: Duration,
    client: OnceCell<Client>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModifiedBody {
    #[serde(default)]
    modified_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletedBody {
    #[serde(default)]
    deleted_count: u64,
}

#[derive(Deserialize)]
struct ImagesBody {
    #[serde(default)]
    images: Vec<String>,
}

impl HttpStore {
    pub fn new(proxy: &ProxyConfig, connection_string: Secret) -> Self {
        HttpStore {
            endpoint: proxy.endpoint.trim_end_matches('/').to_string(),
            connection_string,
            timeout: proxy.timeout.as_duration(),
            connect_timeout: proxy.connect_timeout.as_duration(),
            client: OnceCell::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn client(&self) -> Result<&Client, StoreError> {
        self.client
            .get_or_try_init(|| async {
                let mut headers = HeaderMap::new();
                headers.insert(
                    CONNECTION_HEADER,
                    HeaderValue::from_str(self.connection_string.expose()).map_err(|e| {
                        StoreError::Other(format!("Invalid connection string: {}", e))
                    })?,
                );

                debug!(endpoint = %self.endpoint, "building proxy client");
                Client::builder()
                    .timeout(self.timeout)
                    .connect_timeout(self.connect_timeout)
                    .default_headers(headers)
                    .build()
                    .map_err(|e| StoreError::Other(format!("Failed to build HTTP client: {}", e)))
            })
            .await
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.endpoint.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    async fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, StoreError> {
        Ok(self.client().await?.request(method, self.url(segments)))
    }

    /// Send, mapping transport failures and non-success statuses.
    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e, operation))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error: Some(error), details: Some(details) }) => {
                format!("{}: {}", error, details)
            }
            Ok(ErrorBody { error: Some(error), .. }) => error,
            _ => body,
        };

        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(message));
        }
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T, StoreError> {
        self.send(request, operation)
            .await?
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(format!("{}: {}", operation, e)))
    }

    fn transport_error(&self, err: reqwest::Error, operation: &str) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout {
                operation: operation.to_string(),
            }
        } else if err.is_connect() {
            StoreError::ConnectionFailed {
                store: self.endpoint.clone(),
                source: Box::new(err),
            }
        } else if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Other(format!("{} request failed: {}", operation, err))
        }
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    fn name(&self) -> &str {
        &self.endpoint
    }

    // the proxy looks documents up by name or id under a single path key
    fn addresses_by_key(&self) -> bool {
        true
    }

    #[instrument(skip(self))]
    async fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        let request = self.request(Method::GET, &["databases"]).await?;
        self.send_json(request, "list databases").await
    }

    #[instrument(skip(self))]
    async fn list_collections(&self, database: &str) -> Result<Vec<String>, StoreError> {
        let request = self.request(Method::GET, &["collections", database]).await?;
        self.send_json(request, "list collections").await
    }

    #[instrument(skip(self))]
    async fn find(
        &self,
        database: &str,
        collection: &str,
        query: &FindQuery,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if query.projection == Projection::Metadata {
            params.push(("meta", "1".to_string()));
        }
        if let Some(filter) = query.filter_document() {
            params.push(("filter", filter.to_string()));
        }

        let request = self
            .request(Method::GET, &["documents", database, collection])
            .await?
            .query(&params);
        self.send_json(request, "find").await
    }

    #[instrument(skip(self))]
    async fn find_one(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        let key = filter.key();
        let request = self
            .request(Method::GET, &["document", database, collection, &key])
            .await?;
        match self.send_json::<DocumentRecord>(request, "find one").await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, record))]
    async fn replace(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
        record: &DocumentRecord,
    ) -> Result<(), StoreError> {
        // the proxy upserts on the body's `_id` when present, else on the path name
        let mut body = record.clone();
        if let DocumentFilter::ById(id) = filter {
            if body.id().is_none() {
                body.insert("_id", id.clone());
            }
        }

        let key = match filter {
            DocumentFilter::ById(_) => body.identifier(),
            other => other.key(),
        };
        let request = self
            .request(Method::PUT, &["document", database, collection, &key])
            .await?
            .json(&body);
        self.send(request, "replace").await?;
        Ok(())
    }

    #[instrument(skip(self, updates))]
    async fn patch(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        updates: &Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let request = self
            .request(Method::PATCH, &["document", database, collection, id])
            .await?
            .json(updates);
        let body: ModifiedBody = self.send_json(request, "patch").await?;
        Ok(body.modified_count)
    }

    #[instrument(skip(self))]
    async fn delete(
        &self,
        database: &str,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<u64, StoreError> {
        let key = filter.key();
        let request = self
            .request(Method::DELETE, &["document", database, collection, &key])
            .await?;
        let body: DeletedBody = self.send_json(request, "delete").await?;
        Ok(body.deleted_count)
    }

    #[instrument(skip(self))]
    async fn images(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let request = self
            .request(Method::GET, &["images", database, collection, id])
            .await?;
        let body: ImagesBody = self.send_json(request, "images").await?;
        Ok(body.images)
    }

    #[instrument(skip(self))]
    async fn create(&self, database: &str, collection: Option<&str>) -> Result<(), StoreError> {
        let mut segments = vec!["mkdir", database];
        segments.extend(collection);
        let request = self.request(Method::GET, &segments).await?;
        self.send(request, "mkdir").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn drop_collection(&self, database: &str, collection: &str) -> Result<(), StoreError> {
        let request = self
            .request(Method::DELETE, &["collections", database, collection])
            .await?;
        self.send(request, "drop collection").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn drop_database(&self, database: &str) -> Result<(), StoreError> {
        let request = self.request(Method::DELETE, &["databases", database]).await?;
        self.send(request, "drop database").await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self.request(Method::GET, &["test"]).await?;
        self.send(request, "ping").await?;
        Ok(())
    }
}
