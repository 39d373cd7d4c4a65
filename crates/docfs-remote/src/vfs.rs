use std::sync::Arc;

use async_trait::async_trait;
use docfs_config::DocfsConfig;
use docfs_core::{
    DocumentFs, DocumentStore, FileContents, FileSystem, FsError, FsOptions, Stats, TextEncoding,
};
use futures::future::join_all;
use tracing::{debug, info, instrument};

use crate::backends::HttpStore;
use crate::router::{normalize_path, Mount, Router};

/// Every configured document store, each mounted under `/<alias>`.
pub struct DocVfs {
    config: DocfsConfig,
    router: Router,
}

impl DocVfs {
    /// Mount one proxy-backed adapter per configured connection.
    pub fn from_config(config: DocfsConfig) -> Result<Self, FsError> {
        let effective = config.effective();
        effective.validate_or_err()?;

        let mounts = effective
            .mounts
            .iter()
            .map(|mount| {
                let store: Arc<dyn DocumentStore> = Arc::new(HttpStore::new(
                    &effective.proxy,
                    mount.connection_string.clone(),
                ));
                let options = FsOptions::from_config(&effective.cache, &effective.filters)
                    .with_connection_string(mount.connection_string.expose());
                debug!(alias = %mount.alias, endpoint = %effective.proxy.endpoint, "mounting store");
                Mount::new(mount.alias.clone(), Arc::new(DocumentFs::with_options(store, options)))
            })
            .collect();

        info!(
            name = effective.name.as_deref().unwrap_or("docfs"),
            mounts = effective.mounts.len(),
            "filesystem ready"
        );
        Ok(DocVfs {
            config: effective,
            router: Router::new(mounts),
        })
    }

    /// Mount the given stores with the cache and filter settings of `config`.
    pub fn with_stores(
        config: DocfsConfig,
        stores: Vec<(String, Arc<dyn DocumentStore>)>,
    ) -> Self {
        let mounts = stores
            .into_iter()
            .map(|(alias, store)| {
                let options = FsOptions::from_config(&config.cache, &config.filters);
                Mount::new(alias, Arc::new(DocumentFs::with_options(store, options)))
            })
            .collect();
        DocVfs {
            config,
            router: Router::new(mounts),
        }
    }

    pub fn effective_config(&self) -> &DocfsConfig {
        &self.config
    }

    pub fn aliases(&self) -> Vec<String> {
        self.router.aliases()
    }

    /// The adapter mounted under `alias`.
    pub fn mount(&self, alias: &str) -> Option<Arc<DocumentFs>> {
        self.router.get(alias).map(|m| Arc::clone(&m.fs))
    }

    /// The adapter owning `path` and the path inside it.
    pub fn resolve(&self, path: &str) -> Result<(Arc<DocumentFs>, String), FsError> {
        let (mount, relative) = self.router.resolve(path)?;
        Ok((Arc::clone(&mount.fs), relative))
    }

    fn is_root(path: &str) -> bool {
        normalize_path(path) == "/"
    }

    /// Ping every mount concurrently.
    pub async fn ping_all(&self) -> Vec<(String, Result<(), FsError>)> {
        let mounts: Vec<&Mount> = self.router.mounts().collect();
        let results = join_all(mounts.iter().map(|m| m.fs.ping())).await;
        let mut outcome: Vec<_> = mounts
            .iter()
            .map(|m| m.alias.clone())
            .zip(results)
            .collect();
        outcome.sort_by(|a, b| a.0.cmp(&b.0));
        outcome
    }

    pub async fn get_document_images(&self, path: &str) -> Vec<String> {
        match self.resolve(path) {
            Ok((fs, relative)) => fs.get_document_images(&relative).await,
            Err(_) => Vec::new(),
        }
    }

    pub fn is_document(&self, path: &str) -> bool {
        self.resolve(path)
            .map(|(fs, relative)| fs.is_document(&relative))
            .unwrap_or(false)
    }

    /// Clear every mount's directory cache.
    pub async fn dispose(&self) {
        join_all(self.router.mounts().map(|m| m.fs.dispose())).await;
    }
}

#[async_trait]
impl FileSystem for DocVfs {
    #[instrument(skip(self), fields(path = %path))]
    async fn stat(&self, path: &str) -> Result<Stats, FsError> {
        if Self::is_root(path) {
            return Ok(Stats::directory());
        }
        let (fs, relative) = self.resolve(path)?;
        fs.stat(&relative).await
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        if Self::is_root(path) {
            return Ok(self.aliases());
        }
        let (fs, relative) = self.resolve(path)?;
        fs.readdir(&relative).await
    }

    async fn read_file(
        &self,
        path: &str,
        encoding: Option<TextEncoding>,
    ) -> Result<FileContents, FsError> {
        let (fs, relative) = self.resolve(path)?;
        fs.read_file(&relative, encoding).await
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let (fs, relative) = self.resolve(path)?;
        fs.write_file(&relative, data).await
    }

    async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        let (fs, relative) = self.resolve(path)?;
        fs.mkdir(&relative).await
    }

    async fn unlink(&self, path: &str) -> Result<(), FsError> {
        let (fs, relative) = self.resolve(path)?;
        fs.unlink(&relative).await
    }

    async fn rmdir(&self, path: &str) -> Result<(), FsError> {
        let (fs, relative) = self.resolve(path)?;
        fs.rmdir(&relative).await
    }

    async fn exists(&self, path: &str) -> bool {
        if Self::is_root(path) {
            return true;
        }
        match self.resolve(path) {
            Ok((fs, relative)) => fs.exists(&relative).await,
            Err(_) => false,
        }
    }
}
