use std::sync::Arc;

use docfs_core::{DocumentFs, FsError};

/// A document store mounted at `/<alias>`.
pub struct Mount {
    pub alias: String,
    pub path: String,
    pub fs: Arc<DocumentFs>,
}

impl Mount {
    pub fn new(alias: impl Into<String>, fs: Arc<DocumentFs>) -> Self {
        let alias = alias.into();
        Mount {
            path: format!("/{}", alias.trim_matches('/')),
            alias,
            fs,
        }
    }
}

/// Router that dispatches paths to the mount that owns them.
pub struct Router {
    /// Mounts sorted by path length (longest first) for longest-prefix matching.
    mounts: Vec<Mount>,
}

impl Router {
    pub fn new(mut mounts: Vec<Mount>) -> Self {
        mounts.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Router { mounts }
    }

    /// Resolve a path to its mount and the path inside that mount
    /// (always absolute, `/` for the mount root).
    pub fn resolve(&self, path: &str) -> Result<(&Mount, String), FsError> {
        let normalized = normalize_path(path);

        for mount in &self.mounts {
            if let Some(relative) = strip_mount_prefix(&normalized, &mount.path) {
                return Ok((mount, format!("/{}", relative)));
            }
        }

        Err(FsError::NoMount(path.to_string()))
    }

    /// Mount aliases, sorted by name.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.mounts.iter().map(|m| m.alias.clone()).collect();
        aliases.sort();
        aliases
    }

    pub fn get(&self, alias: &str) -> Option<&Mount> {
        self.mounts.iter().find(|m| m.alias == alias)
    }

    pub fn mounts(&self) -> impl Iterator<Item = &Mount> {
        self.mounts.iter()
    }
}

/// Ensure a leading `/`, collapse repeated slashes and drop a trailing one.
pub(crate) fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn strip_mount_prefix(path: &str, mount_path: &str) -> Option<String> {
    let mount_normalized = mount_path.trim_end_matches('/');

    if path == mount_normalized {
        return Some(String::new());
    }

    path.strip_prefix(mount_normalized)
        .and_then(|suffix| suffix.strip_prefix('/'))
        .map(str::to_string)
}
