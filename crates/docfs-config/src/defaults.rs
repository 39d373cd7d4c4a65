use crate::types::{MountConfig, DocfsConfig};

impl DocfsConfig {
    /// Apply default inference rules to the configuration.
    /// This mutates the config in place.
    pub fn apply_defaults(&mut self) {
        // A config without mounts still exposes the local store
        if self.mounts.is_empty() {
            self.mounts.push(MountConfig::default());
        }

        for mount in &mut self.mounts {
            let trimmed = mount.alias.trim();
            if trimmed.len() != mount.alias.len() {
                mount.alias = trimmed.to_string();
            }
        }

        let endpoint = self.proxy.endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            self.proxy.endpoint = crate::types::default_endpoint();
        } else if endpoint.len() != self.proxy.endpoint.len() {
            self.proxy.endpoint = endpoint.to_string();
        }
    }

    /// Returns a new config with all defaults applied.
    pub fn effective(&self) -> DocfsConfig {
        let mut config = self.clone();
        config.apply_defaults();
        config
    }
}
