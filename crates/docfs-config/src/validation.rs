use std::collections::HashSet;

use crate::types::DocfsConfig;
use crate::ConfigError;

impl DocfsConfig {
    /// Validate the configuration and return a list of errors.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let endpoint = self.proxy.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ConfigError::InvalidEndpoint(
                self.proxy.endpoint.clone(),
                "Endpoint must start with http:// or https://".to_string(),
            ));
        }

        if self.cache.enabled && self.cache.ttl.as_duration().is_zero() {
            errors.push(ConfigError::InvalidConfig(
                "cache.ttl must be greater than zero when the cache is enabled".to_string(),
            ));
        }

        let mut seen_aliases = HashSet::new();
        for mount in &self.mounts {
            let alias = mount.alias.trim();
            if alias.is_empty() {
                errors.push(ConfigError::InvalidMount(
                    mount.alias.clone(),
                    "Alias cannot be empty".to_string(),
                ));
            } else if alias.contains('/') {
                errors.push(ConfigError::InvalidMount(
                    mount.alias.clone(),
                    "Alias cannot contain '/'".to_string(),
                ));
            }

            if !seen_aliases.insert(alias) {
                errors.push(ConfigError::DuplicateMount(mount.alias.clone()));
            }

            if mount.connection_string.is_empty() {
                errors.push(ConfigError::InvalidMount(
                    mount.alias.clone(),
                    "Connection string cannot be empty".to_string(),
                ));
            }
        }

        errors
    }

    /// Validate and return Ok(()) if valid, or Err with the first error.
    pub fn validate_or_err(&self) -> Result<(), ConfigError> {
        match self.validate().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HumanDuration, MountConfig, Secret};

    fn mount(alias: &str, conn: &str) -> MountConfig {
        MountConfig {
            alias: alias.to_string(),
            connection_string: Secret::new(conn),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DocfsConfig::default().effective();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_duplicate_aliases() {
        let config = DocfsConfig {
            mounts: vec![
                mount("Local", "mongodb://a:27017"),
                mount("Local", "mongodb://b:27017"),
            ],
            ..Default::default()
        };

        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ConfigError::DuplicateMount(a) if a == "Local"));
    }

    #[test]
    fn test_alias_with_slash() {
        let config = DocfsConfig {
            mounts: vec![mount("a/b", "mongodb://a:27017")],
            ..Default::default()
        };
        assert!(matches!(
            config.validate_or_err(),
            Err(ConfigError::InvalidMount(alias, _)) if alias == "a/b"
        ));
    }

    #[test]
    fn test_empty_connection_string() {
        let config = DocfsConfig {
            mounts: vec![mount("Local", "  ")],
            ..Default::default()
        };
        assert!(matches!(
            config.validate_or_err(),
            Err(ConfigError::InvalidMount(_, reason)) if reason.contains("Connection string")
        ));
    }

    #[test]
    fn test_bad_endpoint_scheme() {
        let mut config = DocfsConfig::default();
        config.proxy.endpoint = "ftp://proxy".to_string();
        assert!(matches!(
            config.validate_or_err(),
            Err(ConfigError::InvalidEndpoint(_, _))
        ));
    }

    #[test]
    fn test_zero_ttl_rejected_only_when_enabled() {
        let mut config = DocfsConfig::default();
        config.cache.ttl = HumanDuration::from_secs(0);
        assert_eq!(config.validate().len(), 1);

        config.cache.enabled = false;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DocfsConfig {
            mounts: vec![mount("", ""), mount("x/y", "mongodb://h")],
            ..Default::default()
        };
        config.proxy.endpoint = "proxy".to_string();
        assert_eq!(config.validate().len(), 4);
    }
}
