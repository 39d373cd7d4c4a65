use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Human-readable duration (e.g., "200ms", "5s", "1h").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub std::time::Duration);

impl Default for HumanDuration {
    fn default() -> Self {
        HumanDuration(std::time::Duration::from_secs(0))
    }
}

impl HumanDuration {
    pub fn from_secs(secs: u64) -> Self {
        HumanDuration(std::time::Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> std::time::Duration {
        self.0
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        let (num_str, unit) = if let Some(n) = s.strip_suffix("ms") {
            (n, "ms")
        } else if let Some(n) = s.strip_suffix('s') {
            (n, "s")
        } else if let Some(n) = s.strip_suffix('m') {
            (n, "m")
        } else if let Some(n) = s.strip_suffix('h') {
            (n, "h")
        } else if let Some(n) = s.strip_suffix('d') {
            (n, "d")
        } else {
            return Err(format!("Invalid duration format: {}", s));
        };

        let num: u64 = num_str
            .trim()
            .parse()
            .map_err(|_| format!("Invalid number in duration: {}", s))?;

        let seconds_per_unit = match unit {
            "ms" => return Ok(HumanDuration(std::time::Duration::from_millis(num))),
            "s" => 1,
            "m" => 60,
            "h" => 3600,
            _ => 86400,
        };
        let secs = num
            .checked_mul(seconds_per_unit)
            .ok_or_else(|| format!("Duration out of range: {}", s))?;
        let duration = std::time::Duration::from_secs(secs);

        Ok(HumanDuration(duration))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        let secs = self.0.as_secs();

        if millis % 1000 != 0 || millis == 0 {
            write!(f, "{}ms", millis)
        } else if secs % 60 != 0 {
            write!(f, "{}s", secs)
        } else if secs % 3600 != 0 {
            write!(f, "{}m", secs / 60)
        } else if secs % 86400 != 0 {
            write!(f, "{}h", secs / 3600)
        } else {
            write!(f, "{}d", secs / 86400)
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HumanDuration::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A sensitive string (connection strings carry credentials).
///
/// Printing or serializing a `Secret` never reveals its value; use
/// [`Secret::expose`] at the point of use.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl Serialize for Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("***")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Secret)
    }
}

/// Where the document-store HTTP proxy lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout: HumanDuration,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
}

pub(crate) fn default_endpoint() -> String {
    "http://localhost:3000/api/mongodb".to_string()
}

fn default_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(5)
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Directory cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ttl")]
    pub ttl: HumanDuration,
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> HumanDuration {
    HumanDuration(std::time::Duration::from_millis(5000))
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: true,
            ttl: default_ttl(),
        }
    }
}

/// Initial state of the listing filters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub hide_categorized: bool,
    #[serde(default)]
    pub hide_dismissed: bool,
}

/// One mounted document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Name of the mount directory (`/<alias>`).
    pub alias: String,
    pub connection_string: Secret,
}

pub(crate) const DEFAULT_ALIAS: &str = "Local";
pub(crate) const DEFAULT_CONNECTION_STRING: &str = "mongodb://localhost:27017";

impl Default for MountConfig {
    fn default() -> Self {
        MountConfig {
            alias: DEFAULT_ALIAS.to_string(),
            connection_string: Secret::new(DEFAULT_CONNECTION_STRING),
        }
    }
}

/// Top-level DocFS configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocfsConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}
