//! Configuration loading for the roster loader.
//!
//! Connection and auth fields are required. Paging, logging and the subject
//! description fall back to defaults when omitted.

use roster_core::{
    Actor, ActorId, DedicatedFetchPolicy, FilterKey, LoaderConfig, SubjectId, TagValue,
    FIRST_PAGE_SIZE, LOCAL_FILTER_NAME, PAGE_SIZE,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterConfig {
    pub api_base_url: String,
    pub subject_id: SubjectId,
    pub request_timeout_ms: u64,
    pub auth: AuthConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub dedicated_fetch: DedicatedFetchPolicy,
    /// Tab name to open on: empty for all entries, `read` for the locally
    /// known list, anything else a tag.
    #[serde(default)]
    pub initial_filter: String,
    #[serde(default)]
    pub available_tags: Vec<TagCount>,
    #[serde(default)]
    pub local_actors: Vec<LocalActor>,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    pub jwt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PagingConfig {
    pub first_page_size: u32,
    pub page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            first_page_size: FIRST_PAGE_SIZE,
            page_size: PAGE_SIZE,
        }
    }
}

/// A tag the subject carries and how many entries carry it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// One actor of the locally known list.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalActor {
    pub id: u64,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "roster_loader=info,warn".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or ROSTER_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Loader(#[from] roster_core::ConfigError),
}

impl RosterConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RosterConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.auth.api_key.is_none() && self.auth.jwt.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "auth",
                reason: "api_key or jwt must be provided".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for entry in &self.available_tags {
            if entry.tag.is_empty() || entry.tag == LOCAL_FILTER_NAME {
                return Err(ConfigError::InvalidValue {
                    field: "available_tags.tag",
                    reason: format!("'{}' is reserved", entry.tag),
                });
            }
            if !seen.insert(entry.tag.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "available_tags.tag",
                    reason: format!("duplicate tag '{}'", entry.tag),
                });
            }
        }
        if let Some(actor) = self
            .local_actors
            .iter()
            .find(|actor| actor.display_name.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "local_actors.display_name",
                reason: format!("actor {} has an empty display name", actor.id),
            });
        }
        if self.log.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log.filter",
                reason: "must not be empty".to_string(),
            });
        }
        self.loader_config().validate()?;
        Ok(())
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::new()
            .with_first_page_size(self.paging.first_page_size)
            .with_page_size(self.paging.page_size)
            .with_dedicated_fetch(self.dedicated_fetch)
    }

    pub fn initial_filter(&self) -> FilterKey {
        FilterKey::from_wire(self.initial_filter.trim())
    }

    pub fn available_tags(&self) -> Vec<TagValue> {
        self.available_tags
            .iter()
            .map(|entry| TagValue::new(entry.tag.clone()))
            .collect()
    }

    pub fn tag_counts(&self) -> Vec<(TagValue, usize)> {
        self.available_tags
            .iter()
            .map(|entry| (TagValue::new(entry.tag.clone()), entry.count))
            .collect()
    }

    /// Actor ids of the locally known list, in configured order.
    pub fn local_list(&self) -> Vec<ActorId> {
        self.local_actors
            .iter()
            .map(|actor| ActorId::new(actor.id))
            .collect()
    }

    pub fn local_actors(&self) -> Vec<Actor> {
        self.local_actors
            .iter()
            .map(|actor| Actor::new(actor.id, actor.display_name.clone()))
            .collect()
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("ROSTER_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEAD: &str = r#"
api_base_url = "http://localhost:3000"
subject_id = "0191f0a4-7e6b-7cc0-9b5c-3f1f5a8c2d10"
request_timeout_ms = 5000
"#;

    const AUTH: &str = "[auth]\napi_key = \"test-key\"\n";

    /// Top-level keys must precede the first table.
    fn toml_with(top: &str, tables: &str) -> String {
        format!("{}{}\n{}{}", HEAD, top, AUTH, tables)
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn parse(contents: &str) -> RosterConfig {
        toml::from_str(contents).unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file = write_config(&toml_with("", ""));
        let config = RosterConfig::from_path(file.path()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.loader_config(), LoaderConfig::default());
        assert_eq!(config.initial_filter(), FilterKey::All);
        assert!(config.local_list().is_empty());
        assert!(!config.log.json);
    }

    #[test]
    fn test_full_config() {
        let contents = toml_with(
            "initial_filter = \"👍\"",
            r#"
[paging]
first_page_size = 10
page_size = 50

[dedicated_fetch]
mode = "unproductive_pages"
limit = 3

[[available_tags]]
tag = "👍"
count = 4

[[available_tags]]
tag = "❤"
count = 1

[[local_actors]]
id = 7
display_name = "Grace"

[log]
filter = "roster_loader=debug"
json = true
"#
        );
        let config = parse(&contents);
        config.validate().unwrap();
        let loader = config.loader_config();
        assert_eq!(loader.first_page_size, 10);
        assert_eq!(loader.page_size, 50);
        assert_eq!(loader.dedicated_fetch, DedicatedFetchPolicy::UnproductivePages { limit: 3 });
        assert_eq!(config.initial_filter(), FilterKey::tag("👍"));
        assert_eq!(config.available_tags().len(), 2);
        assert_eq!(config.tag_counts()[0].1, 4);
        assert_eq!(config.local_list(), vec![ActorId::new(7)]);
        assert_eq!(config.local_actors()[0].display_name, "Grace");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let contents = toml_with("refresh_interval_ms = 10", "");
        let file = write_config(&contents);
        assert!(matches!(
            RosterConfig::from_path(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_auth_rejected() {
        let contents = toml_with("", "").replace("api_key = \"test-key\"", "");
        let err = parse(&contents).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "auth", .. }));
    }

    #[test]
    fn test_reserved_tag_rejected() {
        let contents = toml_with("", "[[available_tags]]\ntag = \"read\"\ncount = 1\n");
        let err = parse(&contents).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "available_tags.tag", .. }
        ));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let contents = toml_with("", "[paging]\npage_size = 0\n");
        let err = parse(&contents).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Loader(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RosterConfig::from_path(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
