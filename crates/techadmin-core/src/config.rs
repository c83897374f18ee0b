use serde::{Deserialize, Serialize};

use crate::technique::DEFAULT_PAGE_SIZE;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RootConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub catalogue: CatalogueConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Base URL of the backend project, e.g. `https://xyz.example.co`
    #[serde(default)]
    pub url: Option<String>,
    /// Public (anon) API key sent with every request
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CatalogueConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Remote procedure that implements search
    #[serde(default = "default_search_function")]
    pub search_function: String,
    /// Edge function that accepts admin mutations
    #[serde(default = "default_admin_function")]
    pub admin_function: String,
    /// Table holding `(user_id, role)` rows
    #[serde(default = "default_roles_table")]
    pub roles_table: String,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_function: default_search_function(),
            admin_function: default_admin_function(),
            roles_table: default_roles_table(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_search_function() -> String {
    "search_techniques".to_string()
}

fn default_admin_function() -> String {
    "techniques-admin".to_string()
}

fn default_roles_table() -> String {
    "user_roles".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: RootConfig = toml::from_str(
            r#"
            [backend]
            url = "https://example.test"

            [catalogue]
            page_size = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.url.as_deref(), Some("https://example.test"));
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.catalogue.page_size, 50);
        assert_eq!(config.catalogue.search_function, "search_techniques");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: RootConfig = toml::from_str("").unwrap();
        assert_eq!(config, RootConfig::default());
    }
}
