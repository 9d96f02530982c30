use std::path::PathBuf;

use crate::geo::LatLng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where store records come from.
#[derive(Clone, PartialEq, Eq)]
pub enum DirectorySource {
    /// Backend GraphQL endpoint, optionally authenticated.
    Graphql {
        url: String,
        application_token: Option<String>,
    },
    /// Local YAML fixture of store records.
    Fixture(PathBuf),
}

impl std::fmt::Debug for DirectorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectorySource::Graphql {
                url,
                application_token,
            } => f
                .debug_struct("Graphql")
                .field("url", url)
                .field(
                    "application_token",
                    &application_token.as_ref().map(|_| "[redacted]"),
                )
                .finish(),
            DirectorySource::Fixture(path) => f.debug_tuple("Fixture").field(path).finish(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub directory: DirectorySource,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub page_size: u32,
    pub search_debounce_ms: u64,
    pub search_range_meters: u32,
    pub geocoder_url: String,
    pub geocoder_api_key: Option<String>,
    pub default_center: LatLng,
    pub focus_zoom: u8,
    pub focus_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("directory", &self.directory)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .field("search_range_meters", &self.search_range_meters)
            .field("geocoder_url", &self.geocoder_url)
            .field(
                "geocoder_api_key",
                &self.geocoder_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("default_center", &self.default_center)
            .field("focus_zoom", &self.focus_zoom)
            .field("focus_delay_ms", &self.focus_delay_ms)
            .finish()
    }
}
