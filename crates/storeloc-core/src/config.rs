use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, DirectorySource, Environment};
use crate::geo::LatLng;
use crate::ConfigError;

pub const DEFAULT_GEOCODER_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation live here so tests can drive them with a plain
/// `HashMap` lookup instead of mutating the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        parse_value::<u8>(var, &or_default(var, default))
    };
    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        parse_value::<u32>(var, &or_default(var, default))
    };
    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value::<u64>(var, &or_default(var, default))
    };

    let env = parse_environment(&or_default("STORELOC_ENV", "development"))?;
    let log_level = or_default("STORELOC_LOG_LEVEL", "info");

    let directory = if let Some(path) = optional("STORELOC_STORES_PATH") {
        DirectorySource::Fixture(PathBuf::from(path))
    } else {
        let url = optional("STORELOC_GRAPHQL_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("STORELOC_GRAPHQL_URL".to_string()))?;
        DirectorySource::Graphql {
            url,
            application_token: optional("STORELOC_APPLICATION_TOKEN"),
        }
    };

    let request_timeout_secs = parse_u64("STORELOC_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("STORELOC_USER_AGENT", "storeloc/0.1 (store-locator)");

    let page_size = parse_u32("STORELOC_PAGE_SIZE", "100")?;
    if page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STORELOC_PAGE_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let search_debounce_ms = parse_u64("STORELOC_SEARCH_DEBOUNCE_MS", "500")?;
    let search_range_meters = parse_u32("STORELOC_SEARCH_RANGE_METERS", "10000")?;

    let geocoder_url = or_default("STORELOC_GEOCODER_URL", DEFAULT_GEOCODER_URL);
    let geocoder_api_key = optional("STORELOC_GEOCODER_API_KEY");

    let default_center = LatLng::from_str(&or_default("STORELOC_DEFAULT_CENTER", "19.0760,72.8777"))
        .map_err(|reason| ConfigError::InvalidEnvVar {
            var: "STORELOC_DEFAULT_CENTER".to_string(),
            reason,
        })?;

    let focus_zoom = parse_u8("STORELOC_FOCUS_ZOOM", "15")?;
    let focus_delay_ms = parse_u64("STORELOC_FOCUS_DELAY_MS", "100")?;

    Ok(AppConfig {
        env,
        log_level,
        directory,
        request_timeout_secs,
        user_agent,
        page_size,
        search_debounce_ms,
        search_range_meters,
        geocoder_url,
        geocoder_api_key,
        default_center,
        focus_zoom,
        focus_delay_ms,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STORELOC_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
