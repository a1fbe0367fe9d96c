//! Client configuration
//!
//! Defaults match the public Spotify Web API. Every value can be overridden
//! through `CATALOG_*` environment variables.

use std::time::Duration;

use crate::error::{CatalogError, Result};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com";
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
/// Upper bound the catalog accepts for `limit`
pub const MAX_PAGE_LIMIT: u32 = 50;

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogConfig {
    /// Base URL without the `/v1` prefix
    pub api_url: String,
    pub page_limit: u32,
    pub search_limit: u32,
    pub search_debounce: Duration,
    /// Left to the transport when `None`
    pub request_timeout: Option<Duration>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            search_limit: DEFAULT_PAGE_LIMIT,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            request_timeout: None,
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for
    /// missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("CATALOG_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("CATALOG_PAGE_LIMIT") {
            config.page_limit = parse_number("CATALOG_PAGE_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("CATALOG_SEARCH_LIMIT") {
            config.search_limit = parse_number("CATALOG_SEARCH_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("CATALOG_SEARCH_DEBOUNCE_MS") {
            let ms: u64 = parse_number("CATALOG_SEARCH_DEBOUNCE_MS", &raw)?;
            config.search_debounce = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("CATALOG_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("CATALOG_REQUEST_TIMEOUT_SECS", &raw)?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_limit(self.page_limit)?;
        validate_limit(self.search_limit)?;
        if self.api_url.is_empty() {
            return Err(CatalogError::validation("api url must not be empty"));
        }
        Ok(())
    }
}

pub fn validate_limit(limit: u32) -> Result<()> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(CatalogError::validation(format!(
            "limit must be between 1 and {}, got {}",
            MAX_PAGE_LIMIT, limit
        )));
    }
    Ok(())
}

fn parse_number<N: std::str::FromStr>(key: &str, raw: &str) -> Result<N> {
    raw.trim()
        .parse()
        .map_err(|_| CatalogError::validation(format!("{} is not a number: {:?}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = CatalogConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.search_debounce, Duration::from_millis(300));
    }

    #[test]
    fn overrides_are_applied() {
        let config = CatalogConfig::from_lookup(lookup_from(&[
            ("CATALOG_API_URL", "http://localhost:9000/"),
            ("CATALOG_PAGE_LIMIT", "50"),
            ("CATALOG_SEARCH_DEBOUNCE_MS", "150"),
            ("CATALOG_REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.page_limit, 50);
        assert_eq!(config.search_debounce, Duration::from_millis(150));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn out_of_range_limit_is_rejected() {
        let err = CatalogConfig::from_lookup(lookup_from(&[("CATALOG_PAGE_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let err = CatalogConfig::from_lookup(lookup_from(&[("CATALOG_SEARCH_LIMIT", "51")])).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn garbage_number_is_rejected() {
        let err = CatalogConfig::from_lookup(lookup_from(&[("CATALOG_SEARCH_DEBOUNCE_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("CATALOG_SEARCH_DEBOUNCE_MS"));
    }
}
