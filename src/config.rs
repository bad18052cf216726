use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub browser: BrowserSettings,
    pub pagination: PaginationSettings,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Fingerprint and timeouts for every browser session
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Scheme and host of the target site, without trailing slash
    pub origin: String,
    pub headless: bool,
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub window_size: (u32, u32),
    pub listing_timeout: Duration,
    pub detail_timeout: Duration,
    pub ready_timeout: Duration,
    pub contact_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PaginationSettings {
    /// Root of the search pages, e.g. `https://www.tayara.tn/ads`
    pub search_base: String,
    /// A page with fewer results than this is treated as the last one
    pub full_page_size: usize,
    pub page_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let origin = "https://www.tayara.tn".to_string();
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            pagination: PaginationSettings {
                search_base: format!("{}/ads", origin),
                full_page_size: 30,
                page_delay: Duration::from_secs(2),
            },
            browser: BrowserSettings {
                origin,
                headless: true,
                user_agent: DEFAULT_USER_AGENT.to_string(),
                locale: "fr-FR".to_string(),
                timezone: "Africa/Tunis".to_string(),
                window_size: (1920, 1080),
                listing_timeout: Duration::from_secs(60),
                detail_timeout: Duration::from_secs(30),
                ready_timeout: Duration::from_secs(10),
                contact_timeout: Duration::from_secs(5),
            },
        }
    }
}

impl Config {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(host) = lookup("HOST") {
            config.server.host = host;
        }
        override_parsed(&lookup, "PORT", &mut config.server.port)?;

        if let Some(origin) = lookup("TAYARA_ORIGIN") {
            let origin = origin.trim_end_matches('/').to_string();
            config.pagination.search_base = format!("{}/ads", origin);
            config.browser.origin = origin;
        }

        let browser = &mut config.browser;
        override_parsed(&lookup, "SCRAPER_HEADLESS", &mut browser.headless)?;
        if let Some(ua) = lookup("SCRAPER_USER_AGENT") {
            browser.user_agent = ua;
        }
        if let Some(locale) = lookup("SCRAPER_LOCALE") {
            browser.locale = locale;
        }
        if let Some(tz) = lookup("SCRAPER_TIMEZONE") {
            browser.timezone = tz;
        }
        override_secs(&lookup, "SCRAPER_LISTING_TIMEOUT_SECS", &mut browser.listing_timeout)?;
        override_secs(&lookup, "SCRAPER_DETAIL_TIMEOUT_SECS", &mut browser.detail_timeout)?;
        override_secs(&lookup, "SCRAPER_READY_TIMEOUT_SECS", &mut browser.ready_timeout)?;
        override_secs(&lookup, "SCRAPER_CONTACT_TIMEOUT_SECS", &mut browser.contact_timeout)?;

        let pagination = &mut config.pagination;
        override_parsed(&lookup, "SCRAPER_FULL_PAGE_SIZE", &mut pagination.full_page_size)?;
        let mut delay_ms = pagination.page_delay.as_millis() as u64;
        override_parsed(&lookup, "SCRAPER_PAGE_DELAY_MS", &mut delay_ms)?;
        pagination.page_delay = Duration::from_millis(delay_ms);

        Ok(config)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn override_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw))?;
    }
    Ok(())
}

fn override_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut Duration) -> Result<()> {
    let mut secs = target.as_secs();
    override_parsed(lookup, key, &mut secs)?;
    *target = Duration::from_secs(secs);
    Ok(())
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
    fn defaults_match_site() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.browser.origin, "https://www.tayara.tn");
        assert_eq!(config.pagination.search_base, "https://www.tayara.tn/ads");
        assert_eq!(config.pagination.full_page_size, 30);
        assert_eq!(config.browser.window_size, (1920, 1080));
    }

    #[test]
    fn env_overrides_apply() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9090"),
            ("TAYARA_ORIGIN", "http://localhost:3000/"),
            ("SCRAPER_PAGE_DELAY_MS", "0"),
            ("SCRAPER_FULL_PAGE_SIZE", "25"),
            ("SCRAPER_HEADLESS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.browser.origin, "http://localhost:3000");
        assert_eq!(config.pagination.search_base, "http://localhost:3000/ads");
        assert_eq!(config.pagination.page_delay, Duration::ZERO);
        assert_eq!(config.pagination.full_page_size, 25);
        assert!(!config.browser.headless);
    }

    #[test]
    fn invalid_value_names_variable() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
