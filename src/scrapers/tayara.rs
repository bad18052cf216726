use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};
use crate::models::Product;
use crate::scrapers::browser::{BrowserSession, Readiness};
use crate::scrapers::extract::{
    parse_listing_page, parse_product_page, strip_contact_prefix, PHONE_BUTTON, PHONE_LINK,
};
use crate::scrapers::traits::ScraperTrait;
use async_trait::async_trait;
use tracing::{info, warn};

/// The second "Afficher numéro" button belongs to the seller card
const PHONE_BUTTON_INDEX: usize = 1;

/// Browser-backed Tayara scraper. Every call runs in its own browser session
/// on the blocking pool, so concurrent requests never share browser state.
pub struct TayaraBrowserScraper {
    settings: BrowserSettings,
}

impl TayaraBrowserScraper {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn listing_blocking(settings: &BrowserSettings, url: &str) -> Result<Vec<Product>> {
        let session = BrowserSession::launch(settings)?;
        session.open(url, Readiness::Listing, settings.listing_timeout)?;
        let html = session
            .page_html()
            .map_err(|e| ScrapeError::navigation(url, format!("{:#}", e)))?;
        Ok(parse_listing_page(&html, &settings.origin))
    }

    fn product_blocking(settings: &BrowserSettings, url: &str) -> Result<Product> {
        let session = BrowserSession::launch(settings)
            .map_err(|e| ScrapeError::extraction(url, e))?;
        session
            .open(url, Readiness::Detail, settings.detail_timeout)
            .map_err(|e| ScrapeError::extraction(url, e))?;

        let html = session
            .page_html()
            .map_err(|e| ScrapeError::extraction(url, format!("{:#}", e)))?;
        let seller_contact = match session.click_and_read(
            PHONE_BUTTON,
            PHONE_BUTTON_INDEX,
            PHONE_LINK,
            settings.contact_timeout,
        ) {
            Ok(text) => strip_contact_prefix(&text),
            Err(e) => {
                warn!("Could not extract contact info: {:#}", e);
                None
            }
        };

        parse_product_page(&html, url, seller_contact)
    }
}

#[async_trait]
impl ScraperTrait for TayaraBrowserScraper {
    async fn scrape_listing_page(&self, url: &str) -> Result<Vec<Product>> {
        info!("Scraping URL: {}", url);
        let settings = self.settings.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || Self::listing_blocking(&settings, &url)).await?
    }

    async fn scrape_product(&self, url: &str) -> Result<Product> {
        info!("Scraping product page: {}", url);
        let settings = self.settings.clone();
        let owned = url.to_string();
        tokio::task::spawn_blocking(move || Self::product_blocking(&settings, &owned))
            .await
            .map_err(|e| ScrapeError::extraction(url, e))?
    }

    fn source_name(&self) -> &'static str {
        "Tayara"
    }
}
