use crate::error::Result;
use crate::models::Product;
use async_trait::async_trait;

/// Page-level scraping capability shared by the search and detail endpoints.
/// The browser-backed implementation is `TayaraBrowserScraper`; tests swap in
/// scripted ones.
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Scrape every listing card on one search results page
    async fn scrape_listing_page(&self, url: &str) -> Result<Vec<Product>>;

    /// Scrape one product detail page
    async fn scrape_product(&self, url: &str) -> Result<Product>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
