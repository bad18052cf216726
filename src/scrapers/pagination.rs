use crate::config::PaginationSettings;
use crate::models::SearchResponse;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchParams;
use tracing::{error, info};

/// Scrape search results page by page, strictly in order.
///
/// Stops on an empty page, on a page shorter than `full_page_size`, or after
/// `max_pages`. A failed page is logged and skipped; it never aborts the run.
pub async fn search(
    scraper: &dyn ScraperTrait,
    params: &SearchParams,
    max_pages: u32,
    settings: &PaginationSettings,
) -> SearchResponse {
    let mut all_products = Vec::new();
    let mut current_page = 1;

    while current_page <= max_pages {
        let url = params.build_url(&settings.search_base, current_page);
        info!("Scraping page {}: {}", current_page, url);

        let products = match scraper.scrape_listing_page(&url).await {
            Ok(products) => products,
            Err(e) => {
                error!("Error scraping page {}: {}", current_page, e);
                current_page += 1;
                continue;
            }
        };

        if products.is_empty() {
            info!("No products found on page {}, stopping", current_page);
            break;
        }

        let page_len = products.len();
        all_products.extend(products);
        info!("Total products so far: {}", all_products.len());

        if page_len < settings.full_page_size {
            info!(
                "Got only {} products on page {}, assuming last page",
                page_len, current_page
            );
            break;
        }

        current_page += 1;
        if current_page <= max_pages && !settings.page_delay.is_zero() {
            tokio::time::sleep(settings.page_delay).await;
        }
    }

    SearchResponse::from_products(all_products)
}
