mod error;

pub use error::{internal_error, ApiError};

use crate::config::PaginationSettings;
use crate::models::{Product, ProductResponse};
use crate::scrapers::{search, ScraperTrait, SearchParams};
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

const MAX_PAGES_LIMIT: u32 = 50;

/// Shared by every handler; built once in `main`
pub struct AppState {
    pub scraper: Arc<dyn ScraperTrait>,
    pub pagination: PaginationSettings,
    /// Product URLs must start with this origin followed by `/`
    pub origin: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: String,
    category: String,
    subcategory: String,
    city: Option<String>,
    /// Product condition: "Neuf", "Occasion"
    status: Option<String>,
    min_price: Option<u64>,
    max_price: Option<u64>,
    #[serde(default = "default_max_pages")]
    max_pages: u32,
}

fn default_max_pages() -> u32 {
    3
}

impl SearchQuery {
    fn validate(&self) -> Result<(), ApiError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ApiError::BadRequest(
                    "min_price cannot be greater than max_price".to_string(),
                ));
            }
        }
        if !(1..=MAX_PAGES_LIMIT).contains(&self.max_pages) {
            return Err(ApiError::BadRequest(format!(
                "max_pages must be between 1 and {}",
                MAX_PAGES_LIMIT
            )));
        }
        Ok(())
    }

    fn into_params(self) -> (SearchParams, u32) {
        let params = SearchParams {
            query: self.query,
            category: self.category,
            subcategory: self.subcategory,
            city: self.city,
            condition: self.status,
            min_price: self.min_price,
            max_price: self.max_price,
        };
        (params, self.max_pages)
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    url: String,
}

#[get("/")]
async fn index(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": format!("{} Scraper API", state.scraper.source_name()),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/search": "Search products on Tayara.tn",
            "/product": "Get detailed product information from URL",
            "/health": "Service health check"
        }
    }))
}

#[get("/search")]
async fn search_products(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    query.validate()?;

    let (params, max_pages) = query.into_params();
    info!(
        "Search request: query={:?} category={:?} subcategory={:?} max_pages={}",
        params.query, params.category, params.subcategory, max_pages
    );

    let result = search(state.scraper.as_ref(), &params, max_pages, &state.pagination).await;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/product")]
async fn product_info(
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, ApiError> {
    let url = query.into_inner().url;
    if !url.starts_with(&format!("{}/", state.origin)) {
        return Err(ApiError::BadRequest(
            "URL must be a valid Tayara.tn product URL".to_string(),
        ));
    }

    let response = match state.scraper.scrape_product(&url).await {
        Ok(product) => ProductResponse {
            success: true,
            product,
            error: None,
        },
        Err(e) => {
            error!("Product info error: {}", e);
            ProductResponse {
                success: false,
                product: Product::placeholder(&url),
                error: Some(e.to_string()),
            }
        }
    };
    Ok(HttpResponse::Ok().json(response))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Endpoint not found" }))
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// Register all routes, the query error handler and the 404 fallback
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(query_config())
        .service(index)
        .service(search_products)
        .service(product_info)
        .service(health)
        .default_service(web::route().to(not_found));
}
