mod api;
mod config;
mod error;
mod models;
mod scrapers;

use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use config::Config;
use scrapers::TayaraBrowserScraper;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    info!("🛒 Tayara Scout - Scraper API");
    info!("Target site: {}", config.browser.origin);

    let state = web::Data::new(api::AppState {
        scraper: Arc::new(TayaraBrowserScraper::new(config.browser.clone())),
        pagination: config.pagination.clone(),
        origin: config.browser.origin.clone(),
    });

    let (host, port) = config.bind_addr();
    info!("Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, api::internal_error))
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run()
    .await
    .context("Server error")?;

    Ok(())
}
