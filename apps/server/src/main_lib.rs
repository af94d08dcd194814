use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use folioview_market_data::{
    FetchConfig, FetcherConfig, HttpFetcher, MarketDataFetcher, StockDataService,
};
use folioview_portfolio::{HoldingsStore, PortfolioConfig, PortfolioService};

use crate::config::Config;

/// Process-wide service handles, constructed once at startup and shared
/// by reference with every handler.
pub struct AppState {
    pub stock_service: Arc<StockDataService>,
    pub portfolio_service: Arc<PortfolioService>,
}

pub fn init_tracing() {
    let log_format = std::env::var("FV_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Build the application state over the real HTTP fetcher.
pub fn build_state(config: &Config) -> Arc<AppState> {
    let fetcher = Arc::new(HttpFetcher::new(FetcherConfig {
        price_timeout: config.price_timeout,
        metrics_timeout: config.metrics_timeout,
        scrape_timeout: config.scrape_timeout,
    }));
    build_state_with_fetcher(config, fetcher)
}

/// Build the application state over an arbitrary fetcher. Tests inject
/// their own implementations here.
pub fn build_state_with_fetcher(
    config: &Config,
    fetcher: Arc<dyn MarketDataFetcher>,
) -> Arc<AppState> {
    let stock_service = Arc::new(StockDataService::new(
        fetcher,
        FetchConfig {
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
            quote_ttl: config.quote_ttl,
            error_ttl: config.error_ttl,
            max_batch_size: config.max_batch_size,
        },
    ));

    let holdings = Arc::new(HoldingsStore::new());
    let portfolio_service = Arc::new(PortfolioService::new(
        holdings,
        Arc::clone(&stock_service),
        PortfolioConfig {
            snapshot_ttl: config.quote_ttl,
            holdings_ttl: config.holdings_ttl,
        },
    ));

    Arc::new(AppState {
        stock_service,
        portfolio_service,
    })
}
