//! HTTP fetcher over the real upstream sources.
//!
//! Three best-effort paths feed a quote:
//! - Price: Yahoo chart endpoint, JSON.
//! - Secondary metrics: BSE stock-search endpoint, JSON.
//! - Scrape fallback: Google Finance quote page, regex over untrusted HTML,
//!   consulted only when the structured source answered without a P/E.
//!
//! Each call carries its own timeout; exceeding it cancels the in-flight
//! request and surfaces as an ordinary upstream failure.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::fetcher::MarketDataFetcher;
use crate::models::SecondaryMetrics;

const QUOTE_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const METRICS_BASE_URL: &str = "https://api.bseindia.com/BseIndiaAPI/api/StockSearchapi";
const SCRAPE_BASE_URL: &str = "https://www.google.com/finance/quote";

const PRICE_PROVIDER: &str = "YAHOO_CHART";
const METRICS_PROVIDER: &str = "BSE_SEARCH";
const SCRAPE_PROVIDER: &str = "GOOGLE_FINANCE";

/// Sources answer differently to non-browser agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

lazy_static! {
    // The scraped markup format is not guaranteed stable; both patterns are
    // best-effort extraction over whatever the page serves today.
    static ref PE_RATIO_RE: Regex =
        Regex::new(r"(?i)P/E ratio[\s\S]{0,200}?([0-9][0-9.]*)").unwrap();
    static ref EARNINGS_DATE_RE: Regex =
        Regex::new(r"(?i)Earnings date[\s\S]{0,200}?([A-Za-z]{3}\s+\d{1,2},\s+\d{4})").unwrap();
}

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the Yahoo chart endpoint.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    /// Result array; a single element is expected for a single-symbol call
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    /// Current market price
    #[serde(default)]
    regular_market_price: Option<f64>,
}

/// Response from the BSE stock-search endpoint.
#[derive(Debug, Deserialize)]
struct StockSearchResponse {
    /// Matching scrips; the first entry is the symbol itself
    #[serde(default)]
    scripinfo: Option<Vec<ScripInfo>>,
}

#[derive(Debug, Deserialize)]
struct ScripInfo {
    /// P/E ratio; the source serves it as a string or a number depending
    /// on the scrip
    #[serde(rename = "PERatio", default)]
    pe_ratio: Option<Value>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Per-source timeouts for the HTTP fetcher.
#[derive(Clone, Copy, Debug)]
pub struct FetcherConfig {
    /// Deadline for the price endpoint.
    pub price_timeout: Duration,
    /// Deadline for the structured secondary-metrics endpoint.
    pub metrics_timeout: Duration,
    /// Deadline for the scrape fallback.
    pub scrape_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            price_timeout: Duration::from_secs(10),
            metrics_timeout: Duration::from_secs(10),
            scrape_timeout: Duration::from_secs(5),
        }
    }
}

// ============================================================================
// HttpFetcher
// ============================================================================

/// Fetcher over the real upstream HTTP sources.
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    /// Create a fetcher with the given per-source timeouts.
    pub fn new(config: FetcherConfig) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    /// GET `url` and return the body, mapping every failure mode onto
    /// [`MarketDataError`]. The timeout cancels the in-flight call.
    async fn get_text(
        &self,
        provider: &'static str,
        url: &str,
        timeout: Duration,
    ) -> Result<String, MarketDataError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(provider, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::UpstreamStatus {
                provider: provider.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_transport_error(provider, e))
    }

    /// Structured secondary source: BSE stock search.
    ///
    /// Only the P/E ratio is available here; the earnings date comes from
    /// the scrape fallback when needed.
    async fn fetch_structured_metrics(
        &self,
        symbol: &str,
    ) -> Result<SecondaryMetrics, MarketDataError> {
        let url = format!("{}/{}/st/true", METRICS_BASE_URL, symbol);
        let body = self
            .get_text(METRICS_PROVIDER, &url, self.config.metrics_timeout)
            .await?;

        let parsed: StockSearchResponse =
            serde_json::from_str(&body).map_err(|e| MarketDataError::MalformedPayload {
                provider: METRICS_PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        Ok(SecondaryMetrics {
            pe_ratio: parse_scrip_pe_ratio(&parsed),
            latest_earnings: None,
        })
    }

    /// Scrape fallback: Google Finance quote page.
    async fn scrape_fallback_metrics(
        &self,
        symbol: &str,
    ) -> Result<SecondaryMetrics, MarketDataError> {
        let url = format!("{}/{}:NSE", SCRAPE_BASE_URL, symbol);
        let html = self
            .get_text(SCRAPE_PROVIDER, &url, self.config.scrape_timeout)
            .await?;

        Ok(SecondaryMetrics {
            pe_ratio: parse_pe_from_html(&html),
            latest_earnings: parse_earnings_from_html(&html),
        })
    }
}

#[async_trait]
impl MarketDataFetcher for HttpFetcher {
    async fn fetch_price(&self, symbol: &str) -> Result<Option<Decimal>, MarketDataError> {
        let url = format!(
            "{}/{}.NS?interval=1d&range=1d",
            QUOTE_BASE_URL, symbol
        );
        let body = self
            .get_text(PRICE_PROVIDER, &url, self.config.price_timeout)
            .await?;

        let chart: ChartResponse =
            serde_json::from_str(&body).map_err(|e| MarketDataError::MalformedPayload {
                provider: PRICE_PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        // A decodable payload without a price is absence, not failure.
        Ok(parse_chart_price(&chart))
    }

    async fn fetch_secondary_metrics(
        &self,
        symbol: &str,
    ) -> Result<SecondaryMetrics, MarketDataError> {
        match self.fetch_structured_metrics(symbol).await {
            Ok(metrics) if metrics.pe_ratio.is_some() => Ok(metrics),
            Ok(_) => {
                // Structured source answered without a P/E; consult the
                // scrape fallback before settling for nulls.
                debug!(symbol, "no P/E from structured source, trying scrape fallback");
                match self.scrape_fallback_metrics(symbol).await {
                    Ok(metrics) => Ok(metrics),
                    Err(e) => {
                        warn!(symbol, error = %e, "scrape fallback failed");
                        Ok(SecondaryMetrics::default())
                    }
                }
            }
            Err(e) => {
                // Secondary metrics degrade to nulls rather than failing
                // the fetch; only the price path is retry-worthy.
                warn!(symbol, error = %e, "secondary metrics source failed");
                Ok(SecondaryMetrics::default())
            }
        }
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

fn classify_transport_error(provider: &str, err: reqwest::Error) -> MarketDataError {
    if err.is_timeout() {
        MarketDataError::Timeout {
            provider: provider.to_string(),
        }
    } else {
        MarketDataError::Network(err)
    }
}

/// Extract the market price from a decoded chart response.
fn parse_chart_price(chart: &ChartResponse) -> Option<Decimal> {
    chart
        .chart
        .result
        .as_deref()?
        .first()?
        .meta
        .regular_market_price
        .and_then(Decimal::from_f64)
}

/// Extract the P/E ratio from a decoded stock-search response, tolerating
/// both string and numeric encodings.
fn parse_scrip_pe_ratio(response: &StockSearchResponse) -> Option<Decimal> {
    let value = response.scripinfo.as_deref()?.first()?.pe_ratio.as_ref()?;
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        _ => None,
    }
}

/// Pull a P/E ratio out of scraped quote-page HTML.
fn parse_pe_from_html(html: &str) -> Option<Decimal> {
    PE_RATIO_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Pull an earnings date out of scraped quote-page HTML.
fn parse_earnings_from_html(html: &str) -> Option<String> {
    EARNINGS_DATE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
