//! Portfolio assembly service.
//!
//! Joins the holdings store with the stock data coordinator, computes the
//! valuation arithmetic and caches the assembled snapshot. The service
//! depends only on the coordinator's output contract: quotes arrive in no
//! particular order and may carry partial or no data.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use folioview_market_data::{CacheStats, StockDataService, StockQuote, TtlCache};

use crate::errors::PortfolioError;
use crate::models::{EnrichedHolding, Holding, NewHolding, PortfolioSnapshot, SectorSummary};
use crate::store::HoldingsStore;

const PORTFOLIO_KEY: &str = "portfolio";
const HOLDINGS_KEY: &str = "holdings";

/// Cache lifetimes for the assembled views.
#[derive(Clone, Copy, Debug)]
pub struct PortfolioConfig {
    /// Lifetime of the assembled snapshot; quote-class freshness.
    pub snapshot_ttl: Duration,
    /// Lifetime of the holdings list.
    pub holdings_ttl: Duration,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(60),
            holdings_ttl: Duration::from_secs(300),
        }
    }
}

/// Introspection over the portfolio-level caches.
#[derive(Clone, Debug, Serialize)]
pub struct PortfolioCacheStats {
    pub snapshot: CacheStats,
    pub holdings: CacheStats,
}

/// Assembles the enriched portfolio view.
pub struct PortfolioService {
    holdings: Arc<HoldingsStore>,
    stock_data: Arc<StockDataService>,
    snapshot_cache: TtlCache<PortfolioSnapshot>,
    holdings_cache: TtlCache<Vec<Holding>>,
    config: PortfolioConfig,
}

impl PortfolioService {
    pub fn new(
        holdings: Arc<HoldingsStore>,
        stock_data: Arc<StockDataService>,
        config: PortfolioConfig,
    ) -> Self {
        Self {
            holdings,
            stock_data,
            snapshot_cache: TtlCache::new(),
            holdings_cache: TtlCache::new(),
            config,
        }
    }

    /// The holdings list, with a flag reporting whether it was served
    /// from cache.
    pub async fn get_holdings(&self) -> (Vec<Holding>, bool) {
        if let Some(cached) = self.holdings_cache.get(HOLDINGS_KEY) {
            return (cached, true);
        }
        let holdings = self.holdings.get_all().await;
        self.holdings_cache
            .set(HOLDINGS_KEY, holdings.clone(), self.config.holdings_ttl);
        (holdings, false)
    }

    /// A single holding by id.
    pub async fn get_holding(&self, id: &str) -> Result<Holding, PortfolioError> {
        self.holdings
            .get_by_id(id)
            .await
            .ok_or_else(|| PortfolioError::NotFound(id.to_string()))
    }

    /// Add a holding and drop the cached list so the next read sees it.
    pub async fn add_holding(&self, new: NewHolding) -> Result<Holding, PortfolioError> {
        let holding = self.holdings.add(new).await?;
        self.holdings_cache.delete(HOLDINGS_KEY);
        Ok(holding)
    }

    /// The assembled portfolio, with a flag reporting whether it was
    /// served from cache.
    pub async fn get_portfolio(&self) -> Result<(PortfolioSnapshot, bool), PortfolioError> {
        if let Some(cached) = self.snapshot_cache.get(PORTFOLIO_KEY) {
            return Ok((cached, true));
        }

        let holdings = self.holdings.get_all().await;
        let quotes = if holdings.is_empty() {
            Vec::new()
        } else {
            let symbols: Vec<String> =
                holdings.iter().map(|h| h.stock_symbol.clone()).collect();
            self.stock_data.get_stock_data(&symbols).await?
        };

        let snapshot = assemble_snapshot(&holdings, &quotes);
        self.snapshot_cache
            .set(PORTFOLIO_KEY, snapshot.clone(), self.config.snapshot_ttl);
        debug!(
            holdings = snapshot.holdings.len(),
            sectors = snapshot.sector_summaries.len(),
            "assembled portfolio snapshot"
        );
        Ok((snapshot, false))
    }

    /// Force the next reads to miss, then reassemble immediately.
    ///
    /// The stock-quote cache is deliberately left alone; its entries
    /// expire on their own schedule.
    pub async fn refresh(&self) -> Result<PortfolioSnapshot, PortfolioError> {
        self.snapshot_cache.delete(PORTFOLIO_KEY);
        self.holdings_cache.delete(HOLDINGS_KEY);
        let (snapshot, _) = self.get_portfolio().await?;
        Ok(snapshot)
    }

    /// Introspection over the portfolio-level caches.
    pub fn cache_stats(&self) -> PortfolioCacheStats {
        PortfolioCacheStats {
            snapshot: self.snapshot_cache.stats(),
            holdings: self.holdings_cache.stats(),
        }
    }
}

/// Join holdings with quotes and compute the valuation rollups.
fn assemble_snapshot(holdings: &[Holding], quotes: &[StockQuote]) -> PortfolioSnapshot {
    let quote_map: HashMap<&str, &StockQuote> =
        quotes.iter().map(|q| (q.symbol.as_str(), q)).collect();

    let mut enriched: Vec<EnrichedHolding> = holdings
        .iter()
        .map(|holding| {
            let symbol = holding.stock_symbol.trim().to_uppercase();
            enrich_holding(holding, quote_map.get(symbol.as_str()).copied())
        })
        .collect();

    let total_investment: Decimal = enriched.iter().map(|h| h.investment).sum();
    if total_investment > Decimal::ZERO {
        for holding in &mut enriched {
            holding.portfolio_percentage =
                holding.investment / total_investment * Decimal::ONE_HUNDRED;
        }
    }

    let sector_summaries = summarize_sectors(&enriched);

    let total_present_value: Decimal = enriched
        .iter()
        .map(|h| h.present_value.unwrap_or(Decimal::ZERO))
        .sum();
    let total_gain_loss = total_present_value - total_investment;
    let total_gain_loss_percentage = if total_investment > Decimal::ZERO {
        total_gain_loss / total_investment * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    PortfolioSnapshot {
        holdings: enriched,
        sector_summaries,
        total_investment,
        total_present_value,
        total_gain_loss,
        total_gain_loss_percentage,
        last_updated: Utc::now(),
    }
}

/// Join one holding with its quote, if any. Missing market data leaves
/// the derived valuation fields absent.
fn enrich_holding(holding: &Holding, quote: Option<&StockQuote>) -> EnrichedHolding {
    let investment = holding.purchase_price * holding.quantity;
    let cmp = quote.and_then(|q| q.price);
    let present_value = cmp.map(|price| price * holding.quantity);
    let gain_loss = present_value.map(|pv| pv - investment);
    let gain_loss_percentage = gain_loss.and_then(|gl| {
        if investment > Decimal::ZERO {
            Some(gl / investment * Decimal::ONE_HUNDRED)
        } else {
            None
        }
    });

    EnrichedHolding {
        id: holding.id.clone(),
        stock_name: holding.stock_name.clone(),
        stock_symbol: holding.stock_symbol.clone(),
        exchange: holding.exchange.clone(),
        sector: holding.sector.clone(),
        purchase_price: holding.purchase_price,
        quantity: holding.quantity,
        investment,
        portfolio_percentage: Decimal::ZERO,
        cmp,
        present_value,
        gain_loss,
        gain_loss_percentage,
        pe_ratio: quote.and_then(|q| q.pe_ratio),
        latest_earnings: quote.and_then(|q| q.latest_earnings.clone()),
    }
}

/// Group enriched holdings by sector, preserving first-appearance order.
fn summarize_sectors(enriched: &[EnrichedHolding]) -> Vec<SectorSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<EnrichedHolding>> = HashMap::new();
    for holding in enriched {
        let sector = holding.sector.as_str();
        if !grouped.contains_key(sector) {
            order.push(sector);
        }
        grouped.entry(sector).or_default().push(holding.clone());
    }

    order
        .into_iter()
        .map(|sector| {
            let holdings = grouped.remove(sector).unwrap_or_default();
            let total_investment: Decimal = holdings.iter().map(|h| h.investment).sum();
            let total_present_value: Decimal = holdings
                .iter()
                .map(|h| h.present_value.unwrap_or(Decimal::ZERO))
                .sum();
            let gain_loss = total_present_value - total_investment;
            let gain_loss_percentage = if total_investment > Decimal::ZERO {
                gain_loss / total_investment * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };

            SectorSummary {
                sector: sector.to_string(),
                total_investment,
                total_present_value,
                gain_loss,
                gain_loss_percentage,
                holdings,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use folioview_market_data::{
        FetchConfig, MarketDataError, MarketDataFetcher, SecondaryMetrics,
    };
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPriceFetcher {
        prices: HashMap<String, Decimal>,
        calls: AtomicUsize,
    }

    impl FixedPriceFetcher {
        fn new(prices: &[(&str, Decimal)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|(s, p)| (s.to_string(), *p))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataFetcher for FixedPriceFetcher {
        async fn fetch_price(&self, symbol: &str) -> Result<Option<Decimal>, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.prices.get(symbol).copied())
        }

        async fn fetch_secondary_metrics(
            &self,
            _symbol: &str,
        ) -> Result<SecondaryMetrics, MarketDataError> {
            Ok(SecondaryMetrics {
                pe_ratio: Some(dec!(20)),
                latest_earnings: None,
            })
        }
    }

    fn holding(id: &str, symbol: &str, sector: &str, price: Decimal, qty: Decimal) -> Holding {
        Holding {
            id: id.to_string(),
            stock_name: symbol.to_string(),
            stock_symbol: symbol.to_string(),
            exchange: "NSE".to_string(),
            sector: sector.to_string(),
            purchase_price: price,
            quantity: qty,
            created_at: None,
        }
    }

    fn quote(symbol: &str, price: Option<Decimal>) -> StockQuote {
        StockQuote::new(symbol.to_string(), price, SecondaryMetrics::default())
    }

    #[test]
    fn test_enrich_holding_arithmetic() {
        let h = holding("1", "INFY", "IT", dec!(1200), dec!(10));
        let q = quote("INFY", Some(dec!(1500)));

        let enriched = enrich_holding(&h, Some(&q));

        assert_eq!(enriched.investment, dec!(12000));
        assert_eq!(enriched.cmp, Some(dec!(1500)));
        assert_eq!(enriched.present_value, Some(dec!(15000)));
        assert_eq!(enriched.gain_loss, Some(dec!(3000)));
        assert_eq!(enriched.gain_loss_percentage, Some(dec!(25)));
    }

    #[test]
    fn test_enrich_holding_without_price_stays_unavailable() {
        let h = holding("1", "INFY", "IT", dec!(1200), dec!(10));
        let q = quote("INFY", None);

        let enriched = enrich_holding(&h, Some(&q));

        assert_eq!(enriched.investment, dec!(12000));
        assert!(enriched.cmp.is_none());
        assert!(enriched.present_value.is_none());
        assert!(enriched.gain_loss.is_none());
        assert!(enriched.gain_loss_percentage.is_none());
    }

    #[test]
    fn test_snapshot_totals_and_percentages() {
        let holdings = vec![
            holding("1", "INFY", "IT", dec!(1000), dec!(10)),
            holding("2", "TCS", "IT", dec!(3000), dec!(10)),
            holding("3", "RELIANCE", "Energy", dec!(2000), dec!(5)),
        ];
        let quotes = vec![
            quote("INFY", Some(dec!(1100))),
            quote("TCS", Some(dec!(2900))),
            quote("RELIANCE", None),
        ];

        let snapshot = assemble_snapshot(&holdings, &quotes);

        assert_eq!(snapshot.total_investment, dec!(50000));
        // 11000 + 29000; the unpriced holding contributes nothing.
        assert_eq!(snapshot.total_present_value, dec!(40000));
        assert_eq!(snapshot.total_gain_loss, dec!(-10000));
        assert_eq!(snapshot.total_gain_loss_percentage, dec!(-20));

        assert_eq!(snapshot.holdings[0].portfolio_percentage, dec!(20));
        assert_eq!(snapshot.holdings[1].portfolio_percentage, dec!(60));
        assert_eq!(snapshot.holdings[2].portfolio_percentage, dec!(20));
    }

    #[test]
    fn test_sector_grouping_preserves_order() {
        let holdings = vec![
            holding("1", "INFY", "IT", dec!(1000), dec!(10)),
            holding("2", "RELIANCE", "Energy", dec!(2000), dec!(5)),
            holding("3", "TCS", "IT", dec!(3000), dec!(10)),
        ];
        let quotes = vec![
            quote("INFY", Some(dec!(1200))),
            quote("RELIANCE", Some(dec!(2000))),
            quote("TCS", Some(dec!(3000))),
        ];

        let snapshot = assemble_snapshot(&holdings, &quotes);

        assert_eq!(snapshot.sector_summaries.len(), 2);
        let it = &snapshot.sector_summaries[0];
        assert_eq!(it.sector, "IT");
        assert_eq!(it.holdings.len(), 2);
        assert_eq!(it.total_investment, dec!(40000));
        assert_eq!(it.total_present_value, dec!(42000));
        assert_eq!(it.gain_loss, dec!(2000));
        assert_eq!(it.gain_loss_percentage, dec!(5));

        assert_eq!(snapshot.sector_summaries[1].sector, "Energy");
    }

    #[test]
    fn test_empty_portfolio_assembles_to_zeroes() {
        let snapshot = assemble_snapshot(&[], &[]);

        assert!(snapshot.holdings.is_empty());
        assert!(snapshot.sector_summaries.is_empty());
        assert_eq!(snapshot.total_investment, Decimal::ZERO);
        assert_eq!(snapshot.total_gain_loss_percentage, Decimal::ZERO);
    }

    fn service_with_fetcher(fetcher: Arc<FixedPriceFetcher>) -> PortfolioService {
        let stock_data = Arc::new(StockDataService::new(fetcher, FetchConfig::default()));
        PortfolioService::new(
            Arc::new(HoldingsStore::new()),
            stock_data,
            PortfolioConfig::default(),
        )
    }

    fn seed_prices() -> Arc<FixedPriceFetcher> {
        Arc::new(FixedPriceFetcher::new(&[
            ("INFY", dec!(1500)),
            ("TCS", dec!(4000)),
            ("RELIANCE", dec!(2600)),
            ("HDFCBANK", dec!(1700)),
            ("HINDUNILVR", dec!(2400)),
        ]))
    }

    #[tokio::test]
    async fn test_get_portfolio_caches_snapshot() {
        let fetcher = seed_prices();
        let service = service_with_fetcher(fetcher.clone());

        let (first, cached) = service.get_portfolio().await.unwrap();
        assert!(!cached);
        assert_eq!(first.holdings.len(), 5);

        let (second, cached) = service.get_portfolio().await.unwrap();
        assert!(cached);
        assert_eq!(second, first);
        // All five symbols fetched exactly once.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_refresh_invalidates_and_reassembles() {
        let fetcher = seed_prices();
        let service = service_with_fetcher(fetcher.clone());

        service.get_portfolio().await.unwrap();
        service.refresh().await.unwrap();

        let (_, cached) = service.get_portfolio().await.unwrap();
        assert!(cached);
        // The snapshot was rebuilt, but the quote cache still held every
        // symbol, so no second round of fetches happened.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_add_holding_clears_cached_list() {
        let fetcher = seed_prices();
        let service = service_with_fetcher(fetcher);

        let (holdings, cached) = service.get_holdings().await;
        assert!(!cached);
        assert_eq!(holdings.len(), 5);

        let (_, cached) = service.get_holdings().await;
        assert!(cached);

        service
            .add_holding(NewHolding {
                stock_name: "Wipro Limited".to_string(),
                stock_symbol: "WIPRO".to_string(),
                exchange: "NSE".to_string(),
                sector: "Information Technology".to_string(),
                purchase_price: dec!(450),
                quantity: dec!(20),
            })
            .await
            .unwrap();

        let (holdings, cached) = service.get_holdings().await;
        assert!(!cached);
        assert_eq!(holdings.len(), 6);
    }

    #[tokio::test]
    async fn test_get_holding_not_found() {
        let service = service_with_fetcher(seed_prices());

        assert!(service.get_holding("1").await.is_ok());
        assert!(matches!(
            service.get_holding("missing").await.unwrap_err(),
            PortfolioError::NotFound(_)
        ));
    }
}
