//! Stock data coordinator.
//!
//! [`StockDataService`] is the sole public entry point of this crate. For a
//! batch of symbols it deduplicates the input, serves live cache entries,
//! shares in-flight fetches between concurrent callers, retries upstream
//! failures with exponential backoff, and writes every outcome back into
//! the cache. A failure fetching one symbol never fails the batch.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tracing::{debug, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::errors::MarketDataError;
use crate::fetcher::MarketDataFetcher;
use crate::models::StockQuote;

/// A fetch that concurrent callers can await together. The future resolves
/// once; every clone observes the same [`StockQuote`].
type SharedFetch = Shared<BoxFuture<'static, StockQuote>>;

type InFlightTable = Mutex<HashMap<String, SharedFetch>>;

/// Coordinator tuning. All values are pre-resolved by the caller; the
/// service has no configuration source of its own.
#[derive(Clone, Copy, Debug)]
pub struct FetchConfig {
    /// Retries after the initial attempt, so `max_retries + 1` attempts total.
    pub max_retries: u32,
    /// Base backoff delay; attempt `n` waits `2^(n-1) * backoff_base`.
    pub backoff_base: Duration,
    /// Cache lifetime for resolved quotes.
    pub quote_ttl: Duration,
    /// Cache lifetime for exhausted fetches, kept short so recovery is
    /// observed quickly.
    pub error_ttl: Duration,
    /// Upper bound on symbols per batch call.
    pub max_batch_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            quote_ttl: Duration::from_secs(60),
            error_ttl: Duration::from_secs(10),
            max_batch_size: 50,
        }
    }
}

/// Batch coordinator over a [`MarketDataFetcher`].
///
/// Construct one instance at startup and share it by handle; the cache and
/// the in-flight table are process-lifetime state, reset on restart.
pub struct StockDataService {
    fetcher: Arc<dyn MarketDataFetcher>,
    cache: Arc<TtlCache<StockQuote>>,
    in_flight: Arc<InFlightTable>,
    config: FetchConfig,
}

impl StockDataService {
    /// Create a coordinator over the given fetcher.
    pub fn new(fetcher: Arc<dyn MarketDataFetcher>, config: FetchConfig) -> Self {
        Self {
            fetcher,
            cache: Arc::new(TtlCache::new()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Fetch quotes for a batch of symbols.
    ///
    /// The input is normalized (trimmed, uppercased) and deduplicated.
    /// Live cache entries are served directly; the rest are fetched in
    /// parallel, joining any fetch already in flight for the same symbol.
    /// Returns cached quotes first, then fresh ones; order is otherwise
    /// not guaranteed.
    ///
    /// # Errors
    ///
    /// Only malformed input fails the call: an empty batch, a batch above
    /// the configured limit, or a blank symbol. Upstream failures are
    /// reported in-band through each quote's `error` field.
    pub async fn get_stock_data(
        &self,
        symbols: &[String],
    ) -> Result<Vec<StockQuote>, MarketDataError> {
        let unique = self.validate_batch(symbols)?;

        let mut quotes = Vec::with_capacity(unique.len());
        let mut misses = Vec::new();
        for symbol in unique {
            match self.cache.get(&symbol) {
                Some(quote) => quotes.push(quote),
                None => misses.push(symbol),
            }
        }

        if misses.is_empty() {
            return Ok(quotes);
        }

        debug!(
            cached = quotes.len(),
            to_fetch = misses.len(),
            "resolving stock data batch"
        );

        // Register every miss before awaiting anything so the whole set
        // fetches in parallel.
        let fetches: Vec<SharedFetch> = misses
            .into_iter()
            .map(|symbol| self.join_or_register(symbol))
            .collect();

        quotes.extend(futures::future::join_all(fetches).await);
        Ok(quotes)
    }

    /// Introspection snapshot of the quote cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop the cached quote for `symbol`, forcing the next batch that
    /// references it to fetch fresh data.
    pub fn invalidate(&self, symbol: &str) {
        self.cache.delete(&symbol.trim().to_uppercase());
    }

    /// Drop every cached quote.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Normalize, validate and deduplicate a symbol batch.
    fn validate_batch(&self, symbols: &[String]) -> Result<Vec<String>, MarketDataError> {
        if symbols.is_empty() {
            return Err(MarketDataError::InvalidSymbolBatch {
                message: "at least one symbol is required".to_string(),
            });
        }
        if symbols.len() > self.config.max_batch_size {
            return Err(MarketDataError::InvalidSymbolBatch {
                message: format!(
                    "maximum {} symbols allowed per request",
                    self.config.max_batch_size
                ),
            });
        }

        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for raw in symbols {
            let symbol = raw.trim().to_uppercase();
            if symbol.is_empty() {
                return Err(MarketDataError::InvalidSymbolBatch {
                    message: "blank symbol in batch".to_string(),
                });
            }
            if seen.insert(symbol.clone()) {
                unique.push(symbol);
            }
        }
        Ok(unique)
    }

    /// Join the in-flight fetch for `symbol`, or register a new one.
    ///
    /// Check-then-insert happens under a single lock so that concurrent
    /// batches referencing the same symbol share exactly one fetch.
    fn join_or_register(&self, symbol: String) -> SharedFetch {
        let mut in_flight = lock_table(&self.in_flight);
        if let Some(existing) = in_flight.get(&symbol) {
            debug!(%symbol, "joining in-flight fetch");
            return existing.clone();
        }

        let fetch = Self::fetch_and_store(
            symbol.clone(),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.cache),
            Arc::clone(&self.in_flight),
            self.config,
        )
        .boxed()
        .shared();
        in_flight.insert(symbol, fetch.clone());
        fetch
    }

    /// Resolve one symbol: bounded retry around the fetcher, write-back to
    /// the cache, and removal from the in-flight table exactly once,
    /// however the fetch settled.
    async fn fetch_and_store(
        symbol: String,
        fetcher: Arc<dyn MarketDataFetcher>,
        cache: Arc<TtlCache<StockQuote>>,
        in_flight: Arc<InFlightTable>,
        config: FetchConfig,
    ) -> StockQuote {
        let mut last_error = String::new();
        let mut resolved = None;

        for attempt in 0..=config.max_retries {
            if attempt > 0 {
                let delay = config.backoff_base * 2u32.pow(attempt - 1);
                debug!(%symbol, attempt, ?delay, "backing off before retry");
                tokio::time::sleep(delay).await;
            }

            match Self::fetch_once(fetcher.as_ref(), &symbol).await {
                Ok(quote) => {
                    resolved = Some(quote);
                    break;
                }
                Err(e) => {
                    warn!(%symbol, attempt, error = %e, "fetch attempt failed");
                    last_error = e.to_string();
                }
            }
        }

        let quote = resolved
            .unwrap_or_else(|| StockQuote::failed(symbol.clone(), last_error));

        let ttl = if quote.is_failed() {
            config.error_ttl
        } else {
            config.quote_ttl
        };
        cache.set(&symbol, quote.clone(), ttl);

        // Settled: release the symbol so a later batch can fetch fresh
        // data once the cache entry expires or is invalidated.
        lock_table(&in_flight).remove(&symbol);

        quote
    }

    /// One fetch attempt: price and secondary metrics in parallel, either
    /// failure fails the attempt.
    async fn fetch_once(
        fetcher: &dyn MarketDataFetcher,
        symbol: &str,
    ) -> Result<StockQuote, MarketDataError> {
        let (price, metrics) = tokio::join!(
            fetcher.fetch_price(symbol),
            fetcher.fetch_secondary_metrics(symbol)
        );
        Ok(StockQuote::new(symbol.to_string(), price?, metrics?))
    }
}

/// Lock the in-flight table, recovering from poison if necessary.
fn lock_table(table: &InFlightTable) -> MutexGuard<'_, HashMap<String, SharedFetch>> {
    table.lock().unwrap_or_else(|poisoned| {
        warn!("in-flight table mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}
