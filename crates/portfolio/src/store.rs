//! In-memory holdings store.
//!
//! Stands in for a persistent store: the seed list mirrors a small NSE
//! portfolio and mutations live only for the process lifetime.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::PortfolioError;
use crate::models::{Holding, NewHolding};

/// Process-lifetime holdings store.
pub struct HoldingsStore {
    holdings: RwLock<Vec<Holding>>,
}

impl HoldingsStore {
    /// Create a store with the seed portfolio.
    pub fn new() -> Self {
        Self {
            holdings: RwLock::new(seed_holdings()),
        }
    }

    /// Create an empty store.
    pub fn empty() -> Self {
        Self {
            holdings: RwLock::new(Vec::new()),
        }
    }

    /// All holdings, in insertion order.
    pub async fn get_all(&self) -> Vec<Holding> {
        self.holdings.read().await.clone()
    }

    /// A single holding by id.
    pub async fn get_by_id(&self, id: &str) -> Option<Holding> {
        self.holdings
            .read()
            .await
            .iter()
            .find(|h| h.id == id)
            .cloned()
    }

    /// Validate and append a new holding.
    pub async fn add(&self, new: NewHolding) -> Result<Holding, PortfolioError> {
        validate_new_holding(&new)?;

        let holding = Holding {
            id: Uuid::new_v4().to_string(),
            stock_name: new.stock_name,
            stock_symbol: new.stock_symbol.trim().to_uppercase(),
            exchange: new.exchange,
            sector: new.sector,
            purchase_price: new.purchase_price,
            quantity: new.quantity,
            created_at: Some(Utc::now()),
        };

        self.holdings.write().await.push(holding.clone());
        Ok(holding)
    }
}

impl Default for HoldingsStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_new_holding(new: &NewHolding) -> Result<(), PortfolioError> {
    for (field, value) in [
        ("stock_name", &new.stock_name),
        ("stock_symbol", &new.stock_symbol),
        ("exchange", &new.exchange),
        ("sector", &new.sector),
    ] {
        if value.trim().is_empty() {
            return Err(PortfolioError::Validation(format!(
                "{} is required",
                field
            )));
        }
    }
    if new.purchase_price <= Decimal::ZERO {
        return Err(PortfolioError::Validation(
            "purchase_price must be positive".to_string(),
        ));
    }
    if new.quantity <= Decimal::ZERO {
        return Err(PortfolioError::Validation(
            "quantity must be positive".to_string(),
        ));
    }
    Ok(())
}

fn seed_holdings() -> Vec<Holding> {
    let seed = |id: &str,
                name: &str,
                symbol: &str,
                sector: &str,
                price: i64,
                quantity: i64,
                (y, m, d): (i32, u32, u32)| Holding {
        id: id.to_string(),
        stock_name: name.to_string(),
        stock_symbol: symbol.to_string(),
        exchange: "NSE".to_string(),
        sector: sector.to_string(),
        purchase_price: Decimal::from(price),
        quantity: Decimal::from(quantity),
        created_at: Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single(),
    };

    vec![
        seed(
            "1",
            "Infosys Limited",
            "INFY",
            "Information Technology",
            1200,
            10,
            (2024, 1, 15),
        ),
        seed(
            "2",
            "Tata Consultancy Services",
            "TCS",
            "Information Technology",
            3500,
            5,
            (2024, 2, 20),
        ),
        seed(
            "3",
            "Reliance Industries",
            "RELIANCE",
            "Energy",
            2500,
            8,
            (2024, 3, 10),
        ),
        seed("4", "HDFC Bank", "HDFCBANK", "Banking", 1600, 15, (2024, 4, 5)),
        seed(
            "5",
            "Hindustan Unilever",
            "HINDUNILVR",
            "FMCG",
            2200,
            6,
            (2024, 5, 12),
        ),
    ]
}
