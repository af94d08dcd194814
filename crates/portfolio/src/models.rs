//! Portfolio data models.
//!
//! `Holding` keeps the snake_case wire format of the holdings store;
//! the enriched view and its rollups are camelCase, matching what the
//! dashboard consumes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A position in the portfolio as stored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    pub id: String,
    pub stock_name: String,
    pub stock_symbol: String,
    pub exchange: String,
    pub sector: String,
    pub purchase_price: Decimal,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Caller-supplied fields for a new holding.
#[derive(Clone, Debug, Deserialize)]
pub struct NewHolding {
    pub stock_name: String,
    pub stock_symbol: String,
    pub exchange: String,
    pub sector: String,
    pub purchase_price: Decimal,
    pub quantity: Decimal,
}

/// A holding joined with market data and valuation arithmetic.
///
/// Valuation fields derived from the market price stay `None` when no
/// price was available, so the dashboard renders them as unavailable
/// instead of blocking on the whole view.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedHolding {
    pub id: String,
    pub stock_name: String,
    pub stock_symbol: String,
    pub exchange: String,
    pub sector: String,
    pub purchase_price: Decimal,
    pub quantity: Decimal,
    /// Cost basis: purchase price times quantity.
    pub investment: Decimal,
    /// Share of the total portfolio investment, in percent.
    pub portfolio_percentage: Decimal,
    /// Current market price, if the quote carried one.
    pub cmp: Option<Decimal>,
    pub present_value: Option<Decimal>,
    pub gain_loss: Option<Decimal>,
    pub gain_loss_percentage: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub latest_earnings: Option<String>,
}

/// Per-sector rollup of enriched holdings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub sector: String,
    pub total_investment: Decimal,
    pub total_present_value: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_percentage: Decimal,
    pub holdings: Vec<EnrichedHolding>,
}

/// The complete assembled portfolio view.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub holdings: Vec<EnrichedHolding>,
    pub sector_summaries: Vec<SectorSummary>,
    pub total_investment: Decimal,
    pub total_present_value: Decimal,
    pub total_gain_loss: Decimal,
    pub total_gain_loss_percentage: Decimal,
    pub last_updated: DateTime<Utc>,
}
