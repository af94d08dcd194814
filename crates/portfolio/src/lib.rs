//! Folioview Portfolio Crate
//!
//! Joins the holdings store with the market data coordinator to produce
//! the enriched portfolio view: per-holding valuations, per-sector
//! rollups and grand totals. Quotes with missing data degrade to absent
//! valuations instead of failing assembly.

pub mod errors;
pub mod models;
pub mod service;
pub mod store;

pub use errors::PortfolioError;
pub use models::{EnrichedHolding, Holding, NewHolding, PortfolioSnapshot, SectorSummary};
pub use service::{PortfolioCacheStats, PortfolioConfig, PortfolioService};
pub use store::HoldingsStore;
