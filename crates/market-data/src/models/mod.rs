//! Data models for the market data crate.

mod quote;

pub use quote::{SecondaryMetrics, StockQuote};
