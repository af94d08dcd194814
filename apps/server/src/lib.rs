//! Folioview server library.
//!
//! Exposes the router, state construction and configuration so the binary
//! and the integration tests share one code path.

pub mod api;
pub mod config;
pub mod error;
pub mod main_lib;
pub mod models;

pub use main_lib::{build_state, build_state_with_fetcher, init_tracing, AppState};
