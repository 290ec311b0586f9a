//! fx1-api: HTTP API layer for the FX1 ledger
//!
//! Serves the token's read surface, transfers, and administrator operations
//! over JSON, and talks to the exchange router through `RouterClient`.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;
pub mod venue_client;

#[cfg(test)]
mod testing;

pub use server::*;
pub use state::{AppState, LedgerVenue, ServiceError, ServiceToken};
pub use venue_client::RouterClient;
