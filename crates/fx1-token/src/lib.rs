//! FX1 Token Ledger
//!
//! This crate implements the FX1 Sports fee token: a fixed-supply ledger
//! whose transfers through the exchange pool are taxed, with the accrued fees
//! periodically converted to native coin and pool liquidity.
//!
//! # Components
//!
//! - Ledger: balances, allowances, and the contract's native-coin purse
//! - Policy store: versioned fee schedules, caps, launch state, and address flags
//! - Transfer engine: validation, direction, fee, and cap enforcement
//! - Proceeds distributor: guarded swap and liquidity run through an `ExchangeVenue`
//! - Batch sender: administrator multi-recipient transfer
//!
//! All operations are synchronous and run one at a time. The exchange venue
//! and clock are injected through the `ExchangeVenue` and `Environment` traits.

mod admin;
mod batch;
pub mod calculator;
pub mod constants;
mod distributor;
mod engine;
pub mod env;
pub mod ledger;
pub mod policy;
pub mod state;
pub mod store;
pub mod token;
pub mod venue;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use calculator::{fee_amount, partition_proceeds, resolve_direction, validate_schedule};
pub use constants::{metadata, DEFAULT_SWAP_THRESHOLD, TOTAL_SUPPLY};
pub use env::{Environment, SystemEnvironment};
pub use ledger::Ledger;
pub use policy::{PolicyConfig, PolicyStore};
pub use state::{
    AddressFlag, AddressFlags, BindingKind, CapKind, Direction, DistributionOutcome,
    DistributionReport, Event, FeeKind, LaunchState, LiquidityRecipient, ProceedsSplit, Result,
    TokenError, TransferReceipt,
};
pub use store::SnapshotStore;
pub use token::{Token, TokenState};
pub use venue::{
    ExchangeVenue, LiquidityReceipt, LiquidityRequest, SwapRequest, TokenPort, VenueError,
};
