//! Exchange Venue Seam
//!
//! The ledger never implements pool mechanics. It reaches the router through
//! `ExchangeVenue`, and the router reaches back into the ledger through
//! `TokenPort` (pulling approved tokens exactly as a router's `transferFrom`
//! would). Calls through the port while a distribution is running are the
//! reentrant window guarded by `DistributionState`.

use fx1_core::{Address, Amount, NativeAmount, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::TokenError;

/// Exact-input swap of ledger tokens for native coin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub amount_in: Amount,
    pub min_out: NativeAmount,
    /// `[token, wrapped_native]`
    pub path: Vec<Address>,
    pub recipient: Address,
    pub deadline: Timestamp,
}

/// Paired token + native deposit into the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityRequest {
    pub token_amount: Amount,
    pub native_amount: NativeAmount,
    pub min_token: Amount,
    pub min_native: NativeAmount,
    /// Receives the pool shares
    pub recipient: Address,
    pub deadline: Timestamp,
}

/// What the pool actually took for a liquidity deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityReceipt {
    pub token_used: Amount,
    pub native_used: NativeAmount,
    pub liquidity: Amount,
}

/// Venue failures. Any of these during distribution becomes `DistributionFailed`.
#[derive(Debug, Error)]
pub enum VenueError {
    #[error("Router rejected the call: {0}")]
    Rejected(String),

    #[error("Router unreachable: {0}")]
    Transport(String),

    #[error("Router returned an invalid response: {0}")]
    Protocol(String),

    #[error("Ledger rejected router pull: {0}")]
    Ledger(#[from] TokenError),
}

/// The ledger as seen by the router during a venue call
pub trait TokenPort {
    /// Address of the ledger contract itself
    fn token_address(&self) -> Address;

    fn balance_of(&self, holder: &Address) -> Amount;

    /// Delegated transfer on behalf of `spender`
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Direct transfer initiated by `from`
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError>;
}

/// External exchange router (constant-product pool + router)
pub trait ExchangeVenue {
    /// Pool pair for `token` against wrapped native, created if missing
    fn pair_for(&mut self, router: &Address, token: &Address) -> Result<Address, VenueError>;

    /// Wrapped native coin used in swap paths
    fn wrapped_native(&self, router: &Address) -> Result<Address, VenueError>;

    /// Pull `amount_in` tokens through `port` and swap them for native coin.
    /// Returns the native amount delivered to `request.recipient`.
    fn swap_tokens_for_native(
        &mut self,
        router: &Address,
        port: &mut dyn TokenPort,
        request: &SwapRequest,
    ) -> Result<NativeAmount, VenueError>;

    /// Pull up to `token_amount` tokens through `port` and deposit them with
    /// up to `native_amount` coin
    fn add_liquidity(
        &mut self,
        router: &Address,
        port: &mut dyn TokenPort,
        request: &LiquidityRequest,
    ) -> Result<LiquidityReceipt, VenueError>;
}

impl<T: ExchangeVenue + ?Sized> ExchangeVenue for Box<T> {
    fn pair_for(&mut self, router: &Address, token: &Address) -> Result<Address, VenueError> {
        (**self).pair_for(router, token)
    }

    fn wrapped_native(&self, router: &Address) -> Result<Address, VenueError> {
        (**self).wrapped_native(router)
    }

    fn swap_tokens_for_native(
        &mut self,
        router: &Address,
        port: &mut dyn TokenPort,
        request: &SwapRequest,
    ) -> Result<NativeAmount, VenueError> {
        (**self).swap_tokens_for_native(router, port, request)
    }

    fn add_liquidity(
        &mut self,
        router: &Address,
        port: &mut dyn TokenPort,
        request: &LiquidityRequest,
    ) -> Result<LiquidityReceipt, VenueError> {
        (**self).add_liquidity(router, port, request)
    }
}
