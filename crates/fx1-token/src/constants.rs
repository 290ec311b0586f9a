//! FX1 Token Constants
//!
//! Token metadata, fee-rate bounds, and cap floors.

use fx1_core::constants::TOKEN_UNIT;
use fx1_core::Amount;

/// Token metadata
pub mod metadata {
    pub const NAME: &str = "FX1 Sports";
    pub const SYMBOL: &str = "FX1";
    pub const DECIMALS: u8 = fx1_core::constants::DECIMALS;
}

/// Fixed total supply: 300,000,000 tokens
pub const TOTAL_SUPPLY: Amount = 300_000_000 * TOKEN_UNIT;

/// Fee rate constants
pub mod rates {
    /// Rates are expressed out of this denominator (50 = 5%)
    pub const RATE_DENOMINATOR: u32 = 1000;

    /// Maximum combined marketing + liquidity rate (10%)
    pub const MAX_TOTAL_RATE: u32 = 100;
}

/// Cap floors and defaults, in permille of total supply
pub mod caps {
    /// Permille denominator
    pub const PERMILLE: u128 = 1000;

    /// Transfer cap may never be set below 0.5% of supply
    pub const MIN_TRANSFER_PERMILLE: u128 = 5;

    /// Wallet cap may never be set below 1% of supply
    pub const MIN_WALLET_PERMILLE: u128 = 10;

    /// Transfer cap at deployment (1%)
    pub const DEFAULT_TRANSFER_PERMILLE: u128 = 10;

    /// Wallet cap at deployment (2%)
    pub const DEFAULT_WALLET_PERMILLE: u128 = 20;
}

/// Accrued-fee balance that triggers a distribution at deployment (0.05% of supply)
pub const DEFAULT_SWAP_THRESHOLD: Amount = 150_000 * TOKEN_UNIT;
