//! Token State Types
//!
//! Policy enums, address flags, events, receipts, and errors.

use fx1_core::{Address, Amount, FeeSchedule, NativeAmount, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which fee schedule a rate update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeKind {
    Buy,
    Sell,
}

impl fmt::Display for FeeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Which cap an update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapKind {
    Wallet,
    Transfer,
}

impl fmt::Display for CapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wallet => write!(f, "wallet"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

/// Which half of the exchange binding an update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Pair,
    Router,
}

impl BindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::Router => "router",
        }
    }
}

/// A single per-address policy bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressFlag {
    Whitelisted,
    Bot,
    FeeExempt,
    MaxWalletExempt,
    MaxTransferExempt,
}

/// Per-address policy bits. Any combination is legal; absent entries are all-false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressFlags {
    pub whitelisted: bool,
    pub bot: bool,
    pub fee_exempt: bool,
    pub max_wallet_exempt: bool,
    pub max_transfer_exempt: bool,
}

impl AddressFlags {
    pub fn get(&self, flag: AddressFlag) -> bool {
        match flag {
            AddressFlag::Whitelisted => self.whitelisted,
            AddressFlag::Bot => self.bot,
            AddressFlag::FeeExempt => self.fee_exempt,
            AddressFlag::MaxWalletExempt => self.max_wallet_exempt,
            AddressFlag::MaxTransferExempt => self.max_transfer_exempt,
        }
    }

    pub fn set(&mut self, flag: AddressFlag, value: bool) {
        match flag {
            AddressFlag::Whitelisted => self.whitelisted = value,
            AddressFlag::Bot => self.bot = value,
            AddressFlag::FeeExempt => self.fee_exempt = value,
            AddressFlag::MaxWalletExempt => self.max_wallet_exempt = value,
            AddressFlag::MaxTransferExempt => self.max_transfer_exempt = value,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Fully exempt: no fees and neither cap
    pub fn exempt() -> Self {
        Self {
            fee_exempt: true,
            max_wallet_exempt: true,
            max_transfer_exempt: true,
            ..Self::default()
        }
    }
}

/// Launch state. `launched` flips to true exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchState {
    pub launched: bool,
    pub launch_timestamp: Timestamp,
    pub whitelist_period: Timestamp,
}

impl LaunchState {
    /// Whether `now` falls in `[launch_timestamp, launch_timestamp + whitelist_period)`
    pub fn in_whitelist_window(&self, now: Timestamp) -> bool {
        self.launched
            && now >= self.launch_timestamp
            && now < self.launch_timestamp.saturating_add(self.whitelist_period)
    }
}

/// Where pool shares minted during distribution are credited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiquidityRecipient {
    #[default]
    Administrator,
    LockedSink,
}

/// Transfer classification relative to the pool pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
    Plain,
}

/// Reentrancy guard around proceeds distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistributionState {
    #[default]
    Idle,
    Distributing,
}

/// Token split computed from the held fee balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProceedsSplit {
    /// Swapped in full; coin goes to the treasury
    pub marketing: Amount,
    /// Swapped for the coin side of the liquidity deposit
    pub liquidity_swap: Amount,
    /// Deposited as the token side of the liquidity deposit
    pub liquidity_pair: Amount,
}

impl ProceedsSplit {
    pub fn total(&self) -> Amount {
        self.marketing + self.liquidity_swap + self.liquidity_pair
    }
}

/// Result of a completed distribution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionReport {
    pub split: ProceedsSplit,
    pub native_to_treasury: NativeAmount,
    pub native_to_pool: NativeAmount,
    pub tokens_to_pool: Amount,
    pub liquidity_minted: Amount,
}

/// What happened when a transfer crossed the swap threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DistributionOutcome {
    Completed(DistributionReport),
    Failed { reason: String },
}

/// Result of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub direction: Direction,
    pub amount: Amount,
    pub fee: Amount,
    pub credited: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionOutcome>,
}

/// Ledger events, drained by the embedding service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    Transfer {
        from: Address,
        to: Address,
        value: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: Amount,
    },
    FeeScheduleUpdated {
        kind: FeeKind,
        schedule: FeeSchedule,
    },
    CapUpdated {
        kind: CapKind,
        amount: Amount,
    },
    FlagsUpdated {
        flag: AddressFlag,
        value: bool,
        count: usize,
    },
    TreasuryUpdated {
        treasury: Address,
    },
    ExchangeBindingUpdated {
        kind: BindingKind,
        address: Address,
    },
    Launched {
        timestamp: Timestamp,
    },
    WhitelistPeriodUpdated {
        period: Timestamp,
    },
    SwapThresholdUpdated {
        amount: Amount,
    },
    LiquidityRecipientUpdated {
        recipient: LiquidityRecipient,
    },
    OwnershipTransferred {
        previous: Address,
        owner: Address,
    },
    ProceedsDistributed(DistributionReport),
    DistributionFailed {
        reason: String,
    },
}

/// Ledger errors. Every variant except `DistributionFailed` is raised before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Zero amount")]
    ZeroAmount,

    #[error("No bots allowed: {address}")]
    BotRejected { address: Address },

    #[error("Trading not open")]
    TradingNotOpen,

    #[error("Whitelist period active: neither {from} nor {to} is whitelisted")]
    NotWhitelisted { from: Address, to: Address },

    #[error("Transfer amount {amount} exceeds max transfer amount {cap}")]
    TransferCapExceeded { amount: Amount, cap: Amount },

    #[error("Wallet {address} would hold {resulting}, max wallet amount is {cap}")]
    WalletCapExceeded {
        address: Address,
        resulting: Amount,
        cap: Amount,
    },

    #[error("Transfer > allowance: need {required}, allowed {allowed}")]
    AllowanceExceeded { required: Amount, allowed: Amount },

    #[error("Max rate exceeded: {total} > {max}")]
    RateExceeded { total: u32, max: u32 },

    #[error("Min limit: {kind} cap {amount} is below {floor}")]
    BelowFloor {
        kind: CapKind,
        amount: Amount,
        floor: Amount,
    },

    #[error("Invalid {field} address: {address}")]
    InvalidAddress {
        field: &'static str,
        address: Address,
    },

    #[error("Invalid whitelist period")]
    InvalidDuration,

    #[error("Invalid swap threshold")]
    InvalidThreshold,

    #[error("Already launched")]
    AlreadyLaunched,

    #[error("Invalid arrays length: {recipients} recipients, {amounts} amounts")]
    LengthMismatch { recipients: usize, amounts: usize },

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Caller {caller} is not the administrator")]
    Unauthorized { caller: Address },

    #[error("Proceeds distribution failed: {reason}")]
    DistributionFailed { reason: String },

    #[error("Invalid length array")]
    EmptyList,

    #[error("Approve to zero")]
    InvalidSpender,

    #[error("Invalid recipient address at position {index}")]
    InvalidRecipient { index: usize },

    #[error("Exchange venue unavailable: {reason}")]
    VenueUnavailable { reason: String },
}

impl TokenError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "zero_amount",
            Self::BotRejected { .. } => "bot_rejected",
            Self::TradingNotOpen => "trading_not_open",
            Self::NotWhitelisted { .. } => "not_whitelisted",
            Self::TransferCapExceeded { .. } => "transfer_cap_exceeded",
            Self::WalletCapExceeded { .. } => "wallet_cap_exceeded",
            Self::AllowanceExceeded { .. } => "allowance_exceeded",
            Self::RateExceeded { .. } => "rate_exceeded",
            Self::BelowFloor { .. } => "below_floor",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::InvalidDuration => "invalid_duration",
            Self::InvalidThreshold => "invalid_threshold",
            Self::AlreadyLaunched => "already_launched",
            Self::LengthMismatch { .. } => "length_mismatch",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::Unauthorized { .. } => "unauthorized",
            Self::DistributionFailed { .. } => "distribution_failed",
            Self::EmptyList => "empty_list",
            Self::InvalidSpender => "invalid_spender",
            Self::InvalidRecipient { .. } => "invalid_recipient",
            Self::VenueUnavailable { .. } => "venue_unavailable",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ZeroAmount
            | Self::RateExceeded { .. }
            | Self::BelowFloor { .. }
            | Self::InvalidAddress { .. }
            | Self::InvalidDuration
            | Self::InvalidThreshold
            | Self::LengthMismatch { .. }
            | Self::EmptyList
            | Self::InvalidSpender
            | Self::InvalidRecipient { .. } => 400,
            Self::Unauthorized { .. }
            | Self::BotRejected { .. }
            | Self::TradingNotOpen
            | Self::NotWhitelisted { .. } => 403,
            Self::AlreadyLaunched => 409,
            Self::TransferCapExceeded { .. }
            | Self::WalletCapExceeded { .. }
            | Self::AllowanceExceeded { .. }
            | Self::InsufficientBalance { .. } => 422,
            Self::DistributionFailed { .. } | Self::VenueUnavailable { .. } => 502,
        }
    }
}

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = TokenError::RateExceeded { total: 101, max: 100 };
        assert_eq!(err.error_code(), "rate_exceeded");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Max rate exceeded: 101 > 100");

        let err = TokenError::Unauthorized {
            caller: Address::from_low_u64(7),
        };
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_flags_set_and_get() {
        let mut flags = AddressFlags::default();
        assert!(flags.is_default());
        flags.set(AddressFlag::Bot, true);
        assert!(flags.get(AddressFlag::Bot));
        assert!(!flags.get(AddressFlag::Whitelisted));
        flags.set(AddressFlag::Bot, false);
        assert!(flags.is_default());
    }

    #[test]
    fn test_whitelist_window_is_half_open() {
        let launch = LaunchState {
            launched: true,
            launch_timestamp: 1_000,
            whitelist_period: 3_600,
        };
        assert!(!launch.in_whitelist_window(999));
        assert!(launch.in_whitelist_window(1_000));
        assert!(launch.in_whitelist_window(4_599));
        assert!(!launch.in_whitelist_window(4_600));

        let not_launched = LaunchState {
            launched: false,
            ..launch
        };
        assert!(!not_launched.in_whitelist_window(1_000));
    }
}
