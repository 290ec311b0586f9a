//! Fee Calculator
//!
//! Pure math for fees, cap floors, and proceeds partitioning. No ledger access.

use fx1_core::{Address, Amount, FeeSchedule};

use crate::constants::{caps, rates};
use crate::state::{CapKind, Direction, ProceedsSplit, Result, TokenError};

/// Calculate the fee charged on `amount` at `rate` (out of `RATE_DENOMINATOR`).
///
/// Formula: fee = floor(amount * rate / denominator)
///
/// Split as `q * rate + (r * rate) / denominator` so huge amounts cannot overflow;
/// the result is identical to the direct product.
pub fn fee_amount(amount: Amount, rate: u32) -> Amount {
    let denom = rates::RATE_DENOMINATOR as Amount;
    let rate = rate as Amount;
    let q = amount / denom;
    let r = amount % denom;
    q * rate + (r * rate) / denom
}

/// Reject a schedule whose combined rate exceeds `MAX_TOTAL_RATE`
pub fn validate_schedule(schedule: &FeeSchedule) -> Result<()> {
    let total = schedule.marketing_rate as u64 + schedule.liquidity_rate as u64;
    if total > rates::MAX_TOTAL_RATE as u64 {
        return Err(TokenError::RateExceeded {
            total: u32::try_from(total).unwrap_or(u32::MAX),
            max: rates::MAX_TOTAL_RATE,
        });
    }
    Ok(())
}

/// Minimum legal value for a cap, computed against `total_supply`
pub fn cap_floor(kind: CapKind, total_supply: Amount) -> Amount {
    let permille = match kind {
        CapKind::Transfer => caps::MIN_TRANSFER_PERMILLE,
        CapKind::Wallet => caps::MIN_WALLET_PERMILLE,
    };
    total_supply / caps::PERMILLE * permille
}

/// Cap value used at deployment
pub fn default_cap(kind: CapKind, total_supply: Amount) -> Amount {
    let permille = match kind {
        CapKind::Transfer => caps::DEFAULT_TRANSFER_PERMILLE,
        CapKind::Wallet => caps::DEFAULT_WALLET_PERMILLE,
    };
    total_supply / caps::PERMILLE * permille
}

/// Classify a transfer by whether the pool pair is sender or recipient
pub fn resolve_direction(from: &Address, to: &Address, pair: &Address) -> Direction {
    if from == pair {
        Direction::Buy
    } else if to == pair {
        Direction::Sell
    } else {
        Direction::Plain
    }
}

/// Split the held fee balance by the sell schedule's marketing : liquidity ratio.
///
/// The liquidity share is halved: one half is swapped for coin, the other half
/// is deposited alongside that coin. Returns an empty split when the schedule is zero.
pub fn partition_proceeds(held: Amount, sell: &FeeSchedule) -> ProceedsSplit {
    let total = sell.total() as Amount;
    if held == 0 || total == 0 {
        return ProceedsSplit::default();
    }

    // held * marketing / total without overflow
    let marketing_rate = sell.marketing_rate as Amount;
    let marketing = (held / total) * marketing_rate + (held % total) * marketing_rate / total;
    let liquidity = held - marketing;
    let liquidity_swap = liquidity / 2;

    ProceedsSplit {
        marketing,
        liquidity_swap,
        liquidity_pair: liquidity - liquidity_swap,
    }
}
