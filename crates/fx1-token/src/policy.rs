//! Policy Store
//!
//! Administrator-controlled configuration. `PolicyConfig` is a versioned
//! aggregate: every mutator validates and returns a new snapshot, which the
//! caller swaps in whole. Address flags live beside it in a default-false map.

use std::collections::BTreeMap;

use fx1_core::{Address, Amount, FeeSchedule, Timestamp};
use serde::{Deserialize, Serialize};

use crate::calculator::{cap_floor, validate_schedule};
use crate::state::{
    AddressFlag, AddressFlags, BindingKind, CapKind, FeeKind, LaunchState, LiquidityRecipient,
    Result, TokenError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Bumped by every accepted change
    pub version: u64,
    pub owner: Address,
    pub buy_fee: FeeSchedule,
    pub sell_fee: FeeSchedule,
    pub max_wallet_amount: Amount,
    pub max_transfer_amount: Amount,
    pub swap_threshold: Amount,
    pub treasury: Address,
    pub pair: Address,
    pub router: Address,
    pub liquidity_recipient: LiquidityRecipient,
    pub launch: LaunchState,
}

impl PolicyConfig {
    pub fn fee_schedule(&self, kind: FeeKind) -> FeeSchedule {
        match kind {
            FeeKind::Buy => self.buy_fee,
            FeeKind::Sell => self.sell_fee,
        }
    }

    pub fn cap(&self, kind: CapKind) -> Amount {
        match kind {
            CapKind::Wallet => self.max_wallet_amount,
            CapKind::Transfer => self.max_transfer_amount,
        }
    }

    pub fn binding(&self, kind: BindingKind) -> Address {
        match kind {
            BindingKind::Pair => self.pair,
            BindingKind::Router => self.router,
        }
    }

    /// Replace one fee schedule; both rates change together
    pub fn with_fee_schedule(&self, kind: FeeKind, schedule: FeeSchedule) -> Result<Self> {
        validate_schedule(&schedule)?;
        Ok(self.next(|c| match kind {
            FeeKind::Buy => c.buy_fee = schedule,
            FeeKind::Sell => c.sell_fee = schedule,
        }))
    }

    /// Replace one cap; the floor is computed against `total_supply`
    pub fn with_cap(&self, kind: CapKind, amount: Amount, total_supply: Amount) -> Result<Self> {
        let floor = cap_floor(kind, total_supply);
        if amount < floor {
            return Err(TokenError::BelowFloor {
                kind,
                amount,
                floor,
            });
        }
        Ok(self.next(|c| match kind {
            CapKind::Wallet => c.max_wallet_amount = amount,
            CapKind::Transfer => c.max_transfer_amount = amount,
        }))
    }

    pub fn with_treasury(&self, treasury: Address) -> Result<Self> {
        if treasury.is_zero() {
            return Err(TokenError::InvalidAddress {
                field: "treasury",
                address: treasury,
            });
        }
        Ok(self.next(|c| c.treasury = treasury))
    }

    /// Replace the pair or router; `is_contract` is the caller's code check
    pub fn with_binding(
        &self,
        kind: BindingKind,
        address: Address,
        is_contract: bool,
    ) -> Result<Self> {
        if address.is_zero() || !is_contract {
            return Err(TokenError::InvalidAddress {
                field: kind.as_str(),
                address,
            });
        }
        Ok(self.next(|c| match kind {
            BindingKind::Pair => c.pair = address,
            BindingKind::Router => c.router = address,
        }))
    }

    /// Open trading at `now`. Irreversible.
    pub fn launched_at(&self, now: Timestamp) -> Result<Self> {
        if self.launch.launched {
            return Err(TokenError::AlreadyLaunched);
        }
        Ok(self.next(|c| {
            c.launch.launched = true;
            c.launch.launch_timestamp = now;
        }))
    }

    pub fn with_whitelist_period(&self, period: Timestamp) -> Result<Self> {
        if period == 0 {
            return Err(TokenError::InvalidDuration);
        }
        Ok(self.next(|c| c.launch.whitelist_period = period))
    }

    pub fn with_swap_threshold(&self, amount: Amount) -> Result<Self> {
        if amount == 0 {
            return Err(TokenError::InvalidThreshold);
        }
        Ok(self.next(|c| c.swap_threshold = amount))
    }

    pub fn with_liquidity_recipient(&self, recipient: LiquidityRecipient) -> Self {
        self.next(|c| c.liquidity_recipient = recipient)
    }

    pub fn with_owner(&self, owner: Address) -> Result<Self> {
        if owner.is_zero() {
            return Err(TokenError::InvalidAddress {
                field: "owner",
                address: owner,
            });
        }
        Ok(self.next(|c| c.owner = owner))
    }

    fn next(&self, apply: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        apply(&mut next);
        next.version = self.version + 1;
        next
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStore {
    config: PolicyConfig,
    flags: BTreeMap<Address, AddressFlags>,
}

impl PolicyStore {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            flags: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Swap in a validated snapshot
    pub fn replace(&mut self, config: PolicyConfig) {
        self.config = config;
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.config.owner == *address
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if !self.is_owner(caller) {
            return Err(TokenError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    pub fn flags(&self, address: &Address) -> AddressFlags {
        self.flags.get(address).copied().unwrap_or_default()
    }

    pub fn has_flag(&self, address: &Address, flag: AddressFlag) -> bool {
        self.flags(address).get(flag)
    }

    /// Set `flag` on every listed address. The list is validated before any write.
    pub fn set_flags(
        &mut self,
        addresses: &[Address],
        flag: AddressFlag,
        value: bool,
    ) -> Result<()> {
        if addresses.is_empty() {
            return Err(TokenError::EmptyList);
        }
        for address in addresses {
            self.write_flag(*address, flag, value);
        }
        self.config.version += 1;
        Ok(())
    }

    /// Single-address variant of `set_flags`
    pub fn set_flag(&mut self, address: Address, flag: AddressFlag, value: bool) {
        self.write_flag(address, flag, value);
        self.config.version += 1;
    }

    fn write_flag(&mut self, address: Address, flag: AddressFlag, value: bool) {
        let mut flags = self.flags(&address);
        flags.set(flag, value);
        if flags.is_default() {
            self.flags.remove(&address);
        } else {
            self.flags.insert(address, flags);
        }
    }

    pub(crate) fn set_all_flags(&mut self, address: Address, flags: AddressFlags) {
        if flags.is_default() {
            self.flags.remove(&address);
        } else {
            self.flags.insert(address, flags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TOTAL_SUPPLY;
    use fx1_core::constants::TOKEN_UNIT;

    fn config() -> PolicyConfig {
        PolicyConfig {
            version: 0,
            owner: Address::from_low_u64(1),
            buy_fee: FeeSchedule::new(50, 0),
            sell_fee: FeeSchedule::new(50, 0),
            max_wallet_amount: 6_000_000 * TOKEN_UNIT,
            max_transfer_amount: 3_000_000 * TOKEN_UNIT,
            swap_threshold: 150_000 * TOKEN_UNIT,
            treasury: Address::from_low_u64(2),
            pair: Address::from_low_u64(3),
            router: Address::from_low_u64(4),
            liquidity_recipient: LiquidityRecipient::Administrator,
            launch: LaunchState {
                launched: false,
                launch_timestamp: 0,
                whitelist_period: 3_600,
            },
        }
    }

    #[test]
    fn test_fee_update_is_a_new_snapshot() {
        let base = config();
        let next = base.with_fee_schedule(FeeKind::Buy, FeeSchedule::new(70, 30)).unwrap();
        assert_eq!(next.buy_fee, FeeSchedule::new(70, 30));
        assert_eq!(next.sell_fee, base.sell_fee);
        assert_eq!(next.version, 1);
        assert_eq!(base.buy_fee, FeeSchedule::new(50, 0));
    }

    #[test]
    fn test_fee_update_over_cap_rejected() {
        let base = config();
        let err = base
            .with_fee_schedule(FeeKind::Sell, FeeSchedule::new(50, 51))
            .unwrap_err();
        assert_eq!(err, TokenError::RateExceeded { total: 101, max: 100 });
    }

    #[test]
    fn test_transfer_cap_floor_is_inclusive() {
        let base = config();
        let floor = TOTAL_SUPPLY / 200;
        assert!(matches!(
            base.with_cap(CapKind::Transfer, floor - 1, TOTAL_SUPPLY),
            Err(TokenError::BelowFloor { .. })
        ));
        let next = base.with_cap(CapKind::Transfer, floor, TOTAL_SUPPLY).unwrap();
        assert_eq!(next.max_transfer_amount, floor);
    }

    #[test]
    fn test_wallet_cap_floor() {
        let base = config();
        assert!(matches!(
            base.with_cap(CapKind::Wallet, 9 * TOKEN_UNIT / 1000, TOTAL_SUPPLY),
            Err(TokenError::BelowFloor {
                kind: CapKind::Wallet,
                ..
            })
        ));
        let raised = base.max_wallet_amount + 100;
        let next = base.with_cap(CapKind::Wallet, raised, TOTAL_SUPPLY).unwrap();
        assert_eq!(next.max_wallet_amount, raised);
    }

    #[test]
    fn test_launch_once() {
        let launched = config().launched_at(500).unwrap();
        assert!(launched.launch.launched);
        assert_eq!(launched.launch.launch_timestamp, 500);
        assert_eq!(launched.launched_at(900), Err(TokenError::AlreadyLaunched));
    }

    #[test]
    fn test_binding_requires_contract() {
        let base = config();
        let addr = Address::from_low_u64(77);
        assert!(matches!(
            base.with_binding(BindingKind::Router, Address::ZERO, true),
            Err(TokenError::InvalidAddress { field: "router", .. })
        ));
        assert!(matches!(
            base.with_binding(BindingKind::Pair, addr, false),
            Err(TokenError::InvalidAddress { field: "pair", .. })
        ));
        assert_eq!(base.with_binding(BindingKind::Pair, addr, true).unwrap().pair, addr);
    }

    #[test]
    fn test_zero_period_and_threshold_rejected() {
        let base = config();
        assert_eq!(base.with_whitelist_period(0), Err(TokenError::InvalidDuration));
        assert_eq!(base.with_swap_threshold(0), Err(TokenError::InvalidThreshold));
        assert_eq!(base.with_whitelist_period(7_200).unwrap().launch.whitelist_period, 7_200);
    }

    #[test]
    fn test_set_flags_empty_list_rejected() {
        let mut store = PolicyStore::new(config());
        assert_eq!(
            store.set_flags(&[], AddressFlag::Whitelisted, true),
            Err(TokenError::EmptyList)
        );
        assert_eq!(store.config().version, 0);
    }

    #[test]
    fn test_set_flags_many() {
        let mut store = PolicyStore::new(config());
        let addrs: Vec<Address> = (10..15).map(Address::from_low_u64).collect();
        store.set_flags(&addrs, AddressFlag::Whitelisted, true).unwrap();
        for a in &addrs {
            assert!(store.has_flag(a, AddressFlag::Whitelisted));
            assert!(!store.has_flag(a, AddressFlag::Bot));
        }
        store.set_flags(&addrs[..1], AddressFlag::Whitelisted, false).unwrap();
        assert!(!store.has_flag(&addrs[0], AddressFlag::Whitelisted));
        assert_eq!(store.config().version, 2);
    }

    #[test]
    fn test_ensure_owner() {
        let store = PolicyStore::new(config());
        assert!(store.ensure_owner(&Address::from_low_u64(1)).is_ok());
        assert!(matches!(
            store.ensure_owner(&Address::from_low_u64(2)),
            Err(TokenError::Unauthorized { .. })
        ));
    }
}
