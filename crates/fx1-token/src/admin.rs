//! Administrator Operations
//!
//! Every operation here checks the caller against the policy owner first.
//! Policy changes are computed as a new `PolicyConfig` snapshot and swapped in
//! only after validation succeeds.

use fx1_core::{Address, Amount, FeeSchedule, Timestamp};

use crate::env::Environment;
use crate::policy::PolicyConfig;
use crate::state::{
    AddressFlag, AddressFlags, BindingKind, CapKind, Event, FeeKind, LiquidityRecipient, Result,
};
use crate::token::Token;
use crate::venue::ExchangeVenue;

impl<V: ExchangeVenue, E: Environment> Token<V, E> {
    fn authorize(&self, caller: &Address, operation: &str) -> Result<()> {
        self.core().state.policy.ensure_owner(caller).inspect_err(|_| {
            tracing::warn!(caller = %caller, "Rejected {} from non-administrator", operation);
        })
    }

    /// Validate and swap in a new policy snapshot
    fn update_policy(
        &mut self,
        caller: &Address,
        operation: &str,
        change: impl FnOnce(&PolicyConfig) -> Result<PolicyConfig>,
    ) -> Result<()> {
        self.authorize(caller, operation)?;
        let next = change(self.policy())?;
        tracing::info!(version = next.version, "Policy updated: {}", operation);
        self.core_mut().state.policy.replace(next);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Fees
    // ---------------------------------------------------------------------

    /// Replace the buy or sell schedule (combined rate at most 10%)
    pub fn set_fee_schedule(
        &mut self,
        caller: Address,
        kind: FeeKind,
        schedule: FeeSchedule,
    ) -> Result<()> {
        self.update_policy(&caller, "set_fee_schedule", |c| c.with_fee_schedule(kind, schedule))?;
        self.core_mut()
            .emit(Event::FeeScheduleUpdated { kind, schedule });
        Ok(())
    }

    pub fn update_buy_fee_rate(
        &mut self,
        caller: Address,
        marketing_rate: u32,
        liquidity_rate: u32,
    ) -> Result<()> {
        let schedule = FeeSchedule::new(marketing_rate, liquidity_rate);
        self.set_fee_schedule(caller, FeeKind::Buy, schedule)
    }

    pub fn update_sell_fee_rate(
        &mut self,
        caller: Address,
        marketing_rate: u32,
        liquidity_rate: u32,
    ) -> Result<()> {
        let schedule = FeeSchedule::new(marketing_rate, liquidity_rate);
        self.set_fee_schedule(caller, FeeKind::Sell, schedule)
    }

    // ---------------------------------------------------------------------
    // Caps
    // ---------------------------------------------------------------------

    pub fn set_cap(&mut self, caller: Address, kind: CapKind, amount: Amount) -> Result<()> {
        let supply = self.total_supply();
        self.update_policy(&caller, "set_cap", |c| c.with_cap(kind, amount, supply))?;
        self.core_mut().emit(Event::CapUpdated { kind, amount });
        Ok(())
    }

    pub fn set_max_transfer_amount(&mut self, caller: Address, amount: Amount) -> Result<()> {
        self.set_cap(caller, CapKind::Transfer, amount)
    }

    pub fn set_max_wallet_amount(&mut self, caller: Address, amount: Amount) -> Result<()> {
        self.set_cap(caller, CapKind::Wallet, amount)
    }

    // ---------------------------------------------------------------------
    // Address flags
    // ---------------------------------------------------------------------

    /// Set one flag on a non-empty list of addresses
    pub fn set_flags(
        &mut self,
        caller: Address,
        addresses: &[Address],
        flag: AddressFlag,
        value: bool,
    ) -> Result<()> {
        self.authorize(&caller, "set_flags")?;
        self.core_mut().state.policy.set_flags(addresses, flag, value)?;
        tracing::info!(
            flag = ?flag,
            value,
            count = addresses.len(),
            "Address flags updated"
        );
        self.core_mut().emit(Event::FlagsUpdated {
            flag,
            value,
            count: addresses.len(),
        });
        Ok(())
    }

    pub fn update_whitelists(
        &mut self,
        caller: Address,
        addresses: &[Address],
        value: bool,
    ) -> Result<()> {
        self.set_flags(caller, addresses, AddressFlag::Whitelisted, value)
    }

    pub fn exclude_wallets_from_fees(
        &mut self,
        caller: Address,
        addresses: &[Address],
        value: bool,
    ) -> Result<()> {
        self.set_flags(caller, addresses, AddressFlag::FeeExempt, value)
    }

    pub fn exclude_wallets_from_max_wallets(
        &mut self,
        caller: Address,
        addresses: &[Address],
        value: bool,
    ) -> Result<()> {
        self.set_flags(caller, addresses, AddressFlag::MaxWalletExempt, value)
    }

    pub fn exclude_wallets_from_max_transfer(
        &mut self,
        caller: Address,
        addresses: &[Address],
        value: bool,
    ) -> Result<()> {
        self.set_flags(caller, addresses, AddressFlag::MaxTransferExempt, value)
    }

    /// Flag every listed address as a bot
    pub fn set_bots(&mut self, caller: Address, addresses: &[Address]) -> Result<()> {
        self.set_flags(caller, addresses, AddressFlag::Bot, true)
    }

    pub fn set_bot(&mut self, caller: Address, address: Address) -> Result<()> {
        self.set_single_flag(caller, address, AddressFlag::Bot, true)
    }

    pub fn clear_bot(&mut self, caller: Address, address: Address) -> Result<()> {
        self.set_single_flag(caller, address, AddressFlag::Bot, false)
    }

    fn set_single_flag(
        &mut self,
        caller: Address,
        address: Address,
        flag: AddressFlag,
        value: bool,
    ) -> Result<()> {
        self.authorize(&caller, "set_flag")?;
        self.core_mut().state.policy.set_flag(address, flag, value);
        tracing::info!(address = %address, flag = ?flag, value, "Address flag updated");
        self.core_mut().emit(Event::FlagsUpdated {
            flag,
            value,
            count: 1,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Bindings
    // ---------------------------------------------------------------------

    pub fn set_treasury(&mut self, caller: Address, treasury: Address) -> Result<()> {
        self.update_policy(&caller, "set_treasury", |c| c.with_treasury(treasury))?;
        self.core_mut().emit(Event::TreasuryUpdated { treasury });
        Ok(())
    }

    /// Rebind the pair or router. The new address must hold contract code.
    pub fn set_exchange_binding(
        &mut self,
        caller: Address,
        kind: BindingKind,
        address: Address,
    ) -> Result<()> {
        let is_contract = self.env().is_contract(&address);
        self.update_policy(&caller, "set_exchange_binding", |c| {
            c.with_binding(kind, address, is_contract)
        })?;
        self.core_mut()
            .emit(Event::ExchangeBindingUpdated { kind, address });
        Ok(())
    }

    pub fn update_pair(&mut self, caller: Address, pair: Address) -> Result<()> {
        self.set_exchange_binding(caller, BindingKind::Pair, pair)
    }

    pub fn update_dex_router(&mut self, caller: Address, router: Address) -> Result<()> {
        self.set_exchange_binding(caller, BindingKind::Router, router)
    }

    // ---------------------------------------------------------------------
    // Launch and distribution settings
    // ---------------------------------------------------------------------

    /// Open trading now. Fails with `AlreadyLaunched` on a second call.
    pub fn begin_launch(&mut self, caller: Address) -> Result<()> {
        let now = self.env().now();
        self.update_policy(&caller, "begin_launch", |c| c.launched_at(now))?;
        tracing::info!(timestamp = now, "Trading launched");
        self.core_mut().emit(Event::Launched { timestamp: now });
        Ok(())
    }

    pub fn set_whitelist_period(&mut self, caller: Address, period: Timestamp) -> Result<()> {
        self.update_policy(&caller, "set_whitelist_period", |c| c.with_whitelist_period(period))?;
        self.core_mut()
            .emit(Event::WhitelistPeriodUpdated { period });
        Ok(())
    }

    pub fn set_swap_threshold(&mut self, caller: Address, amount: Amount) -> Result<()> {
        self.update_policy(&caller, "set_swap_threshold", |c| c.with_swap_threshold(amount))?;
        self.core_mut()
            .emit(Event::SwapThresholdUpdated { amount });
        Ok(())
    }

    pub fn set_liquidity_recipient(
        &mut self,
        caller: Address,
        recipient: LiquidityRecipient,
    ) -> Result<()> {
        self.update_policy(&caller, "set_liquidity_recipient", |c| {
            Ok(c.with_liquidity_recipient(recipient))
        })?;
        self.core_mut()
            .emit(Event::LiquidityRecipientUpdated { recipient });
        Ok(())
    }

    /// Hand the administrator role to `owner`, who becomes fee- and cap-exempt
    pub fn transfer_ownership(&mut self, caller: Address, owner: Address) -> Result<()> {
        self.update_policy(&caller, "transfer_ownership", |c| c.with_owner(owner))?;

        let policy = &mut self.core_mut().state.policy;
        let merged = {
            let current = policy.flags(&owner);
            AddressFlags {
                whitelisted: current.whitelisted,
                bot: current.bot,
                ..AddressFlags::exempt()
            }
        };
        policy.set_all_flags(owner, merged);

        tracing::info!(previous = %caller, owner = %owner, "Ownership transferred");
        self.core_mut().emit(Event::OwnershipTransferred {
            previous: caller,
            owner,
        });
        Ok(())
    }
}
