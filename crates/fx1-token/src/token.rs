//! FX1 Token
//!
//! `Token` ties the ledger state to its two collaborators: the exchange venue
//! and the execution environment. Operations run strictly one at a time; the
//! venue call inside a distribution is the only point where the ledger can be
//! re-entered, and that path goes through `TokenCore` directly.

use fx1_core::{Address, Amount, DeployConfig, FeeSchedule, NativeAmount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::calculator::{default_cap, validate_schedule};
use crate::constants::{metadata, DEFAULT_SWAP_THRESHOLD, TOTAL_SUPPLY};
use crate::env::Environment;
use crate::ledger::Ledger;
use crate::policy::{PolicyConfig, PolicyStore};
use crate::state::{
    AddressFlag, AddressFlags, CapKind, DistributionState, Event, LaunchState, LiquidityRecipient,
    Result, TokenError, TransferReceipt,
};
use crate::venue::{ExchangeVenue, VenueError};

/// Everything that survives a restart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenState {
    /// Address of the ledger contract; accrued fees are held here
    pub token_address: Address,
    pub ledger: Ledger,
    pub policy: PolicyStore,
}

/// Ledger state plus the transient pieces: reentrancy guard and event outbox
#[derive(Debug)]
pub(crate) struct TokenCore {
    pub(crate) state: TokenState,
    pub(crate) guard: DistributionState,
    pub(crate) events: Vec<Event>,
}

impl TokenCore {
    pub(crate) fn new(state: TokenState) -> Self {
        Self {
            state,
            guard: DistributionState::Idle,
            events: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Record an allowance and emit `Approval`
    pub(crate) fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<()> {
        if spender.is_zero() {
            return Err(TokenError::InvalidSpender);
        }
        self.state.ledger.set_allowance(owner, spender, amount);
        self.emit(Event::Approval {
            owner,
            spender,
            value: amount,
        });
        Ok(())
    }
}

pub struct Token<V, E> {
    core: TokenCore,
    venue: V,
    env: E,
}

impl<V: ExchangeVenue, E: Environment> Token<V, E> {
    /// Create a fresh ledger: validate parameters, bind the pool pair, and mint
    /// the whole supply to the administrator.
    pub fn deploy(params: &DeployConfig, mut venue: V, env: E) -> Result<Self> {
        if params.admin.is_zero() {
            return Err(TokenError::InvalidAddress {
                field: "admin",
                address: params.admin,
            });
        }
        if params.token_address.is_zero() {
            return Err(TokenError::InvalidAddress {
                field: "token",
                address: params.token_address,
            });
        }
        if params.treasury.is_zero() {
            return Err(TokenError::InvalidAddress {
                field: "treasury",
                address: params.treasury,
            });
        }
        if params.router.is_zero() || !env.is_contract(&params.router) {
            return Err(TokenError::InvalidAddress {
                field: "router",
                address: params.router,
            });
        }
        if params.whitelist_period == 0 {
            return Err(TokenError::InvalidDuration);
        }
        validate_schedule(&params.buy_fee)?;
        validate_schedule(&params.sell_fee)?;

        let pair = venue
            .pair_for(&params.router, &params.token_address)
            .map_err(|e: VenueError| TokenError::VenueUnavailable {
                reason: e.to_string(),
            })?;
        if pair.is_zero() {
            return Err(TokenError::InvalidAddress {
                field: "pair",
                address: pair,
            });
        }

        let config = PolicyConfig {
            version: 0,
            owner: params.admin,
            buy_fee: params.buy_fee,
            sell_fee: params.sell_fee,
            max_wallet_amount: default_cap(CapKind::Wallet, TOTAL_SUPPLY),
            max_transfer_amount: default_cap(CapKind::Transfer, TOTAL_SUPPLY),
            swap_threshold: DEFAULT_SWAP_THRESHOLD,
            treasury: params.treasury,
            pair,
            router: params.router,
            liquidity_recipient: LiquidityRecipient::Administrator,
            launch: LaunchState {
                launched: false,
                launch_timestamp: 0,
                whitelist_period: params.whitelist_period,
            },
        };

        let mut policy = PolicyStore::new(config);
        for address in [params.admin, params.token_address, params.treasury] {
            policy.set_all_flags(address, AddressFlags::exempt());
        }
        let mut pair_flags = policy.flags(&pair);
        pair_flags.max_wallet_exempt = true;
        pair_flags.max_transfer_exempt = true;
        policy.set_all_flags(pair, pair_flags);
        let mut router_flags = policy.flags(&params.router);
        router_flags.max_transfer_exempt = true;
        policy.set_all_flags(params.router, router_flags);

        let state = TokenState {
            token_address: params.token_address,
            ledger: Ledger::with_initial_supply(TOTAL_SUPPLY, params.admin),
            policy,
        };

        tracing::info!(
            token = %params.token_address,
            admin = %params.admin,
            pair = %pair,
            "Deployed {} ({}) with supply {}",
            metadata::NAME,
            metadata::SYMBOL,
            TOTAL_SUPPLY
        );

        let mut core = TokenCore::new(state);
        core.emit(Event::Transfer {
            from: Address::ZERO,
            to: params.admin,
            value: TOTAL_SUPPLY,
        });

        Ok(Self { core, venue, env })
    }

    /// Resume from persisted state. The reentrancy guard always starts idle.
    pub fn restore(state: TokenState, venue: V, env: E) -> Self {
        Self {
            core: TokenCore::new(state),
            venue,
            env,
        }
    }

    /// Return to a previously captured state, dropping pending events
    pub fn reset_state(&mut self, state: TokenState) {
        self.core = TokenCore::new(state);
    }

    // ---------------------------------------------------------------------
    // Transfers
    // ---------------------------------------------------------------------

    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt> {
        let now = self.env.now();
        self.core
            .transfer(now, Some(&mut self.venue as &mut dyn ExchangeVenue), from, to, amount)
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt> {
        let now = self.env.now();
        self.core.transfer_from(
            now,
            Some(&mut self.venue as &mut dyn ExchangeVenue),
            spender,
            from,
            to,
            amount,
        )
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<()> {
        self.core.approve(owner, spender, amount)
    }

    // ---------------------------------------------------------------------
    // Read surface
    // ---------------------------------------------------------------------

    pub fn name(&self) -> &'static str {
        metadata::NAME
    }

    pub fn symbol(&self) -> &'static str {
        metadata::SYMBOL
    }

    pub fn decimals(&self) -> u8 {
        metadata::DECIMALS
    }

    pub fn total_supply(&self) -> Amount {
        self.core.state.ledger.total_supply()
    }

    pub fn unminted(&self) -> Amount {
        self.core.state.ledger.unminted()
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.core.state.ledger.balance_of(holder)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.core.state.ledger.allowance(owner, spender)
    }

    pub fn token_address(&self) -> Address {
        self.core.state.token_address
    }

    /// Accrued, not yet distributed fee tokens
    pub fn accrued_fees(&self) -> Amount {
        self.balance_of(&self.core.state.token_address)
    }

    /// Native coin held by the ledger contract (dust left over from liquidity deposits)
    pub fn native_balance(&self) -> NativeAmount {
        self.core.state.ledger.native_balance()
    }

    pub fn policy(&self) -> &PolicyConfig {
        self.core.state.policy.config()
    }

    pub fn flags(&self, address: &Address) -> AddressFlags {
        self.core.state.policy.flags(address)
    }

    pub fn has_flag(&self, address: &Address, flag: AddressFlag) -> bool {
        self.core.state.policy.has_flag(address, flag)
    }

    pub fn owner(&self) -> Address {
        self.policy().owner
    }

    pub fn buy_fee(&self) -> FeeSchedule {
        self.policy().buy_fee
    }

    pub fn sell_fee(&self) -> FeeSchedule {
        self.policy().sell_fee
    }

    pub fn total_buy_fee_rate(&self) -> u32 {
        self.policy().buy_fee.total()
    }

    pub fn total_sell_fee_rate(&self) -> u32 {
        self.policy().sell_fee.total()
    }

    pub fn max_wallet_amount(&self) -> Amount {
        self.policy().max_wallet_amount
    }

    pub fn max_transfer_amount(&self) -> Amount {
        self.policy().max_transfer_amount
    }

    pub fn swap_threshold(&self) -> Amount {
        self.policy().swap_threshold
    }

    pub fn treasury(&self) -> Address {
        self.policy().treasury
    }

    pub fn pair(&self) -> Address {
        self.policy().pair
    }

    pub fn router(&self) -> Address {
        self.policy().router
    }

    pub fn launch(&self) -> LaunchState {
        self.policy().launch
    }

    pub fn whitelist_period(&self) -> Timestamp {
        self.policy().launch.whitelist_period
    }

    pub fn is_distributing(&self) -> bool {
        self.core.guard == DistributionState::Distributing
    }

    /// Persistable state
    pub fn state(&self) -> &TokenState {
        &self.core.state
    }

    /// Drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.core.events)
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn venue_mut(&mut self) -> &mut V {
        &mut self.venue
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub(crate) fn core_mut(&mut self) -> &mut TokenCore {
        &mut self.core
    }

    pub(crate) fn core(&self) -> &TokenCore {
        &self.core
    }
}
