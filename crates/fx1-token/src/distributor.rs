//! Proceeds Distributor
//!
//! Converts the accrued fee holding through the exchange venue:
//! the marketing share is swapped to native coin for the treasury, the
//! liquidity share is half swapped and half paired with that coin as a pool
//! deposit.
//!
//! The whole run is atomic from the ledger's point of view. Ledger writes are
//! journaled and rolled back if any venue leg fails, and the triggering
//! transfer still succeeds. The guard is held for the duration so router
//! pulls (and anything they trigger) are fee-free and cannot start a nested
//! distribution.

use fx1_core::constants::DEAD_ADDRESS;
use fx1_core::{Address, Amount, NativeAmount, Timestamp};

use crate::calculator::partition_proceeds;
use crate::state::{
    DistributionOutcome, DistributionReport, DistributionState, Event, LiquidityRecipient, Result,
    TokenError,
};
use crate::token::TokenCore;
use crate::venue::{ExchangeVenue, LiquidityRequest, SwapRequest, TokenPort, VenueError};

/// The ledger handed to the venue while a distribution is running
pub(crate) struct ReentrantPort<'a> {
    core: &'a mut TokenCore,
    now: Timestamp,
}

impl TokenPort for ReentrantPort<'_> {
    fn token_address(&self) -> Address {
        self.core.state.token_address
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.core.state.ledger.balance_of(holder)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> std::result::Result<(), TokenError> {
        self.core
            .transfer_from(self.now, None, *spender, *from, *to, amount)
            .map(|_| ())
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> std::result::Result<(), TokenError> {
        self.core.transfer(self.now, None, *from, *to, amount).map(|_| ())
    }
}

fn leg_failed(e: VenueError) -> TokenError {
    TokenError::DistributionFailed {
        reason: e.to_string(),
    }
}

/// Holds the distribution guard for one run.
///
/// Dropping the scope, including while unwinding out of a venue call, undoes
/// any ledger writes left uncommitted along with their events and returns the
/// guard to `Idle`.
struct DistributionScope<'a> {
    core: &'a mut TokenCore,
    events_mark: usize,
}

impl<'a> DistributionScope<'a> {
    fn enter(core: &'a mut TokenCore) -> Self {
        core.guard = DistributionState::Distributing;
        let events_mark = core.events.len();
        Self { core, events_mark }
    }
}

impl Drop for DistributionScope<'_> {
    fn drop(&mut self) {
        if self.core.state.ledger.journal_open() {
            self.core.state.ledger.rollback_journal();
            self.core.events.truncate(self.events_mark);
        }
        self.core.guard = DistributionState::Idle;
    }
}

impl TokenCore {
    /// Run `f` with the guard set; the guard is cleared on every exit path
    fn guarded<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut scope = DistributionScope::enter(self);
        f(&mut *scope.core)
    }

    /// Distribute the current holding. Never fails the caller: a failed run is
    /// rolled back and reported in the outcome.
    pub(crate) fn run_distribution(
        &mut self,
        now: Timestamp,
        venue: &mut dyn ExchangeVenue,
    ) -> DistributionOutcome {
        let events_mark = self.events.len();

        let result = self.guarded(|core| {
            core.state.ledger.begin_journal();
            let result = core.distribute_proceeds(now, venue);
            match result {
                Ok(_) => core.state.ledger.commit_journal(),
                Err(_) => core.state.ledger.rollback_journal(),
            }
            result
        });

        match result {
            Ok(report) => {
                tracing::info!(
                    marketing = %report.split.marketing,
                    liquidity = %(report.split.liquidity_swap + report.split.liquidity_pair),
                    native_to_treasury = %report.native_to_treasury,
                    liquidity_minted = %report.liquidity_minted,
                    "Proceeds distributed"
                );
                self.emit(Event::ProceedsDistributed(report.clone()));
                DistributionOutcome::Completed(report)
            }
            Err(e) => {
                self.events.truncate(events_mark);
                let reason = e.to_string();
                tracing::warn!("Proceeds distribution rolled back: {}", reason);
                self.emit(Event::DistributionFailed {
                    reason: reason.clone(),
                });
                DistributionOutcome::Failed { reason }
            }
        }
    }

    fn distribute_proceeds(
        &mut self,
        now: Timestamp,
        venue: &mut dyn ExchangeVenue,
    ) -> Result<DistributionReport> {
        let token = self.state.token_address;
        let config = self.state.policy.config().clone();
        let held = self.state.ledger.balance_of(&token);
        let split = partition_proceeds(held, &config.sell_fee);

        let mut report = DistributionReport {
            split,
            ..DistributionReport::default()
        };
        if split.total() == 0 {
            return Ok(report);
        }

        let wrapped = venue.wrapped_native(&config.router).map_err(leg_failed)?;
        let path = vec![token, wrapped];

        if split.marketing > 0 {
            report.native_to_treasury = self.swap_for_native(
                now,
                venue,
                &config.router,
                SwapRequest {
                    amount_in: split.marketing,
                    min_out: 0,
                    path: path.clone(),
                    recipient: config.treasury,
                    deadline: now,
                },
            )?;
        }

        if split.liquidity_swap > 0 && split.liquidity_pair > 0 {
            let native = self.swap_for_native(
                now,
                venue,
                &config.router,
                SwapRequest {
                    amount_in: split.liquidity_swap,
                    min_out: 0,
                    path,
                    recipient: token,
                    deadline: now,
                },
            )?;
            self.state.ledger.credit_native(native);

            let recipient = match config.liquidity_recipient {
                LiquidityRecipient::Administrator => config.owner,
                LiquidityRecipient::LockedSink => DEAD_ADDRESS,
            };
            let request = LiquidityRequest {
                token_amount: split.liquidity_pair,
                native_amount: native,
                min_token: 0,
                min_native: 0,
                recipient,
                deadline: now,
            };
            self.state
                .ledger
                .set_allowance(token, config.router, split.liquidity_pair);
            let receipt = {
                let mut port = ReentrantPort { core: &mut *self, now };
                venue.add_liquidity(&config.router, &mut port, &request)
            }
            .map_err(leg_failed)?;

            if receipt.token_used > split.liquidity_pair || receipt.native_used > native {
                return Err(TokenError::DistributionFailed {
                    reason: format!(
                        "router overspent deposit: {} tokens, {} coin",
                        receipt.token_used, receipt.native_used
                    ),
                });
            }
            self.state.ledger.debit_native(receipt.native_used)?;
            // unused allowance does not outlive the run
            self.state.ledger.set_allowance(token, config.router, 0);

            report.native_to_pool = receipt.native_used;
            report.tokens_to_pool = receipt.token_used;
            report.liquidity_minted = receipt.liquidity;
        }

        Ok(report)
    }

    fn swap_for_native(
        &mut self,
        now: Timestamp,
        venue: &mut dyn ExchangeVenue,
        router: &Address,
        request: SwapRequest,
    ) -> Result<NativeAmount> {
        let token = self.state.token_address;
        self.state
            .ledger
            .set_allowance(token, *router, request.amount_in);
        let mut port = ReentrantPort { core: &mut *self, now };
        venue
            .swap_tokens_for_native(router, &mut port, &request)
            .map_err(leg_failed)
    }
}
