//! Transfer Engine
//!
//! Every balance movement goes through `plan_transfer` then `apply_plan`.
//! Planning performs all validation against current state and mutates
//! nothing; a rejected transfer therefore leaves the ledger untouched.
//!
//! Validation order:
//! 1. zero amount, null recipient
//! 2. bot flag on either side
//! 3. trading not open (owner and fee-exempt senders may move pre-launch)
//! 4. whitelist window
//! 5. direction and fee
//! 6. transfer cap (sender exemption), then wallet cap (recipient exemption)
//! 7. sender balance

use fx1_core::{Address, Amount, Timestamp};

use crate::calculator::{fee_amount, resolve_direction};
use crate::state::{
    AddressFlags, Direction, DistributionState, Event, Result, TokenError, TransferReceipt,
};
use crate::token::TokenCore;
use crate::venue::ExchangeVenue;

/// A validated transfer, ready to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransferPlan {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub fee: Amount,
    pub direction: Direction,
}

impl TransferPlan {
    pub fn credited(&self) -> Amount {
        self.amount - self.fee
    }
}

fn cleared_for_window(flags: &AddressFlags) -> bool {
    flags.whitelisted || flags.fee_exempt
}

impl TokenCore {
    pub(crate) fn plan_transfer(
        &self,
        now: Timestamp,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferPlan> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        if to.is_zero() {
            return Err(TokenError::InvalidAddress {
                field: "recipient",
                address: to,
            });
        }

        let policy = &self.state.policy;
        let config = policy.config();
        let from_flags = policy.flags(&from);
        let to_flags = policy.flags(&to);

        if from_flags.bot {
            return Err(TokenError::BotRejected { address: from });
        }
        if to_flags.bot {
            return Err(TokenError::BotRejected { address: to });
        }

        if !config.launch.launched && !policy.is_owner(&from) && !from_flags.fee_exempt {
            return Err(TokenError::TradingNotOpen);
        }

        if config.launch.in_whitelist_window(now)
            && !cleared_for_window(&from_flags)
            && !cleared_for_window(&to_flags)
        {
            return Err(TokenError::NotWhitelisted { from, to });
        }

        let direction = resolve_direction(&from, &to, &config.pair);
        let rate = match direction {
            Direction::Buy => config.buy_fee.total(),
            Direction::Sell => config.sell_fee.total(),
            Direction::Plain => 0,
        };
        let taxed =
            self.guard == DistributionState::Idle && !from_flags.fee_exempt && !to_flags.fee_exempt;
        let fee = if taxed { fee_amount(amount, rate) } else { 0 };

        if !from_flags.max_transfer_exempt && amount > config.max_transfer_amount {
            return Err(TokenError::TransferCapExceeded {
                amount,
                cap: config.max_transfer_amount,
            });
        }

        let ledger = &self.state.ledger;
        if !to_flags.max_wallet_exempt && from != to {
            let resulting = ledger.balance_of(&to).saturating_add(amount - fee);
            if resulting > config.max_wallet_amount {
                return Err(TokenError::WalletCapExceeded {
                    address: to,
                    resulting,
                    cap: config.max_wallet_amount,
                });
            }
        }

        let available = ledger.balance_of(&from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        Ok(TransferPlan {
            from,
            to,
            amount,
            fee,
            direction,
        })
    }

    pub(crate) fn apply_plan(&mut self, plan: &TransferPlan) -> Result<()> {
        let sink = self.state.token_address;
        self.state
            .ledger
            .apply_transfer(&plan.from, &plan.to, plan.amount, plan.fee, &sink)?;
        self.emit(Event::Transfer {
            from: plan.from,
            to: plan.to,
            value: plan.credited(),
        });
        if plan.fee > 0 {
            self.emit(Event::Transfer {
                from: plan.from,
                to: sink,
                value: plan.fee,
            });
        }
        Ok(())
    }

    /// Transfer initiated by `from`. `venue` is `None` for reentrant calls.
    pub(crate) fn transfer(
        &mut self,
        now: Timestamp,
        venue: Option<&mut dyn ExchangeVenue>,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt> {
        let plan = self.plan_transfer(now, from, to, amount)?;
        self.apply_plan(&plan)?;
        Ok(self.finish_transfer(now, venue, plan))
    }

    /// Delegated transfer; the allowance is consumed by exactly `amount`
    pub(crate) fn transfer_from(
        &mut self,
        now: Timestamp,
        venue: Option<&mut dyn ExchangeVenue>,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt> {
        let allowed = self.state.ledger.allowance(&from, &spender);
        if amount > allowed {
            return Err(TokenError::AllowanceExceeded {
                required: amount,
                allowed,
            });
        }
        let plan = self.plan_transfer(now, from, to, amount)?;
        self.apply_plan(&plan)?;
        self.state.ledger.set_allowance(from, spender, allowed - amount);
        Ok(self.finish_transfer(now, venue, plan))
    }

    fn finish_transfer(
        &mut self,
        now: Timestamp,
        venue: Option<&mut dyn ExchangeVenue>,
        plan: TransferPlan,
    ) -> TransferReceipt {
        tracing::debug!(
            from = %plan.from,
            to = %plan.to,
            amount = %plan.amount,
            fee = %plan.fee,
            direction = ?plan.direction,
            "Transfer applied"
        );

        let distribution = match venue {
            Some(venue) if self.should_distribute(plan.direction) => {
                Some(self.run_distribution(now, venue))
            }
            _ => None,
        };

        TransferReceipt {
            direction: plan.direction,
            amount: plan.amount,
            fee: plan.fee,
            credited: plan.credited(),
            distribution,
        }
    }

    /// Distribution fires on non-buy transfers once the held fees reach the
    /// threshold. A zero sell schedule gives no split ratio, so the holding waits.
    fn should_distribute(&self, direction: Direction) -> bool {
        let config = self.state.policy.config();
        let held = self.state.ledger.balance_of(&self.state.token_address);
        self.guard == DistributionState::Idle
            && direction != Direction::Buy
            && config.sell_fee.total() > 0
            && held >= config.swap_threshold
    }
}
