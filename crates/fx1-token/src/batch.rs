//! Batch Sender
//!
//! Administrator-only distribution of tokens to many recipients in one
//! all-or-nothing call. Moves are fee-free and skip the launch and whitelist
//! gates, but the recipient wallet cap still applies.

use std::collections::BTreeMap;

use fx1_core::{Address, Amount};

use crate::env::Environment;
use crate::state::{Event, Result, TokenError};
use crate::token::Token;
use crate::venue::ExchangeVenue;

impl<V: ExchangeVenue, E: Environment> Token<V, E> {
    /// Send `amounts[i]` to `recipients[i]` from the caller's balance
    pub fn multi_send(
        &mut self,
        caller: Address,
        recipients: &[Address],
        amounts: &[Amount],
    ) -> Result<()> {
        let core = self.core_mut();
        let policy = &core.state.policy;
        policy.ensure_owner(&caller)?;

        if recipients.len() != amounts.len() || recipients.is_empty() {
            return Err(TokenError::LengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            });
        }
        if let Some(index) = recipients.iter().position(Address::is_zero) {
            return Err(TokenError::InvalidRecipient { index });
        }

        let ledger = &core.state.ledger;
        let available = ledger.balance_of(&caller);
        let required = amounts
            .iter()
            .try_fold(0 as Amount, |acc, a| acc.checked_add(*a));
        match required {
            Some(required) if required <= available => {}
            Some(required) => {
                return Err(TokenError::InsufficientBalance {
                    required,
                    available,
                })
            }
            None => {
                return Err(TokenError::InsufficientBalance {
                    required: Amount::MAX,
                    available,
                })
            }
        }

        // Project resulting balances so repeated recipients are capped on their total
        let cap = policy.config().max_wallet_amount;
        let mut projected: BTreeMap<Address, Amount> = BTreeMap::new();
        for (to, amount) in recipients.iter().zip(amounts) {
            if *to == caller || policy.flags(to).max_wallet_exempt {
                continue;
            }
            let entry = projected.entry(*to).or_insert_with(|| ledger.balance_of(to));
            *entry = entry.saturating_add(*amount);
            if *entry > cap {
                return Err(TokenError::WalletCapExceeded {
                    address: *to,
                    resulting: *entry,
                    cap,
                });
            }
        }

        for (to, amount) in recipients.iter().zip(amounts) {
            core.state.ledger.apply_transfer(&caller, to, *amount, 0, to)?;
            core.emit(Event::Transfer {
                from: caller,
                to: *to,
                value: *amount,
            });
        }

        tracing::info!(
            caller = %caller,
            recipients = recipients.len(),
            "Batch send completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AddressFlag;
    use crate::testing::{deployed, ids, tokens};

    #[test]
    fn test_multi_send() {
        let mut token = deployed();
        token.take_events();
        let recipients = [ids::user(1), ids::user(2), ids::user(3)];
        let amounts = [tokens(1), tokens(2), tokens(3)];
        token.multi_send(ids::ADMIN, &recipients, &amounts).unwrap();

        assert_eq!(token.balance_of(&ids::user(1)), tokens(1));
        assert_eq!(token.balance_of(&ids::user(2)), tokens(2));
        assert_eq!(token.balance_of(&ids::user(3)), tokens(3));
        assert_eq!(token.accrued_fees(), 0);
        assert_eq!(token.take_events().len(), 3);
    }

    #[test]
    fn test_multi_send_length_mismatch() {
        let mut token = deployed();
        let recipients = [ids::user(1), ids::user(2), ids::user(3)];
        assert_eq!(
            token.multi_send(ids::ADMIN, &recipients, &[tokens(1), tokens(2)]),
            Err(TokenError::LengthMismatch {
                recipients: 3,
                amounts: 2
            })
        );
        assert!(matches!(
            token.multi_send(ids::ADMIN, &[], &[]),
            Err(TokenError::LengthMismatch { .. })
        ));
        assert_eq!(token.balance_of(&ids::user(1)), 0);
    }

    #[test]
    fn test_multi_send_insufficient_balance_moves_nothing() {
        let mut token = deployed();
        let admin_before = token.balance_of(&ids::ADMIN);
        token.transfer_ownership(ids::ADMIN, ids::user(9)).unwrap();
        token.transfer(ids::ADMIN, ids::user(9), tokens(5)).unwrap();

        let recipients = [ids::user(1), ids::user(2)];
        assert_eq!(
            token.multi_send(ids::user(9), &recipients, &[tokens(3), tokens(3)]),
            Err(TokenError::InsufficientBalance {
                required: tokens(6),
                available: tokens(5)
            })
        );
        assert_eq!(token.balance_of(&ids::user(1)), 0);
        assert_eq!(token.balance_of(&ids::user(9)), tokens(5));
        assert_eq!(token.balance_of(&ids::ADMIN), admin_before - tokens(5));
    }

    #[test]
    fn test_multi_send_overflowing_sum() {
        let mut token = deployed();
        let recipients = [ids::user(1), ids::user(2)];
        assert!(matches!(
            token.multi_send(ids::ADMIN, &recipients, &[Amount::MAX, 1]),
            Err(TokenError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_multi_send_rejects_null_recipient() {
        let mut token = deployed();
        assert_eq!(
            token.multi_send(ids::ADMIN, &[ids::user(1), Address::ZERO], &[1, 1]),
            Err(TokenError::InvalidRecipient { index: 1 })
        );
    }

    #[test]
    fn test_multi_send_admin_only() {
        let mut token = deployed();
        assert!(matches!(
            token.multi_send(ids::user(1), &[ids::user(2)], &[1]),
            Err(TokenError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_multi_send_caps_repeated_recipient() {
        let mut token = deployed();
        let cap = token.max_wallet_amount();
        let half = cap / 2 + 1;
        assert!(matches!(
            token.multi_send(ids::ADMIN, &[ids::user(1), ids::user(1)], &[half, half]),
            Err(TokenError::WalletCapExceeded { .. })
        ));
        assert_eq!(token.balance_of(&ids::user(1)), 0);

        token
            .exclude_wallets_from_max_wallets(ids::ADMIN, &[ids::user(1)], true)
            .unwrap();
        token
            .multi_send(ids::ADMIN, &[ids::user(1), ids::user(1)], &[half, half])
            .unwrap();
        assert!(token.has_flag(&ids::user(1), AddressFlag::MaxWalletExempt));
        assert_eq!(token.balance_of(&ids::user(1)), half * 2);
    }
}
