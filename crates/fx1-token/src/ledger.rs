//! Balance Ledger
//!
//! Holder balances, allowances, and the token contract's native-coin purse.
//! Supply is minted once at construction; afterwards balances only move.
//!
//! A journal can be opened around a block of mutations so they can be undone
//! as a unit (used by proceeds distribution, whose external calls may fail
//! after earlier legs already moved tokens).

use std::collections::BTreeMap;

use fx1_core::{Address, Amount, NativeAmount};
use serde::{Deserialize, Serialize};

use crate::state::{Result, TokenError};

#[derive(Debug, Clone)]
enum JournalEntry {
    Balance(Address, Option<Amount>),
    Allowance(Address, Address, Option<Amount>),
    Native(NativeAmount),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    total_supply: Amount,
    minted: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    native_balance: NativeAmount,
    #[serde(skip)]
    journal: Option<Vec<JournalEntry>>,
}

impl Ledger {
    /// Create a ledger with the whole supply minted to `holder`
    pub fn with_initial_supply(total_supply: Amount, holder: Address) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(holder, total_supply);
        Self {
            total_supply,
            minted: total_supply,
            balances,
            allowances: BTreeMap::new(),
            native_balance: 0,
            journal: None,
        }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Supply not yet credited to any holder
    pub fn unminted(&self) -> Amount {
        self.total_supply - self.minted
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Native coin held by the token contract itself
    pub fn native_balance(&self) -> NativeAmount {
        self.native_balance
    }

    /// Sum of every recorded balance
    pub fn sum_balances(&self) -> Amount {
        self.balances.values().sum()
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    pub fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        let previous = self.allowances.get(&owner).and_then(|m| m.get(&spender)).copied();
        self.record(JournalEntry::Allowance(owner, spender, previous));
        self.allowances.entry(owner).or_default().insert(spender, amount);
    }

    /// Remove `amount` from `holder`, failing without change if the balance is short
    pub fn debit(&mut self, holder: &Address, amount: Amount) -> Result<()> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        self.write_balance(*holder, available - amount);
        Ok(())
    }

    /// Add `amount` to `holder`. Bounded by total supply, so it cannot overflow.
    pub fn credit(&mut self, holder: &Address, amount: Amount) {
        let balance = self.balance_of(holder);
        self.write_balance(*holder, balance.saturating_add(amount));
    }

    /// Debit `from` by `amount`, credit `to` with `amount - fee` and `fee_sink` with `fee`
    pub fn apply_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
        fee: Amount,
        fee_sink: &Address,
    ) -> Result<()> {
        self.debit(from, amount)?;
        self.credit(to, amount - fee);
        if fee > 0 {
            self.credit(fee_sink, fee);
        }
        Ok(())
    }

    pub fn credit_native(&mut self, amount: NativeAmount) {
        self.record(JournalEntry::Native(self.native_balance));
        self.native_balance = self.native_balance.saturating_add(amount);
    }

    pub fn debit_native(&mut self, amount: NativeAmount) -> Result<()> {
        if amount > self.native_balance {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available: self.native_balance,
            });
        }
        self.record(JournalEntry::Native(self.native_balance));
        self.native_balance -= amount;
        Ok(())
    }

    /// Start recording undo information
    pub fn begin_journal(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Whether changes are currently being recorded
    pub fn journal_open(&self) -> bool {
        self.journal.is_some()
    }

    /// Keep every change since `begin_journal`
    pub fn commit_journal(&mut self) {
        self.journal = None;
    }

    /// Undo every change since `begin_journal`, newest first
    pub fn rollback_journal(&mut self) {
        let Some(entries) = self.journal.take() else {
            return;
        };
        for entry in entries.into_iter().rev() {
            match entry {
                JournalEntry::Balance(holder, Some(previous)) => {
                    self.balances.insert(holder, previous);
                }
                JournalEntry::Balance(holder, None) => {
                    self.balances.remove(&holder);
                }
                JournalEntry::Allowance(owner, spender, Some(previous)) => {
                    self.allowances.entry(owner).or_default().insert(spender, previous);
                }
                JournalEntry::Allowance(owner, spender, None) => {
                    if let Some(m) = self.allowances.get_mut(&owner) {
                        m.remove(&spender);
                        if m.is_empty() {
                            self.allowances.remove(&owner);
                        }
                    }
                }
                JournalEntry::Native(previous) => self.native_balance = previous,
            }
        }
    }

    fn write_balance(&mut self, holder: Address, amount: Amount) {
        let previous = self.balances.get(&holder).copied();
        self.record(JournalEntry::Balance(holder, previous));
        self.balances.insert(holder, amount);
    }

    fn record(&mut self, entry: JournalEntry) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn test_initial_mint() {
        let ledger = Ledger::with_initial_supply(1_000, addr(1));
        assert_eq!(ledger.balance_of(&addr(1)), 1_000);
        assert_eq!(ledger.unminted(), 0);
        assert_eq!(ledger.sum_balances(), ledger.total_supply());
    }

    #[test]
    fn test_debit_short_balance_changes_nothing() {
        let mut ledger = Ledger::with_initial_supply(1_000, addr(1));
        let err = ledger.debit(&addr(2), 1).unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientBalance {
                required: 1,
                available: 0
            }
        );
        assert_eq!(ledger.holder_count(), 1);
    }

    #[test]
    fn test_apply_transfer_routes_fee() {
        let mut ledger = Ledger::with_initial_supply(1_000, addr(1));
        ledger.apply_transfer(&addr(1), &addr(2), 100, 5, &addr(99)).unwrap();
        assert_eq!(ledger.balance_of(&addr(1)), 900);
        assert_eq!(ledger.balance_of(&addr(2)), 95);
        assert_eq!(ledger.balance_of(&addr(99)), 5);
        assert_eq!(ledger.sum_balances(), 1_000);
    }

    #[test]
    fn test_zero_balance_is_kept() {
        let mut ledger = Ledger::with_initial_supply(10, addr(1));
        ledger.apply_transfer(&addr(1), &addr(2), 10, 0, &addr(99)).unwrap();
        assert_eq!(ledger.balance_of(&addr(1)), 0);
        assert_eq!(ledger.holder_count(), 2);
    }

    #[test]
    fn test_rollback_restores_everything() {
        let mut ledger = Ledger::with_initial_supply(1_000, addr(1));
        ledger.set_allowance(addr(1), addr(3), 50);
        let before = serde_json::to_value(&ledger).unwrap();

        ledger.begin_journal();
        ledger.apply_transfer(&addr(1), &addr(2), 300, 0, &addr(99)).unwrap();
        ledger.set_allowance(addr(1), addr(3), 0);
        ledger.set_allowance(addr(2), addr(4), 7);
        ledger.credit_native(42);
        ledger.debit_native(2).unwrap();
        ledger.rollback_journal();

        assert_eq!(serde_json::to_value(&ledger).unwrap(), before);
        assert_eq!(ledger.native_balance(), 0);
        assert_eq!(ledger.allowance(&addr(2), &addr(4)), 0);
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut ledger = Ledger::with_initial_supply(1_000, addr(1));
        ledger.begin_journal();
        ledger.credit_native(42);
        ledger.commit_journal();
        ledger.rollback_journal();
        assert_eq!(ledger.native_balance(), 42);
    }
}
