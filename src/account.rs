use std::collections::HashSet;

use thiserror::Error;

pub type AccountId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    AccountCreation,
    Deposit,
    TransferOut,
    TransferIn,
    Pay,
    Cashback,
    Merge,
}

impl EntryKind {
    /// Outgoing kinds are the ones counted by top-spender queries.
    pub fn is_outgoing(self) -> bool {
        matches!(self, EntryKind::Pay | EntryKind::TransferOut)
    }
}

/// One immutable balance-affecting event. `balance` is the running balance
/// of the owning stream right after the event was applied; `origin` tags
/// which logical account produced the entry, so sub-histories stay
/// distinguishable after accounts are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub timestamp: u64,
    pub kind: EntryKind,
    pub amount: u64,
    pub balance: u64,
    pub origin: AccountId,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("insufficient funds: balance is {balance}, requested {requested}")]
    InsufficientFunds { balance: u64, requested: u64 },
}

/// Append-only, time-ordered history of one account. The first entry is
/// always the creation seed, so the history is never empty.
#[derive(Debug)]
pub struct Account {
    entries: Vec<LedgerEntry>,
}

impl Account {
    pub fn open(timestamp: u64, id: &str) -> Self {
        Self {
            entries: vec![LedgerEntry {
                timestamp,
                kind: EntryKind::AccountCreation,
                amount: 0,
                balance: 0,
                origin: id.to_owned(),
            }],
        }
    }

    pub fn balance(&self) -> u64 {
        self.entries.last().map(|entry| entry.balance).unwrap_or(0)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn credit(&mut self, timestamp: u64, kind: EntryKind, amount: u64, origin: &str) -> u64 {
        let balance = self.balance() + amount;
        self.entries.push(LedgerEntry {
            timestamp,
            kind,
            amount,
            balance,
            origin: origin.to_owned(),
        });
        balance
    }

    /// Debits fail without touching the history when funds are short.
    pub fn debit(
        &mut self,
        timestamp: u64,
        kind: EntryKind,
        amount: u64,
        origin: &str,
    ) -> Result<u64, AccountError> {
        let balance = self.balance();
        if balance < amount {
            return Err(AccountError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }
        let balance = balance - amount;
        self.entries.push(LedgerEntry {
            timestamp,
            kind,
            amount,
            balance,
            origin: origin.to_owned(),
        });
        Ok(balance)
    }

    /// Sum of all outgoing amounts over the full history, folded
    /// sub-histories included.
    pub fn outgoing_total(&self) -> u64 {
        self.entries
            .iter()
            .filter(|entry| entry.kind.is_outgoing())
            .map(|entry| entry.amount)
            .sum()
    }

    /// Balance after the last entry at or before `time_at` whose origin is
    /// in `origins`. `None` when no such entry exists, i.e. the queried
    /// identity had no recorded history yet at `time_at`.
    ///
    /// Entries are kept sorted by timestamp (insertion order on ties), so
    /// the first match from the back is the answer.
    pub fn balance_at(&self, time_at: u64, origins: &HashSet<&str>) -> Option<u64> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.timestamp <= time_at && origins.contains(entry.origin.as_str()))
            .map(|entry| entry.balance)
    }

    /// Folds `other`'s entries into this history: the combined stream is
    /// re-sorted by timestamp (stable, so same-timestamp entries keep
    /// their relative order) and a Merge audit entry is appended last,
    /// carrying the absorbed balance as its amount and the summed balance
    /// as the new running balance.
    pub fn merge_in(&mut self, timestamp: u64, id: &str, other: Account) -> u64 {
        let absorbed = other.balance();
        let combined = self.balance() + absorbed;
        self.entries.extend(other.entries);
        self.entries.sort_by_key(|entry| entry.timestamp);
        self.entries.push(LedgerEntry {
            timestamp,
            kind: EntryKind::Merge,
            amount: absorbed,
            balance: combined,
            origin: id.to_owned(),
        });
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_and_debit_keep_running_balance() {
        let mut acc = Account::open(1, "A1");
        assert_eq!(acc.balance(), 0);
        assert_eq!(acc.credit(2, EntryKind::Deposit, 500, "A1"), 500);
        assert_eq!(acc.debit(3, EntryKind::Pay, 200, "A1").unwrap(), 300);
        assert_eq!(acc.balance(), 300);
        assert_eq!(acc.entries().len(), 3);
        let last = acc.entries().last().unwrap();
        assert_eq!(last.kind, EntryKind::Pay);
        assert_eq!(last.amount, 200);
        assert_eq!(last.balance, 300);
    }

    #[test]
    fn overdraft_leaves_history_untouched() {
        let mut acc = Account::open(1, "A1");
        acc.credit(2, EntryKind::Deposit, 100, "A1");
        let err = acc.debit(3, EntryKind::Pay, 101, "A1").unwrap_err();
        assert!(matches!(
            err,
            AccountError::InsufficientFunds {
                balance: 100,
                requested: 101
            }
        ));
        assert_eq!(acc.balance(), 100);
        assert_eq!(acc.entries().len(), 2);

        // paying the exact balance is fine
        assert_eq!(acc.debit(4, EntryKind::Pay, 100, "A1").unwrap(), 0);
    }

    #[test]
    fn outgoing_total_counts_pay_and_transfer_out() {
        let mut acc = Account::open(1, "A1");
        acc.credit(2, EntryKind::Deposit, 1000, "A1");
        acc.debit(3, EntryKind::TransferOut, 300, "A1").unwrap();
        acc.credit(4, EntryKind::TransferIn, 50, "A1");
        acc.debit(5, EntryKind::Pay, 100, "A1").unwrap();
        acc.credit(6, EntryKind::Cashback, 2, "A1");
        assert_eq!(acc.outgoing_total(), 400);
    }

    #[test]
    fn balance_at_filters_by_time_and_origin() {
        let mut acc = Account::open(1, "A1");
        acc.credit(5, EntryKind::Deposit, 500, "A1");

        let a1_only = HashSet::from(["A1"]);
        assert_eq!(acc.balance_at(0, &a1_only), None);
        assert_eq!(acc.balance_at(1, &a1_only), Some(0));
        assert_eq!(acc.balance_at(4, &a1_only), Some(0));
        assert_eq!(acc.balance_at(5, &a1_only), Some(500));

        // entries of a foreign origin are invisible to the filter
        let a2_only = HashSet::from(["A2"]);
        assert_eq!(acc.balance_at(10, &a2_only), None);
    }

    #[test]
    fn merge_in_interleaves_histories_and_appends_audit_entry() {
        let mut primary = Account::open(1, "A1");
        primary.credit(4, EntryKind::Deposit, 500, "A1");
        let mut secondary = Account::open(2, "A2");
        secondary.credit(3, EntryKind::Deposit, 300, "A2");
        secondary.debit(5, EntryKind::Pay, 100, "A2").unwrap();

        assert_eq!(primary.merge_in(1000, "A1", secondary), 700);
        assert_eq!(primary.balance(), 700);

        let timestamps: Vec<u64> = primary.entries().iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![1, 2, 3, 4, 5, 1000]);

        let audit = primary.entries().last().unwrap();
        assert_eq!(audit.kind, EntryKind::Merge);
        assert_eq!(audit.amount, 200);
        assert_eq!(audit.balance, 700);
        assert_eq!(audit.origin, "A1");

        // provenance tags survive the fold
        let a2_only = HashSet::from(["A2"]);
        assert_eq!(primary.balance_at(999, &a2_only), Some(200));
    }
}
