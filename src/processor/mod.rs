use std::fmt;

use thiserror::Error;

use crate::{
    account::{AccountError, AccountId},
    cashback::PaymentId,
};

pub mod in_memory_processor;

/// Business rejections of the public operations. None of these are fatal;
/// the ledger is left exactly as it was before the rejected call.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("account `{0}` does not exist")]
    AccountNotFound(AccountId),
    #[error("account id `{0}` is already taken")]
    AccountTaken(AccountId),
    #[error("source and target accounts must differ")]
    SameAccount,
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("payment `{payment}` does not belong to account `{account}`")]
    PaymentNotFound {
        account: AccountId,
        payment: PaymentId,
    },
    #[error("account `{account}` has no recorded balance at {time_at}")]
    NoBalanceRecorded { account: AccountId, time_at: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    InProgress,
    CashbackReceived,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::InProgress => f.write_str("IN_PROGRESS"),
            PaymentStatus::CashbackReceived => f.write_str("CASHBACK_RECEIVED"),
        }
    }
}

/// The synchronous public interface of the ledger engine. Timestamps are
/// integer milliseconds, non-decreasing across calls by caller contract.
///
/// Every time-carrying operation except `create_account` first credits all
/// cashback due at or before its timestamp, so callers never observe
/// due-but-pending cashback.
pub trait BankProcessor {
    /// Registers a fresh account. Rejects ids already in use, including
    /// ids retired by a merge.
    fn create_account(&mut self, timestamp: u64, id: &str) -> Result<(), LedgerError>;

    /// Credits `amount` and returns the new balance.
    fn deposit(&mut self, timestamp: u64, id: &str, amount: u64) -> Result<u64, LedgerError>;

    /// Moves `amount` from `source` to `target` and returns the new source
    /// balance. Rejects missing parties, `source == target` and
    /// insufficient funds.
    fn transfer(
        &mut self,
        timestamp: u64,
        source: &str,
        target: &str,
        amount: u64,
    ) -> Result<u64, LedgerError>;

    /// Withdraws `amount` and schedules a 2% cashback maturing 24 hours
    /// later. Returns the payment's globally unique identifier.
    fn pay(&mut self, timestamp: u64, id: &str, amount: u64) -> Result<PaymentId, LedgerError>;

    /// At most `n` accounts, formatted `id(total)`, ordered by total
    /// outgoing amount descending, ties by id ascending. Retired accounts
    /// are excluded; their spending already counts towards the account
    /// that absorbed them.
    fn top_spenders(&mut self, timestamp: u64, n: usize) -> Vec<String>;

    /// Status of a payment, addressed by its *current* beneficiary (after
    /// a merge that is the surviving account).
    fn get_payment_status(
        &mut self,
        timestamp: u64,
        id: &str,
        payment: PaymentId,
    ) -> Result<PaymentStatus, LedgerError>;

    /// Folds `secondary`'s history and pending cashback into `primary`
    /// and retires `secondary`.
    fn merge_accounts(
        &mut self,
        timestamp: u64,
        primary: &str,
        secondary: &str,
    ) -> Result<(), LedgerError>;

    /// Balance of `id` as it stood at `time_at`, answered from whichever
    /// account holds `id`'s history today.
    fn get_balance(&mut self, timestamp: u64, id: &str, time_at: u64)
        -> Result<u64, LedgerError>;
}
