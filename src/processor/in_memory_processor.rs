use std::collections::HashMap;

use tracing::{debug, error};

use crate::{
    account::{Account, AccountId, EntryKind},
    cashback::{CashbackScheduler, PaymentId},
    merge::MergeMap,
};

use super::{BankProcessor, LedgerError, PaymentStatus};

/// The whole engine state: account histories, pending cashback and the
/// retired-identity map. One writer at a time by construction; wrap the
/// processor behind a single lock if a multi-threaded host needs it.
#[derive(Default)]
pub struct InMemoryBankProcessor {
    pub accounts: HashMap<AccountId, Account>,
    cashbacks: CashbackScheduler,
    merges: MergeMap,
}

impl InMemoryBankProcessor {
    /// Credits every cashback due at or before `now` into its beneficiary,
    /// in (maturity, ordinal) order. Entries are timestamped at their
    /// maturity, not at `now`.
    fn settle_due_cashback(&mut self, now: u64) {
        while let Some(due) = self.cashbacks.pop_due(now) {
            match self.accounts.get_mut(&due.beneficiary) {
                Some(account) => {
                    let balance = account.credit(
                        due.matures_at,
                        EntryKind::Cashback,
                        due.amount,
                        &due.beneficiary,
                    );
                    debug!(
                        payment = %due.payment,
                        beneficiary = %due.beneficiary,
                        balance,
                        "cashback materialized"
                    );
                }
                // merges reroute pending beneficiaries before retiring
                // them, so a consistent ledger never reaches this branch
                None => error!(
                    payment = %due.payment,
                    beneficiary = %due.beneficiary,
                    "cashback beneficiary missing"
                ),
            }
        }
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_owned()))
    }

    /// Balance after the most recent entry of `id`'s history.
    pub fn current_balance(&self, id: &str) -> Result<u64, LedgerError> {
        self.accounts
            .get(id)
            .map(Account::balance)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_owned()))
    }
}

impl BankProcessor for InMemoryBankProcessor {
    fn create_account(&mut self, timestamp: u64, id: &str) -> Result<(), LedgerError> {
        // retired ids stay reserved so payment and merge lookups remain
        // unambiguous
        if self.accounts.contains_key(id) || self.merges.is_retired(id) {
            return Err(LedgerError::AccountTaken(id.to_owned()));
        }
        self.accounts.insert(id.to_owned(), Account::open(timestamp, id));
        Ok(())
    }

    fn deposit(&mut self, timestamp: u64, id: &str, amount: u64) -> Result<u64, LedgerError> {
        self.settle_due_cashback(timestamp);
        let account = self.account_mut(id)?;
        Ok(account.credit(timestamp, EntryKind::Deposit, amount, id))
    }

    fn transfer(
        &mut self,
        timestamp: u64,
        source: &str,
        target: &str,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        self.settle_due_cashback(timestamp);
        if source == target {
            return Err(LedgerError::SameAccount);
        }
        if !self.accounts.contains_key(target) {
            return Err(LedgerError::AccountNotFound(target.to_owned()));
        }
        let source_balance =
            self.account_mut(source)?
                .debit(timestamp, EntryKind::TransferOut, amount, source)?;
        if let Some(account) = self.accounts.get_mut(target) {
            account.credit(timestamp, EntryKind::TransferIn, amount, target);
        }
        Ok(source_balance)
    }

    fn pay(&mut self, timestamp: u64, id: &str, amount: u64) -> Result<PaymentId, LedgerError> {
        self.settle_due_cashback(timestamp);
        self.account_mut(id)?
            .debit(timestamp, EntryKind::Pay, amount, id)?;
        // the ordinal is allocated only once the withdrawal succeeded
        Ok(self.cashbacks.register(id, timestamp, amount))
    }

    fn top_spenders(&mut self, timestamp: u64, n: usize) -> Vec<String> {
        self.settle_due_cashback(timestamp);
        let mut totals: Vec<(&str, u64)> = self
            .accounts
            .iter()
            .map(|(id, account)| (id.as_str(), account.outgoing_total()))
            .collect();
        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        totals.truncate(n);
        totals
            .into_iter()
            .map(|(id, total)| format!("{id}({total})"))
            .collect()
    }

    fn get_payment_status(
        &mut self,
        timestamp: u64,
        id: &str,
        payment: PaymentId,
    ) -> Result<PaymentStatus, LedgerError> {
        self.settle_due_cashback(timestamp);
        if !self.accounts.contains_key(id) {
            return Err(LedgerError::AccountNotFound(id.to_owned()));
        }
        let pending = self
            .cashbacks
            .get(payment)
            .filter(|pending| pending.beneficiary == id)
            .ok_or_else(|| LedgerError::PaymentNotFound {
                account: id.to_owned(),
                payment,
            })?;
        Ok(if pending.materialized {
            PaymentStatus::CashbackReceived
        } else {
            PaymentStatus::InProgress
        })
    }

    fn merge_accounts(
        &mut self,
        timestamp: u64,
        primary: &str,
        secondary: &str,
    ) -> Result<(), LedgerError> {
        if primary == secondary {
            return Err(LedgerError::SameAccount);
        }
        if !self.accounts.contains_key(primary) {
            return Err(LedgerError::AccountNotFound(primary.to_owned()));
        }
        if !self.accounts.contains_key(secondary) {
            return Err(LedgerError::AccountNotFound(secondary.to_owned()));
        }
        self.settle_due_cashback(timestamp);
        self.cashbacks.redirect_pending(secondary, primary);
        // settling may have credited either side, so detach only now
        let Some(absorbed) = self.accounts.remove(secondary) else {
            return Err(LedgerError::AccountNotFound(secondary.to_owned()));
        };
        let balance = self.account_mut(primary)?.merge_in(timestamp, primary, absorbed);
        self.merges.record(secondary, primary, timestamp);
        debug!(primary, secondary, balance, "accounts merged");
        Ok(())
    }

    fn get_balance(
        &mut self,
        timestamp: u64,
        id: &str,
        time_at: u64,
    ) -> Result<u64, LedgerError> {
        self.settle_due_cashback(timestamp);
        if !self.accounts.contains_key(id) && !self.merges.is_retired(id) {
            return Err(LedgerError::AccountNotFound(id.to_owned()));
        }
        // who owned `id`'s funds at `time_at`, and which sub-histories
        // belonged to that owner by then
        let owner = self.merges.owner_at(id, time_at);
        let origins = self.merges.folded_into_at(owner, time_at);
        let holder = self.merges.resolve(id);
        let account = self
            .accounts
            .get(holder)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_owned()))?;
        account
            .balance_at(time_at, &origins)
            .ok_or_else(|| LedgerError::NoBalanceRecorded {
                account: id.to_owned(),
                time_at,
            })
    }
}
