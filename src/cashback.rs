use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::account::AccountId;

/// Percentage of a payment refunded as cashback, rounded down.
pub const CASHBACK_RATE_PERCENT: u64 = 2;

/// Cashback matures 24 hours after the payment (timestamps are
/// milliseconds).
pub const CASHBACK_WINDOW_MS: u64 = 86_400_000;

/// 1-based ordinal of an accepted payment, global across all accounts.
/// Rendered as `payment1`, `payment2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PaymentId(u64);

impl PaymentId {
    pub fn ordinal(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payment{}", self.0)
    }
}

#[derive(Debug, Error)]
#[error("payment identifiers look like `payment1`, `payment2`, ...")]
pub struct ParsePaymentIdError;

impl FromStr for PaymentId {
    type Err = ParsePaymentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ordinal: u64 = s
            .strip_prefix("payment")
            .ok_or(ParsePaymentIdError)?
            .parse()
            .map_err(|_| ParsePaymentIdError)?;
        if ordinal == 0 {
            return Err(ParsePaymentIdError);
        }
        Ok(PaymentId(ordinal))
    }
}

/// A cashback obligation created by an accepted payment. `beneficiary`
/// may be rerouted by a merge while the obligation is still pending;
/// `materialized` flips to true exactly once and never reverts.
#[derive(Debug)]
pub struct PendingCashback {
    pub payment: PaymentId,
    pub beneficiary: AccountId,
    pub matures_at: u64,
    pub amount: u64,
    pub materialized: bool,
}

/// A due obligation handed out by [`CashbackScheduler::pop_due`], ready to
/// be credited into its beneficiary's ledger.
#[derive(Debug)]
pub struct DueCashback {
    pub payment: PaymentId,
    pub beneficiary: AccountId,
    pub matures_at: u64,
    pub amount: u64,
}

/// Tracks pending cashback obligations keyed by maturity time. Time never
/// advances on its own here; the engine drains due obligations at the head
/// of every time-carrying operation.
#[derive(Debug, Default)]
pub struct CashbackScheduler {
    /// pending obligations, min-first by (maturity, ordinal)
    due_queue: BinaryHeap<Reverse<(u64, u64)>>,
    payments: HashMap<u64, PendingCashback>,
    accepted: u64,
}

impl CashbackScheduler {
    /// Registers the cashback obligation for an accepted payment and
    /// allocates the next global payment ordinal. Ordinals are only ever
    /// handed out here, so they stay unique and gap-free across accounts.
    pub fn register(&mut self, beneficiary: &str, paid_at: u64, paid_amount: u64) -> PaymentId {
        self.accepted += 1;
        let payment = PaymentId(self.accepted);
        let matures_at = paid_at + CASHBACK_WINDOW_MS;
        let amount = paid_amount * CASHBACK_RATE_PERCENT / 100;
        self.due_queue.push(Reverse((matures_at, payment.0)));
        self.payments.insert(
            payment.0,
            PendingCashback {
                payment,
                beneficiary: beneficiary.to_owned(),
                matures_at,
                amount,
                materialized: false,
            },
        );
        debug!(%payment, beneficiary, matures_at, amount, "cashback registered");
        payment
    }

    /// Hands out the next obligation due at or before `now`, in ascending
    /// (maturity, ordinal) order, marking it materialized. Returns `None`
    /// once everything due has been drained; an obligation is never handed
    /// out twice, so draining again at the same `now` is a no-op.
    pub fn pop_due(&mut self, now: u64) -> Option<DueCashback> {
        loop {
            let Reverse((matures_at, ordinal)) = *self.due_queue.peek()?;
            if matures_at > now {
                return None;
            }
            self.due_queue.pop();
            let Some(pending) = self.payments.get_mut(&ordinal) else {
                continue;
            };
            if pending.materialized {
                continue;
            }
            pending.materialized = true;
            return Some(DueCashback {
                payment: pending.payment,
                beneficiary: pending.beneficiary.clone(),
                matures_at: pending.matures_at,
                amount: pending.amount,
            });
        }
    }

    /// Reroutes every still-pending obligation of `from` to `to`. Already
    /// materialized payments keep their original beneficiary.
    pub fn redirect_pending(&mut self, from: &str, to: &str) {
        for pending in self.payments.values_mut() {
            if !pending.materialized && pending.beneficiary == from {
                debug!(payment = %pending.payment, from, to, "pending cashback redirected");
                pending.beneficiary = to.to_owned();
            }
        }
    }

    pub fn get(&self, payment: PaymentId) -> Option<&PendingCashback> {
        self.payments.get(&payment.0)
    }
}
