//! This module could be a separate crate on its own, to bootstrap
//! [`bank_ledger`](crate) within a binary, but for simplicity purposes I
//! include this module directly in the library.

use std::fmt::Display;
use std::io::{Read, Write};

use anyhow::Result;
use csv_parser::{CsvOperationParser, OperationKind, OperationRow};
use csv_printer::{Outcome, print_outcomes};
use thiserror::Error;
use tracing::debug;

use crate::{
    cashback::{ParsePaymentIdError, PaymentId},
    processor::{BankProcessor, LedgerError, in_memory_processor::InMemoryBankProcessor},
};

pub mod csv_parser;
pub mod csv_printer;

/// Malformed script rows. Business rejections are not script errors; they
/// render as sentinel results instead.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("{op:?} is missing its `{name}` argument")]
    MissingArgument {
        op: OperationKind,
        name: &'static str,
    },
    #[error("`{value}` is not a valid number")]
    InvalidNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("`{value}` is not a valid payment identifier")]
    InvalidPaymentId {
        value: String,
        #[source]
        source: ParsePaymentIdError,
    },
}

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, ScriptError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvOperationParser::new(self.input);

        let mut processor = InMemoryBankProcessor::default();
        let mut outcomes = Vec::new();

        for (line, row) in parser {
            let op = row.op;
            match execute(&mut processor, row) {
                Ok(result) => outcomes.push(Outcome { op, result }),
                Err(err) => (self.error_printer)(line, err),
            }
        }

        print_outcomes(self.output, outcomes.into_iter())
    }
}

fn execute(
    processor: &mut impl BankProcessor,
    row: OperationRow,
) -> Result<String, ScriptError> {
    let OperationRow {
        op,
        timestamp,
        arg1,
        arg2,
        arg3,
    } = row;
    Ok(match op {
        OperationKind::CreateAccount => {
            let id = required(op, "account_id", arg1)?;
            render_flag(processor.create_account(timestamp, &id))
        }
        OperationKind::Deposit => {
            let id = required(op, "account_id", arg1)?;
            let amount = parse_number(required(op, "amount", arg2)?)?;
            render_or_empty(processor.deposit(timestamp, &id, amount))
        }
        OperationKind::Transfer => {
            let source = required(op, "source_account_id", arg1)?;
            let target = required(op, "target_account_id", arg2)?;
            let amount = parse_number(required(op, "amount", arg3)?)?;
            render_or_empty(processor.transfer(timestamp, &source, &target, amount))
        }
        OperationKind::Pay => {
            let id = required(op, "account_id", arg1)?;
            let amount = parse_number(required(op, "amount", arg2)?)?;
            render_or_empty(processor.pay(timestamp, &id, amount))
        }
        OperationKind::TopSpenders => {
            let n = parse_number(required(op, "n", arg1)?)? as usize;
            processor.top_spenders(timestamp, n).join(", ")
        }
        OperationKind::GetPaymentStatus => {
            let id = required(op, "account_id", arg1)?;
            let payment = parse_payment(required(op, "payment_id", arg2)?)?;
            render_or_empty(processor.get_payment_status(timestamp, &id, payment))
        }
        OperationKind::MergeAccounts => {
            let primary = required(op, "primary_account_id", arg1)?;
            let secondary = required(op, "secondary_account_id", arg2)?;
            render_flag(processor.merge_accounts(timestamp, &primary, &secondary))
        }
        OperationKind::GetBalance => {
            let id = required(op, "account_id", arg1)?;
            let time_at = parse_number(required(op, "time_at", arg2)?)?;
            render_or_empty(processor.get_balance(timestamp, &id, time_at))
        }
    })
}

fn required(
    op: OperationKind,
    name: &'static str,
    value: Option<String>,
) -> Result<String, ScriptError> {
    value.ok_or(ScriptError::MissingArgument { op, name })
}

fn parse_number(value: String) -> Result<u64, ScriptError> {
    value
        .parse()
        .map_err(|source| ScriptError::InvalidNumber { value, source })
}

fn parse_payment(value: String) -> Result<PaymentId, ScriptError> {
    value
        .parse()
        .map_err(|source| ScriptError::InvalidPaymentId { value, source })
}

fn render_flag(result: Result<(), LedgerError>) -> String {
    match result {
        Ok(()) => "true".to_owned(),
        Err(err) => {
            debug!(%err, "operation rejected");
            "false".to_owned()
        }
    }
}

fn render_or_empty<T: Display>(result: Result<T, LedgerError>) -> String {
    match result {
        Ok(value) => value.to_string(),
        Err(err) => {
            debug!(%err, "operation rejected");
            String::new()
        }
    }
}
