use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateAccount,
    Deposit,
    Transfer,
    Pay,
    TopSpenders,
    GetPaymentStatus,
    MergeAccounts,
    GetBalance,
}

/// One row of an operation script. The positional arguments are typed by
/// the harness per operation; the engine only ever sees parsed values.
#[derive(Debug, Deserialize)]
pub struct OperationRow {
    pub op: OperationKind,
    pub timestamp: u64,
    pub arg1: Option<String>,
    pub arg2: Option<String>,
    pub arg3: Option<String>,
}

/// Parses an operation script in CSV format
///
/// # Panics
///
/// If a row cannot be parsed
pub struct CsvOperationParser<R> {
    iter: DeserializeRecordsIntoIter<R, OperationRow>,
}

impl<R> CsvOperationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvOperationParser<R>
where
    R: Read,
{
    type Item = (u64, OperationRow);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row.unwrap()))
    }
}
