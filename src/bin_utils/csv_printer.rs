use std::io::Write;

use csv::Writer;
use serde::Serialize;

use super::csv_parser::OperationKind;

/// One output row per executed operation. Rejections render as the
/// caller-facing sentinels (`false` or an empty result).
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub op: OperationKind,
    pub result: String,
}

pub fn print_outcomes<W>(
    output: &mut W,
    outcomes: impl Iterator<Item = Outcome>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for outcome in outcomes {
        if let Err(err) = writer.serialize(outcome) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
