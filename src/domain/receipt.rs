use super::money::Amount;
use super::transaction::{TransactionRecord, total};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation settings for rendered receipts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptFormat {
    pub title: String,
    pub currency_symbol: String,
}

impl Default for ReceiptFormat {
    fn default() -> Self {
        Self {
            title: "Transaction Receipt".to_string(),
            currency_symbol: "$".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub sequence_no: u64,
    pub item_name: String,
    pub amount: Amount,
}

/// A receipt built from a log snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub format: ReceiptFormat,
    pub lines: Vec<ReceiptLine>,
    pub total: Amount,
}

/// Replays a log snapshot into a receipt.
///
/// Lines follow sequence order whatever order the snapshot arrives in, and the
/// output depends on nothing but the snapshot and the format.
pub fn synthesize(records: &[TransactionRecord], format: &ReceiptFormat) -> Receipt {
    let mut lines: Vec<ReceiptLine> = records
        .iter()
        .map(|record| ReceiptLine {
            sequence_no: record.sequence_no,
            item_name: record.item_name.clone(),
            amount: record.amount,
        })
        .collect();
    lines.sort_by_key(|line| line.sequence_no);

    Receipt {
        format: format.clone(),
        lines,
        total: total(records),
    }
}

impl Receipt {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

const NAME_WIDTH: usize = 24;
const AMOUNT_WIDTH: usize = 12;

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = &self.format.currency_symbol;
        let rule = "-".repeat(6 + NAME_WIDTH + AMOUNT_WIDTH);

        writeln!(f, "{}", self.format.title)?;
        writeln!(f, "{}", rule)?;
        if self.lines.is_empty() {
            writeln!(f, "No transactions recorded.")?;
        }
        for line in &self.lines {
            let amount = format!("{}{}", symbol, line.amount);
            writeln!(
                f,
                "{:>4}  {:<name$}{:>amt$}",
                line.sequence_no,
                line.item_name,
                amount,
                name = NAME_WIDTH,
                amt = AMOUNT_WIDTH
            )?;
        }
        writeln!(f, "{}", rule)?;
        let total = format!("{}{}", symbol, self.total);
        writeln!(
            f,
            "{:<name$}{:>amt$}",
            format!("TOTAL ({} items)", self.lines.len()),
            total,
            name = 6 + NAME_WIDTH,
            amt = AMOUNT_WIDTH
        )
    }
}
