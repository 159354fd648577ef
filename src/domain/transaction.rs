use super::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A debit that has happened but has not been given a place in the log yet.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PendingTransaction {
    pub item_name: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

impl PendingTransaction {
    pub fn new(item_name: impl Into<String>, amount: Amount) -> Self {
        Self {
            item_name: item_name.into(),
            amount,
            timestamp: Utc::now(),
        }
    }

    /// Stamps the pending entry with its position in the log.
    pub fn into_record(self, sequence_no: u64) -> TransactionRecord {
        TransactionRecord {
            sequence_no,
            item_name: self.item_name,
            amount: self.amount,
            timestamp: self.timestamp,
        }
    }
}

/// One committed sale. Immutable once appended.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionRecord {
    pub sequence_no: u64,
    pub item_name: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

/// Sum of the amounts of `records`.
pub fn total(records: &[TransactionRecord]) -> Amount {
    records.iter().map(|record| record.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_serializes_amount_as_string() {
        let pending = PendingTransaction::new("Product A", Amount::new(dec!(15.00)).unwrap());
        let record = pending.into_record(1);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"sequence_no\":1"));
        assert!(json.contains("\"item_name\":\"Product A\""));
        assert!(json.contains("\"amount\":\"15.00\""));
    }

    #[test]
    fn test_total() {
        let records: Vec<_> = [dec!(15.00), dec!(20.00), dec!(0.25)]
            .into_iter()
            .enumerate()
            .map(|(i, amount)| {
                PendingTransaction::new("item", Amount::new(amount).unwrap())
                    .into_record(i as u64 + 1)
            })
            .collect();
        assert_eq!(total(&records).value(), dec!(35.25));
        assert_eq!(total(&[]), Amount::ZERO);
    }
}
