use chrono::DateTime;
use rust_decimal::Decimal;

use super::revenue_model::{RawRevenueEntry, RevenueRecord};
use crate::errors::{Result, ValidationError};
use crate::units::UnitConverter;

/// Normalizes raw revenue log rows into [`RevenueRecord`]s.
///
/// Output order matches ledger order. Fails on the first row whose amount
/// or timestamp cannot be represented.
pub fn map_revenue_entries(
    converter: &UnitConverter,
    entries: &[RawRevenueEntry],
) -> Result<Vec<RevenueRecord>> {
    entries
        .iter()
        .map(|entry| -> Result<RevenueRecord> {
            let timestamp = DateTime::from_timestamp(entry.timestamp, 0).ok_or_else(|| {
                ValidationError::InvalidInput(format!(
                    "Revenue timestamp {} is out of range",
                    entry.timestamp
                ))
            })?;
            Ok(RevenueRecord {
                amount: converter.to_decimal(entry.amount)?,
                timestamp,
            })
        })
        .collect()
}

/// Sum of all mapped revenue amounts.
pub fn total_revenue(records: &[RevenueRecord]) -> Decimal {
    records.iter().map(|r| r.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::BaseUnits;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn entry(amount: u128, timestamp: i64) -> RawRevenueEntry {
        RawRevenueEntry {
            amount: BaseUnits(amount),
            timestamp,
        }
    }

    #[test]
    fn test_map_preserves_ledger_order() {
        let converter = UnitConverter::default();
        // Deliberately out of chronological order.
        let entries = vec![
            entry(2_000_000_000_000_000_000, 1_560_000_000),
            entry(500_000_000_000_000_000, 1_550_000_000),
            entry(1_250_000_000_000_000_000, 1_570_000_000),
        ];

        let records = map_revenue_entries(&converter, &entries).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].amount, dec!(2));
        assert_eq!(records[1].amount, dec!(0.5));
        assert_eq!(records[2].amount, dec!(1.25));
        assert_eq!(
            records[1].timestamp,
            Utc.timestamp_opt(1_550_000_000, 0).unwrap()
        );
        assert_eq!(total_revenue(&records), dec!(3.75));
    }

    #[test]
    fn test_map_empty_log() {
        let converter = UnitConverter::default();
        let records = map_revenue_entries(&converter, &[]).unwrap();
        assert!(records.is_empty());
        assert_eq!(total_revenue(&records), Decimal::ZERO);
    }

    #[test]
    fn test_map_rejects_unrepresentable_timestamp() {
        let converter = UnitConverter::default();
        let result = map_revenue_entries(&converter, &[entry(1, i64::MAX)]);
        assert!(result.is_err());
    }
}
