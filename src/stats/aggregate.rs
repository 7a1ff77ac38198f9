/// Aggregator: fold a flat trade list into per-bucket totals, then reindex
/// onto the canonical window so output length and order are fixed by the
/// granularity regardless of how sparse the data is. Absent buckets are
/// zero-filled, never dropped.
///
/// Pure and stateless: the accumulator map is call-scoped and the clock is
/// an explicit parameter. No rounding -- formatting is the frontend's job.
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::db::{TradeKind, TradeRecord};

use super::bucket::{bucket_key, weekday_index, WEEKDAY_LABELS};
use super::window::{canonical_buckets, weekday_buckets, BucketSpec};
use super::Granularity;

/// Totals for one chart slot.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct BucketStats {
    pub label: String,
    pub target: f64,
    pub profit: f64,
    pub loss: f64,
    pub net: f64,
    pub win_count: u32,
    pub total_count: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Acc {
    target: f64,
    profit: f64,
    loss: f64,
    net: f64,
    win_count: u32,
    total_count: u32,
}

impl Acc {
    /// A record lands on exactly one side: amount goes to profit or to loss,
    /// never both. Net carries the sign.
    fn add(&mut self, record: &TradeRecord) {
        self.target += parse_target(&record.target);
        match record.kind {
            TradeKind::Profit => {
                self.profit += record.amount;
                self.win_count += 1;
            }
            TradeKind::Loss => self.loss += record.amount,
        }
        self.net += record.net();
        self.total_count += 1;
    }
}

/// Targets are free text; chart them when numeric, otherwise count zero.
fn parse_target(target: &str) -> f64 {
    target.trim().parse::<f64>().unwrap_or(0.0)
}

fn reindex(specs: Vec<BucketSpec>, accs: &HashMap<String, Acc>) -> Vec<BucketStats> {
    specs
        .into_iter()
        .map(|spec| {
            let acc = accs.get(&spec.key).copied().unwrap_or_default();
            BucketStats {
                label: spec.label,
                target: acc.target,
                profit: acc.profit,
                loss: acc.loss,
                net: acc.net,
                win_count: acc.win_count,
                total_count: acc.total_count,
            }
        })
        .collect()
}

/// Trend series: records grouped by the calendar bucket they happened in,
/// laid out on the trailing window anchored at `now`.
pub fn aggregate(
    records: &[TradeRecord],
    granularity: Granularity,
    now: NaiveDate,
) -> Vec<BucketStats> {
    let mut accs: HashMap<String, Acc> = HashMap::new();
    for record in records {
        accs.entry(bucket_key(record.timestamp.date_naive(), granularity))
            .or_default()
            .add(record);
    }
    reindex(canonical_buckets(granularity, now), &accs)
}

/// Distribution series: records grouped by the weekday they happened on,
/// always 7 slots Mon..Sun. Answers a different question than `aggregate`
/// (weekday pattern, not point in time), so it never shares its keys.
pub fn aggregate_by_weekday(records: &[TradeRecord]) -> Vec<BucketStats> {
    let mut accs: HashMap<String, Acc> = HashMap::new();
    for record in records {
        let idx = weekday_index(record.timestamp.date_naive());
        accs.entry(WEEKDAY_LABELS[idx].to_string())
            .or_default()
            .add(record);
    }
    reindex(weekday_buckets(), &accs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rec(y: i32, m: u32, d: u32, amount: f64, kind: TradeKind, target: &str) -> TradeRecord {
        TradeRecord {
            id: format!("t-{y}{m}{d}-{amount}"),
            owner_id: "u1".into(),
            amount,
            kind,
            target: target.into(),
            timestamp: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            notes: None,
        }
    }

    fn now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap() // a Monday
    }

    #[test]
    fn test_empty_input_zero_fills_every_bucket() {
        for g in [
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Yearly,
        ] {
            let series = aggregate(&[], g, now());
            let expected_len = match g {
                Granularity::Daily => 7,
                Granularity::Weekly => 8,
                Granularity::Monthly => 12,
                Granularity::Yearly => 5,
            };
            assert_eq!(series.len(), expected_len, "{g} length");
            for bucket in &series {
                assert_eq!(bucket.profit, 0.0);
                assert_eq!(bucket.loss, 0.0);
                assert_eq!(bucket.net, 0.0);
                assert_eq!(bucket.win_count, 0);
                assert_eq!(bucket.total_count, 0);
            }
        }
    }

    #[test]
    fn test_length_fixed_even_when_dense() {
        // Records scattered over two years must not stretch the monthly axis
        let records: Vec<_> = (1..=12)
            .flat_map(|m| {
                vec![
                    rec(2024, m, 5, 10.0, TradeKind::Profit, ""),
                    rec(2025, 1, 5, 5.0, TradeKind::Loss, ""),
                ]
            })
            .collect();
        assert_eq!(aggregate(&records, Granularity::Monthly, now()).len(), 12);
    }

    #[test]
    fn test_records_land_in_their_calendar_buckets() {
        let records = vec![
            rec(2025, 3, 10, 100.0, TradeKind::Profit, "120"),
            rec(2025, 3, 10, 30.0, TradeKind::Loss, "50"),
            rec(2025, 3, 7, 20.0, TradeKind::Profit, ""),
        ];
        let series = aggregate(&records, Granularity::Daily, now());

        // Last slot is today (Mon): one win, one loss
        let today = &series[6];
        assert_eq!(today.profit, 100.0);
        assert_eq!(today.loss, 30.0);
        assert_eq!(today.net, 70.0);
        assert_eq!(today.target, 170.0);
        assert_eq!(today.win_count, 1);
        assert_eq!(today.total_count, 2);

        // Friday slot (3 days back) carries the remaining profit
        let friday = &series[3];
        assert_eq!(friday.label, "Fri");
        assert_eq!(friday.profit, 20.0);
        assert_eq!(friday.total_count, 1);
    }

    #[test]
    fn test_sign_property_per_bucket() {
        let records = vec![
            rec(2025, 3, 10, 100.0, TradeKind::Profit, ""),
            rec(2025, 3, 9, 40.0, TradeKind::Loss, ""),
            rec(2025, 3, 9, 15.0, TradeKind::Profit, ""),
        ];
        for bucket in aggregate(&records, Granularity::Daily, now()) {
            // A record contributes to exactly one side; net is the difference
            assert!((bucket.net - (bucket.profit - bucket.loss)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_conservation_against_summary() {
        let records = vec![
            rec(2025, 3, 4, 10.0, TradeKind::Profit, ""),
            rec(2025, 3, 6, 25.0, TradeKind::Profit, ""),
            rec(2025, 3, 8, 7.5, TradeKind::Loss, ""),
            rec(2025, 3, 10, 3.0, TradeKind::Loss, ""),
        ];
        let series = aggregate(&records, Granularity::Daily, now());
        let summary = super::super::summarize(&records);

        let bucketed_profit: f64 = series.iter().map(|b| b.profit).sum();
        let bucketed_loss: f64 = series.iter().map(|b| b.loss).sum();
        assert!((bucketed_profit - summary.total_profit).abs() < 1e-12);
        assert!((bucketed_loss - summary.total_loss).abs() < 1e-12);
    }

    #[test]
    fn test_weekday_distribution_scenario() {
        // Two different Tuesdays and one Friday
        let records = vec![
            rec(2025, 3, 4, 10.0, TradeKind::Profit, ""),
            rec(2025, 3, 11, 20.0, TradeKind::Profit, ""),
            rec(2025, 3, 7, 5.0, TradeKind::Loss, ""),
        ];
        let series = aggregate_by_weekday(&records);
        assert_eq!(series.len(), 7);

        let tue = &series[1];
        assert_eq!(tue.label, "Tue");
        assert_eq!(tue.profit, 30.0);
        assert_eq!(tue.loss, 0.0);

        let fri = &series[4];
        assert_eq!(fri.label, "Fri");
        assert_eq!(fri.profit, 0.0);
        assert_eq!(fri.loss, 5.0);

        for (i, bucket) in series.iter().enumerate() {
            if i != 1 && i != 4 {
                assert_eq!(bucket.total_count, 0, "{} should be empty", bucket.label);
            }
        }
    }

    #[test]
    fn test_non_numeric_target_degrades_to_zero() {
        let records = vec![
            rec(2025, 3, 10, 10.0, TradeKind::Profit, "scalp the open"),
            rec(2025, 3, 10, 10.0, TradeKind::Profit, "150.5"),
        ];
        let series = aggregate(&records, Granularity::Daily, now());
        assert_eq!(series[6].target, 150.5);
    }

    #[test]
    fn test_idempotent_for_same_inputs() {
        let records = vec![
            rec(2025, 3, 4, 10.0, TradeKind::Profit, "12"),
            rec(2025, 3, 7, 5.0, TradeKind::Loss, ""),
        ];
        let first = aggregate(&records, Granularity::Weekly, now());
        let second = aggregate(&records, Granularity::Weekly, now());
        assert_eq!(first, second);
    }
}
