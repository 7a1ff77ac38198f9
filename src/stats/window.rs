/// Bucket windowing: the fixed-width, deterministic chart axes.
///
/// Charts always render the same number of slots for a granularity, no
/// matter how sparse the data is:
///   daily   -> trailing 7 calendar days ending at `now`
///   weekly  -> trailing 8 ISO weeks
///   monthly -> trailing 12 calendar months
///   yearly  -> trailing 5 calendar years
///
/// All sequences run oldest -> newest. Deterministic given `now`.
use chrono::{Datelike, Days, NaiveDate};

use super::bucket::{bucket_key, weekday_index, WEEKDAY_LABELS};
use super::Granularity;

/// One slot of a chart axis: the exact-match lookup key plus the short
/// display label the frontend renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpec {
    pub key: String,
    pub label: String,
}

impl BucketSpec {
    fn keyed(key: String) -> Self {
        Self {
            label: key.clone(),
            key,
        }
    }
}

pub fn canonical_buckets(granularity: Granularity, now: NaiveDate) -> Vec<BucketSpec> {
    match granularity {
        Granularity::Daily => (0..7u64)
            .rev()
            .map(|back| {
                let day = now - Days::new(back);
                BucketSpec {
                    key: bucket_key(day, Granularity::Daily),
                    label: WEEKDAY_LABELS[weekday_index(day)].to_string(),
                }
            })
            .collect(),
        Granularity::Weekly => (0..8u64)
            .rev()
            // Any day inside a week identifies it, so step back 7 days at a time
            .map(|back| BucketSpec::keyed(bucket_key(now - Days::new(back * 7), Granularity::Weekly)))
            .collect(),
        Granularity::Monthly => (0..12i32)
            .rev()
            .map(|back| {
                // Flat month count since year zero; div/rem recover year and month
                let months = now.year() * 12 + now.month0() as i32 - back;
                let (year, month0) = (months.div_euclid(12), months.rem_euclid(12));
                BucketSpec::keyed(format!("{}-{:02}", year, month0 + 1))
            })
            .collect(),
        Granularity::Yearly => (0..5i32)
            .rev()
            .map(|back| BucketSpec::keyed((now.year() - back).to_string()))
            .collect(),
    }
}

/// The fixed Mon..Sun axis for the weekday-distribution chart.
/// Not a trailing window: the order never depends on `now`.
pub fn weekday_buckets() -> Vec<BucketSpec> {
    WEEKDAY_LABELS
        .iter()
        .map(|day| BucketSpec::keyed((*day).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_fixed_lengths_per_granularity() {
        let now = d(2025, 3, 10);
        assert_eq!(canonical_buckets(Granularity::Daily, now).len(), 7);
        assert_eq!(canonical_buckets(Granularity::Weekly, now).len(), 8);
        assert_eq!(canonical_buckets(Granularity::Monthly, now).len(), 12);
        assert_eq!(canonical_buckets(Granularity::Yearly, now).len(), 5);
        assert_eq!(weekday_buckets().len(), 7);
    }

    #[test]
    fn test_daily_window_ends_at_now() {
        // 2025-03-10 is a Monday; the window is Tue..Mon ending today
        let buckets = canonical_buckets(Granularity::Daily, d(2025, 3, 10));
        assert_eq!(buckets[0].key, "2025-03-04");
        assert_eq!(buckets[0].label, "Tue");
        assert_eq!(buckets[6].key, "2025-03-10");
        assert_eq!(buckets[6].label, "Mon");
    }

    #[test]
    fn test_weekly_window_crosses_year_boundary() {
        // 2025-01-08 sits in ISO week 2025-W02; seven weeks back is 2024-W47
        let keys: Vec<_> = canonical_buckets(Granularity::Weekly, d(2025, 1, 8))
            .into_iter()
            .map(|b| b.key)
            .collect();
        assert_eq!(
            keys,
            vec![
                "2024-W47", "2024-W48", "2024-W49", "2024-W50", "2024-W51", "2024-W52",
                "2025-W01", "2025-W02"
            ]
        );
    }

    #[test]
    fn test_monthly_window_crosses_year_boundary() {
        let buckets = canonical_buckets(Granularity::Monthly, d(2025, 3, 15));
        assert_eq!(buckets[0].key, "2024-04");
        assert_eq!(buckets[11].key, "2025-03");
    }

    #[test]
    fn test_yearly_window() {
        let keys: Vec<_> = canonical_buckets(Granularity::Yearly, d(2025, 6, 1))
            .into_iter()
            .map(|b| b.key)
            .collect();
        assert_eq!(keys, vec!["2021", "2022", "2023", "2024", "2025"]);
    }

    #[test]
    fn test_weekday_buckets_fixed_order() {
        let labels: Vec<_> = weekday_buckets().into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
    }

    #[test]
    fn test_deterministic_given_now() {
        let now = d(2025, 3, 10);
        for g in [
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Yearly,
        ] {
            assert_eq!(canonical_buckets(g, now), canonical_buckets(g, now));
        }
    }
}
