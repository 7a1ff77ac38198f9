/// Summary statistics: the headline card numbers for a record list, plus
/// the period pre-filter callers apply before asking for them.
///
/// `summarize` is filter-agnostic -- it reduces whatever list it is given.
use chrono::{Datelike, NaiveDate};

use crate::db::{TradeKind, TradeRecord};

use super::Granularity;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Summary {
    pub total_profit: f64,
    pub total_loss: f64,
    /// Percentage of records that were profits; 0 for an empty list.
    pub win_rate: f64,
}

pub fn summarize(records: &[TradeRecord]) -> Summary {
    let mut total_profit = 0.0;
    let mut total_loss = 0.0;
    let mut wins = 0usize;

    for record in records {
        match record.kind {
            TradeKind::Profit => {
                total_profit += record.amount;
                wins += 1;
            }
            TradeKind::Loss => total_loss += record.amount,
        }
    }

    let win_rate = if records.is_empty() {
        0.0
    } else {
        100.0 * wins as f64 / records.len() as f64
    };

    Summary {
        total_profit,
        total_loss,
        win_rate,
    }
}

/// True when `date` falls in the same day / ISO week / month / year as `now`.
/// Weekly comparison uses the ISO (year, week) pair, so late-December and
/// early-January dates sharing a week compare equal across the year change.
pub fn in_period(date: NaiveDate, granularity: Granularity, now: NaiveDate) -> bool {
    match granularity {
        Granularity::Daily => date == now,
        Granularity::Weekly => date.iso_week() == now.iso_week(),
        Granularity::Monthly => date.year() == now.year() && date.month() == now.month(),
        Granularity::Yearly => date.year() == now.year(),
    }
}

/// Restrict records to the period containing `now`. Callers run this before
/// `summarize` and the weekday distribution; the reductions themselves stay
/// filter-agnostic.
pub fn filter_to_period(
    records: &[TradeRecord],
    granularity: Granularity,
    now: NaiveDate,
) -> Vec<TradeRecord> {
    records
        .iter()
        .filter(|r| in_period(r.timestamp.date_naive(), granularity, now))
        .cloned()
        .collect()
}
