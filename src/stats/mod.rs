pub mod aggregate;
pub mod bucket;
pub mod summary;
pub mod window;

pub use self::aggregate::{aggregate, aggregate_by_weekday, BucketStats};
pub use self::summary::{filter_to_period, summarize, Summary};
pub use self::window::{canonical_buckets, weekday_buckets, BucketSpec};

/// Reporting granularity for charts and summaries.
///
/// Parsed straight from query strings; anything other than the four
/// lowercase names fails deserialization, so handlers never see an
/// out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}
