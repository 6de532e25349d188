use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use super::stock::{RecordKey, StockRecord};
use crate::errors::CoreError;

/// How urgently a picked stock should be looked at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Moderate,
    Low,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Moderate => "moderate",
            Priority::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "moderate" => Ok(Priority::Moderate),
            "low" => Ok(Priority::Low),
            other => Err(CoreError::ValidationError(format!(
                "Invalid priority '{other}': expected one of high, moderate, low"
            ))),
        }
    }
}

/// A favourited record, as stored in the `picked_stocks` collection.
///
/// Uniqueness is on the natural key (ticker, signal type, date), not on `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickedStock {
    /// Store-assigned identity
    pub id: String,
    pub ticker_name: String,
    pub signal_type: String,
    /// Snapshot of the price at pick time
    pub stock_price: String,
    pub date: String,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: String,
}

impl PickedStock {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.ticker_name, &self.signal_type, &self.date)
    }

    pub fn matches(&self, record: &StockRecord) -> bool {
        self.ticker_name == record.ticker_name
            && self.signal_type == record.signal_type
            && self.date == record.date
    }
}

/// Insert payload for a new pick; the store fills in `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPick {
    pub ticker_name: String,
    pub signal_type: String,
    pub stock_price: String,
    pub date: String,
    pub source_file: Option<String>,
    pub priority: Priority,
}

impl NewPick {
    pub fn from_record(record: &StockRecord) -> Self {
        Self {
            ticker_name: record.ticker_name.clone(),
            signal_type: record.signal_type.clone(),
            stock_price: record.stock_price.clone(),
            date: record.date.clone(),
            source_file: record.source_file.clone(),
            priority: Priority::default(),
        }
    }
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickToggle {
    Added,
    Removed,
}

/// Set of picked natural keys, rebuilt whenever the picks cache changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickIndex {
    keys: HashSet<RecordKey>,
}

impl PickIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_picks<'a>(picks: impl IntoIterator<Item = &'a PickedStock>) -> Self {
        Self {
            keys: picks.into_iter().map(PickedStock::key).collect(),
        }
    }

    pub fn contains(&self, record: &StockRecord) -> bool {
        self.keys.contains(&record.key())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
