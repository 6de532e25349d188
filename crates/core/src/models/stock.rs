use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// A single signal row as stored in the JSON data files.
///
/// Price and date are carried as text exactly as they appear in the file.
/// They are only parsed when sorting or filtering (see [`StockRecord::price`]
/// and [`StockRecord::timestamp`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub ticker_name: String,

    /// Free-form label, e.g. "Buy", "Strong Sell"
    pub signal_type: String,

    #[serde(deserialize_with = "string_or_number")]
    pub stock_price: String,

    pub date: String,

    /// Provenance ("<directory>/<file>"), set by the loader on drill-down loads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl StockRecord {
    pub fn new(
        ticker_name: impl Into<String>,
        signal_type: impl Into<String>,
        stock_price: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            ticker_name: ticker_name.into(),
            signal_type: signal_type.into(),
            stock_price: stock_price.into(),
            date: date.into(),
            source_file: None,
        }
    }

    /// Numeric price, or `None` if the text is not a finite number.
    pub fn price(&self) -> Option<f64> {
        self.stock_price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
    }

    /// Epoch milliseconds of `date`, or `None` if it cannot be parsed.
    pub fn timestamp(&self) -> Option<i64> {
        parse_timestamp(&self.date)
    }

    /// Natural key used for pick membership.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.ticker_name, &self.signal_type, &self.date)
    }

    /// Sell-flavoured signals are rendered bearish, everything else bullish.
    pub fn sentiment(&self) -> SignalSentiment {
        SignalSentiment::of(&self.signal_type)
    }
}

/// The (ticker, signal type, date) triple that identifies a pick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub ticker_name: String,
    pub signal_type: String,
    pub date: String,
}

impl RecordKey {
    pub fn new(ticker_name: &str, signal_type: &str, date: &str) -> Self {
        Self {
            ticker_name: ticker_name.to_string(),
            signal_type: signal_type.to_string(),
            date: date.to_string(),
        }
    }
}

/// Colour class of a signal label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSentiment {
    Bullish,
    Bearish,
}

impl SignalSentiment {
    pub fn of(signal_type: &str) -> Self {
        if signal_type.contains("Sell") {
            SignalSentiment::Bearish
        } else {
            SignalSentiment::Bullish
        }
    }
}

/// Parse the date formats seen in data files into epoch milliseconds.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and US-style `MM/DD/YYYY`. Date-only values are
/// taken at midnight UTC.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }
    None
}

/// Data files are hand-edited; prices show up both as `"12.50"` and `12.5`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for stockPrice, got {other}"
        ))),
    }
}
