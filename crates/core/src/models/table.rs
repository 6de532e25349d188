use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::stock::StockRecord;

/// Sentinel signal-type value meaning "no signal filter".
pub const ALL_SIGNALS: &str = "All";

/// Sortable table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    TickerName,
    SignalType,
    StockPrice,
    Date,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::TickerName,
        SortField::SignalType,
        SortField::StockPrice,
        SortField::Date,
    ];

    /// Column header label.
    pub const fn label(self) -> &'static str {
        match self {
            SortField::TickerName => "Ticker Name",
            SortField::SignalType => "Signal Type",
            SortField::StockPrice => "Stock Price",
            SortField::Date => "Date",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = crate::errors::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tickerName" | "ticker" => Ok(SortField::TickerName),
            "signalType" | "signal" => Ok(SortField::SignalType),
            "stockPrice" | "price" => Ok(SortField::StockPrice),
            "date" => Ok(SortField::Date),
            other => Err(crate::errors::CoreError::ValidationError(format!(
                "Unknown sort column '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Active sort column and direction; `None` keeps the filtered insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    active: Option<(SortField, SortDirection)>,
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self {
            active: Some((field, direction)),
        }
    }

    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn field(&self) -> Option<SortField> {
        self.active.map(|(f, _)| f)
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.active.map(|(_, d)| d)
    }

    pub fn active(&self) -> Option<(SortField, SortDirection)> {
        self.active
    }

    pub fn is_sorted(&self) -> bool {
        self.active.is_some()
    }

    /// Header-click cycle: asc → desc → off on the same column;
    /// a different column always starts at asc.
    pub fn toggle(&mut self, field: SortField) {
        self.active = match self.active {
            Some((current, SortDirection::Asc)) if current == field => {
                Some((field, SortDirection::Desc))
            }
            Some((current, SortDirection::Desc)) if current == field => None,
            _ => Some((field, SortDirection::Asc)),
        };
    }

    /// Direction indicator for a column header.
    pub fn indicator(&self, field: SortField) -> Option<SortDirection> {
        match self.active {
            Some((current, dir)) if current == field => Some(dir),
            _ => None,
        }
    }
}

/// Inclusive numeric price window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

impl PriceRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            low: 0.0,
            high: 0.0,
        }
    }
}

/// Every filter the table can apply. Categories combine with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    /// Exact signal type, or [`ALL_SIGNALS`]
    pub signal_type: String,

    /// Case-insensitive ticker substring; blank disables it
    pub ticker_search: String,

    /// Allowed `date` values; empty disables it
    pub dates: BTreeSet<String>,

    /// Active price window; equal to the data bounds means "off"
    pub price_range: PriceRange,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            signal_type: ALL_SIGNALS.to_string(),
            ticker_search: String::new(),
            dates: BTreeSet::new(),
            price_range: PriceRange::default(),
        }
    }
}

/// One entry of the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// A rendered row: the record plus its derived pick flag.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub record: StockRecord,
    pub is_picked: bool,
}

/// Everything a front end needs to draw the current table page.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    /// Filtered record count across all pages
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_items: Vec<PageItem>,
}

impl TableView {
    /// "Showing A to B of N records", or `None` when nothing matched.
    pub fn summary(&self, page_size: usize) -> Option<String> {
        if self.total_count == 0 {
            return None;
        }
        let first = (self.current_page - 1) * page_size + 1;
        let last = (self.current_page * page_size).min(self.total_count);
        let noun = if self.total_count == 1 { "record" } else { "records" };
        Some(format!(
            "Showing {first} to {last} of {} {noun}",
            self.total_count
        ))
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}
