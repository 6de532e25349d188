use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use crate::models::pick::PickIndex;
use crate::models::settings::BoardSettings;
use crate::models::stock::{parse_timestamp, StockRecord};
use crate::models::table::{
    FilterState, PageItem, PriceRange, SortDirection, SortField, SortState, TableRow, TableView,
    ALL_SIGNALS,
};

use super::collation::locale_compare;

/// The data-table engine: filter → sort → paginate over a flat record list.
///
/// Pure in-memory logic, no I/O. Any filter or sort change sends the view
/// back to page 1. Loading a new record set recomputes the price bounds and
/// reopens the price window to them.
#[derive(Debug, Clone)]
pub struct TableService {
    records: Vec<StockRecord>,
    filters: FilterState,
    sort: SortState,
    current_page: usize,
    page_size: usize,
    window_threshold: usize,
    price_bounds: PriceRange,
}

impl TableService {
    pub fn new(page_size: usize, window_threshold: usize) -> Self {
        Self {
            records: Vec::new(),
            filters: FilterState::default(),
            sort: SortState::unsorted(),
            current_page: 1,
            page_size: page_size.max(1),
            window_threshold,
            price_bounds: PriceRange::default(),
        }
    }

    pub fn from_settings(settings: &BoardSettings) -> Self {
        Self::new(settings.page_size, settings.page_window_threshold)
    }

    // ── Data ────────────────────────────────────────────────────────

    /// Replace the record set wholesale.
    ///
    /// Price bounds are recomputed and the price window reset to them;
    /// selected dates that no longer occur in the data are dropped.
    pub fn set_records(&mut self, records: Vec<StockRecord>) {
        self.records = records;
        self.price_bounds = price_bounds(&self.records).unwrap_or_default();
        self.filters.price_range = self.price_bounds;

        let present: HashSet<&str> = self.records.iter().map(|r| r.date.as_str()).collect();
        self.filters.dates.retain(|d| present.contains(d.as_str()));
        self.current_page = 1;
    }

    pub fn records(&self) -> &[StockRecord] {
        &self.records
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// `[floor(min price), ceil(max price)]` of the loaded records.
    pub fn price_bounds(&self) -> PriceRange {
        self.price_bounds
    }

    // ── Filters ─────────────────────────────────────────────────────

    pub fn set_signal_type(&mut self, signal_type: impl Into<String>) {
        self.filters.signal_type = signal_type.into();
        self.current_page = 1;
    }

    pub fn set_ticker_search(&mut self, query: impl Into<String>) {
        self.filters.ticker_search = query.into();
        self.current_page = 1;
    }

    /// Add the date if absent, remove it if present.
    pub fn toggle_date(&mut self, date: &str) {
        if !self.filters.dates.remove(date) {
            self.filters.dates.insert(date.to_string());
        }
        self.current_page = 1;
    }

    pub fn set_dates<I, S>(&mut self, dates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.dates = dates.into_iter().map(Into::into).collect();
        self.current_page = 1;
    }

    pub fn clear_dates(&mut self) {
        self.filters.dates.clear();
        self.current_page = 1;
    }

    /// Set the inclusive price window; reversed bounds are swapped.
    pub fn set_price_range(&mut self, low: f64, high: f64) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        self.filters.price_range = PriceRange::new(low, high);
        self.current_page = 1;
    }

    /// Clear every filter; the price window goes back to the data bounds.
    pub fn reset_filters(&mut self) {
        self.filters = FilterState {
            price_range: self.price_bounds,
            ..FilterState::default()
        };
        self.current_page = 1;
    }

    // ── Sort ────────────────────────────────────────────────────────

    /// Header click: asc → desc → unsorted on the same column.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort.toggle(field);
        self.current_page = 1;
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.current_page = 1;
    }

    // ── Pagination ──────────────────────────────────────────────────

    /// Jump to a page, clamped to `[1, total_pages]`.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page + 1);
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.current_page.saturating_sub(1));
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    // ── Derived data ────────────────────────────────────────────────

    /// Records passing every active filter, in load order.
    pub fn filtered(&self) -> Vec<&StockRecord> {
        let price_active = self.filters.price_range != self.price_bounds;
        let search = self.filters.ticker_search.trim().to_lowercase();
        let signal = self.filters.signal_type.as_str();

        self.records
            .iter()
            .filter(|r| signal == ALL_SIGNALS || r.signal_type == signal)
            .filter(|r| search.is_empty() || r.ticker_name.to_lowercase().contains(&search))
            .filter(|r| self.filters.dates.is_empty() || self.filters.dates.contains(&r.date))
            .filter(|r| {
                !price_active
                    || r.price().is_some_and(|p| self.filters.price_range.contains(p))
            })
            .collect()
    }

    /// Filtered records in display order.
    pub fn sorted(&self) -> Vec<&StockRecord> {
        let mut rows = self.filtered();
        if let (Some(field), Some(direction)) = (self.sort.field(), self.sort.direction()) {
            // sort_by is stable: ties keep their filtered order in both directions.
            rows.sort_by(|a, b| compare_records(a, b, field, direction));
        }
        rows
    }

    /// The current page, with each row's pick flag joined in.
    pub fn view(&self, picks: &PickIndex) -> TableView {
        let sorted = self.sorted();
        let total_count = sorted.len();
        let total_pages = total_pages(total_count, self.page_size);
        let current_page = self.current_page.clamp(1, total_pages);
        let start = (current_page - 1) * self.page_size;

        let rows = sorted
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .map(|record| TableRow {
                is_picked: picks.contains(record),
                record: record.clone(),
            })
            .collect();

        TableView {
            rows,
            total_count,
            total_pages,
            current_page,
            page_items: page_items(current_page, total_pages, self.window_threshold),
        }
    }

    /// Options for the signal-type dropdown: "All" then each type, sorted.
    pub fn signal_type_options(&self) -> Vec<String> {
        let types: BTreeSet<&str> = self.records.iter().map(|r| r.signal_type.as_str()).collect();
        std::iter::once(ALL_SIGNALS.to_string())
            .chain(types.into_iter().map(str::to_string))
            .collect()
    }

    /// Distinct dates, oldest first; unparsable dates go last.
    pub fn date_options(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self.records.iter().map(|r| r.date.as_str()).collect();
        let mut dates: Vec<&str> = unique.into_iter().collect();
        dates.sort_by(|a, b| {
            compare_missing_last(parse_timestamp(a), parse_timestamp(b), SortDirection::Asc, |x, y| {
                x.cmp(y)
            })
        });
        dates.into_iter().map(str::to_string).collect()
    }
}

/// `ceil(count / page_size)`, never below 1.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Page numbers for the pagination control.
///
/// Up to `threshold` pages are all listed. Beyond that: first, last and
/// current ± 1, with each gap collapsed into one [`PageItem::Ellipsis`].
pub fn page_items(current: usize, total: usize, threshold: usize) -> Vec<PageItem> {
    let total = total.max(1);
    if total <= threshold {
        return (1..=total).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total);
    let shown: BTreeSet<usize> = [1, total, current.saturating_sub(1), current, current + 1]
        .into_iter()
        .filter(|p| (1..=total).contains(p))
        .collect();

    let mut items = Vec::with_capacity(shown.len() * 2);
    let mut previous: Option<usize> = None;
    for page in shown {
        if previous.is_some_and(|prev| page != prev + 1) {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}

/// `[floor(min), ceil(max)]` over parseable prices, or `None` if there are none.
pub fn price_bounds(records: &[StockRecord]) -> Option<PriceRange> {
    let mut prices = records.iter().filter_map(StockRecord::price);
    let first = prices.next()?;
    let (min, max) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
    Some(PriceRange::new(min.floor(), max.ceil()))
}

/// Column comparison in the given direction. Unparsable prices and dates
/// always sort after parseable ones, whichever the direction.
pub fn compare_records(
    a: &StockRecord,
    b: &StockRecord,
    field: SortField,
    direction: SortDirection,
) -> Ordering {
    match field {
        SortField::StockPrice => compare_missing_last(a.price(), b.price(), direction, |x, y| {
            x.total_cmp(y)
        }),
        SortField::Date => {
            compare_missing_last(a.timestamp(), b.timestamp(), direction, |x, y| x.cmp(y))
        }
        SortField::TickerName => directed(locale_compare(&a.ticker_name, &b.ticker_name), direction),
        SortField::SignalType => directed(locale_compare(&a.signal_type, &b.signal_type), direction),
    }
}

fn directed(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

fn compare_missing_last<T>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => directed(cmp(&x, &y), direction),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
