//! Search, sort and pagination over an in-memory order list.
//!
//! [`apply`] is a pure function of the record slice and a [`QueryDescriptor`];
//! the same inputs always give the same [`QueryResult`]. Descriptor helpers
//! carry the view's interaction rules (new search or page size goes back to
//! page one, clicking the active column flips its direction).

use crate::locale::Locale;
use crate::order::Order;
use crate::temporal::to_display_text;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Page sizes offered by the table view.
pub const PAGE_SIZES: [usize; 4] = [5, 10, 25, 50];

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Id,
    CustomerName,
    Product,
    Quantity,
    UnitPrice,
    OrderDate,
    Status,
}

impl SortKey {
    fn is_numeric(self) -> bool {
        matches!(self, SortKey::Id | SortKey::Quantity | SortKey::UnitPrice)
    }

    pub fn field_name(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::CustomerName => "customerName",
            SortKey::Product => "product",
            SortKey::Quantity => "quantity",
            SortKey::UnitPrice => "unitPrice",
            SortKey::OrderDate => "orderDate",
            SortKey::Status => "status",
        }
    }

    fn number(self, order: &Order) -> Option<f64> {
        match self {
            SortKey::Id => order.id_value(),
            SortKey::Quantity => order.quantity_value(),
            SortKey::UnitPrice => order.unit_price_value(),
            _ => None,
        }
    }

    fn text(self, order: &Order) -> String {
        match self {
            SortKey::CustomerName => order.customer_name.to_lowercase(),
            SortKey::Product => order.product.to_lowercase(),
            SortKey::Status => order.status.to_lowercase(),
            SortKey::OrderDate => to_display_text(&order.order_date).to_lowercase(),
            SortKey::Id => order.id_text(),
            SortKey::Quantity | SortKey::UnitPrice => String::new(),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "id" => Ok(SortKey::Id),
            "customerName" => Ok(SortKey::CustomerName),
            "product" => Ok(SortKey::Product),
            "quantity" => Ok(SortKey::Quantity),
            "unitPrice" => Ok(SortKey::UnitPrice),
            "orderDate" => Ok(SortKey::OrderDate),
            "status" => Ok(SortKey::Status),
            other => Err(anyhow::anyhow!("Unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Active sort column and direction. Defaults to ascending by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub dir: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey, dir: SortDirection) -> Self {
        Self { key, dir }
    }

    /// Column header click: the active column flips, another column starts ascending.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.dir.reversed())
        } else {
            Self::new(key, SortDirection::Ascending)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub search_term: String,
    pub sort: SortState,
    pub page: usize,
    pub page_size: usize,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            sort: SortState::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryDescriptor {
    pub fn with_search(self, term: impl Into<String>) -> Self {
        Self {
            search_term: term.into(),
            page: 1,
            ..self
        }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        Self {
            page_size,
            page: 1,
            ..self
        }
    }

    pub fn with_page(self, page: usize) -> Self {
        Self { page, ..self }
    }

    pub fn with_sort(self, sort: SortState) -> Self {
        Self { sort, ..self }
    }

    pub fn with_sort_column(self, key: SortKey) -> Self {
        let sort = self.sort.select(key);
        Self { sort, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub visible_records: Vec<Order>,
    pub total_matching: usize,
    pub total_pages: usize,
    /// Requested page after clamping to `1..=total_pages`.
    pub page: usize,
}

impl QueryResult {
    pub fn summary(&self) -> String {
        format!(
            "Showing {} of {} orders",
            self.visible_records.len(),
            self.total_matching
        )
    }
}

/// Pager targets for the first/prev/next/last buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    pub page: usize,
    pub total_pages: usize,
    pub first: usize,
    pub prev: usize,
    pub next: usize,
    pub last: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Pager {
    pub fn for_result(result: &QueryResult) -> Self {
        let page = result.page;
        let last = result.total_pages.max(1);
        Self {
            page,
            total_pages: last,
            first: 1,
            prev: page.saturating_sub(1).max(1),
            next: (page + 1).min(last),
            last,
            has_prev: page > 1,
            has_next: page < last,
        }
    }
}

/// The text a search term is matched against.
fn search_text(order: &Order, locale: &Locale) -> String {
    [
        order.id_text(),
        order.customer_name.clone(),
        order.product.clone(),
        order.status.clone(),
        to_display_text(&order.order_date),
        locale.format_money(order.unit_price_value().unwrap_or(0.0)),
    ]
    .join(" ")
    .to_lowercase()
}

/// Non-numeric values sort below every number.
fn compare_numbers(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Order, b: &Order, key: SortKey, locale: &Locale) -> Ordering {
    if key.is_numeric() {
        compare_numbers(key.number(a), key.number(b))
    } else {
        locale.collate(&key.text(a), &key.text(b))
    }
}

/// Filter, sort and paginate `records`.
pub fn apply(records: &[Order], descriptor: &QueryDescriptor, locale: &Locale) -> QueryResult {
    let needle = descriptor.search_term.trim().to_lowercase();

    let mut matching: Vec<&Order> = if needle.is_empty() {
        records.iter().collect()
    } else {
        records
            .iter()
            .filter(|order| search_text(order, locale).contains(&needle))
            .collect()
    };

    let SortState { key, dir } = descriptor.sort;
    matching.sort_by(|a, b| dir.apply(compare(a, b, key, locale)));

    let total_matching = matching.len();
    let page_size = descriptor.page_size.max(1);
    let total_pages = total_matching.div_ceil(page_size).max(1);
    let page = descriptor.page.clamp(1, total_pages);

    let visible_records: Vec<Order> = matching
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    debug!(
        search = %descriptor.search_term,
        sort = %key,
        total_matching,
        page,
        total_pages,
        visible = visible_records.len(),
        "Order query applied"
    );

    QueryResult {
        visible_records,
        total_matching,
        total_pages,
        page,
    }
}
