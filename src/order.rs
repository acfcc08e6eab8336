use crate::locale::Locale;
use crate::temporal::{OrderDate, to_display_text};
use crate::util::{number_from_text, number_text, text_from_scalar, value_text};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::New,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::Processing => write!(f, "PROCESSING"),
            OrderStatus::Shipped => write!(f, "SHIPPED"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "NEW" => Ok(OrderStatus::New),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(anyhow::anyhow!("Unknown order status: {other}")),
        }
    }
}

/// A numeric field that the API may send as a number or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(serde_json::Number),
    Text(String),
    /// Booleans, arrays and objects. Kept for display, never a number.
    Other(serde_json::Value),
}

impl Numeric {
    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => n.as_f64(),
            Numeric::Text(s) => number_from_text(s),
            Numeric::Other(_) => None,
        }
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self {
        Numeric::Number(n.into())
    }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self {
        Numeric::Number(crate::util::json_number(n))
    }
}

impl From<&str> for Numeric {
    fn from(s: &str) -> Self {
        Numeric::Text(s.to_string())
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Number(n) => match n.as_f64() {
                Some(value) => write!(f, "{}", number_text(value)),
                None => write!(f, "{n}"),
            },
            Numeric::Text(s) => write!(f, "{s}"),
            Numeric::Other(value) => write!(f, "{}", value_text(value)),
        }
    }
}

/// An order as delivered by the order API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Numeric>,
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub product: String,
    #[serde(default)]
    pub quantity: Option<Numeric>,
    #[serde(default)]
    pub unit_price: Option<Numeric>,
    #[serde(default)]
    pub order_date: OrderDate,
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub status: String,
}

fn numeric_value(field: &Option<Numeric>) -> Option<f64> {
    field.as_ref().and_then(Numeric::value)
}

impl Order {
    pub fn id_value(&self) -> Option<f64> {
        numeric_value(&self.id)
    }

    pub fn quantity_value(&self) -> Option<f64> {
        numeric_value(&self.quantity)
    }

    pub fn unit_price_value(&self) -> Option<f64> {
        numeric_value(&self.unit_price)
    }

    /// The id as shown and searched; empty when absent.
    pub fn id_text(&self) -> String {
        self.id.as_ref().map(Numeric::to_string).unwrap_or_default()
    }
}

/// Quantity times unit price. Missing or non-numeric inputs count as zero.
pub fn line_total(order: &Order) -> f64 {
    let usable = |v: Option<f64>| v.filter(|n| n.is_finite()).unwrap_or(0.0);
    usable(order.quantity_value()) * usable(order.unit_price_value())
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRow {
    pub id: Option<Numeric>,
    pub customer_name: String,
    pub product: String,
    pub quantity: Option<Numeric>,
    pub unit_price: String,
    pub order_date: String,
    pub status: String,
    pub status_class: String,
    pub line_total: String,
}

impl OrderRow {
    pub fn render(order: &Order, locale: &Locale) -> Self {
        OrderRow {
            id: order.id.clone(),
            customer_name: order.customer_name.clone(),
            product: order.product.clone(),
            quantity: order.quantity.clone(),
            unit_price: locale.format_money(order.unit_price_value().unwrap_or(0.0)),
            order_date: to_display_text(&order.order_date),
            status: order.status.clone(),
            status_class: order.status.to_lowercase(),
            line_total: locale.format_money(line_total(order)),
        }
    }
}
