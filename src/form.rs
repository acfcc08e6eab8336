use crate::order::{Numeric, Order, OrderStatus};
use crate::temporal::{Instant, parse_editable_text, to_editable_text, to_instant_at, to_wire_text};
use crate::util::{json_number, number_from_text, text_from_scalar};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use thiserror::Error;

/// Why a form submission was rejected. The message is shown to the user as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Customer name is required")]
    CustomerNameRequired,
    #[error("Product is required")]
    ProductRequired,
    #[error("Quantity must be a positive number")]
    InvalidQuantity,
    #[error("Unit price must be a non-negative number")]
    InvalidUnitPrice,
    #[error("Order date is invalid")]
    InvalidOrderDate,
}

/// Text state of the create/edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub id: String,
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub product: String,
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub quantity: String,
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub unit_price: String,
    /// `YYYY-MM-DDTHH:MM`, as held by the date/time input.
    #[serde(default, deserialize_with = "text_from_scalar")]
    pub order_date: String,
    #[serde(default)]
    pub status: OrderStatus,
}

/// Body sent to the order API on create (no `id`) or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Number>,
    pub customer_name: String,
    pub product: String,
    pub quantity: Number,
    pub unit_price: Number,
    pub order_date: String,
    pub status: OrderStatus,
}

impl OrderForm {
    /// An empty form for a new order dated `now`.
    pub fn blank(now: Instant) -> Self {
        OrderForm {
            id: String::new(),
            customer_name: String::new(),
            product: String::new(),
            quantity: "1".to_string(),
            unit_price: "0".to_string(),
            order_date: to_editable_text(now),
            status: OrderStatus::New,
        }
    }

    /// A form pre-filled from an existing record. Dates that cannot be read
    /// are replaced by `now`; unknown statuses by `NEW`.
    pub fn from_order(order: &Order, now: Instant) -> Self {
        let text = |field: &Option<Numeric>, default: &str| {
            field
                .as_ref()
                .map(Numeric::to_string)
                .unwrap_or_else(|| default.to_string())
        };

        OrderForm {
            id: order.id_text(),
            customer_name: order.customer_name.clone(),
            product: order.product.clone(),
            quantity: text(&order.quantity, "1"),
            unit_price: text(&order.unit_price, "0"),
            order_date: to_editable_text(to_instant_at(&order.order_date, now)),
            status: order.status.parse().unwrap_or_default(),
        }
    }

    /// Check the fields in display order and report the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.checked().map(|_| ())
    }

    fn checked(&self) -> Result<(f64, f64, Instant), ValidationError> {
        if self.customer_name.trim().is_empty() {
            return Err(ValidationError::CustomerNameRequired);
        }
        if self.product.trim().is_empty() {
            return Err(ValidationError::ProductRequired);
        }

        let quantity = number_from_text(&self.quantity)
            .filter(|q| q.is_finite() && *q > 0.0)
            .ok_or(ValidationError::InvalidQuantity)?;

        let unit_price = number_from_text(&self.unit_price)
            .filter(|p| p.is_finite() && *p >= 0.0)
            .ok_or(ValidationError::InvalidUnitPrice)?;

        let order_date = parse_editable_text(&self.order_date).ok_or(ValidationError::InvalidOrderDate)?;

        Ok((quantity, unit_price, order_date))
    }

    /// Validate and build the request body.
    pub fn to_payload(&self) -> Result<OrderPayload, ValidationError> {
        let (quantity, unit_price, order_date) = self.checked()?;

        let id = Some(self.id.trim())
            .filter(|id| !id.is_empty())
            .and_then(number_from_text)
            .filter(|id| id.is_finite())
            .map(json_number);

        Ok(OrderPayload {
            id,
            customer_name: self.customer_name.trim().to_string(),
            product: self.product.trim().to_string(),
            quantity: json_number(quantity),
            unit_price: json_number(unit_price),
            order_date: to_wire_text(order_date),
            status: self.status,
        })
    }
}
