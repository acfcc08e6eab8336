mod json_file;

pub use json_file::JsonFileSource;

use crate::order::Order;
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

pub trait OrderSource: Send + Sync {
    /// All orders, in the order the API returned them.
    fn list_orders(&self) -> Result<Vec<Order>>;

    /// The order whose id equals `id`, if any.
    fn find_order(&self, id: i64) -> Result<Option<Order>> {
        let orders = self.list_orders()?;
        Ok(orders
            .into_iter()
            .find(|order| order.id_value() == Some(id as f64)))
    }
}

/// Parse an order list body. A body that is valid JSON but not an array
/// is treated as an empty list.
pub fn parse_orders(body: &str) -> Result<Vec<Order>> {
    let value: Value = serde_json::from_str(body).context("Order list is not valid JSON")?;

    if !value.is_array() {
        warn!("Order list body is not an array, treating as empty");
        return Ok(Vec::new());
    }

    serde_json::from_value(value).context("Failed to read order records")
}
