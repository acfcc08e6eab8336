use super::{OrderSource, parse_orders};
use crate::order::Order;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the order list from a JSON snapshot of the order API response.
/// The file is re-read on every call so edits show up without a restart.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl OrderSource for JsonFileSource {
    fn list_orders(&self) -> Result<Vec<Order>> {
        let body = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read orders from {}", self.path.display()))?;

        let orders = parse_orders(&body)
            .with_context(|| format!("Invalid order list in {}", self.path.display()))?;

        debug!(path = %self.path.display(), count = orders.len(), "Orders loaded");

        Ok(orders)
    }
}
