//! Proof-of-purchase payloads.

use serde::{Deserialize, Serialize};

/// Receipt issued by the platform after a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Store identifier of the purchased product.
    pub product_id: String,
    /// Platform transaction identifier.
    pub transaction_id: String,
    /// Transaction time (Unix epoch seconds).
    pub transaction_date: u64,
    /// Number of items purchased.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Application identifier the store issued the receipt to.
    #[serde(default)]
    pub app_id: Option<String>,
    /// Localized price as reported by the store.
    #[serde(default)]
    pub price: Option<String>,
    /// Localized product title.
    #[serde(default)]
    pub title: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl Receipt {
    /// Creates a receipt for a single item.
    #[must_use]
    pub fn new(product_id: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            transaction_id: transaction_id.into(),
            transaction_date: 0,
            quantity: default_quantity(),
            app_id: None,
            price: None,
            title: None,
        }
    }

    /// Sets the transaction date.
    #[must_use]
    pub fn with_date(mut self, epoch_secs: u64) -> Self {
        self.transaction_date = epoch_secs;
        self
    }

    /// Sets the quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the application identifier.
    #[must_use]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Sets the price.
    #[must_use]
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
