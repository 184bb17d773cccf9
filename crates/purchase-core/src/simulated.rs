//! In-memory store implementing [`PurchasePlatform`].
//!
//! Used by the purchase test suite and the self-test binary in place of a
//! device store. Every call queues the events a real store would send, in
//! the order it would send them.

use std::collections::{BTreeMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{PurchaseError, Result};
use crate::event::{PurchaseEventData, error_code};
use crate::platform::PurchasePlatform;
use crate::receipt::Receipt;
use crate::types::ProductHandle;

/// Simulated store configuration.
///
/// Validated at load time, with defaults for every field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedStoreConfig {
    /// Whether the device can make purchases.
    #[serde(default = "default_true")]
    pub supported: bool,

    /// Products the store knows.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<CatalogEntry>,

    /// Application identifier written into receipts.
    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// Decline every purchase request.
    #[serde(default)]
    pub decline_purchases: bool,

    /// Reject every receipt verification.
    #[serde(default)]
    pub reject_receipts: bool,

    /// Product identifiers owned before the session starts (restorable).
    #[serde(default)]
    pub owned: Vec<String>,
}

/// One product in the simulated catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Store product identifier.
    pub product_id: String,
    /// Localized price.
    #[serde(default)]
    pub price: Option<String>,
    /// Localized title.
    #[serde(default)]
    pub title: Option<String>,
}

impl CatalogEntry {
    /// Creates an entry without price or title.
    #[must_use]
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            price: None,
            title: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            product_id: "android.test.purchased".to_string(),
            price: Some("0.99".to_string()),
            title: Some("Test product".to_string()),
        },
        CatalogEntry {
            product_id: "sku_1".to_string(),
            price: Some("1.99".to_string()),
            title: Some("Gem pack".to_string()),
        },
    ]
}

fn default_app_id() -> String {
    "com.purchase.selftest".to_string()
}

impl Default for SimulatedStoreConfig {
    fn default() -> Self {
        Self {
            supported: default_true(),
            catalog: default_catalog(),
            app_id: default_app_id(),
            decline_purchases: false,
            reject_receipts: false,
            owned: Vec::new(),
        }
    }
}

impl SimulatedStoreConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error for empty or duplicate product identifiers, or an
    /// owned product missing from the catalog.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in &self.catalog {
            if entry.product_id.is_empty() {
                return Err(PurchaseError::config("catalog product_id cannot be empty"));
            }
            if !seen.insert(entry.product_id.as_str()) {
                return Err(PurchaseError::config(format!(
                    "duplicate catalog product_id: {}",
                    entry.product_id
                )));
            }
        }
        if let Some(missing) = self.owned.iter().find(|id| !seen.contains(id.as_str())) {
            return Err(PurchaseError::config(format!(
                "owned product not in catalog: {missing}"
            )));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PurchaseError::config(format!("failed to parse store config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PurchaseError::config(format!("failed to read store config: {e}")))?;
        Self::from_toml_str(&content)
    }
}

/// In-memory purchase platform.
#[derive(Debug)]
pub struct SimulatedStore {
    config: SimulatedStoreConfig,
    next_handle: i32,
    next_transaction: u64,
    products: BTreeMap<ProductHandle, String>,
    receipts: BTreeMap<ProductHandle, Receipt>,
    owned: Vec<String>,
    events: VecDeque<PurchaseEventData>,
}

impl SimulatedStore {
    /// Creates a store from configuration.
    #[must_use]
    pub fn new(config: SimulatedStoreConfig) -> Self {
        let owned = config.owned.clone();
        Self {
            config,
            next_handle: 1,
            next_transaction: 1,
            products: BTreeMap::new(),
            receipts: BTreeMap::new(),
            owned,
            events: VecDeque::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulatedStoreConfig {
        &self.config
    }

    /// Queues an arbitrary raw event.
    pub fn inject(&mut self, event: PurchaseEventData) {
        self.events.push_back(event);
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Product identifiers owned by the simulated account.
    #[must_use]
    pub fn owned(&self) -> &[String] {
        &self.owned
    }

    /// Refunds an owned product; queues a refund event under a fresh handle.
    ///
    /// # Errors
    /// Fails if the product is not owned.
    pub fn refund(&mut self, product_id: &str) -> Result<ProductHandle> {
        let position = self
            .owned
            .iter()
            .position(|id| id == product_id)
            .ok_or_else(|| PurchaseError::platform(format!("{product_id} is not owned")))?;
        self.owned.remove(position);
        let handle = self.allocate(product_id);
        self.events.push_back(PurchaseEventData::refunded(handle));
        Ok(handle)
    }

    fn allocate(&mut self, product_id: &str) -> ProductHandle {
        let handle = ProductHandle::new(self.next_handle);
        self.next_handle += 1;
        self.products.insert(handle, product_id.to_string());
        handle
    }

    fn catalog_entry(&self, product_id: &str) -> Option<&CatalogEntry> {
        self.config
            .catalog
            .iter()
            .find(|entry| entry.product_id == product_id)
    }

    fn issue_receipt(&mut self, product_id: &str, quantity: u32) -> Receipt {
        let transaction_id = format!("sim-{}", self.next_transaction);
        self.next_transaction += 1;
        let date = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut receipt = Receipt::new(product_id, transaction_id)
            .with_date(date)
            .with_quantity(quantity)
            .with_app_id(self.config.app_id.clone());
        if let Some(entry) = self.catalog_entry(product_id) {
            receipt.price.clone_from(&entry.price);
            receipt.title.clone_from(&entry.title);
        }
        receipt
    }

    fn product_id(&self, handle: ProductHandle) -> Result<String> {
        self.products
            .get(&handle)
            .cloned()
            .ok_or(PurchaseError::UnknownProduct(handle))
    }
}

impl Default for SimulatedStore {
    fn default() -> Self {
        Self::new(SimulatedStoreConfig::default())
    }
}

impl PurchasePlatform for SimulatedStore {
    fn is_supported(&self) -> bool {
        self.config.supported
    }

    fn create_product(&mut self, product_id: &str) -> Result<ProductHandle> {
        let handle = self.allocate(product_id);
        let event = if self.catalog_entry(product_id).is_some() {
            PurchaseEventData::product_valid(handle)
        } else {
            PurchaseEventData::product_invalid(handle)
        };
        self.events.push_back(event);
        Ok(handle)
    }

    fn request_purchase(&mut self, handle: ProductHandle, quantity: u32) -> Result<()> {
        let product_id = self.product_id(handle)?;

        self.events
            .push_back(PurchaseEventData::request_in_progress(handle));
        if self.config.decline_purchases {
            self.events.push_back(PurchaseEventData::request_failed(
                handle,
                error_code::PAYMENT_DECLINED,
            ));
            return Ok(());
        }
        if self.catalog_entry(&product_id).is_none() {
            self.events.push_back(PurchaseEventData::request_failed(
                handle,
                error_code::INVALID_PRODUCT,
            ));
            return Ok(());
        }

        let receipt = self.issue_receipt(&product_id, quantity);
        self.receipts.insert(handle, receipt);
        if !self.owned.contains(&product_id) {
            self.owned.push(product_id);
        }
        self.events
            .push_back(PurchaseEventData::request_completed(handle));
        Ok(())
    }

    fn verify_receipt(&mut self, handle: ProductHandle) -> Result<()> {
        self.product_id(handle)?;
        let event = match self.receipts.get(&handle) {
            None => PurchaseEventData::receipt_error(handle, error_code::NO_RECEIPT),
            Some(_) if self.config.reject_receipts => PurchaseEventData::receipt_invalid(handle),
            Some(receipt) => PurchaseEventData::receipt_valid(handle, receipt.clone()),
        };
        self.events.push_back(event);
        Ok(())
    }

    fn restore_transactions(&mut self) -> Result<()> {
        if !self.config.supported {
            self.events
                .push_back(PurchaseEventData::restore_failed(error_code::STORE_UNAVAILABLE));
            return Ok(());
        }
        for product_id in self.owned.clone() {
            let handle = self.allocate(&product_id);
            let receipt = self.issue_receipt(&product_id, 1);
            self.receipts.insert(handle, receipt.clone());
            self.events
                .push_back(PurchaseEventData::restored(handle, Some(receipt)));
        }
        Ok(())
    }

    fn destroy_product(&mut self, handle: ProductHandle) -> Result<()> {
        self.products
            .remove(&handle)
            .ok_or(PurchaseError::UnknownProduct(handle))?;
        self.receipts.remove(&handle);
        self.events.retain(|e| e.handle() != handle);
        Ok(())
    }

    fn poll_event(&mut self) -> Option<PurchaseEventData> {
        self.events.pop_front()
    }
}
