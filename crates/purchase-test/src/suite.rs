//! Built-in purchase tests run against a [`SimulatedStore`].
//!
//! Each test owns a fresh store built from the same configuration, so
//! tests never observe each other's products or receipts.

use std::sync::Arc;

use async_trait::async_trait;
use purchase_core::{
    Product, ProductHandle, ProductListener, ProductState, PurchaseError, PurchaseEventData,
    PurchaseManager, PurchaseManagerListener, Receipt, SimulatedStore, SimulatedStoreConfig,
};

use crate::case::{PurchaseTest, TestReporter};

/// Product identifier the store's catalog does not contain.
pub const UNKNOWN_PRODUCT_ID: &str = "purchase.selftest.unknown";

/// The fixed test list, in run order.
#[must_use]
pub fn default_suite(config: &SimulatedStoreConfig) -> Vec<Box<dyn PurchaseTest>> {
    vec![
        Box::new(CreateProductTest::new(config.clone())),
        Box::new(InvalidProductTest::new(config.clone())),
        Box::new(PurchaseProductTest::new(config.clone())),
        Box::new(DuplicateReceiptTest::new(config.clone())),
        Box::new(RestoreTest::new(config.clone())),
    ]
}

/// Which listener callback completes a test successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Valid,
    Invalid,
    Receipt,
    /// Report failures only.
    Watch,
}

/// Listener translating product callbacks into test reports.
struct Reporting {
    reporter: TestReporter,
    expect: Expect,
}

impl ProductListener for Reporting {
    fn product_valid(&self, product: &Product) {
        self.reporter
            .log(format!("product valid, handle {}", handle_label(product)));
        match (self.expect, product.handle()) {
            (Expect::Valid, Some(_)) => self.reporter.succeeded(),
            (Expect::Valid, None) => self.reporter.failed("valid product has no handle"),
            (Expect::Invalid, _) => self.reporter.failed("unknown product was accepted"),
            (Expect::Receipt | Expect::Watch, _) => {}
        }
    }

    fn product_invalid(&self, product: &Product) {
        self.reporter.log("product invalid");
        match (self.expect, product.handle()) {
            (Expect::Invalid, None) => self.reporter.succeeded(),
            (Expect::Invalid, Some(_)) => self.reporter.failed("invalid product got a handle"),
            _ => self.reporter.failed("catalog product was rejected"),
        }
    }

    fn purchase_started(&self, _product: &Product) {
        self.reporter.log("purchase started");
    }

    fn purchase_completed(&self, _product: &Product) {
        self.reporter.log("purchase completed");
    }

    fn purchase_failed(&self, _product: &Product, error_code: i32) {
        self.reporter
            .failed(format!("purchase failed with error code {error_code}"));
    }

    fn receipt_valid(&self, product: &Product, receipt: &Receipt) {
        self.reporter
            .log(format!("receipt {} verified", receipt.transaction_id));
        if self.expect != Expect::Receipt {
            return;
        }
        if product.receipt() == Some(receipt) {
            self.reporter.succeeded();
        } else {
            self.reporter.failed("verified receipt not attached to product");
        }
    }

    fn receipt_invalid(&self, _product: &Product) {
        self.reporter.failed("store rejected the receipt");
    }

    fn receipt_error(&self, _product: &Product, error_code: i32) {
        self.reporter
            .failed(format!("receipt verification failed with error code {error_code}"));
    }
}

fn handle_label(product: &Product) -> String {
    product
        .handle()
        .map_or_else(|| "none".to_string(), |h| h.to_string())
}

/// Creates a product and attaches a reporting listener to it.
fn create_with_listener(
    manager: &mut PurchaseManager<SimulatedStore>,
    product_id: &str,
    listener: Arc<dyn ProductListener>,
) -> Result<ProductHandle, PurchaseError> {
    let handle = manager.create_product(product_id)?;
    if let Some(product) = manager.product(handle) {
        product.add_product_listener(listener);
    }
    Ok(handle)
}

/// Runs create, purchase and receipt verification for `product_id`.
fn purchase_and_verify(
    manager: &mut PurchaseManager<SimulatedStore>,
    product_id: &str,
    listener: Arc<dyn ProductListener>,
) -> Result<ProductHandle, PurchaseError> {
    let handle = create_with_listener(manager, product_id, listener)?;
    manager.pump();
    manager.request_purchase(handle, 1)?;
    manager.pump();
    // A failed purchase was already reported by the listener.
    if manager.product(handle).map(Product::state) != Some(ProductState::Purchased) {
        return Ok(handle);
    }
    manager.verify_receipt(handle)?;
    manager.pump();
    Ok(handle)
}

fn first_catalog_product(config: &SimulatedStoreConfig) -> Option<String> {
    config.catalog.first().map(|entry| entry.product_id.clone())
}

/// A catalog product is confirmed and receives a handle.
#[derive(Debug)]
pub struct CreateProductTest {
    config: SimulatedStoreConfig,
}

impl CreateProductTest {
    /// Creates the test.
    #[must_use]
    pub const fn new(config: SimulatedStoreConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PurchaseTest for CreateProductTest {
    fn name(&self) -> &str {
        "create product"
    }

    async fn start_test(&mut self, reporter: TestReporter) {
        let Some(product_id) = first_catalog_product(&self.config) else {
            reporter.failed("catalog is empty");
            return;
        };
        let mut manager = PurchaseManager::new(SimulatedStore::new(self.config.clone()));
        let listener = Arc::new(Reporting {
            reporter: reporter.clone(),
            expect: Expect::Valid,
        });
        if let Err(e) = create_with_listener(&mut manager, &product_id, listener) {
            reporter.failed(e.to_string());
            return;
        }
        manager.pump();
    }
}

/// An identifier outside the catalog is rejected and never gets a handle.
#[derive(Debug)]
pub struct InvalidProductTest {
    config: SimulatedStoreConfig,
}

impl InvalidProductTest {
    /// Creates the test.
    #[must_use]
    pub const fn new(config: SimulatedStoreConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PurchaseTest for InvalidProductTest {
    fn name(&self) -> &str {
        "invalid product"
    }

    async fn start_test(&mut self, reporter: TestReporter) {
        let mut manager = PurchaseManager::new(SimulatedStore::new(self.config.clone()));
        let listener = Arc::new(Reporting {
            reporter: reporter.clone(),
            expect: Expect::Invalid,
        });
        if let Err(e) = create_with_listener(&mut manager, UNKNOWN_PRODUCT_ID, listener) {
            reporter.failed(e.to_string());
            return;
        }
        manager.pump();
    }
}

/// Full purchase ending with a verified receipt on the product.
#[derive(Debug)]
pub struct PurchaseProductTest {
    config: SimulatedStoreConfig,
}

impl PurchaseProductTest {
    /// Creates the test.
    #[must_use]
    pub const fn new(config: SimulatedStoreConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PurchaseTest for PurchaseProductTest {
    fn name(&self) -> &str {
        "purchase product"
    }

    async fn start_test(&mut self, reporter: TestReporter) {
        let Some(product_id) = first_catalog_product(&self.config) else {
            reporter.failed("catalog is empty");
            return;
        };
        let mut manager = PurchaseManager::new(SimulatedStore::new(self.config.clone()));
        let listener = Arc::new(Reporting {
            reporter: reporter.clone(),
            expect: Expect::Receipt,
        });
        if let Err(e) = purchase_and_verify(&mut manager, &product_id, listener) {
            reporter.failed(e.to_string());
        }
    }
}

/// A second receipt for an already verified product is rejected and the
/// first one is kept.
#[derive(Debug)]
pub struct DuplicateReceiptTest {
    config: SimulatedStoreConfig,
}

impl DuplicateReceiptTest {
    /// Creates the test.
    #[must_use]
    pub const fn new(config: SimulatedStoreConfig) -> Self {
        Self { config }
    }

    fn check(&self, reporter: &TestReporter) -> Result<(), String> {
        let product_id = first_catalog_product(&self.config).ok_or("catalog is empty")?;
        let mut manager = PurchaseManager::new(SimulatedStore::new(self.config.clone()));
        let listener = Arc::new(Reporting {
            reporter: reporter.clone(),
            expect: Expect::Watch,
        });
        let handle =
            purchase_and_verify(&mut manager, &product_id, listener).map_err(|e| e.to_string())?;

        let first = manager
            .product(handle)
            .and_then(Product::receipt)
            .cloned()
            .ok_or("first receipt was not attached")?;

        let forged = Receipt::new(product_id, "forged-transaction");
        match manager.dispatch(&PurchaseEventData::receipt_valid(handle, forged)) {
            Err(PurchaseError::DuplicateReceipt(_)) => {}
            Err(e) => return Err(format!("unexpected error: {e}")),
            Ok(()) => return Err("second receipt was accepted".to_string()),
        }

        let kept = manager.product(handle).and_then(Product::receipt);
        if kept == Some(&first) {
            Ok(())
        } else {
            Err("first receipt was replaced".to_string())
        }
    }
}

#[async_trait]
impl PurchaseTest for DuplicateReceiptTest {
    fn name(&self) -> &str {
        "duplicate receipt"
    }

    async fn start_test(&mut self, reporter: TestReporter) {
        match self.check(&reporter) {
            Ok(()) => reporter.succeeded(),
            Err(reason) => reporter.failed(reason),
        }
    }
}

/// Listener that ignores every callback.
struct Silent;

impl ProductListener for Silent {
    fn product_valid(&self, _product: &Product) {}

    fn product_invalid(&self, _product: &Product) {}
}

/// Restores a previous purchase through the manager listeners.
#[derive(Debug)]
pub struct RestoreTest {
    config: SimulatedStoreConfig,
}

impl RestoreTest {
    /// Creates the test.
    #[must_use]
    pub const fn new(config: SimulatedStoreConfig) -> Self {
        Self { config }
    }
}

struct RestoreListener {
    reporter: TestReporter,
    product_id: String,
}

impl PurchaseManagerListener for RestoreListener {
    fn product_restored(&self, product: &Product) {
        if product.product_id() != Some(self.product_id.as_str()) {
            return;
        }
        if product.receipt().is_some() {
            self.reporter.succeeded();
        } else {
            self.reporter.failed("restored product has no receipt");
        }
    }

    fn restore_failed(&self, error_code: i32) {
        self.reporter
            .failed(format!("restore failed with error code {error_code}"));
    }
}

#[async_trait]
impl PurchaseTest for RestoreTest {
    fn name(&self) -> &str {
        "restore purchases"
    }

    async fn start_test(&mut self, reporter: TestReporter) {
        let Some(product_id) = first_catalog_product(&self.config) else {
            reporter.failed("catalog is empty");
            return;
        };
        let mut manager = PurchaseManager::new(SimulatedStore::new(self.config.clone()));
        manager.add_listener(Arc::new(RestoreListener {
            reporter: reporter.clone(),
            product_id: product_id.clone(),
        }));

        let purchased = create_with_listener(&mut manager, &product_id, Arc::new(Silent))
            .and_then(|handle| {
                manager.pump();
                manager.request_purchase(handle, 1)?;
                manager.pump();
                Ok(manager.product(handle).map(Product::state))
            });
        match purchased {
            Ok(Some(ProductState::Purchased)) => {}
            Ok(state) => {
                reporter.failed(format!("nothing to restore, purchase ended in {state:?}"));
                return;
            }
            Err(e) => {
                reporter.failed(e.to_string());
                return;
            }
        }

        if let Err(e) = manager.restore_transactions() {
            reporter.failed(e.to_string());
            return;
        }
        manager.pump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{ReportKind, TestId};
    use tokio::sync::mpsc;

    /// Runs one test directly and returns its non-log reports.
    async fn outcomes(mut test: impl PurchaseTest) -> Vec<ReportKind> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = TestReporter::new(TestId::new(), Arc::from(test.name()), tx);
        test.start_test(reporter).await;
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|r| r.kind)
            .filter(|k| !matches!(k, ReportKind::Log(_)))
            .collect()
    }

    #[tokio::test]
    async fn test_default_suite_passes_on_default_store() {
        let config = SimulatedStoreConfig::default();
        for test in default_suite(&config) {
            let name = test.name().to_string();
            let kinds = outcomes(BoxedTest(test)).await;
            assert_eq!(kinds, vec![ReportKind::Succeeded], "test {name}");
        }
    }

    #[tokio::test]
    async fn test_declined_purchases_fail_purchase_test() {
        let config = SimulatedStoreConfig {
            decline_purchases: true,
            ..SimulatedStoreConfig::default()
        };
        let kinds = outcomes(PurchaseProductTest::new(config)).await;
        assert_eq!(
            kinds,
            vec![ReportKind::Failed(
                "purchase failed with error code -5".into()
            )]
        );
    }

    #[tokio::test]
    async fn test_rejected_receipts_fail_purchase_test() {
        let config = SimulatedStoreConfig {
            reject_receipts: true,
            ..SimulatedStoreConfig::default()
        };
        let kinds = outcomes(PurchaseProductTest::new(config)).await;
        assert_eq!(
            kinds,
            vec![ReportKind::Failed("store rejected the receipt".into())]
        );
    }

    #[tokio::test]
    async fn test_unsupported_store_fails_create() {
        let config = SimulatedStoreConfig {
            supported: false,
            ..SimulatedStoreConfig::default()
        };
        let kinds = outcomes(CreateProductTest::new(config)).await;
        assert!(matches!(kinds.as_slice(), [ReportKind::Failed(_)]));
    }

    #[tokio::test]
    async fn test_empty_catalog_fails_fast() {
        let config = SimulatedStoreConfig {
            catalog: Vec::new(),
            ..SimulatedStoreConfig::default()
        };
        let kinds = outcomes(RestoreTest::new(config)).await;
        assert_eq!(kinds, vec![ReportKind::Failed("catalog is empty".into())]);
    }

    struct BoxedTest(Box<dyn PurchaseTest>);

    #[async_trait]
    impl PurchaseTest for BoxedTest {
        fn name(&self) -> &str {
            self.0.name()
        }

        async fn start_test(&mut self, reporter: TestReporter) {
            self.0.start_test(reporter).await;
        }
    }
}
