//! Event routing through `PurchaseManager` over the simulated store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use parking_lot::Mutex;
use purchase_core::event::error_code;
use purchase_core::{
    Product, ProductHandle, ProductListener, ProductState, PurchaseError, PurchaseEventData,
    PurchaseManager, PurchaseManagerListener, Receipt, SimulatedStore, SimulatedStoreConfig,
};

#[derive(Default)]
struct Log {
    entries: Mutex<Vec<String>>,
}

impl Log {
    fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl ProductListener for Log {
    fn product_valid(&self, _product: &Product) {
        self.push("valid");
    }

    fn product_invalid(&self, _product: &Product) {
        self.push("invalid");
    }

    fn purchase_started(&self, _product: &Product) {
        self.push("started");
    }

    fn purchase_completed(&self, _product: &Product) {
        self.push("completed");
    }

    fn purchase_failed(&self, _product: &Product, error_code: i32) {
        self.push(format!("failed:{error_code}"));
    }

    fn receipt_valid(&self, product: &Product, receipt: &Receipt) {
        assert_eq!(product.product_id(), Some(receipt.product_id.as_str()));
        self.push("receipt");
    }
}

impl PurchaseManagerListener for Log {
    fn product_restored(&self, product: &Product) {
        self.push(format!("restored:{}", product.product_id().unwrap_or("?")));
    }

    fn restore_failed(&self, error_code: i32) {
        self.push(format!("restore-failed:{error_code}"));
    }

    fn product_refunded(&self, _product: &Product) {
        self.push("refunded");
    }
}

fn manager() -> PurchaseManager<SimulatedStore> {
    PurchaseManager::new(SimulatedStore::default())
}

#[test]
fn handle_unset_until_create_event_delivered() {
    let mut manager = manager();
    let handle = manager.create_product("sku_1").unwrap();

    let product = manager.product(handle).unwrap();
    assert_eq!(product.handle(), None);
    assert_eq!(product.state(), ProductState::Pending);

    assert_eq!(manager.pump(), 1);
    assert_eq!(manager.product(handle).unwrap().handle(), Some(handle));
}

#[test]
fn full_purchase_reaches_listener_in_order() {
    let mut manager = manager();
    let log = Arc::new(Log::default());
    let handle = manager.create_product("sku_1").unwrap();
    manager
        .product(handle)
        .unwrap()
        .add_product_listener(log.clone());

    manager.pump();
    manager.request_purchase(handle, 1).unwrap();
    manager.pump();
    manager.verify_receipt(handle).unwrap();
    manager.pump();

    assert_eq!(log.entries(), vec!["valid", "started", "completed", "receipt"]);
    let product = manager.product(handle).unwrap();
    assert_eq!(product.state(), ProductState::Purchased);
    assert_eq!(product.receipt().unwrap().product_id, "sku_1");
}

#[test]
fn purchase_of_unconfirmed_product_is_refused() {
    let mut manager = manager();
    let handle = manager.create_product("sku_1").unwrap();

    let err = manager.request_purchase(handle, 1).unwrap_err();
    assert!(matches!(err, PurchaseError::State(_)));
}

#[test]
fn purchase_of_invalid_product_is_refused() {
    let mut manager = manager();
    let log = Arc::new(Log::default());
    let handle = manager.create_product("not.in.catalog").unwrap();
    manager
        .product(handle)
        .unwrap()
        .add_product_listener(log.clone());
    manager.pump();

    assert_eq!(log.entries(), vec!["invalid"]);
    assert!(manager.request_purchase(handle, 1).is_err());
}

#[test]
fn declined_purchase_reports_error_code() {
    let mut manager = PurchaseManager::new(SimulatedStore::new(SimulatedStoreConfig {
        decline_purchases: true,
        ..Default::default()
    }));
    let log = Arc::new(Log::default());
    let handle = manager.create_product("sku_1").unwrap();
    manager
        .product(handle)
        .unwrap()
        .add_product_listener(log.clone());
    manager.pump();
    manager.request_purchase(handle, 1).unwrap();
    manager.pump();

    assert_eq!(
        log.entries(),
        vec![
            "valid".to_string(),
            "started".to_string(),
            format!("failed:{}", error_code::PAYMENT_DECLINED)
        ]
    );
}

#[test]
fn unsupported_platform_refuses_products() {
    let mut manager = PurchaseManager::new(SimulatedStore::new(SimulatedStoreConfig {
        supported: false,
        ..Default::default()
    }));
    assert!(matches!(
        manager.create_product("sku_1"),
        Err(PurchaseError::NotSupported)
    ));
    assert!(matches!(
        manager.restore_transactions(),
        Err(PurchaseError::NotSupported)
    ));
}

#[test]
fn restore_materializes_products_and_notifies_manager_listeners() {
    let mut manager = PurchaseManager::new(SimulatedStore::new(SimulatedStoreConfig {
        owned: vec!["sku_1".to_string()],
        ..Default::default()
    }));
    let log = Arc::new(Log::default());
    manager.add_listener(log.clone());

    manager.restore_transactions().unwrap();
    manager.pump();

    assert_eq!(log.entries(), vec!["restored:sku_1"]);
    let restored: Vec<&Product> = manager.products().collect();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].state(), ProductState::Restored);
    assert!(restored[0].receipt().is_some());
}

#[test]
fn refund_and_restore_failure_reach_manager_listeners() {
    let mut manager = PurchaseManager::new(SimulatedStore::new(SimulatedStoreConfig {
        owned: vec!["sku_1".to_string()],
        ..Default::default()
    }));
    let log = Arc::new(Log::default());
    let listener: Arc<dyn PurchaseManagerListener> = log.clone();
    assert!(manager.add_listener(Arc::clone(&listener)));
    assert!(!manager.add_listener(Arc::clone(&listener)));

    manager.platform_mut().refund("sku_1").unwrap();
    manager
        .platform_mut()
        .inject(PurchaseEventData::restore_failed(error_code::STORE_UNAVAILABLE));
    assert_eq!(manager.pump(), 2);

    assert_eq!(
        log.entries(),
        vec![
            "refunded".to_string(),
            format!("restore-failed:{}", error_code::STORE_UNAVAILABLE)
        ]
    );

    assert!(manager.remove_listener(&listener));
}

#[test]
fn events_for_unknown_handles_and_tags_are_rejected() {
    let mut manager = manager();
    let err = manager
        .dispatch(&PurchaseEventData::request_completed(ProductHandle::new(99)))
        .unwrap_err();
    assert!(matches!(err, PurchaseError::UnknownProduct(_)));

    let err = manager
        .dispatch(&PurchaseEventData::new(42, 0, ProductHandle::new(1)))
        .unwrap_err();
    assert!(matches!(err, PurchaseError::UnknownEventType(42)));

    // Rejected events are skipped by pump without stopping the drain.
    let handle = manager.create_product("sku_1").unwrap();
    manager
        .platform_mut()
        .inject(PurchaseEventData::new(42, 0, handle));
    assert_eq!(manager.pump(), 2);
    assert_eq!(
        manager.product(handle).unwrap().state(),
        ProductState::Created
    );
}

#[test]
fn destroy_product_releases_handle() {
    let mut manager = manager();
    let handle = manager.create_product("sku_1").unwrap();
    manager.pump();

    let product = manager.destroy_product(handle).unwrap();
    assert_eq!(product.product_id(), Some("sku_1"));
    assert!(manager.product(handle).is_none());
    assert!(manager.destroy_product(handle).is_err());
}

#[test]
fn destroy_refused_by_platform_keeps_product() {
    let mut manager = manager();
    let handle = ProductHandle::new(500);
    manager.platform_mut().inject(PurchaseEventData::restored(
        handle,
        Some(Receipt::new("sku_1", "tx-restored")),
    ));
    manager.pump();
    assert_eq!(
        manager.product(handle).unwrap().state(),
        ProductState::Restored
    );

    // The store never issued this handle, so it refuses to release it.
    let err = manager.destroy_product(handle).unwrap_err();
    assert!(matches!(err, PurchaseError::UnknownProduct(h) if h == handle));

    let product = manager.product(handle).unwrap();
    assert_eq!(product.product_id(), Some("sku_1"));
    assert_eq!(product.state(), ProductState::Restored);
}
