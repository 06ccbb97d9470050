//! # Test Fixtures
//!
//! A fully wired service stack over one shared database and a manual clock
//! pinned to 2026-01-12 09:00 UTC.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};

use pas_01_serial_generator::SerialGenerator;
use pas_03_ledger_chain::LedgerChainEngine;
use pas_04_batch_lifecycle::{
    BatchLifecycleApi, BatchLifecycleManager, BatchSummary, LifecycleConfig, NewProduct,
    ProductionRequest,
};
use pas_05_verification::{VerificationConfig, VerificationResolver};
use shared_crypto::AuthSecret;
use shared_store::{Database, DatabaseConfig, FileBackedKVStore, ReadAccess};
use shared_types::{Actor, BatchId, Clock, ItemId, ManualClock, ProductDefId, ProductUnit, Role};

/// Secret used by every fixture stack.
pub const TEST_SECRET: [u8; 32] = [0x5a; 32];

pub struct Stack {
    pub db: Arc<Database>,
    pub clock: Arc<ManualClock>,
    pub ledger: Arc<LedgerChainEngine>,
    pub lifecycle: Arc<BatchLifecycleManager>,
    pub verification: Arc<VerificationResolver>,
}

impl Stack {
    pub fn in_memory() -> Self {
        Self::over(Database::in_memory())
    }

    /// Stack over a file-backed store at `dir/pas.db`.
    pub fn on_file(dir: &Path) -> Self {
        let store = FileBackedKVStore::open(dir.join("pas.db")).expect("open file store");
        let db = Database::open(Box::new(store), DatabaseConfig::default()).expect("open database");
        Self::over(db)
    }

    /// In-memory stack whose row locks wait at most `lock_timeout`.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        let store = shared_store::InMemoryKVStore::new();
        let db = Database::open(Box::new(store), DatabaseConfig { lock_timeout })
            .expect("open database");
        Self::over(db)
    }

    fn over(db: Database) -> Self {
        let db = Arc::new(db);
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap(),
        ));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let serials = Arc::new(SerialGenerator::new(AuthSecret::from_bytes(TEST_SECRET)));
        let ledger = Arc::new(LedgerChainEngine::new(Arc::clone(&db), Arc::clone(&dyn_clock)));
        let lifecycle = Arc::new(BatchLifecycleManager::new(
            Arc::clone(&db),
            Arc::clone(&dyn_clock),
            serials.clone(),
            Arc::clone(&ledger),
            LifecycleConfig::default(),
        ));
        let verification = Arc::new(VerificationResolver::new(
            Arc::clone(&db),
            dyn_clock,
            serials,
            ledger.clone(),
            VerificationConfig::default(),
        ));

        Self {
            db,
            clock,
            ledger,
            lifecycle,
            verification,
        }
    }

    pub fn register_product(&self, name: &str) -> ProductDefId {
        self.lifecycle
            .register_product(
                &maker(),
                NewProduct {
                    name: name.into(),
                    category: "Beverages".into(),
                    description: String::new(),
                    shelf_life_days: Some(180),
                },
            )
            .expect("register product")
            .product_def_id
    }

    /// Batch of `quantity` units manufactured today at "Plant 1".
    pub fn create_batch(&self, product_def_id: ProductDefId, quantity: u32) -> BatchSummary {
        self.lifecycle
            .create_batch(
                &maker(),
                ProductionRequest {
                    product_def_id,
                    quantity,
                    manufacturing_date: Some(today()),
                    expiry_date: None,
                    location: Some("Plant 1".into()),
                },
            )
            .expect("create batch")
    }

    pub fn units(&self, batch_id: BatchId) -> Vec<ProductUnit> {
        self.db.units_in_batch(batch_id).expect("units")
    }

    pub fn unit(&self, item_id: ItemId) -> ProductUnit {
        self.db.unit(item_id).expect("read unit").expect("unit exists")
    }
}

/// `serial#hash`, as printed in the unit's QR code.
pub fn qr_payload(unit: &ProductUnit) -> String {
    pas_02_qr_codec::encode_payload(&unit.serial_code, &unit.auth_hash)
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
}

pub fn maker() -> Actor {
    Actor::new(10, "Acme Foods", Role::Manufacturer)
}

pub fn rival() -> Actor {
    Actor::new(11, "Rival Foods", Role::Manufacturer)
}

pub fn shop() -> Actor {
    Actor::new(20, "Corner Shop", Role::Retailer)
}

pub fn admin() -> Actor {
    Actor::new(1, "Ops", Role::Admin)
}

pub fn buyer(id: u64) -> Actor {
    Actor::new(id, format!("Buyer {}", id), Role::Customer)
}
