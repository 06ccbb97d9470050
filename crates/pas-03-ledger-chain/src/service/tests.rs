use super::*;
use chrono::{NaiveDate, TimeZone, Utc};
use shared_store::{DatabaseConfig, InMemoryKVStore, KeyPrefix};
use shared_types::{BatchStatus, ManualClock, ProductUnit, Role, UnitStatus};
use std::thread;
use std::time::Duration;

struct Fixture {
    db: Arc<Database>,
    clock: Arc<ManualClock>,
    engine: LedgerChainEngine,
}

fn fixture() -> Fixture {
    let db = Arc::new(
        Database::open(
            Box::new(InMemoryKVStore::new()),
            DatabaseConfig {
                lock_timeout: Duration::from_secs(10),
            },
        )
        .unwrap(),
    );
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 12, 8, 0, 0).unwrap(),
    ));
    let engine = LedgerChainEngine::new(Arc::clone(&db), clock.clone());
    Fixture { db, clock, engine }
}

fn maker() -> Actor {
    Actor::new(10, "Acme Foods", Role::Manufacturer)
}

fn shop() -> Actor {
    Actor::new(20, "Corner Shop", Role::Retailer)
}

/// Seed a batch of `count` units with empty chains. Returns the item ids.
fn seed_batch(db: &Database, batch_id: BatchId, manufacturer_id: u64, count: u32) -> Vec<ItemId> {
    let number = format!("BATCH-20260112-{:04}", batch_id);
    let mut txn = db.begin();
    txn.insert_batch(&ProductionBatch {
        batch_id,
        batch_number: number.clone(),
        product_def_id: 1,
        manufacturer_id,
        manufacturer_name: "Acme Foods".into(),
        quantity: count,
        manufacturing_date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
        expiry_date: NaiveDate::from_ymd_opt(2026, 7, 12).unwrap(),
        status: BatchStatus::Active,
        recall_reason: None,
        created_at: Utc::now(),
    })
    .unwrap();

    let mut ids = Vec::new();
    for seq in 1..=count {
        let item_id = txn.next_id(Table::Unit);
        txn.insert_unit(&ProductUnit {
            item_id,
            batch_id,
            sequence: seq,
            serial_code: format!("{}-{:04}", number, seq),
            nonce: "00".repeat(16),
            auth_hash: "ab".repeat(32),
            status: UnitStatus::Manufactured,
            holder_id: manufacturer_id,
            holder_name: "Acme Foods".into(),
            holder_role: Role::Manufacturer,
            chain_length: 0,
            head_hash: GENESIS_HASH.to_string(),
            created_at: Utc::now(),
        })
        .unwrap();
        ids.push(item_id);
    }
    txn.commit().unwrap();
    ids
}

#[test]
fn test_first_entry_links_to_genesis() {
    let f = fixture();
    let ids = seed_batch(&f.db, 1, 10, 1);

    let entry = f
        .engine
        .append(&maker(), ids[0], LedgerAction::Manufactured, "Plant 1")
        .unwrap();

    assert_eq!(entry.sequence, 1);
    assert_eq!(entry.previous_hash, GENESIS_HASH);
    assert_eq!(entry.current_hash, compute_entry_hash(&entry));

    let unit = f.db.unit(ids[0]).unwrap().unwrap();
    assert_eq!(unit.chain_length, 1);
    assert_eq!(unit.head_hash, entry.current_hash);
}

#[test]
fn test_entries_link_in_order() {
    let f = fixture();
    let id = seed_batch(&f.db, 1, 10, 1)[0];

    f.engine.append(&maker(), id, LedgerAction::Manufactured, "Plant 1").unwrap();
    f.clock.advance(chrono::Duration::hours(1));
    f.engine.append(&maker(), id, LedgerAction::Shipped, "Dock 4").unwrap();
    f.clock.advance(chrono::Duration::hours(5));
    f.engine.append(&shop(), id, LedgerAction::Received, "Corner Shop").unwrap();

    let entries = f.engine.entries(id).unwrap();
    assert_eq!(entries.len(), 3);
    for pair in entries.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].current_hash);
        assert_eq!(pair[1].sequence, pair[0].sequence + 1);
    }

    let unit = f.db.unit(id).unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::InInventory);
    assert_eq!(unit.holder_id, 20);
    assert_eq!(unit.holder_role, Role::Retailer);
}

#[test]
fn test_shipping_keeps_holder() {
    let f = fixture();
    let id = seed_batch(&f.db, 1, 10, 1)[0];
    f.engine.append(&maker(), id, LedgerAction::Manufactured, "Plant 1").unwrap();
    f.engine.append(&maker(), id, LedgerAction::Shipped, "Dock 4").unwrap();

    let unit = f.db.unit(id).unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::InTransit);
    assert_eq!(unit.holder_id, 10);
}

#[test]
fn test_append_to_missing_unit() {
    let f = fixture();
    assert_eq!(
        f.engine.append(&maker(), 99, LedgerAction::Shipped, "x"),
        Err(LedgerError::UnitNotFound(99))
    );
}

#[test]
fn test_uncommitted_append_rolls_back() {
    let f = fixture();
    let id = seed_batch(&f.db, 1, 10, 1)[0];
    {
        let mut txn = f.db.begin();
        f.engine
            .append_in(&mut txn, &maker(), id, LedgerAction::Manufactured, "Plant 1")
            .unwrap();
    }
    assert!(f.engine.entries(id).unwrap().is_empty());
    assert_eq!(f.db.unit(id).unwrap().unwrap().chain_length, 0);
}

#[test]
fn test_lock_timeout_is_append_failure() {
    let db = Arc::new(
        Database::open(
            Box::new(InMemoryKVStore::new()),
            DatabaseConfig {
                lock_timeout: Duration::from_millis(20),
            },
        )
        .unwrap(),
    );
    let engine = LedgerChainEngine::new(
        Arc::clone(&db),
        Arc::new(ManualClock::at_date(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap())),
    );
    let id = seed_batch(&db, 1, 10, 1)[0];

    let mut holder = db.begin();
    holder.lock(RowLock::Unit(id)).unwrap();

    let err = engine
        .append(&maker(), id, LedgerAction::Manufactured, "Plant 1")
        .unwrap_err();
    assert!(matches!(err, LedgerError::AppendFailed { .. }));
    assert!(err.is_transient());
}

#[test]
fn test_verify_untouched_chain() {
    let f = fixture();
    let id = seed_batch(&f.db, 1, 10, 1)[0];
    f.engine.append(&maker(), id, LedgerAction::Manufactured, "Plant 1").unwrap();
    f.engine.append(&maker(), id, LedgerAction::Shipped, "Dock 4").unwrap();

    let result = f.engine.verify_chain(id).unwrap();
    assert!(result.valid);
    assert_eq!(result.entries_checked, 2);
}

#[test]
fn test_verify_detects_mutated_entry() {
    let f = fixture();
    let id = seed_batch(&f.db, 1, 10, 1)[0];
    f.engine.append(&maker(), id, LedgerAction::Manufactured, "Plant 1").unwrap();
    let second = f.engine.append(&maker(), id, LedgerAction::Shipped, "Dock 4").unwrap();
    f.engine.append(&shop(), id, LedgerAction::Received, "Corner Shop").unwrap();

    let mut forged = second.clone();
    forged.location = "Elsewhere".into();
    let mut txn = f.db.begin();
    txn.put_raw(
        KeyPrefix::ledger_key(id, forged.sequence),
        bincode::serialize(&forged).unwrap(),
    );
    txn.commit().unwrap();

    let result = f.engine.verify_chain(id).unwrap();
    assert!(!result.valid);
    assert_eq!(result.broken_at, Some(second.entry_id));
}

#[test]
fn test_verify_detects_truncation() {
    let f = fixture();
    let id = seed_batch(&f.db, 1, 10, 1)[0];
    f.engine.append(&maker(), id, LedgerAction::Manufactured, "Plant 1").unwrap();
    f.engine.append(&maker(), id, LedgerAction::Shipped, "Dock 4").unwrap();

    let mut txn = f.db.begin();
    txn.delete_raw(KeyPrefix::ledger_key(id, 2));
    txn.commit().unwrap();

    assert!(!f.engine.verify_chain(id).unwrap().valid);
}

#[test]
fn test_verify_batch_totals() {
    let f = fixture();
    let ids = seed_batch(&f.db, 1, 10, 3);
    for id in &ids {
        f.engine.append(&maker(), *id, LedgerAction::Manufactured, "Plant 1").unwrap();
    }

    let mut txn = f.db.begin();
    txn.delete_raw(KeyPrefix::ledger_key(ids[1], 1));
    txn.commit().unwrap();

    let audit = f.engine.verify_batch(1).unwrap();
    assert_eq!(audit.units_checked, 3);
    assert_eq!(audit.valid_units, 2);
    assert_eq!(audit.broken_units, 1);
    assert!(!audit.is_intact());
    assert_eq!(f.engine.verify_batch(7).unwrap_err(), LedgerError::BatchNotFound(7));
}

#[test]
fn test_list_filters_by_manufacturer_and_groups() {
    let f = fixture();
    let mine = seed_batch(&f.db, 1, 10, 2);
    let theirs = seed_batch(&f.db, 2, 11, 1);
    for id in mine.iter().chain(theirs.iter()) {
        f.engine.append(&maker(), *id, LedgerAction::Manufactured, "Plant").unwrap();
    }

    let filter = LedgerFilter {
        manufacturer_id: Some(10),
        batch_id: None,
    };
    let records = f.engine.list(&filter).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.batch_id == 1));
    assert_eq!(records[0].serial_code, "BATCH-20260112-0001-0001");

    let groups = f.engine.list_grouped(&LedgerFilter::default()).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].batch_number, "BATCH-20260112-0002");
    assert_eq!(groups[1].entries.len(), 1);

    let foreign = LedgerFilter {
        manufacturer_id: Some(10),
        batch_id: Some(2),
    };
    assert!(f.engine.list(&foreign).unwrap().is_empty());
}

#[test]
fn test_concurrent_appends_never_fork() {
    let f = fixture();
    let id = seed_batch(&f.db, 1, 10, 1)[0];
    let engine = Arc::new(f.engine);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..5 {
                    engine.append(&maker(), id, LedgerAction::Stored, "Shelf").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entries = engine.entries(id).unwrap();
    assert_eq!(entries.len(), 40);
    assert!(engine.verify_chain(id).unwrap().valid);
}
