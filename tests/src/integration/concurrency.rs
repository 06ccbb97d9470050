//! # Concurrency
//!
//! Row locks serialize writers per unit, batch and day. These tests race
//! real threads against one shared database.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use pas_03_ledger_chain::LedgerChainApi;
    use pas_04_batch_lifecycle::{BatchLifecycleApi, LifecycleError, ShipmentRequest};
    use pas_05_verification::{ScanContext, VerificationApi};
    use shared_store::{KeyPrefix, ReadAccess, RowLock};
    use shared_types::{ItemId, LedgerAction, UnitStatus, GENESIS_HASH};

    use crate::fixtures::{buyer, maker, shop, Stack};

    const THREADS: usize = 8;

    /// Ship, receive and shelve `ids` at the shop.
    fn stock_shop(stack: &Stack, ids: &[ItemId]) {
        let shipment = stack
            .lifecycle
            .create_shipment(
                &maker(),
                ShipmentRequest {
                    item_ids: ids.to_vec(),
                    retailer_id: shop().id,
                    destination: "Corner Shop".into(),
                    location: None,
                },
            )
            .unwrap();
        stack
            .lifecycle
            .confirm_shipment(&shop(), shipment.shipment_id, None)
            .unwrap();
        stack.lifecycle.store_units(&shop(), ids, "Aisle 3").unwrap();
    }

    #[test]
    fn test_concurrent_appends_never_fork_the_chain() {
        const PER_THREAD: usize = 20;

        let stack = Stack::in_memory();
        let product = stack.register_product("Cold Brew");
        let summary = stack.create_batch(product, 1);
        let item_id = stack.units(summary.batch_id)[0].item_id;

        let barrier = Barrier::new(THREADS);
        thread::scope(|s| {
            for t in 0..THREADS {
                let stack = &stack;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    for i in 0..PER_THREAD {
                        stack
                            .ledger
                            .append(
                                &shop(),
                                item_id,
                                LedgerAction::Stored,
                                &format!("Shelf {}-{}", t, i),
                            )
                            .unwrap();
                    }
                });
            }
        });

        let entries = stack.ledger.entries(item_id).unwrap();
        assert_eq!(entries.len(), 1 + THREADS * PER_THREAD);
        assert_eq!(entries[0].previous_hash, GENESIS_HASH);
        for (i, pair) in entries.windows(2).enumerate() {
            assert_eq!(pair[0].sequence, i as u64 + 1);
            assert_eq!(pair[1].sequence, pair[0].sequence + 1);
            assert_eq!(pair[1].previous_hash, pair[0].current_hash);
        }

        let previous: HashSet<_> = entries.iter().map(|e| e.previous_hash.clone()).collect();
        assert_eq!(previous.len(), entries.len(), "two entries share a predecessor");

        let verification = stack.ledger.verify_chain(item_id).unwrap();
        assert!(verification.valid);
        assert_eq!(verification.entries_checked, entries.len() as u64);

        let unit = stack.unit(item_id);
        assert_eq!(unit.chain_length, entries.len() as u64);
        assert_eq!(unit.head_hash, entries.last().unwrap().current_hash);
    }

    #[test]
    fn test_unit_is_sold_exactly_once() {
        let stack = Stack::in_memory();
        let product = stack.register_product("Cold Brew");
        let summary = stack.create_batch(product, 1);
        let item_id = stack.units(summary.batch_id)[0].item_id;
        stock_shop(&stack, &[item_id]);

        let barrier = Barrier::new(THREADS);
        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let stack = &stack;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        stack
                            .lifecycle
                            .record_sale(&shop(), &[item_id], &format!("Till {}", t))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.into_iter().filter_map(Result::err) {
            assert!(
                matches!(
                    err,
                    LifecycleError::InvalidTransition {
                        from: UnitStatus::Sold,
                        action: LedgerAction::Sold,
                        ..
                    }
                ),
                "unexpected error: {}",
                err
            );
        }

        let sold: Vec<_> = stack
            .ledger
            .entries(item_id)
            .unwrap()
            .into_iter()
            .filter(|e| e.action == LedgerAction::Sold)
            .collect();
        assert_eq!(sold.len(), 1);
        assert_eq!(stack.unit(item_id).status, UnitStatus::Sold);
    }

    #[test]
    fn test_concurrent_batches_get_distinct_numbers() {
        const QUANTITY: u32 = 5;

        let stack = Stack::in_memory();
        let product = stack.register_product("Cold Brew");

        let barrier = Barrier::new(THREADS);
        let numbers: Vec<String> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let stack = &stack;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        stack.create_batch(product, QUANTITY).batch_number
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut sorted = numbers.clone();
        sorted.sort();
        let expected: Vec<_> = (1..=THREADS)
            .map(|n| format!("BATCH-20260112-{:04}", n))
            .collect();
        assert_eq!(sorted, expected);

        let mut serials = HashSet::new();
        for batch in stack.db.batches().unwrap() {
            let units = stack.units(batch.batch_id);
            assert_eq!(units.len(), QUANTITY as usize);
            for unit in units {
                assert!(unit.serial_code.starts_with(&batch.batch_number));
                assert!(serials.insert(unit.serial_code));
            }
        }
        assert_eq!(serials.len(), THREADS * QUANTITY as usize);
    }

    #[test]
    fn test_concurrent_scans_each_recorded_once() {
        const PER_THREAD: usize = 10;

        let stack = Stack::in_memory();
        let product = stack.register_product("Cold Brew");
        let summary = stack.create_batch(product, 1);
        let unit = stack.units(summary.batch_id).remove(0);

        thread::scope(|s| {
            for t in 0..THREADS {
                let stack = &stack;
                let serial = unit.serial_code.as_str();
                s.spawn(move || {
                    let context = ScanContext::for_actor(&buyer(100 + t as u64), None);
                    for _ in 0..PER_THREAD {
                        assert!(stack.verification.verify(serial, None, &context).verified);
                    }
                });
            }
        });

        let scans = stack.db.scans_for_unit(unit.item_id).unwrap();
        assert_eq!(scans.len(), THREADS * PER_THREAD);
        let ids: HashSet<_> = scans.iter().map(|s| s.scan_id).collect();
        assert_eq!(ids.len(), scans.len());
        assert_eq!(
            stack.db.scan_raw(KeyPrefix::Scan.as_bytes()).unwrap().len(),
            THREADS * PER_THREAD
        );
    }

    #[test]
    fn test_lock_timeout_is_transient_and_writes_nothing() {
        let stack = Stack::with_lock_timeout(Duration::from_millis(50));
        let product = stack.register_product("Cold Brew");
        let summary = stack.create_batch(product, 1);
        let item_id = stack.units(summary.batch_id)[0].item_id;
        stock_shop(&stack, &[item_id]);
        let before = stack.ledger.entries(item_id).unwrap().len();

        let mut blocker = stack.db.begin();
        blocker.lock(RowLock::Unit(item_id)).unwrap();

        let err = stack
            .lifecycle
            .record_sale(&shop(), &[item_id], "Till 1")
            .unwrap_err();
        assert!(err.is_transient(), "expected a transient error, got {}", err);
        assert_eq!(stack.ledger.entries(item_id).unwrap().len(), before);

        drop(blocker);
        stack.lifecycle.record_sale(&shop(), &[item_id], "Till 1").unwrap();
        assert_eq!(stack.unit(item_id).status, UnitStatus::Sold);
    }
}
