//! # Atomicity
//!
//! A failed operation leaves storage exactly as it found it, including
//! after the file-backed store is reopened.

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use pas_01_serial_generator::SerialError;
    use pas_03_ledger_chain::LedgerChainApi;
    use pas_04_batch_lifecycle::{AlertFilter, BatchLifecycleApi, LifecycleError, ShipmentRequest};
    use shared_store::{KeyPrefix, ReadAccess};
    use shared_types::{ProductUnit, Role, UnitStatus, GENESIS_HASH};

    use crate::fixtures::{admin, maker, shop, today, Stack};

    /// Occupy a serial the next batch of the day will generate.
    fn squat_serial(stack: &Stack, serial_code: &str) {
        let mut txn = stack.db.begin();
        txn.insert_unit(&ProductUnit {
            item_id: 9_000,
            batch_id: 9_000,
            sequence: 2,
            serial_code: serial_code.into(),
            nonce: String::new(),
            auth_hash: String::new(),
            status: UnitStatus::Manufactured,
            holder_id: 99,
            holder_name: "Squatter".into(),
            holder_role: Role::Manufacturer,
            chain_length: 0,
            head_hash: GENESIS_HASH.into(),
            created_at: Utc::now(),
        })
        .unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn test_failed_batch_leaves_no_rows_on_disk() {
        let dir = tempfile::tempdir().unwrap();

        {
            let stack = Stack::on_file(dir.path());
            let product = stack.register_product("Cold Brew");
            squat_serial(&stack, "BATCH-20260112-0001-0002");

            let err = stack
                .lifecycle
                .create_batch(
                    &maker(),
                    pas_04_batch_lifecycle::ProductionRequest {
                        product_def_id: product,
                        quantity: 3,
                        manufacturing_date: Some(today()),
                        expiry_date: None,
                        location: None,
                    },
                )
                .unwrap_err();
            assert!(matches!(err, LifecycleError::Serial(SerialError::DuplicateSerial(_))));
        }

        let stack = Stack::on_file(dir.path());
        assert!(stack.db.batches().unwrap().is_empty());
        assert!(stack.db.batch_by_number("BATCH-20260112-0001").unwrap().is_none());
        assert!(stack.db.unit_by_serial("BATCH-20260112-0001-0001").unwrap().is_none());
        assert_eq!(stack.db.batch_counter(today()).unwrap(), 0);
        assert!(stack.db.scan_raw(KeyPrefix::Ledger.as_bytes()).unwrap().is_empty());
        assert!(stack.db.scan_raw(KeyPrefix::BatchUnitIndex.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_mixed_shipment_is_all_or_nothing() {
        let stack = Stack::in_memory();
        let product = stack.register_product("Cold Brew");
        let good = stack.create_batch(product, 2);
        let recalled = stack.create_batch(product, 1);
        stack
            .lifecycle
            .recall(&maker(), recalled.batch_id, "Bad seal")
            .unwrap();

        let good_ids: Vec<_> = stack.units(good.batch_id).iter().map(|u| u.item_id).collect();
        let bad_id = stack.units(recalled.batch_id)[0].item_id;
        let mut item_ids = good_ids.clone();
        item_ids.push(bad_id);

        let err = stack
            .lifecycle
            .create_shipment(
                &maker(),
                ShipmentRequest {
                    item_ids,
                    retailer_id: shop().id,
                    destination: "Corner Shop".into(),
                    location: None,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: UnitStatus::Recalled,
                ..
            }
        ));

        for id in good_ids {
            assert_eq!(stack.unit(id).status, UnitStatus::Manufactured);
            assert_eq!(stack.ledger.entries(id).unwrap().len(), 1);
        }
        assert!(stack.db.scan_raw(KeyPrefix::Shipment.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_second_recall_changes_nothing() {
        let stack = Stack::in_memory();
        let product = stack.register_product("Cold Brew");
        let summary = stack.create_batch(product, 2);
        stack
            .lifecycle
            .recall(&maker(), summary.batch_id, "Bad seal")
            .unwrap();

        let err = stack
            .lifecycle
            .recall(&maker(), summary.batch_id, "Again")
            .unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyRecalled(_)));

        for unit in stack.units(summary.batch_id) {
            assert_eq!(stack.ledger.entries(unit.item_id).unwrap().len(), 2);
        }
        let alerts = stack
            .lifecycle
            .risk_alerts(&admin(), &AlertFilter::default())
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            stack.db.batch(summary.batch_id).unwrap().unwrap().recall_reason.as_deref(),
            Some("Bad seal")
        );
    }

    #[test]
    fn test_rejected_sale_appends_nothing() {
        let stack = Stack::in_memory();
        let product = stack.register_product("Cold Brew");
        let summary = stack.create_batch(product, 1);
        let item_id = stack.units(summary.batch_id)[0].item_id;

        let err = stack
            .lifecycle
            .record_sale(&shop(), &[item_id], "Till 1")
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
        assert_eq!(stack.ledger.entries(item_id).unwrap().len(), 1);
        assert_eq!(stack.unit(item_id).status, UnitStatus::Manufactured);
    }
}
