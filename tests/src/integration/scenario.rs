//! # End-to-End Scenario
//!
//! One batch, `BATCH-20260112-0001`, through its whole life: production,
//! public verification, distribution, sale, duplicate detection and recall.

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use pas_03_ledger_chain::LedgerChainApi;
    use pas_04_batch_lifecycle::{AlertFilter, BatchLifecycleApi, ShipmentRequest};
    use pas_05_verification::{ScanContext, VerificationApi};
    use shared_store::ReadAccess;
    use shared_types::{
        AlertKind, BatchStatus, LedgerAction, ScanResult, ShipmentStatus, UnitStatus, GENESIS_HASH,
    };

    use crate::fixtures::{admin, buyer, maker, qr_payload, shop, Stack};

    #[test]
    fn test_batch_scenario() {
        let stack = Stack::in_memory();
        let product = stack.register_product("Sparkling Water 500ml");

        // Production
        let summary = stack.create_batch(product, 3);
        assert_eq!(summary.batch_number, "BATCH-20260112-0001");
        assert_eq!(summary.total_items, 3);

        let units = stack.units(summary.batch_id);
        let serials: Vec<_> = units.iter().map(|u| u.serial_code.clone()).collect();
        assert_eq!(
            serials,
            [
                "BATCH-20260112-0001-0001",
                "BATCH-20260112-0001-0002",
                "BATCH-20260112-0001-0003"
            ]
        );
        for unit in &units {
            let entries = stack.ledger.entries(unit.item_id).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].action, LedgerAction::Manufactured);
            assert_eq!(entries[0].previous_hash, GENESIS_HASH);
        }

        // Batch code
        let report = stack.verification.verify(
            "BATCH-20260112-0001",
            None,
            &ScanContext::anonymous(Some("Market".into())),
        );
        assert!(report.verified);
        assert!(report.is_batch);
        assert_eq!(report.batch.as_ref().unwrap().total_items, 3);

        // Unit code
        let report = stack.verification.verify(
            "BATCH-20260112-0001-0002",
            None,
            &ScanContext::anonymous(None),
        );
        assert!(report.verified);
        assert!(!report.is_batch);
        assert_eq!(report.blockchain_history.len(), 1);

        // Recall
        let outcome = stack
            .lifecycle
            .recall(&maker(), summary.batch_id, "Contaminated seal")
            .unwrap();
        assert_eq!(outcome.units_recalled, 3);
        assert_eq!(outcome.alert.kind, AlertKind::ProductRecall);

        for unit in stack.units(summary.batch_id) {
            assert_eq!(unit.status, UnitStatus::Recalled);
            let entries = stack.ledger.entries(unit.item_id).unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[1].action, LedgerAction::Recalled);
            assert_eq!(entries[1].previous_hash, entries[0].current_hash);
            assert!(stack.ledger.verify_chain(unit.item_id).unwrap().valid);
        }

        let report = stack.verification.verify(
            "BATCH-20260112-0001",
            None,
            &ScanContext::anonymous(None),
        );
        let batch = report.batch.as_ref().unwrap();
        assert!(batch.is_recalled);
        assert_eq!(batch.status_counts.recalled, 3);
    }

    #[test]
    fn test_distribution_sale_and_duplicate_scan() {
        let stack = Stack::in_memory();
        let product = stack.register_product("Sparkling Water 500ml");
        let summary = stack.create_batch(product, 2);
        let units = stack.units(summary.batch_id);
        let ids: Vec<_> = units.iter().map(|u| u.item_id).collect();

        let shipment = stack
            .lifecycle
            .create_shipment(
                &maker(),
                ShipmentRequest {
                    item_ids: ids.clone(),
                    retailer_id: shop().id,
                    destination: "Corner Shop, High St".into(),
                    location: None,
                },
            )
            .unwrap();
        stack.clock.advance(Duration::hours(6));
        let shipment = stack
            .lifecycle
            .confirm_shipment(&shop(), shipment.shipment_id, None)
            .unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Delivered);

        stack.lifecycle.store_units(&shop(), &ids, "Aisle 3").unwrap();
        stack.lifecycle.record_sale(&shop(), &ids[..1], "Till 1").unwrap();

        // The buyer checks their purchase, then a copy surfaces elsewhere.
        let payload = qr_payload(&units[0]);
        stack.clock.advance(Duration::minutes(10));
        let first = stack
            .verification
            .verify(&payload, None, &ScanContext::for_actor(&buyer(50), None));
        assert_eq!(first.scan_result, ScanResult::Valid);
        assert_eq!(first.blockchain_history.len(), 5);
        assert_eq!(
            first.unit.as_ref().unwrap().current_retailer.as_ref().unwrap().name,
            "Corner Shop"
        );

        stack.clock.advance(Duration::hours(3));
        let copy = stack
            .verification
            .verify(&payload, None, &ScanContext::for_actor(&buyer(77), None));
        assert!(!copy.verified);
        assert_eq!(copy.scan_result, ScanResult::Duplicate);

        let alerts = stack
            .lifecycle
            .risk_alerts(&admin(), &AlertFilter::default())
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::DuplicateScan);

        // One unit sold, one still on the shelf.
        let summary = stack.lifecycle.batch_summary(&maker(), summary.batch_id).unwrap();
        assert_eq!(summary.status, BatchStatus::Active);
        assert_eq!(summary.status_counts.sold, 1);
        assert_eq!(summary.status_counts.in_inventory, 1);

        stack.lifecycle.record_sale(&shop(), &ids[1..], "Till 2").unwrap();
        let summary = stack.lifecycle.batch_summary(&maker(), summary.batch_id).unwrap();
        assert_eq!(summary.status, BatchStatus::Completed);
    }

    #[test]
    fn test_forged_qr_is_fake_and_audited() {
        let stack = Stack::in_memory();
        let product = stack.register_product("Sparkling Water 500ml");
        let summary = stack.create_batch(product, 1);
        let unit = stack.units(summary.batch_id).remove(0);

        let forged = format!("{}#{}", unit.serial_code, "0".repeat(64));
        let report = stack
            .verification
            .verify(&forged, None, &ScanContext::anonymous(None));
        assert!(!report.verified);
        assert_eq!(report.scan_result, ScanResult::Fake);

        let scans = stack.db.scans_for_unit(unit.item_id).unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].scan_result, ScanResult::Fake);

        let alerts = stack
            .lifecycle
            .risk_alerts(
                &admin(),
                &AlertFilter {
                    kind: Some(AlertKind::CounterfeitSuspected),
                    ..AlertFilter::default()
                },
            )
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].item_id, Some(unit.item_id));

        // The genuine label still verifies.
        let genuine = stack
            .verification
            .verify(&qr_payload(&unit), None, &ScanContext::anonymous(None));
        assert!(genuine.verified);
    }
}
