//! # Tamper Detection
//!
//! Edits stored ledger rows directly, bypassing the services, and checks
//! that chain verification pins the first untrustworthy entry.

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use pas_03_ledger_chain::LedgerChainApi;
    use pas_04_batch_lifecycle::{BatchLifecycleApi, ShipmentRequest};
    use shared_store::KeyPrefix;
    use shared_types::{ItemId, LedgerAction, LedgerEntry, Role};

    use crate::fixtures::{maker, shop, Stack};

    /// One unit with a four-entry chain: Manufactured, Shipped, Received, Stored.
    fn four_entry_chain(stack: &Stack) -> ItemId {
        let product = stack.register_product("Cold Brew");
        let summary = stack.create_batch(product, 1);
        let item_id = stack.units(summary.batch_id)[0].item_id;

        let shipment = stack
            .lifecycle
            .create_shipment(
                &maker(),
                ShipmentRequest {
                    item_ids: vec![item_id],
                    retailer_id: shop().id,
                    destination: "Corner Shop".into(),
                    location: None,
                },
            )
            .unwrap();
        stack.clock.advance(Duration::hours(4));
        stack
            .lifecycle
            .confirm_shipment(&shop(), shipment.shipment_id, None)
            .unwrap();
        stack.lifecycle.store_units(&shop(), &[item_id], "Aisle 3").unwrap();
        assert_eq!(stack.ledger.entries(item_id).unwrap().len(), 4);
        item_id
    }

    fn overwrite(stack: &Stack, entry: &LedgerEntry) {
        let mut txn = stack.db.begin();
        txn.put_raw(
            KeyPrefix::ledger_key(entry.item_id, entry.sequence),
            bincode::serialize(entry).unwrap(),
        );
        txn.commit().unwrap();
    }

    #[test]
    fn test_any_field_edit_breaks_chain_at_that_entry() {
        let mutations: Vec<(&str, fn(&mut LedgerEntry))> = vec![
            ("action", |e| e.action = LedgerAction::Recalled),
            ("actor_id", |e| e.actor_id += 1),
            ("actor_name", |e| e.actor_name.push('x')),
            ("actor_role", |e| e.actor_role = Role::Admin),
            ("location", |e| e.location = "Elsewhere".into()),
            ("previous_hash", |e| e.previous_hash = "f".repeat(64)),
            ("current_hash", |e| e.current_hash = "e".repeat(64)),
            ("created_at", |e| e.created_at = e.created_at + Duration::seconds(1)),
            ("sequence", |e| e.sequence = 7),
            ("item_id", |e| e.item_id += 1_000),
        ];

        for (field, mutate) in mutations {
            let stack = Stack::in_memory();
            let item_id = four_entry_chain(&stack);
            assert!(stack.ledger.verify_chain(item_id).unwrap().valid);

            let original = stack.ledger.entries(item_id).unwrap().remove(1);
            let mut forged = original.clone();
            mutate(&mut forged);
            // The forged row replaces the original under its old key.
            let mut txn = stack.db.begin();
            txn.put_raw(
                KeyPrefix::ledger_key(item_id, original.sequence),
                bincode::serialize(&forged).unwrap(),
            );
            txn.commit().unwrap();

            let result = stack.ledger.verify_chain(item_id).unwrap();
            assert!(!result.valid, "edit of {} went unnoticed", field);
            assert_eq!(result.broken_at, Some(original.entry_id), "field {}", field);
            assert!(result.reason.is_some());
        }
    }

    #[test]
    fn test_rehashed_edit_is_caught_by_successor() {
        let stack = Stack::in_memory();
        let item_id = four_entry_chain(&stack);
        let entries = stack.ledger.entries(item_id).unwrap();

        // A careful forger recomputes the edited entry's own hash.
        let mut forged = entries[1].clone();
        forged.location = "Elsewhere".into();
        forged.current_hash = pas_03_ledger_chain::compute_entry_hash(&forged);
        overwrite(&stack, &forged);

        let result = stack.ledger.verify_chain(item_id).unwrap();
        assert!(!result.valid);
        assert_eq!(result.broken_at, Some(entries[2].entry_id));
    }

    #[test]
    fn test_batch_audit_counts_broken_units() {
        let stack = Stack::in_memory();
        let product = stack.register_product("Cold Brew");
        let summary = stack.create_batch(product, 3);
        let units = stack.units(summary.batch_id);

        let mut entry = stack.ledger.entries(units[2].item_id).unwrap().remove(0);
        entry.actor_name = "Someone Else".into();
        overwrite(&stack, &entry);

        let audit = stack.ledger.verify_batch(summary.batch_id).unwrap();
        assert_eq!(audit.units_checked, 3);
        assert_eq!(audit.valid_units, 2);
        assert_eq!(audit.broken_units, 1);
        assert!(!audit.is_intact());
        let broken = audit.results.iter().find(|r| !r.valid).unwrap();
        assert_eq!(broken.item_id, units[2].item_id);
    }
}
