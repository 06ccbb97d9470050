//! # Unit State Machine
//!
//! | From | Action | To |
//! |------|--------|----|
//! | Manufactured, In_Inventory | Shipped | In_Transit |
//! | In_Transit | Received | In_Inventory |
//! | In_Inventory | Stored | In_Inventory |
//! | In_Inventory | Sold | Sold |
//! | any non-terminal | Recalled | Recalled |
//!
//! `Manufactured` is only ever recorded by batch creation.

use super::errors::LifecycleError;
use shared_types::{ItemId, LedgerAction, UnitStatus};

pub fn is_allowed(from: UnitStatus, action: LedgerAction) -> bool {
    use LedgerAction as A;
    use UnitStatus as S;

    match (from, action) {
        (S::Manufactured | S::InInventory, A::Shipped) => true,
        (S::InTransit, A::Received) => true,
        (S::InInventory, A::Stored | A::Sold) => true,
        (status, A::Recalled) => !status.is_terminal(),
        _ => false,
    }
}

pub fn check_transition(
    item_id: ItemId,
    from: UnitStatus,
    action: LedgerAction,
) -> Result<(), LifecycleError> {
    if is_allowed(from, action) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            item_id,
            from,
            action,
        })
    }
}
