//! The reconciliation engine: pure decision logic, no I/O.

use shopsync_core::{LocationPolicy, StockRecord, Sku};

use crate::decision::{ReconciliationDecision, StockCorrection};

/// Decide what (if anything) must change in the target store so that this
/// SKU's stock matches the source store.
///
/// The comparison is strictly by quantity equality: no tolerance band, no
/// negative-quantity clamping. The write target is always the policy's
/// authoritative location, never inferred from the source store (the two
/// stores have unrelated location identifier spaces).
pub fn decide(
    sku: &Sku,
    source: Option<&StockRecord>,
    target: Option<&StockRecord>,
    policy: &LocationPolicy,
) -> ReconciliationDecision {
    let Some(source) = source else {
        return ReconciliationDecision::SourceMissing { sku: sku.clone() };
    };

    let Some((_, source_qty)) = source.first_available() else {
        return ReconciliationDecision::SourceNoStock { sku: sku.clone() };
    };

    let Some(target) = target else {
        return ReconciliationDecision::TargetMissing {
            sku: sku.clone(),
            source_quantity: source_qty,
        };
    };

    let expected = &policy.authoritative_location_id;
    let Some(target_qty) = target.available_at(expected) else {
        // Also covers a target record with zero location entries: "not present
        // at the configured location" is the same mismatch, just with no other
        // location to report as `actual`.
        return ReconciliationDecision::LocationMismatch {
            sku: sku.clone(),
            expected: expected.clone(),
            actual: target.first_location().cloned(),
        };
    };

    if source_qty == target_qty {
        return ReconciliationDecision::NoActionNeeded {
            sku: sku.clone(),
            quantity: source_qty,
        };
    }

    ReconciliationDecision::UpdateRequired(StockCorrection {
        sku: sku.clone(),
        inventory_item_id: target.inventory_item_id.clone(),
        location_id: expected.clone(),
        from_quantity: target_qty,
        to_quantity: source_qty,
    })
}
