//! One full reconciliation pass for one retailer.

use std::collections::HashMap;

use thiserror::Error;

use shopsync_core::{LocationPolicy, Sku, StockRecord};
use shopsync_reconcile::{decide, ReconciliationDecision, SyncOutcome, SyncSummary};
use shopsync_shopify::{BulkStock, CatalogClient, TransportError};

use crate::applier::{ApplierConfig, CorrectionApplier};

/// A pass-fatal failure. Per-SKU failures never surface here; they are
/// absorbed into the summary as `Failed` outcomes.
#[derive(Debug, Error)]
pub enum PassError {
    /// The target catalog could not be listed; nothing can be reconciled.
    #[error("catalog listing failed: {0}")]
    CatalogListing(#[source] TransportError),
}

/// Drives one pass: list, fetch, decide, apply, aggregate.
pub struct SyncOrchestrator {
    source: CatalogClient,
    target: CatalogClient,
    policy: LocationPolicy,
    applier: CorrectionApplier,
}

impl SyncOrchestrator {
    pub fn new(
        source: CatalogClient,
        target: CatalogClient,
        policy: LocationPolicy,
        applier_config: ApplierConfig,
    ) -> Self {
        let applier = CorrectionApplier::new(target.clone(), applier_config);
        Self {
            source,
            target,
            policy,
            applier,
        }
    }

    /// Run one full reconciliation pass.
    ///
    /// The target store's own catalog defines the universe of SKUs: source-only
    /// SKUs are never pushed into a retailer. Exactly one outcome is recorded
    /// per listed SKU.
    pub async fn run_pass(&self) -> Result<SyncSummary, PassError> {
        let mut summary = SyncSummary::begin();

        let skus = self
            .target
            .list_all_skus()
            .await
            .map_err(PassError::CatalogListing)?;
        tracing::info!(
            target = %self.target.store(),
            total = skus.len(),
            "starting reconciliation pass"
        );

        let (source_stock, mut fetch_failures) =
            self.fetch_side(&self.source, &skus, "source").await;
        let (target_stock, target_failures) =
            self.fetch_side(&self.target, &skus, "target").await;
        for (sku, reason) in target_failures {
            fetch_failures.entry(sku).or_insert(reason);
        }

        let mut corrections = Vec::new();
        for sku in &skus {
            if let Some(reason) = fetch_failures.remove(sku) {
                summary.record(SyncOutcome::failed(sku.clone(), reason));
                continue;
            }

            let decision = decide(
                sku,
                source_stock.get(sku),
                target_stock.get(sku),
                &self.policy,
            );
            match decision {
                ReconciliationDecision::UpdateRequired(correction) => {
                    corrections.push(correction)
                }
                passthrough => summary.record(passthrough.into()),
            }
        }

        for outcome in self.applier.apply(&corrections).await {
            summary.record(outcome);
        }

        summary.finish();
        tracing::info!(
            target = %self.target.store(),
            total = summary.total,
            updated = summary.updated,
            no_update_needed = summary.no_update_needed,
            failed = summary.failed,
            "reconciliation pass complete"
        );
        Ok(summary)
    }

    /// Fetch one side's stock for the SKU set: batched first, then per-SKU
    /// fallback for whatever the batches could not resolve.
    ///
    /// Returns the merged records plus per-SKU fetch failures; a fetch failure
    /// costs that SKU only, never the pass.
    async fn fetch_side(
        &self,
        client: &CatalogClient,
        skus: &[Sku],
        side: &str,
    ) -> (HashMap<Sku, StockRecord>, HashMap<Sku, String>) {
        let BulkStock {
            mut records,
            unresolved,
        } = client.bulk_fetch_stock(skus).await;

        let mut failures = HashMap::new();
        for sku in unresolved {
            match client.fetch_stock(&sku).await {
                Ok(Some(record)) => {
                    records.insert(sku, record);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(sku = %sku, side, error = %err, "per-SKU fetch failed");
                    failures.insert(sku, format!("{side} fetch failed: {err}"));
                }
            }
        }

        (records, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use shopsync_core::LocationId;
    use shopsync_shopify::{CatalogConfig, GraphqlTransport, RetryPolicy};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::applier::WriteStrategy;

    struct FakeTransport {
        responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    }

    impl FakeTransport {
        fn new(responses: Vec<Result<Value, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl GraphqlTransport for FakeTransport {
        async fn execute(&self, _query: &str, _variables: Value) -> Result<Value, TransportError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
        }
    }

    fn sku_page(skus: &[&str]) -> Value {
        let edges: Vec<Value> = skus
            .iter()
            .map(|sku| json!({ "node": { "sku": sku }, "cursor": sku }))
            .collect();
        json!({
            "productVariants": {
                "edges": edges,
                "pageInfo": { "hasNextPage": false },
            }
        })
    }

    fn variant(sku: &str, location: &str, qty: Option<i64>) -> Value {
        let quantities = match qty {
            Some(q) => json!([{ "name": "available", "quantity": q }]),
            None => json!([]),
        };
        json!({
            "node": {
                "id": format!("gid://shop/ProductVariant/{sku}"),
                "sku": sku,
                "inventoryItem": {
                    "id": format!("gid://shop/InventoryItem/{sku}"),
                    "inventoryLevels": {
                        "edges": [{
                            "node": {
                                "location": { "id": location },
                                "quantities": quantities,
                            }
                        }]
                    }
                }
            }
        })
    }

    fn stock_page(variants: Vec<Value>) -> Value {
        json!({ "productVariants": { "edges": variants } })
    }

    fn accepted() -> Result<Value, TransportError> {
        Ok(json!({ "inventorySetQuantities": { "userErrors": [] } }))
    }

    fn fast_catalog_config() -> CatalogConfig {
        CatalogConfig {
            retry: RetryPolicy::new(1, Duration::from_millis(1)),
            page_delay: Duration::from_millis(0),
            bulk_lookup_size: 100,
            bulk_result_window: 250,
        }
    }

    fn fast_applier_config() -> ApplierConfig {
        ApplierConfig {
            batch_size: 1,
            batch_delay: Duration::from_millis(0),
            strategy: WriteStrategy::PerItem,
            retry: RetryPolicy::new(1, Duration::from_millis(1)),
        }
    }

    fn orchestrator(
        source_responses: Vec<Result<Value, TransportError>>,
        target_responses: Vec<Result<Value, TransportError>>,
    ) -> SyncOrchestrator {
        let source = CatalogClient::new(
            Arc::new(FakeTransport::new(source_responses)),
            fast_catalog_config(),
            "source-store",
        );
        let target = CatalogClient::new(
            Arc::new(FakeTransport::new(target_responses)),
            fast_catalog_config(),
            "target-store",
        );
        SyncOrchestrator::new(
            source,
            target,
            LocationPolicy::new(LocationId::from("L_target")),
            fast_applier_config(),
        )
    }

    #[tokio::test]
    async fn a_full_pass_produces_exactly_one_outcome_per_sku() {
        // Target catalog: X (needs update), W (equal), Y (wrong location),
        // Z (absent from source), N (source has no available quantity).
        let source_responses = vec![
            // bulk fetch: everything but Z; N has no available dimension.
            Ok(stock_page(vec![
                variant("X", "L_source", Some(12)),
                variant("W", "L_source", Some(7)),
                variant("Y", "L_source", Some(3)),
                variant("N", "L_source", None),
            ])),
        ];
        let target_responses = vec![
            Ok(sku_page(&["X", "W", "Y", "Z", "N"])),
            Ok(stock_page(vec![
                variant("X", "L_target", Some(5)),
                variant("W", "L_target", Some(7)),
                variant("Y", "L_other", Some(1)),
                variant("Z", "L_target", Some(1)),
                variant("N", "L_target", Some(2)),
            ])),
            // one write for X
            accepted(),
        ];

        let summary = orchestrator(source_responses, target_responses)
            .run_pass()
            .await
            .unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.bucket_sum(), summary.total);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.no_update_needed, 1);
        assert_eq!(summary.location_mismatches, 1);
        assert_eq!(summary.source_missing, 1);
        assert_eq!(summary.source_no_stock, 1);
        assert_eq!(summary.failed, 0);

        let update = &summary.updated_skus[0];
        assert_eq!(update.sku, Sku::from("X"));
        assert_eq!(update.from_quantity, 5);
        assert_eq!(update.to_quantity, 12);
        assert!(summary.finished_at.is_some());
    }

    #[tokio::test]
    async fn second_pass_after_convergence_updates_nothing() {
        let source_responses =
            vec![Ok(stock_page(vec![variant("X", "L_source", Some(12))]))];
        // Target already corrected to 12.
        let target_responses = vec![
            Ok(sku_page(&["X"])),
            Ok(stock_page(vec![variant("X", "L_target", Some(12))])),
        ];

        let summary = orchestrator(source_responses, target_responses)
            .run_pass()
            .await
            .unwrap();

        assert_eq!(summary.updated, 0);
        assert_eq!(summary.no_update_needed, 1);
    }

    #[tokio::test]
    async fn listing_failure_is_fatal_for_the_pass() {
        let target_responses = vec![
            Err(TransportError::Http {
                status: 401,
                body: "unauthorized".into(),
            }),
        ];
        let err = orchestrator(Vec::new(), target_responses)
            .run_pass()
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::CatalogListing(_)));
    }

    #[tokio::test]
    async fn unresolved_bulk_skus_fall_back_to_per_sku_fetches() {
        let source_responses = vec![
            // bulk fetch fails (initial + 1 retry) -> A and B unresolved
            Err(TransportError::Network("reset".into())),
            Err(TransportError::Network("reset".into())),
            // per-SKU fallback: A resolves, B keeps timing out
            Ok(stock_page(vec![variant("A", "L_source", Some(4))])),
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
        ];
        let target_responses = vec![
            Ok(sku_page(&["A", "B"])),
            Ok(stock_page(vec![
                variant("A", "L_target", Some(4)),
                variant("B", "L_target", Some(1)),
            ])),
        ];

        let summary = orchestrator(source_responses, target_responses)
            .run_pass()
            .await
            .unwrap();

        // A reconciled normally; B's fetch failure costs B only.
        assert_eq!(summary.total, 2);
        assert_eq!(summary.no_update_needed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failed_skus[0].0, Sku::from("B"));
        assert!(summary.failed_skus[0].1.contains("source fetch failed"));
    }

    #[tokio::test]
    async fn write_rejection_is_a_failed_outcome_not_a_pass_failure() {
        let source_responses =
            vec![Ok(stock_page(vec![variant("V", "L_source", Some(3))]))];
        let target_responses = vec![
            Ok(sku_page(&["V"])),
            Ok(stock_page(vec![variant("V", "L_target", Some(0))])),
            Ok(json!({
                "inventorySetQuantities": {
                    "userErrors": [
                        { "field": ["input", "quantities", "0"], "message": "location not active" }
                    ]
                }
            })),
        ];

        let summary = orchestrator(source_responses, target_responses)
            .run_pass()
            .await
            .unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.failed_skus[0].1, "location not active");
    }
}
