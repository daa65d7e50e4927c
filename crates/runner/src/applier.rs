//! Turns `UpdateRequired` decisions into remote writes.

use std::time::Duration;

use futures_util::future::join_all;

use shopsync_reconcile::{StockCorrection, SyncOutcome};
use shopsync_shopify::gql::{join_user_errors, QuantityChange, UserError};
use shopsync_shopify::{with_retry, CatalogClient, RetryPolicy, TransportError};

/// The remote API caps a single set-quantities mutation at 50 changes.
const BULK_WRITE_CAP: usize = 50;

/// How a batch of corrections is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// One single-change mutation per SKU, issued concurrently within a batch.
    PerItem,
    /// One multi-change mutation for the whole batch.
    BulkMutation,
}

/// Applier tuning knobs.
#[derive(Debug, Clone)]
pub struct ApplierConfig {
    pub batch_size: usize,
    /// Blind pacing delay between batches.
    pub batch_delay: Duration,
    pub strategy: WriteStrategy,
    pub retry: RetryPolicy,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_secs(2),
            strategy: WriteStrategy::PerItem,
            retry: RetryPolicy::default(),
        }
    }
}

/// Issues stock-correction writes to the target catalog in bounded batches
/// and classifies each outcome.
pub struct CorrectionApplier {
    client: CatalogClient,
    config: ApplierConfig,
}

impl CorrectionApplier {
    pub fn new(client: CatalogClient, config: ApplierConfig) -> Self {
        Self { client, config }
    }

    /// Apply every correction, one outcome per correction, in input order.
    ///
    /// Each batch settles fully before the next one starts; a fixed delay
    /// between batches keeps the write rate under the remote's limit.
    pub async fn apply(&self, corrections: &[StockCorrection]) -> Vec<SyncOutcome> {
        let batch_size = match self.config.strategy {
            WriteStrategy::PerItem => self.config.batch_size.max(1),
            WriteStrategy::BulkMutation => self.config.batch_size.clamp(1, BULK_WRITE_CAP),
        };
        let total_batches = corrections.len().div_ceil(batch_size);
        let mut outcomes = Vec::with_capacity(corrections.len());

        for (index, batch) in corrections.chunks(batch_size).enumerate() {
            tracing::info!(
                store = %self.client.store(),
                batch = index + 1,
                total_batches,
                size = batch.len(),
                "applying correction batch"
            );

            match self.config.strategy {
                WriteStrategy::PerItem => {
                    let settled = join_all(batch.iter().map(|c| self.apply_one(c))).await;
                    outcomes.extend(settled);
                }
                WriteStrategy::BulkMutation => {
                    outcomes.extend(self.apply_bulk(batch).await);
                }
            }

            if index + 1 < total_batches {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        outcomes
    }

    /// Write a single correction as an absolute quantity.
    ///
    /// Transport failures go through the shared retry combinator; embedded
    /// user errors are definitive rejections and are never retried.
    async fn apply_one(&self, correction: &StockCorrection) -> SyncOutcome {
        let changes = [QuantityChange {
            inventory_item_id: correction.inventory_item_id.clone(),
            location_id: correction.location_id.clone(),
            quantity: correction.to_quantity,
        }];

        match with_retry(self.config.retry, || {
            self.client.set_available_quantities(&changes)
        })
        .await
        {
            Ok(errors) if errors.is_empty() => {
                tracing::info!(
                    sku = %correction.sku,
                    from = correction.from_quantity,
                    to = correction.to_quantity,
                    "updated inventory"
                );
                SyncOutcome::Updated(correction.clone())
            }
            Ok(errors) => {
                SyncOutcome::failed(correction.sku.clone(), join_user_errors(&errors))
            }
            Err(err) => self.transport_failure(correction, &err),
        }
    }

    /// Write a whole batch in one multi-change mutation.
    ///
    /// User errors carrying an index in their field path fail only that
    /// change; errors without one cannot be attributed and fail the whole
    /// batch.
    async fn apply_bulk(&self, batch: &[StockCorrection]) -> Vec<SyncOutcome> {
        let changes: Vec<QuantityChange> = batch
            .iter()
            .map(|c| QuantityChange {
                inventory_item_id: c.inventory_item_id.clone(),
                location_id: c.location_id.clone(),
                quantity: c.to_quantity,
            })
            .collect();

        let errors = match with_retry(self.config.retry, || {
            self.client.set_available_quantities(&changes)
        })
        .await
        {
            Ok(errors) => errors,
            Err(err) => {
                return batch
                    .iter()
                    .map(|c| self.transport_failure(c, &err))
                    .collect();
            }
        };

        if errors.is_empty() {
            return batch
                .iter()
                .map(|c| SyncOutcome::Updated(c.clone()))
                .collect();
        }

        let unattributed: Vec<UserError> = errors
            .iter()
            .filter(|e| e.change_index().is_none())
            .cloned()
            .collect();
        if !unattributed.is_empty() {
            let reason = join_user_errors(&errors);
            return batch
                .iter()
                .map(|c| SyncOutcome::failed(c.sku.clone(), reason.clone()))
                .collect();
        }

        batch
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mine: Vec<UserError> = errors
                    .iter()
                    .filter(|e| e.change_index() == Some(i))
                    .cloned()
                    .collect();
                if mine.is_empty() {
                    SyncOutcome::Updated(c.clone())
                } else {
                    SyncOutcome::failed(c.sku.clone(), join_user_errors(&mine))
                }
            })
            .collect()
    }

    fn transport_failure(&self, correction: &StockCorrection, err: &TransportError) -> SyncOutcome {
        tracing::error!(sku = %correction.sku, error = %err, "inventory write failed");
        SyncOutcome::failed(correction.sku.clone(), err.to_string())
    }
}
