//! Remote catalog accessor: listing, stock lookups, and the stock write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use shopsync_core::{Sku, StockRecord};

use crate::gql::{
    self, join_user_errors, parse_field, QuantityChange, SkuNode, UserError, VariantConnection,
    VariantNode,
};
use crate::retry::{with_retry, RetryPolicy};
use crate::transport::{GraphqlTransport, TransportError};

/// Maximum SKUs folded into one batched lookup query.
const BULK_LOOKUP_SIZE: usize = 100;

/// Result window requested per batched lookup (the remote caps pages at 250).
/// Kept well above the batch size so an over-matching search query cannot
/// push a requested SKU out of the response.
const BULK_RESULT_WINDOW: usize = 250;

/// Accessor tuning knobs.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub retry: RetryPolicy,
    /// Pause between listing pages.
    pub page_delay: Duration,
    pub bulk_lookup_size: usize,
    /// Result window requested per batched lookup.
    pub bulk_result_window: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            page_delay: Duration::from_millis(500),
            bulk_lookup_size: BULK_LOOKUP_SIZE,
            bulk_result_window: BULK_RESULT_WINDOW,
        }
    }
}

/// Result of a batched stock lookup.
///
/// `unresolved` names SKUs whose batch failed outright after retries; the
/// caller falls back to per-SKU lookups for those. SKUs simply absent from
/// the store are not unresolved — they are legitimately missing.
#[derive(Debug, Default)]
pub struct BulkStock {
    pub records: HashMap<Sku, StockRecord>,
    pub unresolved: Vec<Sku>,
}

/// SKU-indexed view of one store's catalog.
///
/// Cloneable handle; clones share the underlying transport (and therefore the
/// store's pacing state).
#[derive(Clone)]
pub struct CatalogClient {
    transport: Arc<dyn GraphqlTransport>,
    config: CatalogConfig,
    /// Store label for log lines only.
    store: String,
}

impl CatalogClient {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        config: CatalogConfig,
        store: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            config,
            store: store.into(),
        }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    /// List every SKU in the store's catalog.
    ///
    /// Pages through the variant list until the remote reports no further
    /// pages. Blank SKUs are filtered out. A page failure (after transport
    /// retries) aborts the whole listing; the listing is not restartable
    /// mid-pagination.
    pub async fn list_all_skus(&self) -> Result<Vec<Sku>, TransportError> {
        let mut skus = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0u32;

        loop {
            page += 1;
            let variables = json!({ "after": cursor });
            let data = with_retry(self.config.retry, || {
                self.transport
                    .execute(gql::SKU_PAGE_QUERY, variables.clone())
            })
            .await?;

            let connection: VariantConnection<SkuNode> = parse_field(&data, "productVariants")?;
            let fetched = connection.edges.len();

            cursor = connection
                .edges
                .last()
                .and_then(|edge| edge.cursor.clone());
            for edge in connection.edges {
                if let Some(sku) = edge.node.sku {
                    let sku = Sku::new(sku);
                    if !sku.is_blank() {
                        skus.push(sku);
                    }
                }
            }

            tracing::debug!(
                store = %self.store,
                page,
                fetched,
                total = skus.len(),
                "fetched SKU page"
            );

            let has_next_page = connection
                .page_info
                .map(|info| info.has_next_page)
                .unwrap_or(false);
            if !has_next_page {
                break;
            }
            tokio::time::sleep(self.config.page_delay).await;
        }

        tracing::info!(store = %self.store, total = skus.len(), "completed SKU listing");
        Ok(skus)
    }

    /// Fetch one SKU's stock snapshot.
    ///
    /// `Ok(None)` when the SKU does not exist in this store's catalog or the
    /// response lacks the nested fields a usable record needs (warn-logged);
    /// errors are transport-level only.
    pub async fn fetch_stock(&self, sku: &Sku) -> Result<Option<StockRecord>, TransportError> {
        let variables = json!({ "first": 1, "query": format!("sku:{sku}") });
        let data = with_retry(self.config.retry, || {
            self.transport
                .execute(gql::VARIANT_STOCK_QUERY, variables.clone())
        })
        .await?;

        let connection: VariantConnection<VariantNode> = match parse_field(&data, "productVariants")
        {
            Ok(connection) => connection,
            Err(err) => {
                tracing::warn!(store = %self.store, sku = %sku, error = %err,
                    "malformed stock response, treating SKU as absent");
                return Ok(None);
            }
        };

        Ok(connection
            .edges
            .into_iter()
            .next()
            .and_then(|edge| edge.node.into_stock_record()))
    }

    /// Fetch stock for many SKUs, batched into OR-joined search queries.
    ///
    /// Batches that fail after retries mark their SKUs unresolved rather than
    /// silently dropping them. The result window is requested with headroom
    /// over the batch size; if it still comes back full, any requested SKU
    /// absent from it is marked unresolved too, since the window may have
    /// truncated it away.
    pub async fn bulk_fetch_stock(&self, skus: &[Sku]) -> BulkStock {
        let mut result = BulkStock::default();

        for chunk in skus.chunks(self.config.bulk_lookup_size.max(1)) {
            let query = chunk
                .iter()
                .map(|sku| format!("sku:{sku}"))
                .collect::<Vec<_>>()
                .join(" OR ");
            let window = self.config.bulk_result_window.max(chunk.len());
            let variables = json!({ "first": window, "query": query });

            let data = match with_retry(self.config.retry, || {
                self.transport
                    .execute(gql::VARIANT_STOCK_QUERY, variables.clone())
            })
            .await
            {
                Ok(data) => data,
                Err(err) => {
                    tracing::warn!(store = %self.store, batch = chunk.len(), error = %err,
                        "bulk stock lookup failed, marking batch unresolved");
                    result.unresolved.extend(chunk.iter().cloned());
                    continue;
                }
            };

            let connection: VariantConnection<VariantNode> =
                match parse_field(&data, "productVariants") {
                    Ok(connection) => connection,
                    Err(err) => {
                        tracing::warn!(store = %self.store, error = %err,
                            "malformed bulk response, marking batch unresolved");
                        result.unresolved.extend(chunk.iter().cloned());
                        continue;
                    }
                };

            let fetched = connection.edges.len();
            for edge in connection.edges {
                if let Some(record) = edge.node.into_stock_record() {
                    // Search queries can over-match; keep only what was asked for.
                    if chunk.contains(&record.sku) {
                        result.records.insert(record.sku.clone(), record);
                    }
                }
            }

            // A full window may have truncated requested SKUs out of the
            // response; send anything missing through the per-SKU fallback.
            if fetched >= window {
                for sku in chunk {
                    if !result.records.contains_key(sku) {
                        tracing::warn!(store = %self.store, sku = %sku,
                            "bulk result window saturated, marking SKU unresolved");
                        result.unresolved.push(sku.clone());
                    }
                }
            }
        }

        result
    }

    /// Set absolute available quantities, up to 50 changes per call.
    ///
    /// Returns the embedded user-error list; an empty list means every change
    /// was accepted. Transport retries are the caller's decision (the applier
    /// wraps this in the shared retry combinator).
    pub async fn set_available_quantities(
        &self,
        changes: &[QuantityChange],
    ) -> Result<Vec<UserError>, TransportError> {
        let variables = json!({
            "input": {
                "name": "available",
                "reason": "correction",
                "ignoreCompareQuantity": true,
                "quantities": changes,
            }
        });

        let data = self
            .transport
            .execute(gql::SET_QUANTITIES_MUTATION, variables)
            .await?;

        let payload: Value = parse_field(&data, "inventorySetQuantities")?;
        let user_errors: Vec<UserError> = parse_field(&payload, "userErrors")?;

        if !user_errors.is_empty() {
            tracing::error!(store = %self.store, errors = %join_user_errors(&user_errors),
                "inventory write rejected");
        }
        Ok(user_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted transport: pops one canned response per call and records what
    /// was asked.
    struct FakeTransport {
        responses: Mutex<VecDeque<Result<Value, TransportError>>>,
        calls: Mutex<Vec<Value>>,
    }

    impl FakeTransport {
        fn new(responses: Vec<Result<Value, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GraphqlTransport for FakeTransport {
        async fn execute(&self, _query: &str, variables: Value) -> Result<Value, TransportError> {
            self.calls.lock().unwrap().push(variables);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
        }
    }

    fn fast_config() -> CatalogConfig {
        CatalogConfig {
            retry: RetryPolicy::new(1, Duration::from_millis(1)),
            page_delay: Duration::from_millis(0),
            bulk_lookup_size: 2,
            bulk_result_window: 10,
        }
    }

    fn client(transport: FakeTransport) -> (Arc<FakeTransport>, CatalogClient) {
        let transport = Arc::new(transport);
        let client = CatalogClient::new(transport.clone(), fast_config(), "test-store");
        (transport, client)
    }

    fn sku_page(count: usize, offset: usize, has_next_page: bool) -> Value {
        let edges: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "node": { "sku": format!("SKU-{}", offset + i) },
                    "cursor": format!("cursor-{}", offset + i),
                })
            })
            .collect();
        json!({
            "productVariants": {
                "edges": edges,
                "pageInfo": { "hasNextPage": has_next_page },
            }
        })
    }

    fn variant_payload(sku: &str, location: &str, qty: i64) -> Value {
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
                                "quantities": [{ "name": "available", "quantity": qty }],
                            }
                        }]
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn listing_walks_all_pages_and_stops_on_the_last() {
        let (transport, client) = client(FakeTransport::new(vec![
            Ok(sku_page(100, 0, true)),
            Ok(sku_page(100, 100, true)),
            Ok(sku_page(37, 200, false)),
        ]));

        let skus = client.list_all_skus().await.unwrap();

        assert_eq!(skus.len(), 237);
        let unique: std::collections::HashSet<_> = skus.iter().collect();
        assert_eq!(unique.len(), 237);
        // No request after the final page.
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn listing_passes_the_last_cursor_to_the_next_page() {
        let (transport, client) = client(FakeTransport::new(vec![
            Ok(sku_page(2, 0, true)),
            Ok(sku_page(1, 2, false)),
        ]));

        client.list_all_skus().await.unwrap();

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0]["after"], Value::Null);
        assert_eq!(calls[1]["after"], json!("cursor-1"));
    }

    #[tokio::test]
    async fn empty_catalog_lists_as_empty_not_an_error() {
        let (_, client) = client(FakeTransport::new(vec![Ok(sku_page(0, 0, false))]));
        let skus = client.list_all_skus().await.unwrap();
        assert!(skus.is_empty());
    }

    #[tokio::test]
    async fn blank_skus_are_filtered_from_the_listing() {
        let page = json!({
            "productVariants": {
                "edges": [
                    { "node": { "sku": "REAL" }, "cursor": "c1" },
                    { "node": { "sku": "" }, "cursor": "c2" },
                    { "node": { "sku": null }, "cursor": "c3" },
                ],
                "pageInfo": { "hasNextPage": false },
            }
        });
        let (_, client) = client(FakeTransport::new(vec![Ok(page)]));
        let skus = client.list_all_skus().await.unwrap();
        assert_eq!(skus, vec![Sku::from("REAL")]);
    }

    #[tokio::test]
    async fn mid_listing_failure_aborts_the_whole_listing() {
        let (_, client) = client(FakeTransport::new(vec![
            Ok(sku_page(100, 0, true)),
            Err(TransportError::Http {
                status: 401,
                body: "unauthorized".into(),
            }),
        ]));
        let err = client.list_all_skus().await.unwrap_err();
        assert!(matches!(err, TransportError::Http { status: 401, .. }));
    }

    #[tokio::test]
    async fn fetch_stock_returns_absent_for_unknown_sku() {
        let (_, client) = client(FakeTransport::new(vec![Ok(
            json!({ "productVariants": { "edges": [] } }),
        )]));
        let record = client.fetch_stock(&Sku::from("GHOST")).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn fetch_stock_treats_malformed_shapes_as_absent() {
        let (_, client) = client(FakeTransport::new(vec![Ok(json!({ "unexpected": true }))]));
        let record = client.fetch_stock(&Sku::from("X")).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn fetch_stock_retries_transient_failures() {
        let (transport, client) = client(FakeTransport::new(vec![
            Err(TransportError::Timeout),
            Ok(json!({ "productVariants": { "edges": [variant_payload("X", "L1", 4)] } })),
        ]));
        let record = client.fetch_stock(&Sku::from("X")).await.unwrap().unwrap();
        assert_eq!(record.first_available().unwrap().1, 4);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn bulk_fetch_merges_batches_and_marks_failed_ones_unresolved() {
        // bulk_lookup_size is 2: first batch (A, B) succeeds, second (C, D)
        // fails twice (initial + 1 retry).
        let (_, client) = client(FakeTransport::new(vec![
            Ok(json!({ "productVariants": { "edges": [
                variant_payload("A", "L1", 1),
                variant_payload("B", "L1", 2),
            ] } })),
            Err(TransportError::Network("reset".into())),
            Err(TransportError::Network("reset".into())),
        ]));

        let skus: Vec<Sku> = ["A", "B", "C", "D"].into_iter().map(Sku::from).collect();
        let bulk = client.bulk_fetch_stock(&skus).await;

        assert_eq!(bulk.records.len(), 2);
        assert!(bulk.records.contains_key(&Sku::from("A")));
        assert_eq!(bulk.unresolved, vec![Sku::from("C"), Sku::from("D")]);
    }

    #[tokio::test]
    async fn bulk_fetch_requests_a_window_larger_than_the_batch() {
        let (transport, client) = client(FakeTransport::new(vec![Ok(
            json!({ "productVariants": { "edges": [variant_payload("A", "L1", 1)] } }),
        )]));

        client.bulk_fetch_stock(&[Sku::from("A"), Sku::from("B")]).await;

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0]["first"], json!(10));
    }

    #[tokio::test]
    async fn saturated_bulk_window_marks_missing_skus_unresolved() {
        // The window of 2 comes back full, with an over-matched variant
        // holding the slot B would have filled; B must reach the per-SKU
        // fallback rather than read as legitimately absent.
        let transport = Arc::new(FakeTransport::new(vec![Ok(
            json!({ "productVariants": { "edges": [
                variant_payload("A", "L1", 1),
                variant_payload("UNRELATED", "L1", 9),
            ] } }),
        )]));
        let config = CatalogConfig {
            bulk_result_window: 2,
            ..fast_config()
        };
        let client = CatalogClient::new(transport.clone(), config, "test-store");

        let bulk = client
            .bulk_fetch_stock(&[Sku::from("A"), Sku::from("B")])
            .await;

        assert_eq!(bulk.records.len(), 1);
        assert!(bulk.records.contains_key(&Sku::from("A")));
        assert_eq!(bulk.unresolved, vec![Sku::from("B")]);
    }

    #[tokio::test]
    async fn bulk_fetch_ignores_over_matched_variants() {
        let (_, client) = client(FakeTransport::new(vec![Ok(
            json!({ "productVariants": { "edges": [
                variant_payload("A", "L1", 1),
                variant_payload("UNRELATED", "L1", 9),
            ] } }),
        )]));

        let bulk = client.bulk_fetch_stock(&[Sku::from("A")]).await;
        assert_eq!(bulk.records.len(), 1);
        assert!(bulk.unresolved.is_empty());
    }

    #[tokio::test]
    async fn set_quantities_surfaces_embedded_user_errors() {
        let (_, client) = client(FakeTransport::new(vec![Ok(json!({
            "inventorySetQuantities": {
                "userErrors": [
                    { "field": ["input", "quantities", "0"], "message": "invalid location" }
                ]
            }
        }))]));

        let changes = vec![QuantityChange {
            inventory_item_id: "gid://shop/InventoryItem/1".into(),
            location_id: "L1".into(),
            quantity: 5,
        }];
        let errors = client.set_available_quantities(&changes).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "invalid location");
        assert_eq!(errors[0].change_index(), Some(0));
    }
}
