//! GraphQL operations and the response shapes we consume.
//!
//! Only the fields the reconciliation core reads are modelled; everything
//! else in the remote schema is ignored by serde.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopsync_core::{InventoryItemId, InventoryLevel, LocationId, Sku, StockRecord, VariantId};

use crate::transport::TransportError;

/// Cursor-paginated SKU listing, 250 records per page.
pub const SKU_PAGE_QUERY: &str = r#"
    query getProductVariants($after: String) {
        productVariants(first: 250, after: $after) {
            edges {
                node {
                    sku
                }
                cursor
            }
            pageInfo {
                hasNextPage
            }
        }
    }
"#;

/// Variant lookup by SKU search query, with per-location available quantities.
/// Used with `first: 1` for single lookups and `first: 100` for batched ones.
pub const VARIANT_STOCK_QUERY: &str = r#"
    query getVariantStock($first: Int!, $query: String!) {
        productVariants(first: $first, query: $query) {
            edges {
                node {
                    id
                    sku
                    inventoryItem {
                        id
                        inventoryLevels(first: 10) {
                            edges {
                                node {
                                    location {
                                        id
                                    }
                                    quantities(names: ["available"]) {
                                        name
                                        quantity
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

/// Absolute-quantity inventory write. Accepts up to 50 changes per call;
/// rejections come back as `userErrors` inside a 200 response.
pub const SET_QUANTITIES_MUTATION: &str = r#"
    mutation inventorySetQuantities($input: InventorySetQuantitiesInput!) {
        inventorySetQuantities(input: $input) {
            userErrors {
                field
                message
            }
        }
    }
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantConnection<T> {
    pub edges: Vec<Edge<T>>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkuNode {
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub inventory_item: Option<InventoryItemNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemNode {
    pub id: String,
    #[serde(default)]
    pub inventory_levels: Option<LevelConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelConnection {
    pub edges: Vec<Edge<LevelNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelNode {
    pub location: LocationNode,
    #[serde(default)]
    pub quantities: Vec<QuantityNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationNode {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuantityNode {
    pub name: String,
    pub quantity: i64,
}

/// Field/message pair embedded in an otherwise-successful mutation response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    /// Index into the mutation's `quantities` array this error refers to, when
    /// the field path carries one (e.g. `["input", "quantities", "3", ...]`).
    ///
    /// Only the segment directly after `"quantities"` counts; numeric segments
    /// elsewhere in the path do not attribute the error to a change.
    pub fn change_index(&self) -> Option<usize> {
        let field = self.field.as_ref()?;
        let position = field.iter().position(|segment| segment == "quantities")?;
        field.get(position + 1)?.parse().ok()
    }
}

/// Join user-error messages for a `Failed` outcome reason.
pub fn join_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// One entry of the set-quantities mutation input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityChange {
    pub inventory_item_id: InventoryItemId,
    pub location_id: LocationId,
    pub quantity: i64,
}

/// Deserialize a `data` sub-value, mapping shape errors to [`TransportError::Malformed`].
pub fn parse_field<T: serde::de::DeserializeOwned>(
    data: &Value,
    field: &str,
) -> Result<T, TransportError> {
    let value = data
        .get(field)
        .ok_or_else(|| TransportError::Malformed(format!("missing {field} in response")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| TransportError::Malformed(format!("{field}: {e}")))
}

impl VariantNode {
    /// Build a stock snapshot from a variant node.
    ///
    /// Returns `None` (with a warning) when the node lacks the nested pieces a
    /// usable record needs; a single bad record must not abort a whole pass.
    pub fn into_stock_record(self) -> Option<StockRecord> {
        let Some(sku) = self.sku.filter(|s| !s.trim().is_empty()) else {
            tracing::warn!(variant = %self.id, "variant has no SKU, skipping");
            return None;
        };
        let Some(item) = self.inventory_item else {
            tracing::warn!(sku = %sku, "no inventory item for SKU, treating as absent");
            return None;
        };

        let locations = item
            .inventory_levels
            .map(|levels| {
                levels
                    .edges
                    .into_iter()
                    .map(|edge| {
                        let available = edge
                            .node
                            .quantities
                            .iter()
                            .find(|q| q.name == "available")
                            .map(|q| q.quantity);
                        InventoryLevel::new(LocationId::new(edge.node.location.id), available)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(StockRecord {
            sku: Sku::new(sku),
            variant_id: VariantId::new(self.id),
            inventory_item_id: InventoryItemId::new(item.id),
            locations,
        })
    }
}
