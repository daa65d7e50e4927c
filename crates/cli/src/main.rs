//! `shopsync` — reconcile retailer inventory against the source-of-truth store.
//!
//! Runs one reconciliation pass per selected retailer, sequentially, so the
//! aggregate load on the remote API stays predictable. A retailer's fatal
//! failure (bad config, catalog listing) skips that retailer only; the
//! process exits non-zero if any retailer failed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use shopsync_config::{GlobalConfig, InventoryTuning, ResolvedRetailer, ResolvedStore, RetailerConfig};
use shopsync_reconcile::SyncSummary;
use shopsync_runner::{
    ApplierConfig, LogReporter, ReportSink, SyncOrchestrator, WriteStrategy,
};
use shopsync_shopify::{
    CatalogClient, CatalogConfig, HttpTransport, Pacer, RetryPolicy, StoreCredentials,
};

#[derive(Parser, Debug)]
#[command(
    name = "shopsync",
    about = "Reconcile retailer inventory against the source-of-truth store"
)]
struct Args {
    /// Global configuration file (source store, tuning knobs).
    #[arg(long, default_value = "config/global-config.json")]
    global_config: PathBuf,

    /// Retailers file (JSON array of retailer entries).
    #[arg(long, default_value = "config/retailers.json")]
    retailers: PathBuf,

    /// Sync only this retailer id. Without it, every retailer with inventory
    /// sync enabled participates.
    #[arg(value_name = "RETAILER_ID")]
    retailer: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    shopsync_observability::init();
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(error = %err, "run aborted");
            ExitCode::FAILURE
        }
    }
}

/// Run the selected retailers. `Ok(false)` means the run finished but at
/// least one retailer failed fatally.
async fn run(args: Args) -> anyhow::Result<bool> {
    let global = GlobalConfig::load(&args.global_config)?;
    let retailers = RetailerConfig::load_all(&args.retailers)?;
    let source = global.resolve_source()?;
    let tuning = &global.inventory;

    let selected: Vec<RetailerConfig> = retailers
        .into_iter()
        .filter(|retailer| match &args.retailer {
            Some(id) => &retailer.id == id,
            None => retailer.settings.sync_inventory,
        })
        .collect();

    if selected.is_empty() {
        // An explicit filter that matches nothing is an operator error, not a
        // clean no-op.
        return match &args.retailer {
            Some(id) => {
                tracing::error!(retailer = %id, "no retailer with this id");
                Ok(false)
            }
            None => {
                tracing::warn!("no retailers selected, nothing to do");
                Ok(true)
            }
        };
    }

    let sink = LogReporter;
    let mut all_ok = true;

    for retailer in selected {
        if !retailer.settings.sync_inventory {
            tracing::warn!(retailer = %retailer.id, "inventory sync disabled, skipping");
            continue;
        }

        let resolved = match retailer.resolve() {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::error!(retailer = %retailer.id, error = %err,
                    "configuration error, skipping retailer");
                all_ok = false;
                continue;
            }
        };

        tracing::info!(retailer = %resolved.name, "starting inventory sync");
        match sync_retailer(&source, &resolved, tuning).await {
            Ok(summary) => sink.publish(&resolved.name, &summary).await,
            Err(err) => {
                tracing::error!(retailer = %resolved.id, error = %err, "pass failed");
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}

async fn sync_retailer(
    source: &ResolvedStore,
    retailer: &ResolvedRetailer,
    tuning: &InventoryTuning,
) -> anyhow::Result<SyncSummary> {
    let source_client = catalog_client(source, tuning)?;
    let target_client = catalog_client(&retailer.store, tuning)?;

    let applier_config = ApplierConfig {
        batch_size: tuning.batch_size,
        batch_delay: tuning.batch_delay(),
        strategy: if tuning.use_bulk_mutations {
            WriteStrategy::BulkMutation
        } else {
            WriteStrategy::PerItem
        },
        retry: retry_policy(tuning),
    };

    let orchestrator = SyncOrchestrator::new(
        source_client,
        target_client,
        retailer.policy.clone(),
        applier_config,
    );
    Ok(orchestrator.run_pass().await?)
}

fn catalog_client(store: &ResolvedStore, tuning: &InventoryTuning) -> anyhow::Result<CatalogClient> {
    let pacer = Pacer::from_requests_per_second(tuning.requests_per_second);
    let transport = HttpTransport::new(
        StoreCredentials::new(store.domain.as_str(), store.access_token.as_str()),
        pacer,
    )?;
    Ok(CatalogClient::new(
        Arc::new(transport),
        CatalogConfig {
            retry: retry_policy(tuning),
            page_delay: tuning.page_delay(),
            ..CatalogConfig::default()
        },
        store.domain.clone(),
    ))
}

fn retry_policy(tuning: &InventoryTuning) -> RetryPolicy {
    RetryPolicy::new(tuning.max_retries, Duration::from_secs(1))
}
