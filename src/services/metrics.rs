//! Prometheus metrics
//!
//! Registered in the default registry, scraped through `GET /metrics`.

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Sync runs by mode (conditional/forced) and outcome
    pub static ref SYNC_RUNS: IntCounterVec = register_int_counter_vec!(
        "catalog_sync_runs_total",
        "Catalog sync triggers by mode and outcome",
        &["mode", "outcome"]
    )
    .expect("metric can be registered");

    /// Enrichment units skipped after a remote failure
    pub static ref ENRICHMENT_FAILURES: IntCounterVec = register_int_counter_vec!(
        "catalog_enrichment_failures_total",
        "Genre or series-detail units that failed and were skipped",
        &["unit"]
    )
    .expect("metric can be registered");

    /// Rows written by the batch reconciler
    pub static ref RECONCILED_ROWS: IntCounterVec = register_int_counter_vec!(
        "catalog_reconciled_rows_total",
        "Records upserted per relation",
        &["relation"]
    )
    .expect("metric can be registered");

    /// Channel import runs by outcome
    pub static ref CHANNEL_IMPORTS: IntCounterVec = register_int_counter_vec!(
        "channel_imports_total",
        "Playlist channel import runs by outcome",
        &["outcome"]
    )
    .expect("metric can be registered");
}

pub fn record_sync(mode: &str, outcome: &str) {
    SYNC_RUNS.with_label_values(&[mode, outcome]).inc();
}

pub fn record_enrichment_failure(unit: &str) {
    ENRICHMENT_FAILURES.with_label_values(&[unit]).inc();
}

pub fn record_reconciled(relation: &str, rows: usize) {
    RECONCILED_ROWS
        .with_label_values(&[relation])
        .inc_by(rows as u64);
}

pub fn record_import(outcome: &str) {
    CHANNEL_IMPORTS.with_label_values(&[outcome]).inc();
}
