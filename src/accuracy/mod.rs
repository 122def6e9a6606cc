//! Extraction accuracy matrix: how much of each document type reviewers had
//! to correct, which fields they corrected most, and the monthly trend.
//!
//! Recomputed from scratch on every call; nothing here is cached or stored.

pub mod aggregate;
pub mod counting;
pub mod types;

pub use aggregate::{aggregate, aggregate_cancellable, aggregate_with_config};
pub use counting::{edited_field_count, total_field_count};
pub use types::*;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AccuracyConfig;
use crate::db::{DatabaseError, DocumentStore, SqliteDocumentStore};

#[derive(Error, Debug)]
pub enum AccuracyError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Accuracy aggregation cancelled")]
    Cancelled,
}

/// Aggregate every stored document of one organization.
pub fn load_accuracy_matrix(
    conn: &Connection,
    organization_id: &Uuid,
    now: DateTime<Utc>,
    config: &AccuracyConfig,
) -> Result<AccuracyMatrix, AccuracyError> {
    load_accuracy_matrix_with(&SqliteDocumentStore::new(), conn, organization_id, now, config)
}

pub fn load_accuracy_matrix_with(
    store: &dyn DocumentStore,
    conn: &Connection,
    organization_id: &Uuid,
    now: DateTime<Utc>,
    config: &AccuracyConfig,
) -> Result<AccuracyMatrix, AccuracyError> {
    let documents = store.list_for_organization(conn, organization_id)?;
    let matrix = aggregate_with_config(&documents, now, config);

    tracing::info!(
        organization_id = %organization_id,
        documents = documents.len(),
        total_edits = matrix.total_edits,
        overall_accuracy = matrix.overall_accuracy,
        "Computed accuracy matrix"
    );
    Ok(matrix)
}
