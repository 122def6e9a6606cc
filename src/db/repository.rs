use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;
use uuid::Uuid;

use super::DatabaseError;
use crate::models::DocumentRecord;

/// Storage seam used by the review and accuracy flows.
pub trait DocumentStore {
    fn insert(&self, conn: &Connection, doc: &DocumentRecord) -> Result<(), DatabaseError>;

    fn get(&self, conn: &Connection, id: &Uuid) -> Result<Option<DocumentRecord>, DatabaseError>;

    /// Every document of one organization, oldest first.
    fn list_for_organization(
        &self,
        conn: &Connection,
        organization_id: &Uuid,
    ) -> Result<Vec<DocumentRecord>, DatabaseError>;

    /// Replace a document's stored `extracted_data` wholesale.
    fn update_extracted_data(
        &self,
        conn: &Connection,
        id: &Uuid,
        extracted_data: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;
}

/// SQLite-backed document store.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDocumentStore;

impl SqliteDocumentStore {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn insert(&self, conn: &Connection, doc: &DocumentRecord) -> Result<(), DatabaseError> {
        insert_document(conn, doc)
    }

    fn get(&self, conn: &Connection, id: &Uuid) -> Result<Option<DocumentRecord>, DatabaseError> {
        get_document(conn, id)
    }

    fn list_for_organization(
        &self,
        conn: &Connection,
        organization_id: &Uuid,
    ) -> Result<Vec<DocumentRecord>, DatabaseError> {
        list_documents_for_organization(conn, organization_id)
    }

    fn update_extracted_data(
        &self,
        conn: &Connection,
        id: &Uuid,
        extracted_data: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        update_extracted_data(conn, id, extracted_data, updated_at)
    }
}

// ═══════════════════════════════════════════
// Document Repository
// ═══════════════════════════════════════════

pub fn insert_document(conn: &Connection, doc: &DocumentRecord) -> Result<(), DatabaseError> {
    let extracted_json = serde_json::to_string(&doc.extracted_data)
        .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

    conn.execute(
        "INSERT INTO documents (id, organization_id, document_type, created_at, extracted_data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doc.id.to_string(),
            doc.organization_id.to_string(),
            doc.document_type,
            doc.created_at.to_rfc3339(),
            extracted_json,
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<DocumentRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, organization_id, document_type, created_at, extracted_data
         FROM documents WHERE id = ?1"
    )?;

    let result = stmt.query_row(params![id.to_string()], read_document_row);

    match result {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_documents_for_organization(
    conn: &Connection,
    organization_id: &Uuid,
) -> Result<Vec<DocumentRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, organization_id, document_type, created_at, extracted_data
         FROM documents WHERE organization_id = ?1
         ORDER BY created_at ASC"
    )?;

    let rows = stmt.query_map(params![organization_id.to_string()], read_document_row)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

pub fn update_extracted_data(
    conn: &Connection,
    id: &Uuid,
    extracted_data: &Value,
    updated_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let extracted_json = serde_json::to_string(extracted_data)
        .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

    let changed = conn.execute(
        "UPDATE documents SET extracted_data = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), extracted_json, updated_at.to_rfc3339()],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "document".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct DocumentRow {
    id: String,
    organization_id: String,
    document_type: String,
    created_at: String,
    extracted_data: String,
}

fn read_document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        document_type: row.get(2)?,
        created_at: row.get(3)?,
        extracted_data: row.get(4)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<DocumentRecord, DatabaseError> {
    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::InvalidTimestamp {
            value: row.created_at.clone(),
            reason: e.to_string(),
        })?;

    Ok(DocumentRecord {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        organization_id: Uuid::parse_str(&row.organization_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        document_type: row.document_type,
        created_at,
        extracted_data: serde_json::from_str(&row.extracted_data)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?,
    })
}
