use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::certificate::CanonicalCertificate;
use super::edit_log::EditLog;
use crate::pipeline::normalize::{normalize, NormalizeError};

/// Document type used when storage has none on record.
pub const UNKNOWN_DOCUMENT_TYPE: &str = "unknown";

/// A persisted document as the host's storage hands it over.
///
/// `extracted_data` is kept exactly as stored: the canonical certificate
/// leaves plus the embedded `edit_tracking` map and any metadata keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub document_type: String,
    pub created_at: DateTime<Utc>,
    pub extracted_data: Value,
}

impl DocumentRecord {
    /// Canonical view of the stored payload.
    pub fn certificate(&self) -> Result<CanonicalCertificate, NormalizeError> {
        normalize(&self.extracted_data)
    }

    pub fn edit_log(&self) -> EditLog {
        EditLog::from_extracted_data(&self.extracted_data)
    }
}
