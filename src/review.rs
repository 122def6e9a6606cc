//! Reviewer corrections on canonical certificates.
//!
//! Provides the data layer for the certificate editor: a typed address for
//! every editable leaf, the pure edit operation that records an audit entry,
//! the flattened field list with confidence flagging, and the save-edit
//! flow that commits the record and its edit log together.
//!
//! Edits assume a single writer per document. Two reviewers saving the same
//! document concurrently are not merged; the later transaction wins.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{DatabaseError, DocumentStore, SqliteDocumentStore};
use crate::models::{
    is_addressable_name, is_reserved_field, CanonicalCertificate, DocumentRecord, EditLog, EditLogEntry,
    ExaminationType, FieldType, FitnessStatus, EDIT_TRACKING_KEY, LAST_EDITED_AT_KEY,
    RESERVED_FIELD_NAMES, UNKNOWN_DOCUMENT_TYPE,
};
use crate::pipeline::confidence::{self, ConfidenceScore};
use crate::pipeline::normalize::{lenient, normalize, NormalizeError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("Field path is empty")]
    EmptyFieldPath,

    #[error("Field {0} is reserved metadata and cannot be edited")]
    ReservedField(String),

    #[error("Unknown field path: {0}")]
    UnknownFieldPath(String),

    #[error("Field {field_path} expects a {expected} value")]
    TypeMismatch {
        field_path: String,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Address of one editable leaf in the canonical certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    PatientName,
    PatientIdNumber,
    PatientCompany,
    PatientOccupation,
    ExaminationDate,
    ExamType(ExaminationType),
    TestDone(String),
    TestResult(String),
    ValidUntil,
    Fitness(FitnessStatus),
    Comments,
    FollowUp,
    ReviewDate,
    Restriction(String),
}

/// Result of applying one edit. The inputs are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub record: CanonicalCertificate,
    pub edit_log: EditLog,
    pub entry: EditLogEntry,
}

/// One leaf of the certificate as the review screen shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewField {
    pub field_path: String,
    pub label: String,
    pub value: String,
    pub field_type: FieldType,
    pub confidence: ConfidenceScore,
    pub is_flagged: bool,
}

/// Spellings accepted as an explicit "unchecked" when a flag arrives as text.
const UNCHECKED_VALUES: &[&str] = &["no", "false", "unchecked", "0", ""];

// ---------------------------------------------------------------------------
// Field paths
// ---------------------------------------------------------------------------

impl FieldPath {
    /// Parse a dot-delimited path such as `examination.tests.bloods.result`.
    ///
    /// Test and restriction names may themselves contain dots; they take
    /// every segment between the fixed prefix and the fixed tail.
    pub fn parse(raw: &str) -> Result<Self, EditError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EditError::EmptyFieldPath);
        }

        let segments: Vec<&str> = trimmed.split('.').collect();
        if segments.iter().any(|s| is_reserved_field(s)) {
            return Err(EditError::ReservedField(trimmed.to_string()));
        }
        let unknown = || EditError::UnknownFieldPath(trimmed.to_string());
        if segments.iter().any(|s| s.is_empty()) {
            return Err(unknown());
        }

        let path = match segments.as_slice() {
            ["patient", "name"] => Self::PatientName,
            ["patient", "id_number"] => Self::PatientIdNumber,
            ["patient", "company"] => Self::PatientCompany,
            ["patient", "occupation"] => Self::PatientOccupation,
            ["examination", "date"] => Self::ExaminationDate,
            ["examination", "type", kind] => {
                Self::ExamType(ExaminationType::from_str(kind).map_err(|_| unknown())?)
            }
            ["examination", "tests", name @ .., "done"] if !name.is_empty() => {
                Self::TestDone(name.join("."))
            }
            ["examination", "tests", name @ .., "result"] if !name.is_empty() => {
                Self::TestResult(name.join("."))
            }
            ["certification", "valid_until"] => Self::ValidUntil,
            ["certification", "comments"] => Self::Comments,
            ["certification", "follow_up"] => Self::FollowUp,
            ["certification", "review_date"] => Self::ReviewDate,
            ["certification", status] => {
                Self::Fitness(FitnessStatus::from_str(status).map_err(|_| unknown())?)
            }
            ["restrictions", name @ ..] if !name.is_empty() => Self::Restriction(name.join(".")),
            _ => return Err(unknown()),
        };
        Ok(path)
    }

    /// Every editable leaf currently present in `cert`, in display order.
    /// Map entries whose name could not be parsed back are left out.
    pub fn all_for(cert: &CanonicalCertificate) -> Vec<Self> {
        let mut paths = vec![
            Self::PatientName,
            Self::PatientIdNumber,
            Self::PatientCompany,
            Self::PatientOccupation,
            Self::ExaminationDate,
        ];
        paths.extend(ExaminationType::all().iter().map(|k| Self::ExamType(*k)));
        for name in cert.examination.tests.keys().filter(|n| is_addressable_name(n)) {
            paths.push(Self::TestDone(name.clone()));
            paths.push(Self::TestResult(name.clone()));
        }
        paths.push(Self::ValidUntil);
        paths.extend(FitnessStatus::all().iter().map(|s| Self::Fitness(*s)));
        paths.extend([Self::Comments, Self::FollowUp, Self::ReviewDate]);
        paths.extend(
            cert.restrictions
                .keys()
                .filter(|n| is_addressable_name(n))
                .map(|n| Self::Restriction(n.clone())),
        );
        paths
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Self::PatientName => FieldType::Name,
            Self::PatientIdNumber => FieldType::Id,
            Self::ExaminationDate | Self::ValidUntil | Self::ReviewDate => FieldType::Date,
            Self::ExamType(_) | Self::TestDone(_) | Self::Fitness(_) | Self::Restriction(_) => {
                FieldType::Boolean
            }
            Self::PatientCompany
            | Self::PatientOccupation
            | Self::TestResult(_)
            | Self::Comments
            | Self::FollowUp => FieldType::Text,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::PatientName => "Full name".into(),
            Self::PatientIdNumber => "ID number".into(),
            Self::PatientCompany => "Company".into(),
            Self::PatientOccupation => "Occupation".into(),
            Self::ExaminationDate => "Examination date".into(),
            Self::ExamType(kind) => humanize(kind.as_str()),
            Self::TestDone(name) => format!("{} done", humanize(name)),
            Self::TestResult(name) => format!("{} result", humanize(name)),
            Self::ValidUntil => "Valid until".into(),
            Self::Fitness(status) => humanize(status.as_str()),
            Self::Comments => "Comments".into(),
            Self::FollowUp => "Follow up".into(),
            Self::ReviewDate => "Review date".into(),
            Self::Restriction(name) => humanize(name),
        }
    }

    fn expects_flag(&self) -> bool {
        self.field_type() == FieldType::Boolean
    }

    /// Current value at this path. Absent map entries read as `null`.
    pub fn read(&self, cert: &CanonicalCertificate) -> Value {
        let text = |s: &String| Value::String(s.clone());
        match self {
            Self::PatientName => text(&cert.patient.name),
            Self::PatientIdNumber => text(&cert.patient.id_number),
            Self::PatientCompany => text(&cert.patient.company),
            Self::PatientOccupation => text(&cert.patient.occupation),
            Self::ExaminationDate => text(&cert.examination.date),
            Self::ExamType(kind) => Value::Bool(cert.examination.exam_type.get(*kind)),
            Self::TestDone(name) => cert
                .examination
                .tests
                .get(name)
                .map_or(Value::Null, |t| Value::Bool(t.done)),
            Self::TestResult(name) => cert
                .examination
                .tests
                .get(name)
                .map_or(Value::Null, |t| text(&t.result)),
            Self::ValidUntil => text(&cert.certification.valid_until),
            Self::Fitness(status) => Value::Bool(cert.certification.fitness(*status)),
            Self::Comments => text(&cert.certification.comments),
            Self::FollowUp => text(&cert.certification.follow_up),
            Self::ReviewDate => text(&cert.certification.review_date),
            Self::Restriction(name) => cert
                .restrictions
                .get(name)
                .map_or(Value::Null, |b| Value::Bool(*b)),
        }
    }

    /// Overwrite the leaf, creating the test or restriction entry if needed.
    fn write(&self, cert: &mut CanonicalCertificate, value: &Value) -> Result<(), EditError> {
        if self.expects_flag() {
            let checked = self.coerce_flag(value)?;
            match self {
                Self::ExamType(kind) => cert.examination.exam_type.set(*kind, checked),
                Self::TestDone(name) => {
                    cert.examination.tests.entry(name.clone()).or_default().done = checked
                }
                Self::Fitness(status) => cert.certification.set_fitness(*status, checked),
                Self::Restriction(name) => {
                    cert.restrictions.insert(name.clone(), checked);
                }
                _ => {}
            }
            return Ok(());
        }

        let text = self.coerce_text(value)?;
        let slot = match self {
            Self::PatientName => &mut cert.patient.name,
            Self::PatientIdNumber => &mut cert.patient.id_number,
            Self::PatientCompany => &mut cert.patient.company,
            Self::PatientOccupation => &mut cert.patient.occupation,
            Self::ExaminationDate => &mut cert.examination.date,
            Self::TestResult(name) => {
                &mut cert.examination.tests.entry(name.clone()).or_default().result
            }
            Self::ValidUntil => &mut cert.certification.valid_until,
            Self::Comments => &mut cert.certification.comments,
            Self::FollowUp => &mut cert.certification.follow_up,
            Self::ReviewDate => &mut cert.certification.review_date,
            Self::ExamType(_) | Self::TestDone(_) | Self::Fitness(_) | Self::Restriction(_) => {
                return Err(self.mismatch("text"))
            }
        };
        *slot = text;
        Ok(())
    }

    fn coerce_text(&self, value: &Value) -> Result<String, EditError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            _ => Err(self.mismatch("text")),
        }
    }

    fn coerce_flag(&self, value: &Value) -> Result<bool, EditError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if lenient::is_checked(s) => Ok(true),
            Value::String(s) if UNCHECKED_VALUES.contains(&s.trim().to_lowercase().as_str()) => {
                Ok(false)
            }
            Value::Number(n) if n.as_u64() == Some(1) => Ok(true),
            Value::Number(n) if n.as_u64() == Some(0) => Ok(false),
            _ => Err(self.mismatch("boolean")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> EditError {
        EditError::TypeMismatch {
            field_path: self.to_string(),
            expected,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PatientName => f.write_str("patient.name"),
            Self::PatientIdNumber => f.write_str("patient.id_number"),
            Self::PatientCompany => f.write_str("patient.company"),
            Self::PatientOccupation => f.write_str("patient.occupation"),
            Self::ExaminationDate => f.write_str("examination.date"),
            Self::ExamType(kind) => write!(f, "examination.type.{kind}"),
            Self::TestDone(name) => write!(f, "examination.tests.{name}.done"),
            Self::TestResult(name) => write!(f, "examination.tests.{name}.result"),
            Self::ValidUntil => f.write_str("certification.valid_until"),
            Self::Fitness(status) => write!(f, "certification.{status}"),
            Self::Comments => f.write_str("certification.comments"),
            Self::FollowUp => f.write_str("certification.follow_up"),
            Self::ReviewDate => f.write_str("certification.review_date"),
            Self::Restriction(name) => write!(f, "restrictions.{name}"),
        }
    }
}

impl FromStr for FieldPath {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Edit operations
// ---------------------------------------------------------------------------

/// Apply one reviewer correction.
///
/// Returns the updated record and log; the previous entry for the same path
/// is replaced (last write wins). `previous_value` is `null` when the edit
/// creates a test or restriction that did not exist.
pub fn apply_edit(
    record: &CanonicalCertificate,
    edit_log: &EditLog,
    field_path: &str,
    new_value: Value,
    now: DateTime<Utc>,
) -> Result<EditOutcome, EditError> {
    let path = FieldPath::parse(field_path)?;

    let previous_value = path.read(record);
    let mut updated = record.clone();
    path.write(&mut updated, &new_value)?;

    let entry = EditLogEntry {
        field_path: path.to_string(),
        previous_value,
        new_value: path.read(&updated),
        edited_at: now,
    };

    let mut log = edit_log.clone();
    log.record(entry.clone());

    Ok(EditOutcome {
        record: updated,
        edit_log: log,
        entry,
    })
}

/// Flatten a certificate into the review screen's field list.
pub fn review_fields(cert: &CanonicalCertificate) -> Vec<ReviewField> {
    FieldPath::all_for(cert)
        .into_iter()
        .map(|path| {
            let value = match path.read(cert) {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                _ => String::new(),
            };
            let field_type = path.field_type();
            let confidence = confidence::score(&value, field_type);
            ReviewField {
                field_path: path.to_string(),
                label: path.label(),
                value,
                field_type,
                confidence,
                is_flagged: confidence.needs_review(),
            }
        })
        .collect()
}

/// Normalize a fresh extraction payload and store it as a new document.
pub fn ingest_extraction(
    conn: &Connection,
    organization_id: Uuid,
    document_type: &str,
    raw: &Value,
    now: DateTime<Utc>,
) -> Result<DocumentRecord, ReviewError> {
    ingest_extraction_with(
        &SqliteDocumentStore::new(),
        conn,
        organization_id,
        document_type,
        raw,
        now,
    )
}

pub fn ingest_extraction_with(
    store: &dyn DocumentStore,
    conn: &Connection,
    organization_id: Uuid,
    document_type: &str,
    raw: &Value,
    now: DateTime<Utc>,
) -> Result<DocumentRecord, ReviewError> {
    let certificate = normalize(raw)?;
    let document_type = match document_type.trim() {
        "" => UNKNOWN_DOCUMENT_TYPE.to_string(),
        other => other.to_string(),
    };

    let doc = DocumentRecord {
        id: Uuid::new_v4(),
        organization_id,
        document_type,
        created_at: now,
        extracted_data: certificate.to_value(),
    };
    store.insert(conn, &doc)?;

    tracing::info!(
        document_id = %doc.id,
        document_type = %doc.document_type,
        "Ingested extraction"
    );
    Ok(doc)
}

/// Apply one edit to a stored document.
///
/// The canonical record, the `edit_tracking` entry and `last_edited_at` are
/// written in one transaction. Entries already in `edit_tracking` are kept
/// as stored, even ones that no longer parse.
pub fn save_field_edit(
    conn: &Connection,
    document_id: &Uuid,
    field_path: &str,
    new_value: Value,
    now: DateTime<Utc>,
) -> Result<EditLogEntry, ReviewError> {
    save_field_edit_with(
        &SqliteDocumentStore::new(),
        conn,
        document_id,
        field_path,
        new_value,
        now,
    )
}

pub fn save_field_edit_with(
    store: &dyn DocumentStore,
    conn: &Connection,
    document_id: &Uuid,
    field_path: &str,
    new_value: Value,
    now: DateTime<Utc>,
) -> Result<EditLogEntry, ReviewError> {
    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    let doc = store.get(&tx, document_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "document".into(),
        id: document_id.to_string(),
    })?;

    let certificate = normalize(&doc.extracted_data)?;
    let outcome = apply_edit(&certificate, &doc.edit_log(), field_path, new_value, now)?;

    let extracted_data = rebuild_extracted_data(&doc.extracted_data, &outcome, now)?;
    store.update_extracted_data(&tx, document_id, &extracted_data, now)?;

    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        document_id = %document_id,
        field_path = %outcome.entry.field_path,
        "Saved reviewer edit"
    );
    Ok(outcome.entry)
}

/// Stored payload after an edit: the canonical record, the raw edit log with
/// the new entry upserted, and the carried-over metadata keys.
fn rebuild_extracted_data(
    stored: &Value,
    outcome: &EditOutcome,
    now: DateTime<Utc>,
) -> Result<Value, DatabaseError> {
    let mut data = match outcome.record.to_value() {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    // Metadata stays; vendor-shaped keys are dropped so the stored payload
    // re-classifies as canonical.
    if let Some(stored) = stored.as_object() {
        for key in RESERVED_FIELD_NAMES {
            if let Some(value) = stored.get(*key) {
                data.insert((*key).to_string(), value.clone());
            }
        }
    }

    let mut tracking = stored
        .get(EDIT_TRACKING_KEY)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let entry = serde_json::to_value(&outcome.entry)
        .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
    tracking.insert(outcome.entry.field_path.clone(), entry);

    data.insert(EDIT_TRACKING_KEY.to_string(), Value::Object(tracking));
    data.insert(LAST_EDITED_AT_KEY.to_string(), Value::String(now.to_rfc3339()));

    Ok(Value::Object(data))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
