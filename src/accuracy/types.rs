use serde::{Deserialize, Serialize};

/// Dashboard view of how much reviewers had to correct the extractor.
/// Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyMatrix {
    /// One row per document type, ordered by type name.
    pub document_types: Vec<DocumentTypeAccuracy>,
    /// Most edited fields, most frequent first.
    pub frequently_edited_fields: Vec<FieldEditFrequency>,
    /// Calendar months ending at the current one, oldest first.
    pub monthly_trends: Vec<MonthlyTrend>,
    /// Accuracy over every field of every document (2 decimals).
    pub overall_accuracy: f64,
    /// All counted edits, the denominator of each field percentage.
    pub total_edits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeAccuracy {
    pub document_type: String,
    pub total_documents: usize,
    pub edited_documents: usize,
    pub total_fields: usize,
    pub edited_fields: usize,
    pub accuracy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEditFrequency {
    pub field_name: String,
    pub edit_count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub accuracy: f64,
    pub document_count: usize,
}
