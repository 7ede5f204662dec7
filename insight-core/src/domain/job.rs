//! Query job domain types
//!
//! A submitted query runs asynchronously on the service as a job. The job is
//! identified by a [`JobHandle`] and observed through [`StatusSnapshot`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for one running query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Query job status as reported by the service
///
/// Labels are case-sensitive. Anything outside the known set is kept verbatim
/// in [`QueryStatus::Unrecognized`] so it can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueryStatus {
    Scheduled,
    Running,
    Complete,
    Failed,
    Cancelled,
    Unrecognized(String),
}

impl QueryStatus {
    /// Classifies a raw status label
    pub fn from_label(label: &str) -> Self {
        match label {
            "Scheduled" => Self::Scheduled,
            "Running" => Self::Running,
            "Complete" => Self::Complete,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// The label as the service spells it
    pub fn label(&self) -> &str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Whether polling stops on this status regardless of row count
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Scheduled | Self::Running)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for QueryStatus {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<QueryStatus> for String {
    fn from(status: QueryStatus) -> Self {
        status.label().to_string()
    }
}

/// One field/value pair of a matched log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultField {
    pub field: String,
    pub value: String,
}

impl ResultField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One matched log record, fields in the order the service returned them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow {
    pub fields: Vec<ResultField>,
}

impl ResultRow {
    pub fn new(fields: Vec<ResultField>) -> Self {
        Self { fields }
    }

    /// Returns the value of the first field with the given name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<ResultField> for ResultRow {
    fn from_iter<I: IntoIterator<Item = ResultField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Point-in-time read of a job: its status and the rows collected so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: QueryStatus,
    pub rows: Vec<ResultRow>,
}

impl StatusSnapshot {
    pub fn new(status: QueryStatus, rows: Vec<ResultRow>) -> Self {
        Self { status, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }
}
