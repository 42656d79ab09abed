//! Issue field schema, sanitization and validation.
//!
//! Candidates arrive as loose JSON objects. [`sanitize`] copies out only the
//! fields named in [`ISSUE_FIELDS`]; [`validate`] then walks the same table in
//! order and reports the first violation. Neither step mutates its input.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use serde_json::{Map, Value};

use super::models::{IssueStatus, NewIssue};
use crate::errors::ValidationError;

/// A candidate issue as received from a client.
pub type Candidate = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Timestamp,
    Status,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Text, Value::String(_)) => true,
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s).is_ok(),
            // Membership is checked after the field pass, whatever the JSON type.
            (FieldKind::Status, _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => f.write_str("text"),
            FieldKind::Number => f.write_str("a number"),
            FieldKind::Timestamp => f.write_str("an RFC 3339 timestamp"),
            FieldKind::Status => f.write_str("a valid status"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub requirement: Requirement,
    pub kind: FieldKind,
}

const fn field(name: &'static str, requirement: Requirement, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor {
        name,
        requirement,
        kind,
    }
}

/// Recognized issue fields, in validation order.
pub const ISSUE_FIELDS: &[FieldDescriptor] = &[
    field("status", Requirement::Required, FieldKind::Status),
    field("owner", Requirement::Required, FieldKind::Text),
    field("effort", Requirement::Optional, FieldKind::Number),
    field("created", Requirement::Required, FieldKind::Timestamp),
    field("completionDate", Requirement::Optional, FieldKind::Timestamp),
    field("title", Requirement::Required, FieldKind::Text),
];

fn descriptor(name: &str) -> Option<&'static FieldDescriptor> {
    ISSUE_FIELDS.iter().find(|d| d.name == name)
}

/// Falsy check: absent, null, `""`, `false` and numeric zero all count as
/// missing.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

/// Copy of `candidate` holding only recognized fields.
pub fn sanitize(candidate: &Candidate) -> Candidate {
    candidate
        .iter()
        .filter(|(name, _)| descriptor(name).is_some())
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Check a sanitized candidate against [`ISSUE_FIELDS`] and the status
/// enumeration. The first violation wins.
pub fn validate(candidate: &Candidate) -> Result<(), ValidationError> {
    for desc in ISSUE_FIELDS {
        let value = candidate.get(desc.name);
        match desc.requirement {
            Requirement::Required if is_blank(value) => {
                return Err(ValidationError::MissingField { field: desc.name });
            }
            Requirement::Optional if is_unset_optional(value) => continue,
            _ => {}
        }
        if value.is_some_and(|v| !desc.kind.accepts(v)) {
            return Err(ValidationError::WrongType {
                field: desc.name,
                expected: desc.kind,
            });
        }
    }

    match candidate.get("status") {
        Some(Value::String(status)) => IssueStatus::from_str(status).map(|_| ()),
        other => Err(ValidationError::InvalidStatus {
            status: other.map(Value::to_string).unwrap_or_default(),
        }),
    }
}

// Optional fields left empty by a form are treated as not supplied.
fn is_unset_optional(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
        || matches!(value, Some(Value::String(s)) if s.is_empty())
}

/// Sanitize, validate and convert a candidate into a typed [`NewIssue`].
pub fn into_new_issue(candidate: &Candidate) -> Result<NewIssue, ValidationError> {
    let mut cleaned = sanitize(candidate);
    validate(&cleaned)?;

    cleaned.retain(|name, value| {
        let optional = descriptor(name).is_some_and(|d| d.requirement == Requirement::Optional);
        !(optional && is_unset_optional(Some(&*value)))
    });

    serde_json::from_value(Value::Object(cleaned)).map_err(|e| ValidationError::Malformed {
        detail: e.to_string(),
    })
}
