use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Opaque store-assigned identifier for an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    /// Generate a fresh identifier. Only stores call this.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IssueId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum IssueStatus {
    #[default]
    New,
    Open,
    Assigned,
    Fixed,
    Verified,
    Closed,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 6] = [
        Self::New,
        Self::Open,
        Self::Assigned,
        Self::Fixed,
        Self::Verified,
        Self::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Open => "Open",
            Self::Assigned => "Assigned",
            Self::Fixed => "Fixed",
            Self::Verified => "Verified",
            Self::Closed => "Closed",
        }
    }
}

impl FromStr for IssueStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Open" => Ok(Self::Open),
            "Assigned" => Ok(Self::Assigned),
            "Fixed" => Ok(Self::Fixed),
            "Verified" => Ok(Self::Verified),
            "Closed" => Ok(Self::Closed),
            _ => Err(ValidationError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// A validated issue that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub status: IssueStatus,
    pub owner: String,
    pub title: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
}

/// A persisted issue document. `id` travels as `_id`, the document key the
/// browser UI reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: IssueId,
    pub status: IssueStatus,
    pub owner: String,
    pub title: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
}

impl Issue {
    pub fn from_new(id: IssueId, new: NewIssue) -> Self {
        Self {
            id,
            status: new.status,
            owner: new.owner,
            title: new.title,
            created: new.created,
            effort: new.effort,
            completion_date: new.completion_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMetadata {
    pub total_count: usize,
}

/// Response body of `GET /api/issues`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueList {
    #[serde(rename = "_metadata")]
    pub metadata: ListMetadata,
    pub records: Vec<Issue>,
}

impl From<Vec<Issue>> for IssueList {
    fn from(records: Vec<Issue>) -> Self {
        Self {
            metadata: ListMetadata {
                total_count: records.len(),
            },
            records,
        }
    }
}
