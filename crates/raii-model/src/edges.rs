use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of semantic link a [`ReferenceEdge`] asserts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    CitedInReasoning,
    BuildsOn,
    Supersedes,
    RequiredBy,
}

impl ReferenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceType::CitedInReasoning => "cited_in_reasoning",
            ReferenceType::BuildsOn => "builds_on",
            ReferenceType::Supersedes => "supersedes",
            ReferenceType::RequiredBy => "required_by",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown reference type: {0:?}")]
pub struct InvalidReferenceType(pub String);

impl FromStr for ReferenceType {
    type Err = InvalidReferenceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cited_in_reasoning" => Ok(ReferenceType::CitedInReasoning),
            "builds_on" => Ok(ReferenceType::BuildsOn),
            "supersedes" => Ok(ReferenceType::Supersedes),
            "required_by" => Ok(ReferenceType::RequiredBy),
            other => Err(InvalidReferenceType(other.to_string())),
        }
    }
}

/// A typed, directed task -> chunk edge asserting continued semantic
/// need, independent of the positional ownership relation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceEdge {
    pub source_task_id: String,
    pub target_chunk_id: String,
    pub reference_type: ReferenceType,
    pub created_at: DateTime<Utc>,
}

impl ReferenceEdge {
    pub fn new(source_task_id: impl Into<String>, target_chunk_id: impl Into<String>, reference_type: ReferenceType) -> Self {
        Self {
            source_task_id: source_task_id.into(),
            target_chunk_id: target_chunk_id.into(),
            reference_type,
            created_at: Utc::now(),
        }
    }
}
