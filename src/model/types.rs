use crate::error::{CheckgateError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Severity {
    type Err = CheckgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(CheckgateError::InvalidArgument(format!(
                "Invalid severity: {}",
                s
            ))),
        }
    }
}

/// The kind of artifact an execution evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Story,
    Epic,
    Prd,
    Architecture,
    Code,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 5] = [
        ArtifactType::Story,
        ArtifactType::Epic,
        ArtifactType::Prd,
        ArtifactType::Architecture,
        ArtifactType::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Story => "story",
            ArtifactType::Epic => "epic",
            ArtifactType::Prd => "prd",
            ArtifactType::Architecture => "architecture",
            ArtifactType::Code => "code",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = CheckgateError;

    fn from_str(s: &str) -> Result<Self> {
        ArtifactType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CheckgateError::InvalidArgument(format!(
                    "Invalid artifact_type '{}'. Must be one of: {}",
                    s,
                    ArtifactType::ALL.map(|t| t.as_str()).join(", ")
                ))
            })
    }
}

/// Outcome of a single checklist item within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pass,
    Fail,
    Skip,
    Na,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Pass,
        ItemStatus::Fail,
        ItemStatus::Skip,
        ItemStatus::Na,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pass => "pass",
            ItemStatus::Fail => "fail",
            ItemStatus::Skip => "skip",
            ItemStatus::Na => "na",
        }
    }

    /// Whether a result with this status must carry explanatory notes.
    pub fn requires_notes(&self) -> bool {
        matches!(self, ItemStatus::Fail | ItemStatus::Skip)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = CheckgateError;

    fn from_str(s: &str) -> Result<Self> {
        ItemStatus::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CheckgateError::InvalidArgument(format!(
                    "Invalid status '{}'. Must be one of: {}",
                    s,
                    ItemStatus::ALL.map(|t| t.as_str()).join(", ")
                ))
            })
    }
}

/// Aggregate status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    InProgress,
    Pass,
    Fail,
    Partial,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::InProgress => "in_progress",
            ExecutionStatus::Pass => "pass",
            ExecutionStatus::Fail => "fail",
            ExecutionStatus::Partial => "partial",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::InProgress)
    }

    /// Derives the terminal status from a set of item outcomes.
    ///
    /// Any failure fails the execution. Otherwise a single pass is enough to
    /// pass; an execution made only of skipped or not-applicable items is
    /// partial. An empty set has no status.
    pub fn derive(statuses: &[ItemStatus]) -> Option<ExecutionStatus> {
        if statuses.is_empty() {
            return None;
        }
        if statuses.contains(&ItemStatus::Fail) {
            return Some(ExecutionStatus::Fail);
        }
        if statuses.contains(&ItemStatus::Pass) {
            return Some(ExecutionStatus::Pass);
        }
        Some(ExecutionStatus::Partial)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = CheckgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in_progress" => Ok(ExecutionStatus::InProgress),
            "pass" => Ok(ExecutionStatus::Pass),
            "fail" => Ok(ExecutionStatus::Fail),
            "partial" => Ok(ExecutionStatus::Partial),
            _ => Err(CheckgateError::Parse(format!(
                "Invalid execution status: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ItemStatus::*;

    #[test]
    fn test_derive_status_table() {
        assert_eq!(ExecutionStatus::derive(&[Pass, Pass]), Some(ExecutionStatus::Pass));
        assert_eq!(ExecutionStatus::derive(&[Pass, Fail]), Some(ExecutionStatus::Fail));
        assert_eq!(ExecutionStatus::derive(&[Skip, Na]), Some(ExecutionStatus::Partial));
        assert_eq!(
            ExecutionStatus::derive(&[Pass, Skip, Fail]),
            Some(ExecutionStatus::Fail)
        );
        assert_eq!(ExecutionStatus::derive(&[Na, Pass]), Some(ExecutionStatus::Pass));
        assert_eq!(ExecutionStatus::derive(&[]), None);
    }

    #[test]
    fn test_artifact_type_rejects_unknown() {
        assert_eq!("prd".parse::<ArtifactType>().unwrap(), ArtifactType::Prd);
        let err = "ticket".parse::<ArtifactType>().unwrap_err();
        assert!(matches!(err, CheckgateError::InvalidArgument(_)));
        assert!(err.to_string().contains("story, epic, prd"));
    }

    #[test]
    fn test_item_status_requires_notes() {
        assert!(Fail.requires_notes());
        assert!(Skip.requires_notes());
        assert!(!Pass.requires_notes());
        assert!(!Na.requires_notes());
    }

    #[test]
    fn test_severity_from_str_case_insensitive() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert!("urgent".parse::<Severity>().is_err());
    }
}
