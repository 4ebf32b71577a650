//! Error taxonomy for the tabular transform.
//!
//! Two layers, per the partial-failure contract:
//! - [`TransformError`] — conditions that abort a run (unreadable input,
//!   unparseable Turtle, a tabular file whose rows cannot be attributed
//!   to entities).
//! - [`Defect`] — per-entity conditions (unknown type, malformed
//!   restriction, invalid row). The affected entity is skipped, the
//!   defect is recorded in the run summary, and every other entity still
//!   produces output.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Fatal error conditions. Anything here aborts the run before output is
/// produced.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// The tabular file is structurally broken: wrong header, or a record
    /// whose shape prevents attributing it to any entity.
    #[error("malformed tabular file: {0}")]
    Tabular(String),

    #[error("failed to serialize graph: {0}")]
    Serialize(String),
}

/// Classification of a recorded, non-fatal defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// No recognized `rdf:type` for a subject and no caller-supplied
    /// default entity kind.
    UnknownEntityType,
    /// A restriction blank node missing `owl:onProperty`, a quantifier,
    /// or a filler.
    MalformedRestriction,
    /// A tabular row violating the per-entity invariants.
    InvalidRow,
}

impl DefectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DefectKind::UnknownEntityType => "unknown_entity_type",
            DefectKind::MalformedRestriction => "malformed_restriction",
            DefectKind::InvalidRow => "invalid_row",
        }
    }
}

/// One recorded defect: which entity, which row (for import), and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Defect {
    pub kind: DefectKind,
    /// Rendered identifier of the affected entity.
    pub entity: String,
    /// 1-based data row number in the tabular file, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub reason: String,
}

impl Defect {
    pub fn unknown_entity_type(entity: impl Into<String>) -> Self {
        Self {
            kind: DefectKind::UnknownEntityType,
            entity: entity.into(),
            row: None,
            reason: "no recognized rdf:type".to_string(),
        }
    }

    pub fn malformed_restriction(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: DefectKind::MalformedRestriction,
            entity: entity.into(),
            row: None,
            reason: reason.into(),
        }
    }

    pub fn invalid_row(entity: impl Into<String>, row: usize, reason: impl Into<String>) -> Self {
        Self {
            kind: DefectKind::InvalidRow,
            entity: entity.into(),
            row: Some(row),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(
                f,
                "[{}] {} (row {}): {}",
                self.kind.as_str(),
                self.entity,
                row,
                self.reason
            ),
            None => write!(f, "[{}] {}: {}", self.kind.as_str(), self.entity, self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defect_display_carries_row_number() {
        let defect = Defect::invalid_row("dcc:Sensor", 7, "status=deprecated without replaced_by");
        let text = defect.to_string();
        assert!(text.contains("row 7"));
        assert!(text.contains("dcc:Sensor"));
        assert!(text.contains("invalid_row"));
    }

    #[test]
    fn defect_display_without_row() {
        let defect = Defect::unknown_entity_type("https://ptb.de/x");
        assert!(!defect.to_string().contains("row"));
    }
}
