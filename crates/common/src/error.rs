//! Error types for BuildProbe test-data handling

use thiserror::Error;

use crate::types::EntityCategory;

/// Result type alias using the BuildProbe common error
pub type Result<T> = std::result::Result<T, Error>;

/// A single deletion that failed while draining a creation ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionFailure {
    pub category: EntityCategory,
    pub id: String,
    pub reason: String,
}

/// A single field whose request and response values differ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Field {shape}.{field} expects {expected}, got {found}")]
    FieldType {
        shape: &'static str,
        field: &'static str,
        expected: String,
        found: &'static str,
    },

    #[error("Cleanup failed for {} entities:\n{}", .0.len(), format_failures(.0))]
    Cleanup(Vec<DeletionFailure>),

    #[error("Model comparison failed with mismatched fields:\n{}", format_mismatches(.0))]
    Comparison(Vec<Mismatch>),

    #[error("No comparison rule found for {0}")]
    MissingComparisonRule(String),

    #[error("Field not found: {field} in {model}")]
    MissingModelField { model: String, field: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

fn format_failures(failures: &[DeletionFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("- {} {}: {}", f.category, f.id, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_mismatches(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(|m| format!("- {}: expected={}, actual={}", m.field, m.expected, m.actual))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_error_lists_every_failure() {
        let err = Error::Cleanup(vec![
            DeletionFailure {
                category: EntityCategory::BuildTypes,
                id: "bt1".to_string(),
                reason: "not found".to_string(),
            },
            DeletionFailure {
                category: EntityCategory::Projects,
                id: "p1".to_string(),
                reason: "connection reset".to_string(),
            },
        ]);

        let message = err.to_string();
        assert!(message.starts_with("Cleanup failed for 2 entities"));
        assert!(message.contains("- buildTypes bt1: not found"));
        assert!(message.contains("- projects p1: connection reset"));
    }
}
