//! Error types for encoding and decoding ACH files.

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, NachaError>;

/// Errors that can occur while packing, parsing or writing ACH records.
#[derive(Error, Debug)]
pub enum NachaError {
    /// A single field failed to pack or unpack
    #[error("{field} value {value:?} {reason}")]
    FieldValidation {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field was never assigned
    #[error("{field} value is missing")]
    MissingField { field: String },

    /// A line could not be classified or loaded
    #[error("{source_name}:{line}: {reason}")]
    Malformed {
        source_name: String,
        line: usize,
        reason: String,
    },

    /// Writer scopes opened or closed out of nesting order
    #[error("context error: {0}")]
    Context(String),

    /// A caller argument that is structurally invalid
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Failed to read from or write to the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: nacha <file.ach>")]
    MissingArgument,
}

impl NachaError {
    pub(crate) fn field(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        NachaError::FieldValidation {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Prefixes the field name of a field-level error with its record name.
    pub(crate) fn in_record(self, record: &str) -> Self {
        match self {
            NachaError::FieldValidation {
                field,
                value,
                reason,
            } => NachaError::FieldValidation {
                field: format!("{}.{}", record, field),
                value,
                reason,
            },
            NachaError::MissingField { field } => NachaError::MissingField {
                field: format!("{}.{}", record, field),
            },
            other => other,
        }
    }

    /// Returns `true` for errors raised by a single field.
    pub fn is_field_error(&self) -> bool {
        matches!(
            self,
            NachaError::FieldValidation { .. } | NachaError::MissingField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = NachaError::MissingField {
            field: "immediate_origin".to_string(),
        }
        .in_record("FileHeader");
        assert_eq!(err.to_string(), "FileHeader.immediate_origin value is missing");
    }

    #[test]
    fn test_malformed_message_cites_line() {
        let err = NachaError::Malformed {
            source_name: "sample.ach".to_string(),
            line: 3,
            reason: "unknown record type '0'".to_string(),
        };
        assert_eq!(err.to_string(), "sample.ach:3: unknown record type '0'");
    }

    #[test]
    fn test_in_record_leaves_other_errors_alone() {
        let err = NachaError::Context("no file open".to_string()).in_record("FileHeader");
        assert!(matches!(err, NachaError::Context(_)));
        assert!(!err.is_field_error());
    }
}
