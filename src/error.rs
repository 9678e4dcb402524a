use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// One or more expected columns are absent from the header row.
    #[error("Schema error: missing column(s) {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Parse error at row {row}, column {column}: {value:?} ({reason})")]
    Parse {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// Non-fatal. Only ever reported through `Derived::warnings`.
    #[error("No population reference for entity {entity:?}")]
    MissingReference { entity: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub fn parse(row: usize, column: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            row,
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error should abort the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MissingReference { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_columns() {
        let err = ReportError::Schema {
            missing: vec!["Country".into(), "Trained_CHWs".into()],
        };
        assert_eq!(
            err.to_string(),
            "Schema error: missing column(s) Country, Trained_CHWs"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_reference_is_not_fatal() {
        let err = ReportError::MissingReference { entity: "Chad".into() };
        assert!(!err.is_fatal());
    }
}
