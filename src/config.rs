//! Run configuration for ingestion and reporting.
//!
//! Both structs carry sensible defaults; the CLI overrides individual fields
//! from its flags.
use std::path::PathBuf;

/// Date formats tried, in order, when parsing `Report_Date`.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
];

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub date_formats: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Number of entities kept in each ranking.
    pub top_n: usize,
    /// Rows shown in console previews.
    pub preview_rows: usize,
    pub out_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            preview_rows: 5,
            out_dir: PathBuf::from("reports"),
        }
    }
}
