//! Surveillance report pipeline: ingest country-level mpox surveillance rows,
//! reduce them to the latest observation per country, derive coverage and
//! capacity metrics, and produce the Top-N rankings, KPIs and map layer
//! consumed by a presentation layer.
pub mod charts;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod population;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
pub use loader::{normalize, Dataset};
pub use metrics::{derive, Derived};
pub use population::PopulationTable;
pub use reports::{generate_report, Metric, Report};
