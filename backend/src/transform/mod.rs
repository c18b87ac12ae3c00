//! Transformation module.
//!
//! This module turns imported rows into canonical evaluations and derives
//! statistics from them:
//! - Normalizer: two source schemas → one `Evaluation` shape
//! - Aggregator: mixture-dependent summary statistics
//! - Grouper: sorted rows → display groups
//! - Pipeline: CSV → normalized dataset

pub mod aggregator;
pub mod grouper;
pub mod normalizer;
pub mod pipeline;

pub use aggregator::{aggregate, Aggregates, Mixture, Summary};
pub use grouper::{group_rows, RowGroup};
pub use normalizer::{normalize_dataset, normalize_records, normalize_row, ExamKind};
pub use pipeline::{load_bytes, load_csv, CsvInfo, DatasetStats, LoadedDataset};
