//! # Evalboard - unified view over essay evaluation records
//!
//! Evalboard reconciles two exam schemas into one record shape and derives a
//! filterable, sortable, groupable view with live summary statistics:
//! numeric-score exams (ENEM) and proficiency-level exams (SAEB).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│ Normalizer  │────▶│    View     │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (2 schemas) │     │ filter/sort │
//! └─────────────┘     └─────────────┘     └─────────────┘     │ group/stats │
//!                                                             └──────┬──────┘
//!                                                                    ▼
//!                                                          CSV export / JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evalboard::{load_csv, ViewController};
//! use std::{path::Path, sync::Arc};
//!
//! let loaded = load_csv(Path::new("evaluations.csv"))?;
//! let mut view = ViewController::new(loaded.evaluations.into_iter().map(Arc::new).collect());
//! view.set_city(Some("Recife".into()));
//! println!("{:?}", view.derived().aggregates);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Evaluation, Grade, Field)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Normalizer, aggregator, grouper and pipeline
//! - [`view`] - View state and controller
//! - [`export`] - CSV export
//! - [`config`] - Server configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Interactive view
pub mod view;

// Export
pub mod export;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ExportError, LoadError, PipelineError, ProcessingError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Evaluation, EvaluationMeta, Field, Grade, RawRecord};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_str, ParseResult,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    aggregate, group_rows, load_bytes, load_csv, normalize_dataset, normalize_records,
    normalize_row, Aggregates, CsvInfo, DatasetStats, ExamKind, LoadedDataset, Mixture,
    RowGroup, Summary,
};

// =============================================================================
// Re-exports - View
// =============================================================================

pub use view::{
    default_sort, matches, DerivedView, ExamFilter, FilterKey, FilterOptions, Filters,
    LoadStatus, SortDirection, SortRule, ViewController, ViewState,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{export_file_name, to_csv};

// =============================================================================
// Re-exports - Config / API
// =============================================================================

pub use config::ServerConfig;

pub use api::types::{error_response, UploadResponse, ViewResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
