//! High-level entry points: CSV source → canonical evaluations.
//!
//! Combines parsing and normalization, and reports progress on the log
//! stream. A failure at either step yields no dataset at all.
//!
//! # Example
//!
//! ```rust,ignore
//! use evalboard::transform::pipeline::load_csv;
//! use std::path::Path;
//!
//! let loaded = load_csv(Path::new("evaluations.csv"))?;
//! println!("{} evaluations ({} annulled)", loaded.evaluations.len(), loaded.stats.annulled);
//! ```

use serde::Serialize;
use std::path::Path;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::PipelineResult;
use crate::models::Evaluation;
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, ParseResult};
use super::normalizer::normalize_records;

/// CSV file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Record kind counts for a freshly loaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub numeric: usize,
    pub level: usize,
    pub annulled: usize,
}

impl DatasetStats {
    pub fn from_evaluations(evaluations: &[Evaluation]) -> Self {
        let numeric = evaluations.iter().filter(|e| e.meta.is_numeric).count();
        Self {
            numeric,
            level: evaluations.len() - numeric,
            annulled: evaluations.iter().filter(|e| e.meta.is_annulled).count(),
        }
    }
}

/// Result of a complete load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedDataset {
    /// Canonical evaluations, one per data row
    pub evaluations: Vec<Evaluation>,
    /// CSV parsing metadata
    pub csv_info: CsvInfo,
    /// Kind counts
    pub stats: DatasetStats,
}

/// Load and normalize a CSV file.
pub fn load_csv(path: &Path) -> PipelineResult<LoadedDataset> {
    log_info(format!("📖 Reading {}", path.display()));
    let parse_result = parse_csv_file_auto(path)?;
    normalize_parsed(parse_result)
}

/// Load and normalize CSV bytes (uploads).
pub fn load_bytes(bytes: &[u8]) -> PipelineResult<LoadedDataset> {
    log_info(format!("📖 Reading {} bytes", bytes.len()));
    let parse_result = parse_bytes_auto(bytes)?;
    normalize_parsed(parse_result)
}

fn normalize_parsed(parse_result: ParseResult) -> PipelineResult<LoadedDataset> {
    log_success(format!("Detected encoding: {}", parse_result.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parse_result.delimiter)));
    log_success(format!("Read {} rows", parse_result.records.len()));

    let csv_info = CsvInfo {
        encoding: parse_result.encoding.clone(),
        delimiter: parse_result.delimiter,
        headers: parse_result.headers.clone(),
        row_count: parse_result.records.len(),
    };

    let missing: Vec<&str> = EXPECTED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !csv_info.headers.iter().any(|h| h == col))
        .collect();
    if !missing.is_empty() {
        log_warning(format!("Columns not found (treated as empty): {}", missing.join(", ")));
    }

    log_info("⚙️  Normalizing evaluations...");
    let evaluations = normalize_records(&parse_result.records)?;
    let stats = DatasetStats::from_evaluations(&evaluations);
    log_success(format!(
        "{} evaluations ({} numeric, {} level, {} annulled)",
        evaluations.len(),
        stats.numeric,
        stats.level,
        stats.annulled
    ));

    Ok(LoadedDataset {
        evaluations,
        csv_info,
        stats,
    })
}

/// Columns the normalizer reads. Both exam schemas share one file layout.
pub const EXPECTED_COLUMNS: [&str; 9] = [
    "city_name",
    "school_name",
    "class_name",
    "student_name",
    "student_id",
    "exam_type",
    "essay_date",
    "final_score",
    "final_level",
];

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
