//! REST API types for frontend integration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::Evaluation;
use crate::transform::aggregator::Aggregates;
use crate::transform::grouper::RowGroup;
use crate::transform::pipeline::{DatasetStats, LoadedDataset};
use crate::view::{ExamFilter, FilterOptions, SortRule, ViewController};

/// Response sent after a CSV upload replaced the dataset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Identifier of the dataset now being served
    pub dataset_id: String,

    /// "ready" or "warning" (annulled essays present)
    pub status: String,

    pub total: usize,

    pub csv_info: CsvMetadata,

    pub stats: DatasetStats,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl UploadResponse {
    pub fn new(dataset_id: String, loaded: &LoadedDataset) -> Self {
        let info = &loaded.csv_info;
        UploadResponse {
            dataset_id,
            status: if loaded.stats.annulled == 0 { "ready" } else { "warning" }.to_string(),
            total: loaded.evaluations.len(),
            csv_info: CsvMetadata {
                encoding: info.encoding.clone(),
                delimiter: info.delimiter.to_string(),
                row_count: info.row_count,
                columns: info.headers.clone(),
            },
            stats: loaded.stats.clone(),
        }
    }
}

/// Derived view returned by `POST /api/view`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub dataset_id: Option<String>,
    /// Rows in the dataset
    pub total: usize,
    /// Rows passing the filters
    pub visible: usize,
    pub sort: Vec<SortRule>,
    pub groups: Vec<RowGroup<Arc<Evaluation>>>,
    pub aggregates: Aggregates,
    pub options: FilterOptions,
    pub exam_choices: Vec<ExamFilter>,
}

impl ViewResponse {
    pub fn new(dataset_id: Option<String>, controller: &ViewController) -> Self {
        let derived = controller.derived();
        ViewResponse {
            dataset_id,
            total: controller.dataset().len(),
            visible: derived.sorted.len(),
            sort: controller.state().sort.clone(),
            groups: derived.groups.clone(),
            aggregates: derived.aggregates.clone(),
            options: derived.options.clone(),
            exam_choices: ExamFilter::choices(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}
