//! Reconcile the two source schemas into canonical [`Evaluation`]s.
//!
//! # Source schemas
//!
//! ```text
//! Numeric exams (ENEM)                 Proficiency exams (SAEB)
//! ┌──────────────────────────┐         ┌──────────────────────────────┐
//! │ final_score              │         │ final_level (or final_score) │
//! │ competence_{1..5}_score  │         │ competence_{1..5}_level      │
//! └──────────────────────────┘         └──────────────────────────────┘
//!              │                                      │
//!              └──────────────┬───────────────────────┘
//!                             ▼
//!            Evaluation { final, c1..c5, meta }
//! ```
//!
//! For proficiency exams one competence column is a *verifying* level that
//! corroborates the final level: the 5th for 6th-year classes, the 4th for
//! every other class. It is copied into the grid only when it disagrees with
//! the final level, and any value other than `A` annuls the essay.

use serde_json::Value;

use crate::error::{ProcessingError, ProcessingResult};
use crate::models::{Evaluation, EvaluationMeta, Grade, RawRecord};

/// Substring of `exam_type` identifying proficiency-level exams.
pub const LEVEL_EXAM_MARKER: &str = "saeb";

/// Exact (lower-cased) `exam_type` of numeric-score exams.
pub const NUMERIC_EXAM_MARKER: &str = "enem";

/// Verifying level that keeps an essay valid.
pub const VALID_VERIFYING_LETTER: &str = "A";

/// Ordinal marker spellings following a class-year digit (`6º`, `6o`, `6°`).
pub const ORDINAL_MARKERS: [char; 3] = ['º', 'o', '°'];

/// Which source schema a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamKind {
    /// Numeric 0..N scores.
    Numeric,
    /// Ordinal proficiency levels.
    Level,
}

/// Classify an exam by its category string. Empty categories are numeric.
pub fn classify_exam(exam_type: &str) -> ExamKind {
    if exam_type.trim().to_lowercase().contains(LEVEL_EXAM_MARKER) {
        ExamKind::Level
    } else {
        ExamKind::Numeric
    }
}

/// Whether a class name refers to the given school year (`6º`, `6o` or `6°`).
pub fn has_class_year(class_name: &str, year: u8) -> bool {
    let lowered = class_name.to_lowercase();
    ORDINAL_MARKERS
        .iter()
        .any(|marker| lowered.contains(&format!("{}{}", year, marker)))
}

/// Normalize a whole dataset. Total: never fails, one evaluation per row.
pub fn normalize_dataset(rows: &[RawRecord]) -> Vec<Evaluation> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index, row))
        .collect()
}

/// Structural entry point for parsed rows.
///
/// Rows must be JSON objects (`null` counts as an empty row). Column names
/// are trimmed. Any other shape aborts the whole dataset.
pub fn normalize_records(rows: &[Value]) -> ProcessingResult<Vec<Evaluation>> {
    let records = rows
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            Value::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| (k.trim().to_string(), v.clone()))
                .collect::<RawRecord>()),
            Value::Null => Ok(RawRecord::new()),
            other => Err(ProcessingError::NotARecord {
                row,
                found: value_kind(other),
            }),
        })
        .collect::<ProcessingResult<Vec<_>>>()?;

    Ok(normalize_dataset(&records))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalize one row. `index` is the row position in the dataset.
pub fn normalize_row(index: usize, row: &RawRecord) -> Evaluation {
    let id = match text_of(row, "student_id") {
        Some(student_id) => format!("{}_{}", student_id, index),
        None => format!("row_{}", index),
    };

    let exam_type = text_of(row, "exam_type").unwrap_or_default();
    let class_name = text_of(row, "class_name").unwrap_or_default();
    let kind = classify_exam(&exam_type);

    let mut evaluation = Evaluation {
        id,
        city_name: text_of(row, "city_name").unwrap_or_default(),
        school_name: text_of(row, "school_name").unwrap_or_default(),
        class_name,
        student_name: text_of(row, "student_name").unwrap_or_default(),
        exam_type,
        essay_date: text_of(row, "essay_date").unwrap_or_default(),
        final_grade: None,
        c1: None,
        c2: None,
        c3: None,
        c4: None,
        c5: None,
        meta: EvaluationMeta {
            is_numeric: kind == ExamKind::Numeric,
            verifying_letter: None,
            is_annulled: false,
        },
    };

    match kind {
        ExamKind::Numeric => apply_score_columns(&mut evaluation, row),
        ExamKind::Level => apply_level_columns(&mut evaluation, row),
    }

    evaluation
}

fn apply_score_columns(evaluation: &mut Evaluation, row: &RawRecord) {
    evaluation.final_grade = grade_of(row, "final_score");
    evaluation.c1 = grade_of(row, "competence_1_score");
    evaluation.c2 = grade_of(row, "competence_2_score");
    evaluation.c3 = grade_of(row, "competence_3_score");
    evaluation.c4 = grade_of(row, "competence_4_score");
    evaluation.c5 = grade_of(row, "competence_5_score");
}

fn apply_level_columns(evaluation: &mut Evaluation, row: &RawRecord) {
    let final_grade = grade_of(row, "final_level").or_else(|| grade_of(row, "final_score"));

    evaluation.c1 = grade_of(row, "competence_1_level");
    evaluation.c2 = grade_of(row, "competence_2_level");
    evaluation.c3 = grade_of(row, "competence_3_level");

    let verifying = if has_class_year(&evaluation.class_name, 6) {
        evaluation.c4 = grade_of(row, "competence_4_level");
        let verifying = grade_of(row, "competence_5_level");
        if verifying != final_grade {
            evaluation.c5 = verifying.clone();
        }
        verifying
    } else {
        let verifying = grade_of(row, "competence_4_level");
        if verifying != final_grade {
            evaluation.c4 = verifying.clone();
        }
        evaluation.c5 = None;
        verifying
    };

    let verifying_letter = verifying.or_else(|| final_grade.clone());
    evaluation.meta.is_annulled = verifying_letter
        .as_ref()
        .is_some_and(|letter| *letter != Grade::text(VALID_VERIFYING_LETTER));
    evaluation.meta.verifying_letter = verifying_letter;
    evaluation.final_grade = final_grade;
}

/// Text cell; numbers and booleans are rendered, null and "" are absent.
fn text_of(row: &RawRecord, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        }),
        other => Some(other.to_string()),
    }
}

/// Grade cell; numbers stay numeric, everything else is text.
fn grade_of(row: &RawRecord, key: &str) -> Option<Grade> {
    match row.get(key)? {
        Value::Number(n) => n.as_f64().map(Grade::Number),
        _ => text_of(row, key).map(Grade::Text),
    }
}
