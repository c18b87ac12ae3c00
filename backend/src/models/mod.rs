//! Domain models for the Evalboard pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`RawRecord`] - One imported row, column name → loosely typed value
//! - [`Grade`] - A score (numeric exams) or a level (proficiency exams)
//! - [`Evaluation`] - Canonical, immutable evaluation record
//! - [`EvaluationMeta`] - Provenance flags computed at normalization time
//! - [`Field`] - Column selector used for sorting, grouping and aggregates

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A raw imported row. Column names are trimmed before normalization.
pub type RawRecord = Map<String, Value>;

// =============================================================================
// Grade
// =============================================================================

/// A score or level cell.
///
/// Numeric exams carry numbers, proficiency exams carry letter levels.
/// A number never equals its textual spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Grade {
    /// Numeric score.
    Number(f64),
    /// Level or any other textual value.
    Text(String),
}

impl Grade {
    /// Numeric value, parsing text the way a spreadsheet would.
    ///
    /// Unparsable text yields `NaN`.
    pub fn as_number(&self) -> f64 {
        match self {
            Grade::Number(n) => *n,
            Grade::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// Whether this is the `-` placeholder some sources use for "no value".
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Grade::Text(s) if s.is_empty() || s == "-")
    }

    /// Text grade with the given value.
    pub fn text(value: impl Into<String>) -> Self {
        Grade::Text(value.into())
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display already renders 80.0 as "80"
            Grade::Number(n) => write!(f, "{}", n),
            Grade::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Grade {
    fn from(value: f64) -> Self {
        Grade::Number(value)
    }
}

impl From<&str> for Grade {
    fn from(value: &str) -> Self {
        Grade::Text(value.to_string())
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Provenance metadata attached to every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMeta {
    /// True for numeric-score exams, false for proficiency-level exams.
    /// Set once by the normalizer; every downstream branch reads this flag.
    pub is_numeric: bool,
    /// Level used to corroborate the final level (level exams only).
    pub verifying_letter: Option<Grade>,
    /// Verifying level present and different from the valid marker.
    pub is_annulled: bool,
}

/// Canonical evaluation record. Created once per raw row, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: String,
    pub city_name: String,
    pub school_name: String,
    pub class_name: String,
    pub student_name: String,
    pub exam_type: String,
    /// Kept verbatim; the month is the first seven characters.
    pub essay_date: String,
    #[serde(rename = "final")]
    pub final_grade: Option<Grade>,
    pub c1: Option<Grade>,
    pub c2: Option<Grade>,
    pub c3: Option<Grade>,
    pub c4: Option<Grade>,
    pub c5: Option<Grade>,
    pub meta: EvaluationMeta,
}

impl Evaluation {
    /// Grade stored in a score/level field. `None` for text columns.
    pub fn grade(&self, field: Field) -> Option<&Grade> {
        match field {
            Field::Final => self.final_grade.as_ref(),
            Field::C1 => self.c1.as_ref(),
            Field::C2 => self.c2.as_ref(),
            Field::C3 => self.c3.as_ref(),
            Field::C4 => self.c4.as_ref(),
            Field::C5 => self.c5.as_ref(),
            _ => None,
        }
    }

    /// Textual value of any field; absent values render as an empty string.
    pub fn text(&self, field: Field) -> String {
        match field {
            Field::Id => self.id.clone(),
            Field::CityName => self.city_name.clone(),
            Field::SchoolName => self.school_name.clone(),
            Field::ClassName => self.class_name.clone(),
            Field::StudentName => self.student_name.clone(),
            Field::ExamType => self.exam_type.clone(),
            Field::EssayDate => self.essay_date.clone(),
            grade => self.grade(grade).map(Grade::to_string).unwrap_or_default(),
        }
    }

    /// Year-month prefix of the essay date (`YYYY-MM`), empty when absent.
    pub fn month(&self) -> String {
        self.essay_date.chars().take(7).collect()
    }
}

// =============================================================================
// Field
// =============================================================================

/// Column selector over [`Evaluation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    CityName,
    SchoolName,
    ClassName,
    StudentName,
    ExamType,
    EssayDate,
    Final,
    C1,
    C2,
    C3,
    C4,
    C5,
}

impl Field {
    /// All columns in display order.
    pub const ALL: [Field; 13] = [
        Field::Id,
        Field::CityName,
        Field::SchoolName,
        Field::ClassName,
        Field::StudentName,
        Field::ExamType,
        Field::EssayDate,
        Field::Final,
        Field::C1,
        Field::C2,
        Field::C3,
        Field::C4,
        Field::C5,
    ];

    /// Score/level columns.
    pub const GRADES: [Field; 6] = [
        Field::Final,
        Field::C1,
        Field::C2,
        Field::C3,
        Field::C4,
        Field::C5,
    ];

    /// Column name as used in exports and on the API.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::CityName => "city_name",
            Field::SchoolName => "school_name",
            Field::ClassName => "class_name",
            Field::StudentName => "student_name",
            Field::ExamType => "exam_type",
            Field::EssayDate => "essay_date",
            Field::Final => "final",
            Field::C1 => "c1",
            Field::C2 => "c2",
            Field::C3 => "c3",
            Field::C4 => "c4",
            Field::C5 => "c5",
        }
    }

    pub fn is_grade(&self) -> bool {
        Self::GRADES.contains(self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.key() == normalized)
            .ok_or_else(|| format!("Unknown field: {}", s))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builder used by tests across the crate.
    pub(crate) fn evaluation(id: &str) -> Evaluation {
        Evaluation {
            id: id.to_string(),
            city_name: String::new(),
            school_name: String::new(),
            class_name: String::new(),
            student_name: String::new(),
            exam_type: String::new(),
            essay_date: String::new(),
            final_grade: None,
            c1: None,
            c2: None,
            c3: None,
            c4: None,
            c5: None,
            meta: EvaluationMeta {
                is_numeric: true,
                verifying_letter: None,
                is_annulled: false,
            },
        }
    }

    #[test]
    fn test_grade_display() {
        assert_eq!(Grade::Number(80.0).to_string(), "80");
        assert_eq!(Grade::Number(7.5).to_string(), "7.5");
        assert_eq!(Grade::text("B").to_string(), "B");
    }

    #[test]
    fn test_grade_number_never_equals_text() {
        assert_ne!(Grade::Number(5.0), Grade::text("5"));
        assert_eq!(Grade::text("A"), Grade::from("A"));
    }

    #[test]
    fn test_grade_as_number() {
        assert_eq!(Grade::text(" 120 ").as_number(), 120.0);
        assert!(Grade::text("B").as_number().is_nan());
    }

    #[test]
    fn test_field_parse_roundtrip() {
        for field in Field::ALL {
            assert_eq!(field.key().parse::<Field>(), Ok(field));
        }
        assert_eq!(" City_Name ".parse::<Field>(), Ok(Field::CityName));
        assert!("grade".parse::<Field>().is_err());
    }

    #[test]
    fn test_text_and_month() {
        let mut e = evaluation("s1_0");
        e.essay_date = "2023-07-15T10:00:00".into();
        e.final_grade = Some(Grade::Number(720.0));

        assert_eq!(e.month(), "2023-07");
        assert_eq!(e.text(Field::Final), "720");
        assert_eq!(e.text(Field::C1), "");
        assert_eq!(e.text(Field::Id), "s1_0");
    }

    #[test]
    fn test_evaluation_serialization_uses_column_names() {
        let mut e = evaluation("row_0");
        e.final_grade = Some(Grade::text("B"));
        let json = serde_json::to_value(&e).unwrap();

        assert_eq!(json["final"], "B");
        assert_eq!(json["c5"], Value::Null);
        assert_eq!(json["meta"]["is_numeric"], true);
    }
}
