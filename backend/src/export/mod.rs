//! CSV export of the rows currently in view.

use chrono::NaiveDate;
use serde::Serialize;
use std::borrow::Borrow;

use crate::error::{ExportError, ExportResult};
use crate::models::{Evaluation, Grade};

/// One exported line. Field order is the column order.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    city_name: &'a str,
    school_name: &'a str,
    class_name: &'a str,
    student_name: &'a str,
    exam_type: &'a str,
    essay_date: &'a str,
    #[serde(rename = "final")]
    final_grade: Option<String>,
    c1: Option<String>,
    c2: Option<String>,
    c3: Option<String>,
    c4: Option<String>,
    c5: Option<String>,
    is_numeric: bool,
    verifying_letter: Option<String>,
    is_annulled: bool,
}

impl<'a> From<&'a Evaluation> for ExportRow<'a> {
    fn from(e: &'a Evaluation) -> Self {
        let cell = |g: &Option<Grade>| g.as_ref().map(Grade::to_string);
        Self {
            id: &e.id,
            city_name: &e.city_name,
            school_name: &e.school_name,
            class_name: &e.class_name,
            student_name: &e.student_name,
            exam_type: &e.exam_type,
            essay_date: &e.essay_date,
            final_grade: cell(&e.final_grade),
            c1: cell(&e.c1),
            c2: cell(&e.c2),
            c3: cell(&e.c3),
            c4: cell(&e.c4),
            c5: cell(&e.c5),
            is_numeric: e.meta.is_numeric,
            verifying_letter: cell(&e.meta.verifying_letter),
            is_annulled: e.meta.is_annulled,
        }
    }
}

/// Serialize rows to CSV in the given order.
pub fn to_csv<R: Borrow<Evaluation>>(rows: &[R]) -> ExportResult<String> {
    if rows.is_empty() {
        return Err(ExportError::NoRows);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(ExportRow::from(row.borrow()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;

    Ok(String::from_utf8(bytes)?)
}

/// `evaluations_export_YYYY-MM-DD.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("evaluations_export_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::evaluation;

    #[test]
    fn test_empty_rows_rejected() {
        let rows: Vec<Evaluation> = Vec::new();
        assert!(matches!(to_csv(&rows), Err(ExportError::NoRows)));
    }

    #[test]
    fn test_header_and_rows() {
        let mut numeric = evaluation("S1_0");
        numeric.city_name = "Recife".into();
        numeric.student_name = "Silva, Ana".into();
        numeric.final_grade = Some(Grade::Number(720.0));
        numeric.c1 = Some(Grade::Number(160.0));

        let mut level = evaluation("row_1");
        level.meta.is_numeric = false;
        level.final_grade = Some(Grade::text("B"));
        level.meta.verifying_letter = Some(Grade::text("C"));
        level.meta.is_annulled = true;

        let csv = to_csv(&[numeric, level]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "id,city_name,school_name,class_name,student_name,exam_type,essay_date,final,c1,c2,c3,c4,c5,is_numeric,verifying_letter,is_annulled"
        );
        assert_eq!(lines[1], "S1_0,Recife,,,\"Silva, Ana\",,,720,160,,,,,true,,false");
        assert_eq!(lines[2], "row_1,,,,,,,B,,,,,,false,C,true");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "evaluations_export_2024-03-07.csv");
    }
}
