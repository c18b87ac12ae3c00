//! Summary statistics over the rows currently in view.
//!
//! Metadata columns get distinct counts and the essay dates a month span.
//! Grade columns depend on which exam kinds are present in the input:
//!
//! | Rows present          | Label   | Value                              |
//! |-----------------------|---------|------------------------------------|
//! | numeric and level     | `Mixed` | `-`                                |
//! | numeric only          | `Avg`   | rounded arithmetic mean            |
//! | level only            | `Mode`  | most frequent value, first wins    |
//! | no value in the field | `-`     | `-`                                |

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{Evaluation, Field, Grade};

/// Placeholder for "no statistic".
pub const PLACEHOLDER: &str = "-";

/// One summary cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub label: String,
    pub value: String,
}

impl Summary {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    fn empty() -> Self {
        Self::new(PLACEHOLDER, PLACEHOLDER)
    }
}

/// Summary per field. Empty for an empty input.
pub type Aggregates = BTreeMap<Field, Summary>;

/// Composition of the exam kinds in a row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mixture {
    /// Only numeric-score rows: grades are averaged.
    Numeric,
    /// Only proficiency-level rows: grades use the mode.
    Level,
    /// Both kinds: grades are not comparable.
    Mixed,
}

impl Mixture {
    /// Scan `meta.is_numeric` once. `None` for an empty input.
    pub fn of<R: Borrow<Evaluation>>(rows: &[R]) -> Option<Self> {
        let has_numeric = rows.iter().any(|r| r.borrow().meta.is_numeric);
        let has_level = rows.iter().any(|r| !r.borrow().meta.is_numeric);

        match (has_numeric, has_level) {
            (true, true) => Some(Mixture::Mixed),
            (true, false) => Some(Mixture::Numeric),
            (false, true) => Some(Mixture::Level),
            (false, false) => None,
        }
    }
}

/// Compute every summary for the given rows.
pub fn aggregate<R: Borrow<Evaluation>>(rows: &[R]) -> Aggregates {
    let mut res = Aggregates::new();
    let Some(mixture) = Mixture::of(rows) else {
        return res;
    };

    res.insert(
        Field::CityName,
        Summary::new("Cities", count_distinct(rows, Field::CityName).to_string()),
    );
    res.insert(
        Field::SchoolName,
        Summary::new("Schools", count_distinct(rows, Field::SchoolName).to_string()),
    );
    res.insert(
        Field::ClassName,
        Summary::new("Classes", count_distinct(rows, Field::ClassName).to_string()),
    );
    res.insert(
        Field::ExamType,
        Summary::new("Exams", count_distinct(rows, Field::ExamType).to_string()),
    );
    res.insert(Field::StudentName, Summary::new("Students", count_students(rows).to_string()));
    res.insert(Field::EssayDate, date_range(rows));

    for field in Field::GRADES {
        let values: Vec<&Grade> = rows
            .iter()
            .filter_map(|r| r.borrow().grade(field))
            .filter(|g| !g.is_placeholder())
            .collect();

        let summary = if values.is_empty() {
            Summary::empty()
        } else {
            match mixture {
                Mixture::Mixed => Summary::new("Mixed", PLACEHOLDER),
                Mixture::Numeric => Summary::new("Avg", average(&values)),
                Mixture::Level => Summary::new("Mode", mode(&values)),
            }
        };
        res.insert(field, summary);
    }

    res
}

/// Distinct non-empty values of a text column.
pub fn count_distinct<R: Borrow<Evaluation>>(rows: &[R], field: Field) -> usize {
    rows.iter()
        .map(|r| r.borrow().text(field))
        .filter(|v| !v.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

/// Distinct student names, ignoring case.
pub fn count_students<R: Borrow<Evaluation>>(rows: &[R]) -> usize {
    rows.iter()
        .map(|r| r.borrow().student_name.to_lowercase())
        .filter(|v| !v.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

/// Month span between the earliest and latest parseable essay date.
pub fn date_range<R: Borrow<Evaluation>>(rows: &[R]) -> Summary {
    let dates: Vec<NaiveDate> = rows
        .iter()
        .filter_map(|r| parse_essay_date(&r.borrow().essay_date))
        .collect();

    match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => {
            let months = (max.year() - min.year()) * 12 + (max.month() as i32 - min.month() as i32);
            Summary::new("Range", format!("{} mths", months))
        }
        _ => Summary::new("Range", PLACEHOLDER),
    }
}

/// Parse the date part of an essay date. Day of month is kept but unused by the span.
pub fn parse_essay_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, format) {
            return Some(d);
        }
    }
    // Year-month only
    NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d").ok()
}

/// Arithmetic mean rounded to a whole number.
fn average(values: &[&Grade]) -> String {
    let sum: f64 = values.iter().map(|g| g.as_number()).sum();
    let avg = (sum / values.len() as f64).round();
    if avg == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{:.0}", avg)
}

/// Most frequent value compared as text; the first value to reach the top count wins.
fn mode(values: &[&Grade]) -> String {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut max_count = 0;
    let mut mode = PLACEHOLDER.to_string();

    for value in values {
        let key = value.to_string();
        let count = counts.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count > max_count {
            max_count = *count;
            mode = key;
        }
    }

    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::evaluation;

    fn numeric(final_score: f64) -> Evaluation {
        let mut e = evaluation("n");
        e.final_grade = Some(Grade::Number(final_score));
        e
    }

    fn level(final_level: &str) -> Evaluation {
        let mut e = evaluation("l");
        e.meta.is_numeric = false;
        e.final_grade = Some(Grade::text(final_level));
        e
    }

    #[test]
    fn test_empty_input_gives_empty_map() {
        let rows: Vec<Evaluation> = Vec::new();
        assert!(aggregate(&rows).is_empty());
    }

    #[test]
    fn test_numeric_average() {
        let rows = vec![numeric(60.0), numeric(80.0), numeric(100.0)];
        let res = aggregate(&rows);

        assert_eq!(res[&Field::Final], Summary::new("Avg", "80"));
        // No competence values at all
        assert_eq!(res[&Field::C1], Summary::new("-", "-"));
    }

    #[test]
    fn test_average_rounds_to_nearest() {
        let rows = vec![numeric(1.0), numeric(2.0)];
        assert_eq!(aggregate(&rows)[&Field::Final].value, "2");

        let rows = vec![numeric(1.0), numeric(1.0), numeric(2.0)];
        assert_eq!(aggregate(&rows)[&Field::Final].value, "1");
    }

    #[test]
    fn test_level_mode() {
        let rows = vec![level("B"), level("B"), level("A")];
        assert_eq!(aggregate(&rows)[&Field::Final], Summary::new("Mode", "B"));
    }

    #[test]
    fn test_mode_tie_first_encountered_wins() {
        let rows = vec![level("C"), level("A"), level("A"), level("C")];
        assert_eq!(aggregate(&rows)[&Field::Final].value, "A");

        let rows = vec![level("D"), level("B")];
        assert_eq!(aggregate(&rows)[&Field::Final].value, "D");
    }

    #[test]
    fn test_mixed_rows() {
        let rows = vec![numeric(600.0), level("A")];
        let res = aggregate(&rows);

        assert_eq!(res[&Field::Final], Summary::new("Mixed", "-"));
        assert_eq!(res[&Field::C2], Summary::new("-", "-"));
    }

    #[test]
    fn test_placeholder_values_are_ignored() {
        let mut dash = level("-");
        dash.c1 = Some(Grade::text("-"));
        let rows = vec![dash, level("C")];

        assert_eq!(aggregate(&rows)[&Field::Final].value, "C");
        assert_eq!(aggregate(&rows)[&Field::C1], Summary::new("-", "-"));
    }

    #[test]
    fn test_distinct_counts() {
        let mut a = numeric(1.0);
        a.city_name = "Recife".into();
        a.student_name = "Ana".into();
        a.exam_type = "ENEM".into();
        let mut b = numeric(2.0);
        b.city_name = "Recife".into();
        b.student_name = "ana".into();
        let mut c = numeric(3.0);
        c.city_name = "Olinda".into();
        c.student_name = "Bia".into();

        let res = aggregate(&[a, b, c]);

        assert_eq!(res[&Field::CityName], Summary::new("Cities", "2"));
        assert_eq!(res[&Field::StudentName], Summary::new("Students", "2"));
        assert_eq!(res[&Field::SchoolName], Summary::new("Schools", "0"));
        assert_eq!(res[&Field::ExamType], Summary::new("Exams", "1"));
    }

    #[test]
    fn test_date_range_months() {
        let mut a = numeric(1.0);
        a.essay_date = "2023-07-30".into();
        let mut b = numeric(2.0);
        b.essay_date = "2023-01-02T08:00:00Z".into();
        let mut c = numeric(3.0);
        c.essay_date = "not a date".into();

        assert_eq!(date_range(&[a, b, c]), Summary::new("Range", "6 mths"));
    }

    #[test]
    fn test_date_range_across_years_ignores_day() {
        let mut a = numeric(1.0);
        a.essay_date = "2022-11-30".into();
        let mut b = numeric(2.0);
        b.essay_date = "2023-02-01".into();

        assert_eq!(date_range(&[a, b]).value, "3 mths");
    }

    #[test]
    fn test_date_range_without_dates() {
        let rows: Vec<Evaluation> = Vec::new();
        assert_eq!(date_range(&rows), Summary::new("Range", "-"));
        assert_eq!(date_range(&[numeric(1.0)]), Summary::new("Range", "-"));
    }

    #[test]
    fn test_parse_essay_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 9);
        assert_eq!(parse_essay_date("2023-03-09"), expected);
        assert_eq!(parse_essay_date("2023/03/09"), expected);
        assert_eq!(parse_essay_date("2023-03-09 14:30:00"), expected);
        assert_eq!(parse_essay_date("2023-03-09T14:30:00.250"), expected);
        assert_eq!(parse_essay_date("2023-03"), NaiveDate::from_ymd_opt(2023, 3, 1));
        assert_eq!(parse_essay_date("09/03/2023"), None);
    }

    #[test]
    fn test_mixture_scan() {
        assert_eq!(Mixture::of::<Evaluation>(&[]), None);
        assert_eq!(Mixture::of(&[numeric(1.0)]), Some(Mixture::Numeric));
        assert_eq!(Mixture::of(&[level("A")]), Some(Mixture::Level));
        assert_eq!(Mixture::of(&[level("A"), numeric(1.0)]), Some(Mixture::Mixed));
    }
}
