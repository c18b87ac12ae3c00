//! Row predicate over the current view state.

use serde::{Deserialize, Serialize};

use super::state::{ExamFilter, ViewState};
use crate::models::Evaluation;
use crate::transform::normalizer::{has_class_year, LEVEL_EXAM_MARKER, NUMERIC_EXAM_MARKER};

/// A sub-predicate that can be lifted when computing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKey {
    Search,
    City,
    School,
    Class,
    Exam,
    Dates,
}

/// Whether `row` passes every active filter except `excluded`.
pub fn matches(row: &Evaluation, state: &ViewState, excluded: Option<FilterKey>) -> bool {
    let active = |key: FilterKey| excluded != Some(key);
    let filters = &state.filters;

    if active(FilterKey::Search) && !matches_search(row, &state.search) {
        return false;
    }
    if active(FilterKey::City) && !matches_exact(&row.city_name, filters.city.as_deref()) {
        return false;
    }
    if active(FilterKey::School) && !matches_exact(&row.school_name, filters.school.as_deref()) {
        return false;
    }
    if active(FilterKey::Class) && !matches_exact(&row.class_name, filters.class.as_deref()) {
        return false;
    }
    if active(FilterKey::Exam) && !matches_exam(row, filters.exam) {
        return false;
    }
    if active(FilterKey::Dates)
        && !matches_months(
            &row.month(),
            filters.start_month.as_deref(),
            filters.end_month.as_deref(),
        )
    {
        return false;
    }

    true
}

/// Case-insensitive substring over student, school, city and class names.
pub fn matches_search(row: &Evaluation, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let haystack = [
        row.student_name.as_str(),
        row.school_name.as_str(),
        row.city_name.as_str(),
        row.class_name.as_str(),
    ]
    .join(" ")
    .to_lowercase();

    haystack.contains(&query.to_lowercase())
}

fn matches_exact(value: &str, selected: Option<&str>) -> bool {
    selected.map_or(true, |selected| value == selected)
}

/// Category filter. Reads `exam_type` because categories are user-facing
/// labels; numeric/level branching elsewhere uses `meta.is_numeric`.
pub fn matches_exam(row: &Evaluation, filter: ExamFilter) -> bool {
    let exam_type = row.exam_type.to_lowercase();
    match filter {
        ExamFilter::All => true,
        ExamFilter::Numeric => exam_type == NUMERIC_EXAM_MARKER,
        ExamFilter::Level => exam_type.contains(LEVEL_EXAM_MARKER),
        ExamFilter::LevelYear(year) => {
            exam_type.contains(LEVEL_EXAM_MARKER) && has_class_year(&row.class_name, year)
        }
    }
}

/// Inclusive lexicographic comparison on `YYYY-MM`.
pub fn matches_months(month: &str, start: Option<&str>, end: Option<&str>) -> bool {
    if start.is_some_and(|start| month < start) {
        return false;
    }
    if end.is_some_and(|end| month > end) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::evaluation;

    fn row(city: &str, school: &str, class: &str, exam: &str, date: &str) -> Evaluation {
        let mut e = evaluation("r");
        e.student_name = "Ana Souza".into();
        e.city_name = city.into();
        e.school_name = school.into();
        e.class_name = class.into();
        e.exam_type = exam.into();
        e.essay_date = date.into();
        e
    }

    fn dataset() -> Vec<Evaluation> {
        vec![
            row("Recife", "Escola A", "6º ano A", "SAEB", "2023-01-15"),
            row("Recife", "Escola B", "9º ano", "SAEB", "2023-04-02"),
            row("Olinda", "Escola A", "3º ano", "ENEM", "2023-06-30"),
            row("Olinda", "Escola C", "6o ano", "saeb", "2023-09-01"),
            row("Recife", "Escola C", "3º ano", "Enem 2023", ""),
        ]
    }

    fn apply(rows: &[Evaluation], state: &ViewState) -> Vec<Evaluation> {
        rows.iter().filter(|r| matches(r, state, None)).cloned().collect()
    }

    #[test]
    fn test_default_state_matches_everything() {
        let rows = dataset();
        assert_eq!(apply(&rows, &ViewState::default()).len(), rows.len());
    }

    #[test]
    fn test_search_is_case_insensitive_across_names() {
        let e = row("Recife", "Escola A", "6º ano", "SAEB", "");
        assert!(matches_search(&e, "souza"));
        assert!(matches_search(&e, "ESCOLA a"));
        assert!(matches_search(&e, "recife"));
        assert!(matches_search(&e, "6º"));
        assert!(!matches_search(&e, "olinda"));
    }

    #[test]
    fn test_exam_categories() {
        let rows = dataset();
        let count = |filter| rows.iter().filter(|r| matches_exam(r, filter)).count();

        assert_eq!(count(ExamFilter::All), 5);
        // Exact match only: "Enem 2023" is not the numeric marker
        assert_eq!(count(ExamFilter::Numeric), 1);
        assert_eq!(count(ExamFilter::Level), 3);
        assert_eq!(count(ExamFilter::LevelYear(6)), 2);
        assert_eq!(count(ExamFilter::LevelYear(9)), 1);
        assert_eq!(count(ExamFilter::LevelYear(7)), 0);
    }

    #[test]
    fn test_month_range_inclusive() {
        assert!(matches_months("2023-04", Some("2023-04"), Some("2023-04")));
        assert!(!matches_months("2023-03", Some("2023-04"), None));
        assert!(!matches_months("2023-05", None, Some("2023-04")));
        assert!(!matches_months("", Some("2023-01"), None));
        assert!(matches_months("", None, None));
    }

    #[test]
    fn test_filters_idempotent_and_commutative() {
        let rows = dataset();

        let mut by_city = ViewState::default();
        by_city.filters.city = Some("Recife".into());
        let mut by_exam = ViewState::default();
        by_exam.filters.exam = ExamFilter::Level;
        let mut both = by_city.clone();
        both.filters.exam = ExamFilter::Level;

        let city_once = apply(&rows, &by_city);
        assert_eq!(apply(&city_once, &by_city), city_once);

        let city_then_exam = apply(&apply(&rows, &by_city), &by_exam);
        let exam_then_city = apply(&apply(&rows, &by_exam), &by_city);
        assert_eq!(city_then_exam, exam_then_city);
        assert_eq!(city_then_exam, apply(&rows, &both));
        assert_eq!(city_then_exam.len(), 2);
    }

    #[test]
    fn test_excluded_key_lifts_only_that_filter() {
        let e = row("Olinda", "Escola A", "3º ano", "ENEM", "2023-06-30");
        let mut state = ViewState::default();
        state.filters.city = Some("Recife".into());
        state.filters.school = Some("Escola A".into());

        assert!(!matches(&e, &state, None));
        assert!(matches(&e, &state, Some(FilterKey::City)));
        assert!(!matches(&e, &state, Some(FilterKey::School)));
    }

    #[test]
    fn test_date_filter() {
        let rows = dataset();
        let mut state = ViewState::default();
        state.filters.start_month = Some("2023-04".into());
        state.filters.end_month = Some("2023-06".into());

        let dates: Vec<_> = apply(&rows, &state).into_iter().map(|e| e.essay_date).collect();
        assert_eq!(dates, vec!["2023-04-02", "2023-06-30"]);
    }
}
