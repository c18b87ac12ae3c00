//! Filter option discovery.
//!
//! Each list is computed from the rows passing every filter except the one it
//! feeds, so picking a city never hides the other cities.

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::BTreeSet;

use super::filter::{matches, FilterKey};
use super::state::ViewState;
use crate::models::Evaluation;

/// Choices for the filter menus. "All" is implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub schools: Vec<String>,
    pub classes: Vec<String>,
    /// `YYYY-MM` values for both ends of the month range.
    pub months: Vec<String>,
}

impl FilterOptions {
    pub fn discover<R: Borrow<Evaluation>>(rows: &[R], state: &ViewState) -> Self {
        Self {
            cities: distinct(rows, state, FilterKey::City, |e| e.city_name.clone()),
            schools: distinct(rows, state, FilterKey::School, |e| e.school_name.clone()),
            classes: distinct(rows, state, FilterKey::Class, |e| e.class_name.clone()),
            months: distinct(rows, state, FilterKey::Dates, Evaluation::month),
        }
    }
}

/// Distinct non-empty values of `value` over rows matching all filters but `excluded`.
pub fn distinct<R, F>(rows: &[R], state: &ViewState, excluded: FilterKey, value: F) -> Vec<String>
where
    R: Borrow<Evaluation>,
    F: Fn(&Evaluation) -> String,
{
    rows.iter()
        .filter_map(|r| {
            let row: &Evaluation = r.borrow();
            matches(row, state, Some(excluded)).then(|| value(row))
        })
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::evaluation;
    use crate::view::state::ExamFilter;

    fn row(city: &str, school: &str, exam: &str, date: &str) -> Evaluation {
        let mut e = evaluation("r");
        e.city_name = city.into();
        e.school_name = school.into();
        e.exam_type = exam.into();
        e.essay_date = date.into();
        e
    }

    fn dataset() -> Vec<Evaluation> {
        vec![
            row("Recife", "Escola A", "ENEM", "2023-02-01"),
            row("Recife", "Escola B", "SAEB", "2023-05-10"),
            row("Olinda", "Escola C", "SAEB", "2023-05-20"),
            row("", "Escola C", "SAEB", ""),
        ]
    }

    #[test]
    fn test_unfiltered_options() {
        let options = FilterOptions::discover(&dataset(), &ViewState::default());

        assert_eq!(options.cities, vec!["Olinda", "Recife"]);
        assert_eq!(options.schools, vec!["Escola A", "Escola B", "Escola C"]);
        assert!(options.classes.is_empty());
        assert_eq!(options.months, vec!["2023-02", "2023-05"]);
    }

    #[test]
    fn test_own_filter_does_not_narrow_its_options() {
        let mut state = ViewState::default();
        state.filters.city = Some("Recife".into());
        let options = FilterOptions::discover(&dataset(), &state);

        assert_eq!(options.cities, vec!["Olinda", "Recife"]);
        assert_eq!(options.schools, vec!["Escola A", "Escola B"]);
    }

    #[test]
    fn test_other_filters_narrow_options() {
        let mut state = ViewState::default();
        state.filters.exam = ExamFilter::Level;
        state.filters.start_month = Some("2023-05".into());
        let options = FilterOptions::discover(&dataset(), &state);

        assert_eq!(options.cities, vec!["Olinda", "Recife"]);
        assert_eq!(options.schools, vec!["Escola B", "Escola C"]);
        assert_eq!(options.months, vec!["2023-05"]);
    }
}
