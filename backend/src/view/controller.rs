//! Owner of the canonical dataset and the user's view state.
//!
//! Every mutator ends with [`ViewController::refresh`], which rebuilds the
//! derived view from scratch:
//!
//! ```text
//! dataset ──filter──► filtered ──sort──► sorted ──group──► groups
//!    │                                      │
//!    └──options (own filter lifted)         └──aggregate──► aggregates
//! ```

use serde::Serialize;
use std::sync::Arc;

use super::filter::matches;
use super::options::FilterOptions;
use super::sort::{sort_rows, toggle_sort};
use super::state::{default_sort, ExamFilter, Filters, ViewState};
use crate::error::PipelineResult;
use crate::models::{Evaluation, Field};
use crate::transform::aggregator::{aggregate, Aggregates};
use crate::transform::grouper::{group_rows, RowGroup};
use crate::transform::pipeline::LoadedDataset;

/// Outcome of the most recent load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum LoadStatus {
    /// Nothing loaded yet.
    Idle,
    /// The dataset holds the last successful load.
    Ready,
    /// The last load failed; holds the user-visible message.
    Failed(String),
}

/// Everything computed from the dataset and the view state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedView {
    pub filtered: Vec<Arc<Evaluation>>,
    /// Filtered rows in display order.
    pub sorted: Vec<Arc<Evaluation>>,
    pub groups: Vec<RowGroup<Arc<Evaluation>>>,
    /// Statistics over the visible rows.
    pub aggregates: Aggregates,
    pub options: FilterOptions,
}

impl DerivedView {
    /// Run the full derivation.
    pub fn derive(dataset: &[Arc<Evaluation>], state: &ViewState) -> Self {
        let filtered: Vec<Arc<Evaluation>> = dataset
            .iter()
            .filter(|row| matches(row, state, None))
            .cloned()
            .collect();

        let mut sorted = filtered.clone();
        sort_rows(&mut sorted, &state.sort);

        let groups = group_rows(&sorted, state.group_by);
        let aggregates = aggregate(&sorted);
        let options = FilterOptions::discover(dataset, state);

        Self {
            filtered,
            sorted,
            groups,
            aggregates,
            options,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewController {
    dataset: Vec<Arc<Evaluation>>,
    state: ViewState,
    derived: DerivedView,
    status: LoadStatus,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ViewController {
    /// Controller over an already loaded dataset.
    pub fn new(dataset: Vec<Arc<Evaluation>>) -> Self {
        let status = if dataset.is_empty() {
            LoadStatus::Idle
        } else {
            LoadStatus::Ready
        };
        Self::with_state(dataset, ViewState::default()).with_status(status)
    }

    /// Controller starting from an explicit view state.
    pub fn with_state(dataset: Vec<Arc<Evaluation>>, state: ViewState) -> Self {
        let derived = DerivedView::derive(&dataset, &state);
        Self {
            dataset,
            state,
            derived,
            status: LoadStatus::Ready,
        }
    }

    fn with_status(mut self, status: LoadStatus) -> Self {
        self.status = status;
        self
    }

    pub fn dataset(&self) -> &[Arc<Evaluation>] {
        &self.dataset
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn derived(&self) -> &DerivedView {
        &self.derived
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Rows to export: the visible order, before grouping.
    pub fn export_rows(&self) -> &[Arc<Evaluation>] {
        &self.derived.sorted
    }

    /// Recompute the derived view.
    pub fn refresh(&mut self) {
        self.derived = DerivedView::derive(&self.dataset, &self.state);
    }

    // -------------------------------------------------------------------------
    // Dataset
    // -------------------------------------------------------------------------

    pub fn replace_dataset(&mut self, evaluations: Vec<Evaluation>) {
        self.dataset = evaluations.into_iter().map(Arc::new).collect();
        self.status = LoadStatus::Ready;
        self.refresh();
    }

    /// Install a load result. On failure the current dataset stays in place.
    pub fn apply_load(&mut self, result: PipelineResult<LoadedDataset>) -> &LoadStatus {
        match result {
            Ok(loaded) => self.replace_dataset(loaded.evaluations),
            Err(err) => self.status = LoadStatus::Failed(err.user_message().to_string()),
        }
        &self.status
    }

    // -------------------------------------------------------------------------
    // Filters
    // -------------------------------------------------------------------------

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.state.search = query.into();
        self.refresh();
    }

    pub fn set_city(&mut self, city: Option<String>) {
        self.state.filters.city = selection(city);
        self.refresh();
    }

    pub fn set_school(&mut self, school: Option<String>) {
        self.state.filters.school = selection(school);
        self.refresh();
    }

    pub fn set_class(&mut self, class: Option<String>) {
        self.state.filters.class = selection(class);
        self.refresh();
    }

    pub fn set_exam(&mut self, exam: ExamFilter) {
        self.state.filters.exam = exam;
        self.refresh();
    }

    pub fn set_start_month(&mut self, month: Option<String>) {
        self.state.filters.start_month = selection(month);
        self.refresh();
    }

    pub fn set_end_month(&mut self, month: Option<String>) {
        self.state.filters.end_month = selection(month);
        self.refresh();
    }

    /// Clear every filter and the search text.
    pub fn reset_filters(&mut self) {
        self.state.filters = Filters::default();
        self.state.search.clear();
        self.refresh();
    }

    // -------------------------------------------------------------------------
    // Sort and grouping
    // -------------------------------------------------------------------------

    pub fn toggle_sort(&mut self, field: Field, multi: bool) {
        toggle_sort(&mut self.state.sort, field, multi);
        self.refresh();
    }

    pub fn reset_sort(&mut self) {
        self.state.sort = default_sort();
        self.refresh();
    }

    pub fn set_group_by(&mut self, field: Option<Field>) {
        self.state.group_by = field;
        self.refresh();
    }

    pub fn reset_group(&mut self) {
        self.set_group_by(None);
    }

    pub fn reset_all(&mut self) {
        self.state = ViewState::default();
        self.refresh();
    }
}

/// An empty selection means "All".
fn selection(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LoadError, PipelineError, ProcessingError};
    use crate::models::tests::evaluation;
    use crate::models::Grade;
    use crate::transform::aggregator::Summary;
    use crate::transform::pipeline::load_bytes;

    fn row(id: &str, city: &str, exam: &str, date: &str, score: f64) -> Evaluation {
        let mut e = evaluation(id);
        e.city_name = city.into();
        e.school_name = format!("Escola {}", city);
        e.exam_type = exam.into();
        e.essay_date = date.into();
        e.final_grade = Some(Grade::Number(score));
        e
    }

    fn controller() -> ViewController {
        let rows = vec![
            row("a", "Recife", "ENEM", "2023-01-10", 600.0),
            row("b", "Olinda", "ENEM", "2023-03-05", 800.0),
            row("c", "Recife", "ENEM", "2023-07-21", 700.0),
        ];
        ViewController::new(rows.into_iter().map(Arc::new).collect())
    }

    fn sorted_ids(c: &ViewController) -> Vec<String> {
        c.export_rows().iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_default_view_newest_first() {
        let c = controller();

        assert_eq!(c.status(), &LoadStatus::Ready);
        assert_eq!(sorted_ids(&c), vec!["c", "b", "a"]);
        assert_eq!(c.derived().groups.len(), 1);
        assert_eq!(c.derived().groups[0].title, "All Records");
        assert_eq!(c.derived().aggregates[&Field::Final], Summary::new("Avg", "700"));
        assert_eq!(c.derived().aggregates[&Field::EssayDate].value, "6 mths");
    }

    #[test]
    fn test_empty_controller() {
        let c = ViewController::default();

        assert_eq!(c.status(), &LoadStatus::Idle);
        assert!(c.export_rows().is_empty());
        assert!(c.derived().aggregates.is_empty());
        assert_eq!(c.derived().groups[0].title, "All Records");
    }

    #[test]
    fn test_filter_refreshes_everything() {
        let mut c = controller();
        c.set_city(Some("Recife".into()));

        assert_eq!(sorted_ids(&c), vec!["c", "a"]);
        assert_eq!(c.derived().filtered.len(), 2);
        assert_eq!(c.derived().aggregates[&Field::Final].value, "650");
        // Own filter lifted for its option list
        assert_eq!(c.derived().options.cities, vec!["Olinda", "Recife"]);
        assert_eq!(c.derived().options.schools, vec!["Escola Recife"]);
    }

    #[test]
    fn test_empty_selection_means_all() {
        let mut c = controller();
        c.set_city(Some(String::new()));
        assert_eq!(c.state().filters.city, None);
        assert_eq!(c.export_rows().len(), 3);
    }

    #[test]
    fn test_toggle_sort_and_reset() {
        let mut c = controller();

        c.toggle_sort(Field::Final, false);
        assert_eq!(sorted_ids(&c), vec!["a", "c", "b"]);
        c.toggle_sort(Field::Final, false);
        assert_eq!(sorted_ids(&c), vec!["b", "c", "a"]);
        c.toggle_sort(Field::Final, false);
        assert!(c.state().sort.is_empty());
        // No rules: dataset order
        assert_eq!(sorted_ids(&c), vec!["a", "b", "c"]);

        c.reset_sort();
        assert_eq!(c.state().sort, default_sort());
    }

    #[test]
    fn test_grouping() {
        let mut c = controller();
        c.set_group_by(Some(Field::CityName));

        let titles: Vec<_> = c.derived().groups.iter().map(|g| g.title.clone()).collect();
        assert_eq!(titles, vec!["Olinda", "Recife"]);
        let recife: Vec<_> = c.derived().groups[1].rows.iter().map(|e| e.id.clone()).collect();
        assert_eq!(recife, vec!["c", "a"]);

        c.reset_group();
        assert_eq!(c.derived().groups.len(), 1);
    }

    #[test]
    fn test_reset_filters_clears_search() {
        let mut c = controller();
        c.set_search("olinda");
        c.set_exam(ExamFilter::Level);
        c.set_start_month(Some("2023-02".into()));
        assert!(c.export_rows().is_empty());

        c.reset_filters();
        assert_eq!(c.state().search, "");
        assert_eq!(c.state().filters, Filters::default());
        assert_eq!(c.export_rows().len(), 3);
    }

    #[test]
    fn test_reset_all() {
        let mut c = controller();
        c.set_end_month(Some("2023-03".into()));
        c.toggle_sort(Field::CityName, true);
        c.set_group_by(Some(Field::ExamType));

        c.reset_all();
        assert_eq!(c.state(), &ViewState::default());
        assert_eq!(sorted_ids(&c), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_failed_load_keeps_previous_dataset() {
        let mut c = controller();

        let status = c.apply_load(Err(PipelineError::Load(LoadError::EmptyFile)));
        assert_eq!(
            status,
            &LoadStatus::Failed("Failed to load CSV file. Check file path.".into())
        );
        assert_eq!(c.dataset().len(), 3);

        let structural = ProcessingError::NotARecord { row: 0, found: "string" };
        c.apply_load(Err(PipelineError::Processing(structural)));
        assert_eq!(
            c.status(),
            &LoadStatus::Failed("Error processing dataset structure.".into())
        );
        assert_eq!(c.export_rows().len(), 3);
    }

    #[test]
    fn test_successful_load_replaces_dataset() {
        let mut c = controller();
        c.set_city(Some("Recife".into()));

        let csv = "city_name,exam_type,final_level,competence_4_level\nCaruaru,SAEB,B,B\n";
        c.apply_load(load_bytes(csv.as_bytes()));

        assert_eq!(c.status(), &LoadStatus::Ready);
        assert_eq!(c.dataset().len(), 1);
        // The view state survives a reload
        assert!(c.export_rows().is_empty());
        assert_eq!(c.derived().options.cities, vec!["Caruaru"]);
    }
}
