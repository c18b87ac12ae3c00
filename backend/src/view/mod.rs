//! Interactive view over a loaded dataset.
//!
//! - State: search text, filters, sort rules and grouping chosen by the user
//! - Filter: the row predicate, with per-filter exclusion
//! - Sort: stable multi-key ordering and the sort toggle cycle
//! - Options: filter menu values
//! - Controller: owns the dataset and rebuilds the derived view on every change

pub mod controller;
pub mod filter;
pub mod options;
pub mod sort;
pub mod state;

pub use controller::{DerivedView, LoadStatus, ViewController};
pub use filter::{matches, FilterKey};
pub use options::FilterOptions;
pub use sort::{collate, sort_rows, toggle_sort};
pub use state::{default_sort, ExamFilter, Filters, SortDirection, SortRule, ViewState};
