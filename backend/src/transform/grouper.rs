//! Partition sorted rows into display groups.
//!
//! ```text
//! Sorted rows                        Grouped by school_name
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │ Ana   │ Escola B         │       │ Escola A: [Bia, Caio]    │
//! │ Bia   │ Escola A         │  →    ├──────────────────────────┤
//! │ Caio  │ Escola A         │       │ Escola B: [Ana]          │
//! │ Davi  │ (none)           │       ├──────────────────────────┤
//! └──────────────────────────┘       │ Unknown:  [Davi]         │
//!                                    └──────────────────────────┘
//! ```
//!
//! Groups come out in lexicographic key order; rows keep their sorted order
//! inside each group.

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::models::{Evaluation, Field};

/// Title of the single group produced when grouping is off.
pub const ALL_RECORDS_TITLE: &str = "All Records";

/// Key used for rows without a value in the grouping field.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// One group of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowGroup<R> {
    pub title: String,
    pub rows: Vec<R>,
}

/// Group rows by the exact text of `field`, or return one group with everything.
pub fn group_rows<R>(rows: &[R], field: Option<Field>) -> Vec<RowGroup<R>>
where
    R: Borrow<Evaluation> + Clone,
{
    let Some(field) = field else {
        return vec![RowGroup {
            title: ALL_RECORDS_TITLE.to_string(),
            rows: rows.to_vec(),
        }];
    };

    let mut groups: BTreeMap<String, Vec<R>> = BTreeMap::new();

    for row in rows {
        let mut key = row.borrow().text(field);
        if key.is_empty() {
            key = UNKNOWN_GROUP.to_string();
        }
        groups.entry(key).or_default().push(row.clone());
    }

    groups
        .into_iter()
        .map(|(title, rows)| RowGroup { title, rows })
        .collect()
}
