//! User-controlled view state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::Field;

/// Exam category selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExamFilter {
    /// Every row (`All`).
    #[default]
    All,
    /// Numeric-score exams (`enem`).
    Numeric,
    /// Any proficiency-level exam (`saeb`).
    Level,
    /// Proficiency-level exams of one school year (`saeb_6` .. `saeb_9`).
    LevelYear(u8),
}

impl ExamFilter {
    /// Every selectable category, in menu order.
    pub fn choices() -> Vec<ExamFilter> {
        let mut choices = vec![ExamFilter::All, ExamFilter::Numeric, ExamFilter::Level];
        choices.extend((6..=9).map(ExamFilter::LevelYear));
        choices
    }
}

impl fmt::Display for ExamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamFilter::All => f.write_str("All"),
            ExamFilter::Numeric => f.write_str("enem"),
            ExamFilter::Level => f.write_str("saeb"),
            ExamFilter::LevelYear(year) => write!(f, "saeb_{}", year),
        }
    }
}

impl FromStr for ExamFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "" | "all" => Ok(ExamFilter::All),
            "enem" => Ok(ExamFilter::Numeric),
            "saeb" => Ok(ExamFilter::Level),
            other => other
                .strip_prefix("saeb_")
                .and_then(|year| year.parse::<u8>().ok())
                .filter(|year| (1..=9).contains(year))
                .map(ExamFilter::LevelYear)
                .ok_or_else(|| format!("Unknown exam filter: {}", s)),
        }
    }
}

impl TryFrom<String> for ExamFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExamFilter> for String {
    fn from(value: ExamFilter) -> Self {
        value.to_string()
    }
}

/// Field filters. `None` means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    pub city: Option<String>,
    pub school: Option<String>,
    pub class: Option<String>,
    pub exam: ExamFilter,
    /// Inclusive `YYYY-MM` lower bound.
    pub start_month: Option<String>,
    /// Inclusive `YYYY-MM` upper bound.
    pub end_month: Option<String>,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("Unknown sort direction: {}", other)),
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    pub field: Field,
    pub direction: SortDirection,
}

impl SortRule {
    pub fn asc(field: Field) -> Self {
        Self { field, direction: SortDirection::Asc }
    }

    pub fn desc(field: Field) -> Self {
        Self { field, direction: SortDirection::Desc }
    }
}

/// `field` or `field:asc|desc`; the direction defaults to ascending.
impl FromStr for SortRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field, direction.parse()?),
            None => (s, SortDirection::Asc),
        };
        Ok(SortRule { field: field.parse()?, direction })
    }
}

/// Sort rules applied when nothing else was chosen: newest essays first.
pub fn default_sort() -> Vec<SortRule> {
    vec![SortRule::desc(Field::EssayDate)]
}

/// Everything the user controls about the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub search: String,
    pub filters: Filters,
    /// Priority order: the first rule is the primary key.
    pub sort: Vec<SortRule>,
    pub group_by: Option<Field>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: Filters::default(),
            sort: default_sort(),
            group_by: None,
        }
    }
}
