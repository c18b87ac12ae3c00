//! Multi-key row ordering.

use std::borrow::Borrow;
use std::cmp::Ordering;

use super::state::{SortDirection, SortRule};
use crate::models::{Evaluation, Field, Grade};

/// Stable sort by the given rules, first rule first.
pub fn sort_rows<R: Borrow<Evaluation>>(rows: &mut [R], rules: &[SortRule]) {
    if rules.is_empty() {
        return;
    }
    rows.sort_by(|a, b| compare_rows(a.borrow(), b.borrow(), rules));
}

/// Ordering of two rows under the given rules. Ties fall through to the next rule.
pub fn compare_rows(a: &Evaluation, b: &Evaluation, rules: &[SortRule]) -> Ordering {
    for rule in rules {
        let ordering = compare_field(a, b, rule.field);
        if ordering != Ordering::Equal {
            return match rule.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
        }
    }
    Ordering::Equal
}

fn compare_field(a: &Evaluation, b: &Evaluation, field: Field) -> Ordering {
    if let (Some(Grade::Number(x)), Some(Grade::Number(y))) = (a.grade(field), b.grade(field)) {
        return x.partial_cmp(y).unwrap_or(Ordering::Equal);
    }
    collate(&a.text(field), &b.text(field))
}

/// Locale-style string comparison.
///
/// Letters compare without accents or case first; on a tie unaccented letters
/// come before accented ones, then lower case before upper case.
pub fn collate(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| -> String {
        s.chars().map(base_letter).flat_map(char::to_lowercase).collect()
    };

    fold(a)
        .cmp(&fold(b))
        .then_with(|| {
            let accents = |s: &str| s.chars().map(|c| base_letter(c) != c).collect::<Vec<_>>();
            accents(a).cmp(&accents(b))
        })
        .then_with(|| {
            let uppercase = |s: &str| s.chars().map(char::is_uppercase).collect::<Vec<_>>();
            uppercase(a).cmp(&uppercase(b))
        })
        .then_with(|| a.cmp(b))
}

/// Strip the diacritic from Latin-1 letters.
fn base_letter(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'º' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    }
}

/// Cycle a column through ascending, descending and unsorted.
///
/// A column not yet sorted starts ascending; with `multi` it is appended as
/// the lowest-priority key, otherwise it replaces every rule.
pub fn toggle_sort(rules: &mut Vec<SortRule>, field: Field, multi: bool) {
    match rules.iter().position(|rule| rule.field == field) {
        Some(index) => match rules[index].direction {
            SortDirection::Asc => rules[index].direction = SortDirection::Desc,
            SortDirection::Desc => {
                rules.remove(index);
            }
        },
        None => {
            if !multi {
                rules.clear();
            }
            rules.push(SortRule::asc(field));
        }
    }
}
