//! Splitting a raw query into its filter, order and grouping clauses.
//!
//! The splitter is purely textual: it never validates quoting or parentheses
//! inside a clause and it cannot fail.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Grouping;

static ORDER_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\sORDER BY\s").expect("valid ORDER BY regex"));

static GROUP_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\sGROUP BY\s").expect("valid GROUP BY regex"));

static GROUPING_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^(.*?)\s+AS\s+'(.*)'$").expect("valid grouping label regex"));

/// The raw clauses of a query, before any reference extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitQuery {
    pub filter: Option<String>,
    pub order: Option<String>,
    pub groupings: Vec<Grouping>,
}

/// Splits a raw query on `GROUP BY` and `ORDER BY`.
///
/// The query is padded with a space on each side so a separator at the very
/// start or end still has whitespace around it.
pub fn split_query(query: &str) -> SplitQuery {
    let padded = format!(" {} ", query);

    let (head, groupings) = match GROUP_BY.find(&padded) {
        Some(m) => (&padded[..m.start()], split_groupings(&padded[m.end()..])),
        None => (padded.as_str(), Vec::new()),
    };

    let (filter, order) = match ORDER_BY.find(head) {
        Some(m) => (
            head[..m.start()].trim(),
            Some(head[m.end()..].trim().to_string()),
        ),
        None => (head.trim(), None),
    };

    let filter = if filter.is_empty() {
        None
    } else {
        Some(filter.to_string())
    };

    tracing::debug!(
        filter = ?filter,
        order = ?order,
        groupings = groupings.len(),
        "split query clauses"
    );

    SplitQuery {
        filter,
        order,
        groupings,
    }
}

/// Splits the text after `GROUP BY` into labelled criteria.
///
/// Commas inside single quotes or parentheses do not separate items, so a
/// label such as `'Due FORMAT(DESC, yyyy)'` stays whole.
fn split_groupings(text: &str) -> Vec<Grouping> {
    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                items.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&text[start..]);

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_grouping)
        .collect()
}

fn parse_grouping(item: &str) -> Grouping {
    match GROUPING_LABEL.captures(item) {
        Some(caps) => Grouping {
            criteria: caps[1].trim().to_string(),
            name: Some(caps[2].to_string()),
        },
        None => Grouping {
            criteria: item.to_string(),
            name: None,
        },
    }
}
