//! # Query Compiler
//!
//! Turns a user-typed query such as
//!
//! ```text
//! #Project AND @Priority > 3 ORDER BY @Due ASC
//! ```
//!
//! into a [`QueryDescriptor`]: the clause text with every tag and attribute
//! reference swapped for a positional placeholder (`{tag0}`, `{attr0}`, ...),
//! plus one structured record per placeholder.
//!
//! ## Pipeline
//!
//! 1. [`split_query`] separates the filter, `ORDER BY` and `GROUP BY` clauses.
//! 2. [`extract_tags`] runs over the filter, order and grouping clauses, in
//!    that order, sharing one list so numbering never restarts. It consumes
//!    `{...}` data filters and skips the bodies of attribute `.On(...)`
//!    suffixes.
//! 3. [`extract_attrs`] does the same for attributes, on the tag-substituted
//!    text. Its `.On(...)` suffix calls back into [`extract_tags`].
//!
//! The compiler is pure: no I/O, no shared state between calls. It fails only
//! on an `.On(` suffix with no closing parenthesis or a data filter with no
//! closing brace.

pub mod attrs;
pub mod clauses;
pub mod tags;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryPart};

pub use attrs::extract_attrs;
pub use clauses::{split_query, SplitQuery};
pub use tags::extract_tags;

/// A reference to a tag, e.g. `##?~Space.Tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReference {
    pub space: Option<String>,
    pub name: String,
    /// Number of `#` in the modifier run.
    pub search_depth: usize,
    /// False when a `?` followed the `#` run.
    pub strict_search_depth: bool,
    /// True when the modifier run contained `~`.
    pub include_owner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<TagDataFilter>,
}

/// A predicate on a tag's data, written in braces after the tag:
/// `#Person{.height.meters > 1.8}` gives pattern `{exp0} > 1.8` and
/// exps `["height.meters"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDataFilter {
    pub pattern: String,
    pub exps: Vec<String>,
}

/// A reference to an attribute, e.g. `@Space.Price.Exists().On(Shop)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttrReference {
    pub space: Option<String>,
    pub name: String,
    pub exists: bool,
    /// Set only when an `.On(...)` suffix was present.
    pub tag_filters: Option<Vec<TagReference>>,
}

/// One labelled entry of a `GROUP BY` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub criteria: String,
    pub name: Option<String>,
}

/// The compiled form of a query.
///
/// Every `{tag<N>}` in any clause has its record at `tag_references[N]`, and
/// every `{attr<N>}` at `attr_references[N]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub filter_clause: Option<String>,
    pub order_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
    pub tag_references: Vec<TagReference>,
    pub attr_references: Vec<AttrReference>,
}

impl QueryDescriptor {
    /// Iterates over the filter, order and grouping clause texts that are present.
    pub fn clauses(&self) -> impl Iterator<Item = &str> {
        self.filter_clause
            .as_deref()
            .into_iter()
            .chain(self.order_clause.as_deref())
            .chain(self.groupings.iter().map(|g| g.criteria.as_str()))
    }
}

pub(crate) fn placeholder(kind: &str, index: usize) -> String {
    format!("{{{}{}}}", kind, index)
}

/// Compiles a raw query string into a [`QueryDescriptor`].
///
/// Text that is not a tag or attribute reference (operators, literals,
/// malformed references) passes through unchanged. No partial descriptor is
/// returned on error.
pub fn parse_query(query: &str) -> Result<QueryDescriptor, QueryError> {
    let SplitQuery {
        filter,
        order,
        mut groupings,
    } = split_query(query);

    let mut tag_references = Vec::new();
    let filter = filter
        .map(|c| extract_tags(&c, &mut tag_references))
        .transpose()
        .map_err(|e| e.in_part(QueryPart::Filter))?;
    let order = order
        .map(|c| extract_tags(&c, &mut tag_references))
        .transpose()
        .map_err(|e| e.in_part(QueryPart::Order))?;
    for (i, grouping) in groupings.iter_mut().enumerate() {
        grouping.criteria = extract_tags(&grouping.criteria, &mut tag_references)
            .map_err(|e| e.in_part(QueryPart::Grouping(i + 1)))?;
    }

    let mut attr_references = Vec::new();
    let filter = filter
        .map(|c| extract_attrs(&c, &mut attr_references))
        .transpose()
        .map_err(|e| e.in_part(QueryPart::Filter))?;
    let order = order
        .map(|c| extract_attrs(&c, &mut attr_references))
        .transpose()
        .map_err(|e| e.in_part(QueryPart::Order))?;
    for (i, grouping) in groupings.iter_mut().enumerate() {
        grouping.criteria = extract_attrs(&grouping.criteria, &mut attr_references)
            .map_err(|e| e.in_part(QueryPart::Grouping(i + 1)))?;
    }

    Ok(QueryDescriptor {
        filter_clause: filter,
        order_clause: order,
        groupings,
        tag_references,
        attr_references,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn indices(descriptor: &QueryDescriptor, kind: &str) -> Vec<usize> {
        let prefix = format!("{{{}", kind);
        let mut found = Vec::new();
        for clause in descriptor.clauses() {
            let mut rest = clause;
            while let Some(start) = rest.find(&prefix) {
                let after = &rest[start + prefix.len()..];
                let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
                if after[digits.len()..].starts_with('}') {
                    found.push(digits.parse().unwrap());
                }
                rest = after;
            }
        }
        found
    }

    fn assert_dense(descriptor: &QueryDescriptor) {
        let tags = indices(descriptor, "tag");
        let attrs = indices(descriptor, "attr");
        assert_eq!(
            tags.iter().copied().collect::<BTreeSet<_>>(),
            (0..descriptor.tag_references.len()).collect::<BTreeSet<_>>()
        );
        assert_eq!(tags.len(), descriptor.tag_references.len());
        assert_eq!(
            attrs.iter().copied().collect::<BTreeSet<_>>(),
            (0..descriptor.attr_references.len()).collect::<BTreeSet<_>>()
        );
        assert_eq!(attrs.len(), descriptor.attr_references.len());
    }

    #[test]
    fn plain_text_passes_through() {
        let descriptor = parse_query("  Price > 3 AND Name = 'abc'  ").unwrap();

        assert_eq!(
            descriptor.filter_clause.as_deref(),
            Some("Price > 3 AND Name = 'abc'")
        );
        assert_eq!(descriptor.order_clause, None);
        assert!(descriptor.tag_references.is_empty());
        assert!(descriptor.attr_references.is_empty());
    }

    #[test]
    fn empty_query_has_no_clauses() {
        let descriptor = parse_query("").unwrap();
        assert_eq!(descriptor, QueryDescriptor::default());
    }

    #[test]
    fn compiles_filter_and_order() {
        let descriptor = parse_query("#Project AND @Priority > 3 ORDER BY @Due ASC").unwrap();

        assert_eq!(
            descriptor.filter_clause.as_deref(),
            Some("{tag0} AND {attr0} > 3")
        );
        assert_eq!(descriptor.order_clause.as_deref(), Some("{attr1} ASC"));
        assert_eq!(descriptor.tag_references[0].name, "Project");
        assert_eq!(descriptor.attr_references[0].name, "Priority");
        assert_eq!(descriptor.attr_references[1].name, "Due");
        assert_dense(&descriptor);
    }

    #[test]
    fn order_clause_numbering_continues() {
        let descriptor =
            parse_query("#A AND #[B C] AND @X ORDER BY #D, @[Y Z], @W DESC").unwrap();

        assert_eq!(
            descriptor.filter_clause.as_deref(),
            Some("{tag0} AND {tag1} AND {attr0}")
        );
        assert_eq!(
            descriptor.order_clause.as_deref(),
            Some("{tag2}, {attr2}, {attr1} DESC")
        );
        let names: Vec<_> = descriptor.tag_references.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B C", "D"]);
        let names: Vec<_> = descriptor.attr_references.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["X", "W", "Y Z"]);
        assert_dense(&descriptor);
    }

    #[test]
    fn attr_filters_do_not_consume_main_tag_numbers() {
        let descriptor = parse_query("#Shop AND @Price.On(Shop|#Market) > 2").unwrap();

        assert_eq!(
            descriptor.filter_clause.as_deref(),
            Some("{tag0} AND {attr0} > 2")
        );
        assert_eq!(descriptor.tag_references.len(), 1);
        let filters = descriptor.attr_references[0].tag_filters.as_ref().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[1].name, "Market");
        assert_eq!(filters[1].search_depth, 1);
        assert_dense(&descriptor);
    }

    #[test]
    fn tags_inside_attr_filters_belong_to_the_attr() {
        let descriptor = parse_query("@Price.On(#Shop) AND #Open").unwrap();

        assert_eq!(descriptor.filter_clause.as_deref(), Some("{attr0} AND {tag0}"));
        assert_eq!(descriptor.tag_references.len(), 1);
        assert_eq!(descriptor.tag_references[0].name, "Open");
        let filters = descriptor.attr_references[0].tag_filters.as_ref().unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].name, "Shop");
        assert!(filters[0].include_owner);
        assert_dense(&descriptor);
    }

    #[test]
    fn groupings_are_compiled_after_order() {
        let descriptor = parse_query(
            "#Test ORDER BY @Due GROUP BY #Pinned AS 'Pinned', @[Due Date] AS 'Due', 1 AS 'Other'",
        )
        .unwrap();

        assert_eq!(descriptor.filter_clause.as_deref(), Some("{tag0}"));
        assert_eq!(descriptor.order_clause.as_deref(), Some("{attr0}"));
        assert_eq!(descriptor.groupings.len(), 3);
        assert_eq!(descriptor.groupings[0].criteria, "{tag1}");
        assert_eq!(descriptor.groupings[0].name.as_deref(), Some("Pinned"));
        assert_eq!(descriptor.groupings[1].criteria, "{attr1}");
        assert_eq!(descriptor.groupings[2].criteria, "1");
        assert_dense(&descriptor);
    }

    #[test]
    fn unclosed_on_suffix_fails_whole_query() {
        let err = parse_query("#Tag AND @Abc.On(Tag1").unwrap_err();
        assert!(matches!(err, QueryError::UnclosedAttrFilter { ref attr, .. } if attr == "Abc"));
    }

    #[test]
    fn unclosed_on_suffix_in_order_clause_fails() {
        let err = parse_query("#Tag ORDER BY @Abc.On(Tag1").unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnclosedAttrFilter {
                part: QueryPart::Order,
                ..
            }
        ));
        assert!(err.to_string().ends_with("of the ORDER BY clause"));
    }

    #[test]
    fn errors_name_the_grouping_item() {
        let err = parse_query("#A GROUP BY #B AS 'B', #C{.x AS 'C'").unwrap_err();
        assert_eq!(
            err,
            QueryError::UnclosedDataFilter {
                tag: "C".into(),
                position: 2,
                part: QueryPart::Grouping(2),
            }
        );
    }

    #[test]
    fn ordering_by_data_filter_expression() {
        let descriptor = parse_query(
            "##Tasks.Setup AND #General.Finished ORDER BY #General.Finished{(.date)::date} DESC",
        )
        .unwrap();

        assert_eq!(descriptor.filter_clause.as_deref(), Some("{tag0} AND {tag1}"));
        assert_eq!(descriptor.order_clause.as_deref(), Some("{tag2} DESC"));
        assert_eq!(descriptor.tag_references.len(), 3);

        let setup = &descriptor.tag_references[0];
        assert_eq!(setup.space.as_deref(), Some("Tasks"));
        assert_eq!(setup.name, "Setup");
        assert_eq!(setup.search_depth, 2);
        assert_eq!(setup.filter, None);

        assert_eq!(descriptor.tag_references[1].search_depth, 1);
        assert_eq!(descriptor.tag_references[1].filter, None);

        let finished = &descriptor.tag_references[2];
        assert_eq!(finished.space.as_deref(), Some("General"));
        assert_eq!(finished.name, "Finished");
        let filter = finished.filter.as_ref().unwrap();
        assert_eq!(filter.pattern, "({exp0})::date");
        assert_eq!(filter.exps, vec!["date"]);
        assert_dense(&descriptor);
    }

    #[test]
    fn grouping_criteria_may_carry_data_filters() {
        let descriptor = parse_query(
            "#Test GROUP BY #Pinned AS 'Pinned', #Scheduled{.start} AS 'Scheduled FORMAT(DESC yyyy-MMM-dd)', 1 AS 'Other'",
        )
        .unwrap();

        assert_eq!(descriptor.groupings[1].criteria, "{tag2}");
        assert_eq!(
            descriptor.groupings[1].name.as_deref(),
            Some("Scheduled FORMAT(DESC yyyy-MMM-dd)")
        );
        let filter = descriptor.tag_references[2].filter.as_ref().unwrap();
        assert_eq!(filter.pattern, "{exp0}");
        assert_eq!(filter.exps, vec!["start"]);
    }

    #[test]
    fn on_call_without_attribute_keeps_its_tags() {
        let descriptor = parse_query("#A AND Title.On(#B)").unwrap();

        assert_eq!(
            descriptor.filter_clause.as_deref(),
            Some("{tag0} AND Title.On({tag1})")
        );
        assert_dense(&descriptor);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let descriptor = parse_query("#~Me").unwrap();
        let json = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(json["filterClause"], "{tag0}");
        assert_eq!(json["orderClause"], serde_json::Value::Null);
        assert_eq!(json["tagReferences"][0]["searchDepth"], 1);
        assert_eq!(json["tagReferences"][0]["strictSearchDepth"], true);
        assert_eq!(json["tagReferences"][0]["includeOwner"], true);
        assert!(json.get("groupings").is_none());
        assert!(json["tagReferences"][0].get("filter").is_none());
    }
}
