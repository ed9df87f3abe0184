//! Attribute references: `@Price`, `@Space.Price`, `@[Due Date]`, with the
//! optional `.Exists()` and `.On(Tag1|#Space.Tag2)` suffixes.
//!
//! Runs on clauses whose tag references are already placeholders.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::tags::extract_tags;
use super::{placeholder, AttrReference, TagReference};
use crate::error::{QueryError, QueryPart};

const EXISTS_SUFFIX: &str = ".Exists()";
pub(super) const ON_PREFIX: &str = ".On(";

static SINGLE_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([A-Za-z0-9_]+)(?:\.([A-Za-z0-9_]+))?")
        .expect("valid single-word attr regex")
});

static BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@\[(?:([A-Za-z0-9_\s]+)\.)?([A-Za-z0-9_\s]+)\]")
        .expect("valid bracketed attr regex")
});

#[derive(Debug, Clone, Copy)]
enum Grammar {
    SingleWord,
    Bracketed,
}

impl Grammar {
    fn pattern(self) -> &'static Regex {
        match self {
            Grammar::SingleWord => &SINGLE_WORD,
            Grammar::Bracketed => &BRACKETED,
        }
    }

    /// Returns `(space, name, end)` for a match, where `end` is the byte
    /// offset in `clause` just past the base reference.
    fn reference<'c>(
        self,
        clause: &str,
        caps: &Captures<'c>,
    ) -> (Option<&'c str>, &'c str, usize) {
        let first = caps.get(1);
        let second = caps.get(2);
        match (self, first, second) {
            // `@Abc.Exists()` is attribute `Abc` with a suffix, not `Exists` in space `Abc`.
            (Grammar::SingleWord, Some(first), Some(second))
                if clause[second.end()..].starts_with('(') =>
            {
                (None, first.as_str(), first.end())
            }
            (Grammar::SingleWord, Some(first), Some(second)) => {
                (Some(first.as_str()), second.as_str(), second.end())
            }
            (Grammar::SingleWord, Some(first), None) => (None, first.as_str(), first.end()),
            (Grammar::Bracketed, space, Some(name)) => {
                (space.map(|m| m.as_str()), name.as_str(), name.end() + 1)
            }
            _ => unreachable!("attribute regex always captures a name"),
        }
    }
}

/// Byte ranges of the `.On(...)` suffixes that belong to an attribute
/// reference, from `.On(` to the closing `)` or to the end of the clause when
/// unclosed.
pub(super) fn filter_bodies(clause: &str) -> Vec<Range<usize>> {
    let mut bodies = Vec::new();
    for grammar in [Grammar::SingleWord, Grammar::Bracketed] {
        for caps in grammar.pattern().captures_iter(clause) {
            let (_, _, mut end) = grammar.reference(clause, &caps);
            if clause[end..].starts_with(EXISTS_SUFFIX) {
                end += EXISTS_SUFFIX.len();
            }
            if clause[end..].starts_with(ON_PREFIX) {
                let open_end = end + ON_PREFIX.len();
                let close = clause[open_end..]
                    .find(')')
                    .map_or(clause.len(), |close| open_end + close + 1);
                bodies.push(end..close);
            }
        }
    }
    bodies
}

/// Replaces every attribute reference in `clause` with an `{attr<N>}`
/// placeholder, appending one [`AttrReference`] per match to `attrs`.
///
/// Fails when an `.On(` suffix has no closing parenthesis before the end of
/// the clause, or when a tag in it has an unclosed data filter.
pub fn extract_attrs(clause: &str, attrs: &mut Vec<AttrReference>) -> Result<String, QueryError> {
    let clause = replace_references(clause, Grammar::SingleWord, attrs)?;
    replace_references(&clause, Grammar::Bracketed, attrs)
}

fn replace_references(
    clause: &str,
    grammar: Grammar,
    attrs: &mut Vec<AttrReference>,
) -> Result<String, QueryError> {
    let mut output = String::with_capacity(clause.len());
    let mut cursor = 0;

    while let Some(caps) = grammar.pattern().captures_at(clause, cursor) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let (space, name, mut end) = grammar.reference(clause, &caps);

        let mut attr = AttrReference {
            space: space.map(str::to_string),
            name: name.to_string(),
            exists: false,
            tag_filters: None,
        };

        if clause[end..].starts_with(EXISTS_SUFFIX) {
            attr.exists = true;
            end += EXISTS_SUFFIX.len();
        }

        if clause[end..].starts_with(ON_PREFIX) {
            let filter_start = end + ON_PREFIX.len();
            let Some(close) = clause[filter_start..].find(')') else {
                tracing::warn!(attr = %attr.name, position = end, "unclosed attribute filter");
                return Err(QueryError::UnclosedAttrFilter {
                    attr: attr.name,
                    position: end,
                    part: QueryPart::default(),
                });
            };
            let filter_end = filter_start + close;
            attr.tag_filters = Some(parse_tag_filters(&clause[filter_start..filter_end])?);
            end = filter_end + 1;
        }

        let token = placeholder("attr", attrs.len());
        tracing::debug!(%token, space = ?attr.space, name = %attr.name, "attr reference");
        output.push_str(&clause[cursor..whole.start()]);
        output.push_str(&token);
        attrs.push(attr);
        cursor = end;
    }

    output.push_str(&clause[cursor..]);
    Ok(output)
}

/// Parses the pipe-separated body of `.On(...)` with the tag grammar.
///
/// Fragments without a leading `~` get one, so a bare name is still a valid
/// tag reference and every filter includes the owner.
fn parse_tag_filters(body: &str) -> Result<Vec<TagReference>, QueryError> {
    let mut filters = Vec::new();
    for fragment in body.split('|').map(str::trim) {
        if fragment.starts_with('~') {
            extract_tags(fragment, &mut filters)?;
        } else {
            extract_tags(&format!("~{}", fragment), &mut filters)?;
        }
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_plain_attrs() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@Priority > 3 AND @Done = true", &mut attrs).unwrap();

        assert_eq!(clause, "{attr0} > 3 AND {attr1} = true");
        assert_eq!(attrs[0].name, "Priority");
        assert_eq!(attrs[0].space, None);
        assert!(!attrs[0].exists);
        assert_eq!(attrs[0].tag_filters, None);
        assert_eq!(attrs[1].name, "Done");
    }

    #[test]
    fn identifies_attr_spaces() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@Work.Priority AND @[My Space.Due Date]", &mut attrs).unwrap();

        assert_eq!(clause, "{attr0} AND {attr1}");
        assert_eq!(attrs[0].space.as_deref(), Some("Work"));
        assert_eq!(attrs[0].name, "Priority");
        assert_eq!(attrs[1].space.as_deref(), Some("My Space"));
        assert_eq!(attrs[1].name, "Due Date");
    }

    #[test]
    fn bracketed_attr_without_space() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@[Due Date] < '2024-01-01'", &mut attrs).unwrap();

        assert_eq!(clause, "{attr0} < '2024-01-01'");
        assert_eq!(attrs[0].space, None);
        assert_eq!(attrs[0].name, "Due Date");
    }

    #[test]
    fn parses_exists_suffix() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@Abc.Exists() AND @Work.Def.Exists()", &mut attrs).unwrap();

        assert_eq!(clause, "{attr0} AND {attr1}");
        assert!(attrs[0].exists);
        assert_eq!(attrs[0].name, "Abc");
        assert_eq!(attrs[0].space, None);
        assert!(attrs[1].exists);
        assert_eq!(attrs[1].space.as_deref(), Some("Work"));
        assert_eq!(attrs[1].name, "Def");
    }

    #[test]
    fn parses_exists_and_on_suffixes() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@Abc.Exists().On(Tag1|#Space2.Tag2)", &mut attrs).unwrap();

        assert_eq!(clause, "{attr0}");
        assert!(attrs[0].exists);
        let filters = attrs[0].tag_filters.as_ref().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].space, None);
        assert_eq!(filters[0].name, "Tag1");
        assert_eq!(filters[0].search_depth, 0);
        assert!(filters[0].include_owner);
        assert_eq!(filters[1].space.as_deref(), Some("Space2"));
        assert_eq!(filters[1].name, "Tag2");
        assert_eq!(filters[1].search_depth, 1);
        assert!(filters[1].include_owner);
    }

    #[test]
    fn on_suffix_without_exists() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@Price.On(~Shop | [Corner Shop]) > 10", &mut attrs).unwrap();

        assert_eq!(clause, "{attr0} > 10");
        assert!(!attrs[0].exists);
        let filters = attrs[0].tag_filters.as_ref().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].name, "Shop");
        assert_eq!(filters[1].name, "Corner Shop");
        assert!(filters[1].include_owner);
    }

    #[test]
    fn unclosed_on_suffix_is_an_error() {
        let mut attrs = Vec::new();
        let err = extract_attrs("@Abc.On(Tag1", &mut attrs).unwrap_err();

        assert_eq!(
            err,
            QueryError::UnclosedAttrFilter {
                attr: "Abc".into(),
                position: 4,
                part: QueryPart::Clause,
            }
        );
        assert!(attrs.is_empty());
    }

    #[test]
    fn tag_placeholders_are_left_alone() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("{tag0} AND @Size", &mut attrs).unwrap();

        assert_eq!(clause, "{tag0} AND {attr0}");
    }

    #[test]
    fn single_word_attrs_are_numbered_before_bracketed_attrs() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@[Due Date] > @Start", &mut attrs).unwrap();

        assert_eq!(clause, "{attr1} > {attr0}");
        assert_eq!(attrs[0].name, "Start");
        assert_eq!(attrs[1].name, "Due Date");
    }

    #[test]
    fn finds_only_attribute_owned_filter_bodies() {
        let clause = "@A.On(x) AND Title.On(y) AND @[B C].Exists().On(z";

        assert_eq!(filter_bodies(clause), vec![2..8, 44..clause.len()]);
    }

    #[test]
    fn on_filter_tags_may_carry_data_filters() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@Due.On(Task{.done = false})", &mut attrs).unwrap();

        assert_eq!(clause, "{attr0}");
        let filters = attrs[0].tag_filters.as_ref().unwrap();
        assert_eq!(filters[0].name, "Task");
        assert_eq!(filters[0].filter.as_ref().unwrap().pattern, "{exp0} = false");
    }

    #[test]
    fn unknown_call_suffix_stays_literal() {
        let mut attrs = Vec::new();
        let clause = extract_attrs("@Abc.Length() > 2", &mut attrs).unwrap();

        assert_eq!(clause, "{attr0}.Length() > 2");
        assert_eq!(attrs[0].name, "Abc");
        assert_eq!(attrs[0].space, None);
    }
}
