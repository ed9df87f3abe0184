//! Tag references: `#Tag`, `##?Space.Tag`, `~Tag`, `#~[Space 2.Tag 2]`.
//!
//! A reference is a modifier run followed by an optional space qualifier and
//! a name. The modifier run is one or more `#` (search depth), optionally
//! followed by `?` (non-strict depth) and/or `~` (include owner); a lone `~`;
//! or a `~` placed in front of the `#` run.
//!
//! A reference may carry a data filter in braces, `#Person{.height > 1.8}`.
//! Each `.path` expression in it becomes an `{exp<N>}` placeholder.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::attrs::filter_bodies;
use super::{placeholder, TagDataFilter, TagReference};
use crate::error::{QueryError, QueryPart};

static SINGLE_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(~?#+\??~?|~)(?:([A-Za-z0-9_]+)\.)?([A-Za-z0-9_]+)")
        .expect("valid single-word tag regex")
});

static BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(~?#+\??~?|~)\[(?:([A-Za-z0-9_\s]+)\.)?([A-Za-z0-9_\s]+)\]")
        .expect("valid bracketed tag regex")
});

static TAG_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{tag[0-9]+\}").expect("valid tag placeholder regex"));

static DATA_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s(](\.[A-Za-z0-9_\[\].]+)").expect("valid data expression regex")
});

impl TagReference {
    /// Decodes a modifier run (`#`, `##?`, `#~`, `~`, `~#`...) plus the
    /// qualifier and name that follow it.
    fn from_modifier(modifier: &str, space: Option<&str>, name: &str) -> Self {
        Self {
            space: space.map(str::to_string),
            name: name.to_string(),
            search_depth: modifier.chars().filter(|c| *c == '#').count(),
            strict_search_depth: !modifier.contains('?'),
            include_owner: modifier.contains('~'),
            filter: None,
        }
    }

    fn from_captures(caps: &Captures<'_>) -> Self {
        Self::from_modifier(&caps[1], caps.get(2).map(|m| m.as_str()), &caps[3])
    }
}

impl TagDataFilter {
    /// Builds a filter from the text between the braces.
    fn parse(body: &str) -> Self {
        let padded = format!(" {}", body);
        let mut pattern = String::with_capacity(padded.len());
        let mut exps = Vec::new();
        let mut cursor = 0;

        for caps in DATA_EXPRESSION.captures_iter(&padded) {
            let Some(path) = caps.get(1) else {
                continue;
            };
            pattern.push_str(&padded[cursor..path.start()]);
            pattern.push_str(&placeholder("exp", exps.len()));
            exps.push(path.as_str()[1..].to_string());
            cursor = path.end();
        }
        pattern.push_str(&padded[cursor..]);

        Self {
            pattern: pattern.trim().to_string(),
            exps,
        }
    }
}

/// Replaces every tag reference in `clause` with a `{tag<N>}` placeholder.
///
/// Each reference found is appended to `tags`; N is the length of `tags`
/// before the append, so numbering continues from whatever the list already
/// holds. All single-word references are numbered before any bracketed one.
/// A data filter in braces right after a reference is consumed with it.
/// The body of an attribute's `.On(...)` suffix is left for
/// [`extract_attrs`](super::extract_attrs), which owns those references.
///
/// Fails only when a data filter has no closing brace.
pub fn extract_tags(clause: &str, tags: &mut Vec<TagReference>) -> Result<String, QueryError> {
    let clause = replace_references(clause, &SINGLE_WORD, tags)?;
    replace_references(&clause, &BRACKETED, tags)
}

// Placeholders start with `{`, which no modifier run accepts, so one
// left-to-right pass sees the same matches a rescan after every
// substitution would.
fn replace_references(
    clause: &str,
    pattern: &Regex,
    tags: &mut Vec<TagReference>,
) -> Result<String, QueryError> {
    let skipped = filter_bodies(clause);
    let mut output = String::with_capacity(clause.len());
    let mut cursor = 0;

    while let Some(caps) = pattern.captures_at(clause, cursor) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        if let Some(body) = owning_body(&skipped, whole.start()) {
            output.push_str(&clause[cursor..body.end]);
            cursor = body.end;
            continue;
        }

        let mut tag = TagReference::from_captures(&caps);
        let mut end = whole.end();

        if has_data_filter(&clause[end..]) {
            let Some(close) = closing_brace(&clause[end..]) else {
                tracing::warn!(tag = %tag.name, position = end, "unclosed data filter");
                return Err(QueryError::UnclosedDataFilter {
                    tag: tag.name,
                    position: end,
                    part: QueryPart::default(),
                });
            };
            tag.filter = Some(TagDataFilter::parse(&clause[end + 1..end + close]));
            end += close + 1;
        }

        let token = placeholder("tag", tags.len());
        tracing::debug!(%token, space = ?tag.space, name = %tag.name, "tag reference");
        output.push_str(&clause[cursor..whole.start()]);
        output.push_str(&token);
        tags.push(tag);
        cursor = end;
    }

    output.push_str(&clause[cursor..]);
    Ok(output)
}

fn owning_body(bodies: &[Range<usize>], offset: usize) -> Option<&Range<usize>> {
    bodies.iter().find(|body| body.contains(&offset))
}

// A single-word tag placed right after a bracketed one is already a
// placeholder by the time the bracketed pass sees it.
fn has_data_filter(rest: &str) -> bool {
    rest.starts_with('{') && !TAG_PLACEHOLDER.is_match(rest)
}

/// Offset of the `}` balancing the `{` that `text` starts with.
fn closing_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
