use std::fmt;
use thiserror::Error;

/// Which part of a query an error position is relative to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryPart {
    /// A clause handed straight to an extractor.
    #[default]
    Clause,
    Filter,
    Order,
    /// 1-based position in the `GROUP BY` list.
    Grouping(usize),
}

impl fmt::Display for QueryPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPart::Clause => write!(f, "clause"),
            QueryPart::Filter => write!(f, "filter clause"),
            QueryPart::Order => write!(f, "ORDER BY clause"),
            QueryPart::Grouping(n) => write!(f, "GROUP BY item {}", n),
        }
    }
}

/// The structural failures the query compiler can report.
///
/// Both are an opening delimiter with no matching close. Everything else that
/// fails to match a reference grammar is left in the clause as literal text.
/// `position` is a byte offset into the clause text as the failing extractor
/// saw it; `part` names that clause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unclosed bracket in attribute filter '{attr}' at byte {position} of the {part}")]
    UnclosedAttrFilter {
        attr: String,
        position: usize,
        part: QueryPart,
    },

    #[error("unclosed brace in data filter of tag '{tag}' at byte {position} of the {part}")]
    UnclosedDataFilter {
        tag: String,
        position: usize,
        part: QueryPart,
    },
}

impl QueryError {
    /// Records which part of the query the failing clause came from.
    pub fn in_part(mut self, clause: QueryPart) -> Self {
        match &mut self {
            QueryError::UnclosedAttrFilter { part, .. }
            | QueryError::UnclosedDataFilter { part, .. } => *part = clause,
        }
        self
    }
}

#[derive(Error, Debug)]
pub enum NotuqlError {
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, NotuqlError>;
