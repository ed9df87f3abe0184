use crate::commands::{CmdMessage, CmdResult, CompiledQuery};
use crate::error::Result;
use crate::query::parse_query;
use std::fs;
use std::path::Path;

const COMMENT_PREFIX: &str = "//";

/// Compiles every query in a file, one per line.
///
/// Blank lines and lines starting with `//` are skipped. A query that fails to
/// compile becomes an error message naming its line; the others still compile.
pub fn run(path: &Path) -> Result<CmdResult> {
    let content = fs::read_to_string(path)?;
    let mut result = CmdResult::default();
    let mut compiled = Vec::new();
    let mut total = 0;

    for (i, line) in content.lines().enumerate() {
        let query = line.trim();
        if query.is_empty() || query.starts_with(COMMENT_PREFIX) {
            continue;
        }
        total += 1;

        match parse_query(query) {
            Ok(descriptor) => compiled.push(CompiledQuery {
                source: query.to_string(),
                line: Some(i + 1),
                descriptor,
            }),
            Err(e) => {
                tracing::debug!(line = i + 1, error = %e, "batch query failed");
                result.add_message(CmdMessage::error(format!("line {}: {}", i + 1, e)));
            }
        }
    }

    if total == 0 {
        result.add_message(CmdMessage::warning(format!(
            "No queries found in {}",
            path.display()
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "Compiled {} of {} queries",
            compiled.len(),
            total
        )));
    }

    Ok(result.with_compiled(compiled))
}
