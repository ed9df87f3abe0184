use crate::commands::{CmdResult, CompiledQuery};
use crate::error::Result;
use crate::query::parse_query;

pub fn run(query: &str) -> Result<CmdResult> {
    let descriptor = parse_query(query)?;
    Ok(CmdResult::default().with_compiled(vec![CompiledQuery {
        source: query.to_string(),
        line: None,
        descriptor,
    }]))
}
