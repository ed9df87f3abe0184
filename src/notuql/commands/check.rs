use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::query::{parse_query, QueryDescriptor};

/// Compiles a query and reports what it references instead of returning it.
pub fn run(query: &str) -> Result<CmdResult> {
    let descriptor = parse_query(query)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(summarize(&descriptor)));
    if descriptor.filter_clause.is_none() {
        result.add_message(CmdMessage::warning("Query has no filter clause"));
    }
    Ok(result)
}

pub(crate) fn summarize(descriptor: &QueryDescriptor) -> String {
    let mut summary = format!(
        "ok: {}, {}",
        plural(descriptor.tag_references.len(), "tag reference"),
        plural(descriptor.attr_references.len(), "attribute reference"),
    );
    if descriptor.order_clause.is_some() {
        summary.push_str(", ordered");
    }
    if !descriptor.groupings.is_empty() {
        summary.push_str(&format!(", {}", plural(descriptor.groupings.len(), "grouping")));
    }
    summary
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
