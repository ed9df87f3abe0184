use colored::Colorize;
use notuql::api::{CmdMessage, CompiledQuery, MessageLevel, OutputFormat};
use notuql::error::Result;
use notuql::query::{AttrReference, QueryDescriptor, TagDataFilter, TagReference};
use serde::Serialize;

const LABEL_WIDTH: usize = 8;

#[derive(Serialize)]
struct BatchEntry<'a> {
    line: Option<usize>,
    query: &'a str,
    descriptor: &'a QueryDescriptor,
}

pub(crate) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

/// Prints compiled queries. A single query prints its bare descriptor; batch
/// output carries the source line with each descriptor.
pub(crate) fn print_compiled(
    compiled: &[CompiledQuery],
    format: OutputFormat,
    pretty: bool,
    batch: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let out = if batch {
                let entries: Vec<BatchEntry<'_>> = compiled
                    .iter()
                    .map(|c| BatchEntry {
                        line: c.line,
                        query: &c.source,
                        descriptor: &c.descriptor,
                    })
                    .collect();
                to_json(&entries, pretty)?
            } else {
                match compiled {
                    [single] => to_json(&single.descriptor, pretty)?,
                    many => {
                        let descriptors: Vec<&QueryDescriptor> =
                            many.iter().map(|c| &c.descriptor).collect();
                        to_json(&descriptors, pretty)?
                    }
                }
            };
            println!("{}", out);
        }
        OutputFormat::Text => {
            for (i, c) in compiled.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                if batch {
                    let header = match c.line {
                        Some(n) => format!("line {}: {}", n, c.source),
                        None => c.source.clone(),
                    };
                    println!("{}", header.bold());
                }
                print_descriptor_text(&c.descriptor);
            }
        }
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

fn print_descriptor_text(descriptor: &QueryDescriptor) {
    for (label, text) in clause_lines(descriptor) {
        println!("{}{}", pad_label(&label).dimmed(), text);
    }
    for (token, syntax) in reference_lines(descriptor) {
        println!("{}{}", pad_label(&token).yellow(), syntax);
    }
}

fn pad_label(label: &str) -> String {
    format!("{:<width$}", label, width = LABEL_WIDTH)
}

fn clause_lines(descriptor: &QueryDescriptor) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    if let Some(filter) = &descriptor.filter_clause {
        lines.push(("filter".to_string(), filter.clone()));
    }
    if let Some(order) = &descriptor.order_clause {
        lines.push(("order".to_string(), order.clone()));
    }
    for grouping in &descriptor.groupings {
        let text = match &grouping.name {
            Some(name) => format!("{} AS '{}'", grouping.criteria, name),
            None => grouping.criteria.clone(),
        };
        lines.push(("group".to_string(), text));
    }
    lines
}

fn reference_lines(descriptor: &QueryDescriptor) -> Vec<(String, String)> {
    let tags = descriptor
        .tag_references
        .iter()
        .enumerate()
        .map(|(i, tag)| (format!("{{tag{}}}", i), tag_syntax(tag)));
    let attrs = descriptor
        .attr_references
        .iter()
        .enumerate()
        .map(|(i, attr)| (format!("{{attr{}}}", i), attr_syntax(attr)));
    tags.chain(attrs).collect()
}

/// Writes a tag reference back in canonical query syntax.
fn tag_syntax(tag: &TagReference) -> String {
    let mut out = "#".repeat(tag.search_depth);
    if !tag.strict_search_depth {
        out.push('?');
    }
    if tag.include_owner {
        out.push('~');
    }
    out.push_str(&qualified_name(tag.space.as_deref(), &tag.name));
    if let Some(filter) = &tag.filter {
        out.push_str(&format!("{{{}}}", data_filter_syntax(filter)));
    }
    out
}

fn data_filter_syntax(filter: &TagDataFilter) -> String {
    filter
        .exps
        .iter()
        .enumerate()
        .fold(filter.pattern.clone(), |text, (i, exp)| {
            text.replace(&format!("{{exp{}}}", i), &format!(".{}", exp))
        })
}

fn attr_syntax(attr: &AttrReference) -> String {
    let mut out = format!("@{}", qualified_name(attr.space.as_deref(), &attr.name));
    if attr.exists {
        out.push_str(".Exists()");
    }
    if let Some(filters) = &attr.tag_filters {
        let filters: Vec<String> = filters.iter().map(tag_syntax).collect();
        out.push_str(&format!(".On({})", filters.join("|")));
    }
    out
}

fn qualified_name(space: Option<&str>, name: &str) -> String {
    let full = match space {
        Some(space) => format!("{}.{}", space, name),
        None => name.to_string(),
    };
    if full.chars().any(char::is_whitespace) {
        format!("[{}]", full)
    } else {
        full
    }
}
