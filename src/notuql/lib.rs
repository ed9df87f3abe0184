//! # notuql
//!
//! A compiler for the query language of a note-organization application built
//! around notes, tags and typed attributes, each scoped to a space.
//!
//! ```
//! let descriptor = notuql::parse_query("#Project AND @Priority > 3 ORDER BY @Due ASC").unwrap();
//!
//! assert_eq!(descriptor.filter_clause.as_deref(), Some("{tag0} AND {attr0} > 3"));
//! assert_eq!(descriptor.order_clause.as_deref(), Some("{attr1} ASC"));
//! assert_eq!(descriptor.tag_references[0].name, "Project");
//! ```
//!
//! The output is a [`QueryDescriptor`](query::QueryDescriptor): clause text
//! with placeholders plus the structured references behind them, ready for a
//! query executor that lives elsewhere.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs, print.rs)                           │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - compile, check, batch, config                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Query Compiler (query/)                                    │
//! │  - Pure and synchronous, no I/O                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`query`]: clause splitting, tag and attribute extraction
//! - [`api`]: the facade used by the binary
//! - [`commands`]: logic behind each CLI command
//! - [`config`]: persisted output settings
//! - [`error`]: error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod query;

pub use error::{QueryError, QueryPart};
pub use query::{
    extract_attrs, extract_tags, parse_query, split_query, AttrReference, Grouping,
    QueryDescriptor, TagDataFilter, TagReference,
};
