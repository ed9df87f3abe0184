//! # API Facade
//!
//! A thin layer over the command modules and the single entry point for UI
//! clients. It dispatches to `commands/*.rs`, normalizes inputs (query words
//! split by the shell are joined back into one query) and returns
//! `Result<CmdResult>`. It never prints.

use crate::commands;
use crate::error::{NotuqlError, Result};
use std::path::Path;

pub struct NotuqlApi {
    paths: commands::NotuqlPaths,
}

impl NotuqlApi {
    pub fn new(paths: commands::NotuqlPaths) -> Self {
        Self { paths }
    }

    pub fn compile<I: AsRef<str>>(&self, parts: &[I]) -> Result<commands::CmdResult> {
        let query = join_query(parts)?;
        commands::compile::run(&query)
    }

    pub fn check<I: AsRef<str>>(&self, parts: &[I]) -> Result<commands::CmdResult> {
        let query = join_query(parts)?;
        commands::check::run(&query)
    }

    pub fn batch(&self, path: &Path) -> Result<commands::CmdResult> {
        commands::batch::run(path)
    }

    pub fn config(&self, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&self.paths, action)
    }

    pub fn load_config(&self) -> Result<NotuqlConfig> {
        NotuqlConfig::load(&self.paths.config_dir)
    }

    pub fn paths(&self) -> &commands::NotuqlPaths {
        &self.paths
    }
}

/// Joins query words with single spaces, as the shell split them on whitespace.
fn join_query<I: AsRef<str>>(parts: &[I]) -> Result<String> {
    if parts.is_empty() {
        return Err(NotuqlError::Api("No query given".into()));
    }
    Ok(parts
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(" "))
}

pub use crate::commands::config::ConfigAction;
pub use crate::config::{NotuqlConfig, OutputFormat};
pub use commands::{CmdMessage, CmdResult, CompiledQuery, MessageLevel, NotuqlPaths};
