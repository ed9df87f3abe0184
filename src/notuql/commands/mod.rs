use crate::config::NotuqlConfig;
use crate::query::QueryDescriptor;
use std::path::PathBuf;

pub mod batch;
pub mod check;
pub mod compile;
pub mod config;

#[derive(Debug, Clone)]
pub struct NotuqlPaths {
    pub config_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// A query together with what it compiled to.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub source: String,
    /// 1-based line number when the query came from a batch file.
    pub line: Option<usize>,
    pub descriptor: QueryDescriptor,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub compiled: Vec<CompiledQuery>,
    pub config: Option<NotuqlConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_compiled(mut self, compiled: Vec<CompiledQuery>) -> Self {
        self.compiled = compiled;
        self
    }

    pub fn with_config(mut self, config: NotuqlConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
