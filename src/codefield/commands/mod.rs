//! # Commands
//!
//! Each bulk operation lives in its own module with a `run` function. Commands
//! take their collaborators explicitly, never touch ambient state, and return
//! a [`CmdResult`]: structured data plus user-facing messages the host binding
//! shows however it likes (tooltip, info box, log).
//!
//! Per-item failures inside a command become warning messages; only failures
//! that make the whole command meaningless are returned as `Err`.

use crate::config::CodefieldConfig;
use crate::model::{CodeBlock, NoteTypeId};
use std::path::{Path, PathBuf};

pub mod compact;
pub mod configure;
pub mod inject;

/// Locations the commands read from.
#[derive(Debug, Clone)]
pub struct CodefieldPaths {
    /// Root of the add-on's bundled assets: the highlighting library, themes,
    /// scripts, stylesheets and the dialog document.
    pub user_files: PathBuf,
    /// URL prefix under which the host's webview serves `user_files`.
    pub web_base: String,
}

impl CodefieldPaths {
    pub fn new<P: AsRef<Path>>(user_files: P, web_base: impl Into<String>) -> Self {
        Self {
            user_files: user_files.as_ref().to_path_buf(),
            web_base: web_base.into(),
        }
    }

    pub fn styles_dir(&self) -> PathBuf {
        self.user_files.join("styles")
    }

    /// Webview URL of a file under `user_files`.
    pub fn web_url(&self, relative: &str) -> String {
        format!("{}/{}", self.web_base.trim_end_matches('/'), relative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
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

/// A note type as listed in the configuration dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTypeSummary {
    pub id: NoteTypeId,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Note types whose templates were rewritten and saved.
    pub changed_note_types: Vec<NoteTypeId>,
    /// Blocks converted to their compact form.
    pub compacted_blocks: Vec<CodeBlock>,
    pub listed_note_types: Vec<NoteTypeSummary>,
    pub themes: Vec<String>,
    /// Set when a command produced or persisted a configuration.
    pub config: Option<CodefieldConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_changed_note_types(mut self, ids: Vec<NoteTypeId>) -> Self {
        self.changed_note_types = ids;
        self
    }

    pub fn with_compacted_blocks(mut self, blocks: Vec<CodeBlock>) -> Self {
        self.compacted_blocks = blocks;
        self
    }

    pub fn with_listed_note_types(mut self, note_types: Vec<NoteTypeSummary>) -> Self {
        self.listed_note_types = note_types;
        self
    }

    pub fn with_themes(mut self, themes: Vec<String>) -> Self {
        self.themes = themes;
        self
    }

    pub fn with_config(mut self, config: CodefieldConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Folds another result's data and messages into this one.
    pub fn merge(&mut self, other: CmdResult) {
        self.changed_note_types.extend(other.changed_note_types);
        self.compacted_blocks.extend(other.compacted_blocks);
        self.listed_note_types.extend(other.listed_note_types);
        self.themes.extend(other.themes);
        if other.config.is_some() {
            self.config = other.config;
        }
        self.messages.extend(other.messages);
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
