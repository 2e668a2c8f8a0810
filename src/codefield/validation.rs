//! # Field-Check Override
//!
//! Before saving a note the host checks that its fields are not empty and,
//! for cloze note types, that a cloze deletion is present. That check works on
//! plain text, so a cloze wrapped around highlighted code
//! (`{{<span class="cm-variable">c1</span>::...}}`) looks malformed to it.
//!
//! The host exposes the check as a single replaceable strategy. We install a
//! [`FieldCheckOverride`] in that slot: it captures the host's original
//! strategy exactly once, answers [`FieldsCheckResult::Normal`] for bypassed
//! note types, and delegates everything else unchanged. Installing again
//! (an add-on reload) never wraps the override around itself.

use crate::config::CodefieldConfig;
use crate::html;
use crate::model::Note;
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

static CLOZE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{c\d+::").expect("CLOZE_MARKER regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldsCheckResult {
    Normal,
    /// The first field has no text.
    Empty,
    /// A cloze note type without any cloze deletion.
    MissingCloze,
}

/// A strategy for validating a note's fields before it is saved.
pub trait FieldsCheck: Send + Sync {
    fn check(&self, note: &Note) -> FieldsCheckResult;
}

impl<F> FieldsCheck for F
where
    F: Fn(&Note) -> FieldsCheckResult + Send + Sync,
{
    fn check(&self, note: &Note) -> FieldsCheckResult {
        self(note)
    }
}

/// The host's heuristic, used when its own check was never captured. Cloze
/// markers are matched against the raw markup, as the host does.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicFieldsCheck;

impl FieldsCheck for BasicFieldsCheck {
    fn check(&self, note: &Note) -> FieldsCheckResult {
        let first = note.fields.first().map(|f| f.html.as_str()).unwrap_or("");
        if html::strip_tags(first).trim().is_empty() {
            return FieldsCheckResult::Empty;
        }
        if note.is_cloze && !note.fields.iter().any(|f| CLOZE_MARKER.is_match(&f.html)) {
            return FieldsCheckResult::MissingCloze;
        }
        FieldsCheckResult::Normal
    }
}

/// The override slot. Holds at most one original strategy for its lifetime.
pub struct FieldCheckOverride {
    original: OnceCell<Box<dyn FieldsCheck>>,
}

impl FieldCheckOverride {
    pub const fn new() -> Self {
        Self {
            original: OnceCell::new(),
        }
    }

    /// Captures the host's original check. Returns `false`, leaving the
    /// captured strategy in place, when one was already installed.
    pub fn install(&self, original: Box<dyn FieldsCheck>) -> bool {
        match self.original.set(original) {
            Ok(()) => {
                tracing::debug!("field check override installed");
                true
            }
            Err(_) => {
                tracing::debug!("field check override already installed, keeping original");
                false
            }
        }
    }

    pub fn is_installed(&self) -> bool {
        self.original.get().is_some()
    }

    pub fn check(&self, note: &Note, config: &CodefieldConfig) -> FieldsCheckResult {
        if config.is_bypassed(note.notetype_id) {
            return FieldsCheckResult::Normal;
        }
        match self.original.get() {
            Some(original) => original.check(note),
            None => BasicFieldsCheck.check(note),
        }
    }
}

impl Default for FieldCheckOverride {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide slot the host binding installs into at startup.
pub static FIELD_CHECK_OVERRIDE: FieldCheckOverride = FieldCheckOverride::new();
