//! # Host UI Seams
//!
//! Traits for the parts of the host's user interface this crate drives, plus
//! in-memory implementations. The host binding implements them over its own
//! widgets; nothing here knows about a toolkit.

use std::fmt;
use std::time::Duration;

/// Bulk-operation progress reporting.
///
/// `update` is called once per unit of work. Hosts with an event loop pump
/// it from there, which keeps long synchronizations responsive.
pub trait Progress {
    fn start(&mut self, max: usize, label: &str);
    fn update(&mut self, value: usize, label: &str);
    fn finish(&mut self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _max: usize, _label: &str) {}
    fn update(&mut self, _value: usize, _label: &str) {}
    fn finish(&mut self) {}
}

/// Remembers every call; useful for tests and for hosts that render
/// progress after the fact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedProgress {
    pub max: usize,
    pub label: String,
    pub updates: Vec<(usize, String)>,
    pub finished: bool,
}

impl Progress for RecordedProgress {
    fn start(&mut self, max: usize, label: &str) {
        self.max = max;
        self.label = label.to_string();
        self.finished = false;
    }

    fn update(&mut self, value: usize, label: &str) {
        self.updates.push((value, label.to_string()));
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

/// Identifies one editing surface (one open note editor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// A text selection inside the active field, as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

/// The host's rich-text editing surface for one note.
pub trait EditorSurface {
    fn surface_id(&self) -> SurfaceId;

    /// Snapshots the current selection. Called before a dialog is shown,
    /// since showing it can move focus and lose the selection.
    fn save_selection(&mut self) -> Selection;

    fn restore_selection(&mut self, selection: &Selection);

    /// Inserts markup at the current selection, replacing selected content.
    fn insert_html(&mut self, html: &str);

    /// Markup of the active field.
    fn field_html(&self) -> String;

    fn set_field_html(&mut self, html: String);

    /// Installs (or replaces) the stylesheet used by code blocks in the field.
    fn install_styles(&mut self, css: &str);

    /// Arranges for double-clicks on code blocks to emit `edit_code`
    /// messages, once the surface has settled for `after`.
    fn attach_block_listener(&mut self, after: Duration);

    fn focus(&mut self);
}

/// An editing surface backed by a string.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    id: u64,
    html: String,
    selection: Selection,
    styles: Option<String>,
    listener_delay: Option<Duration>,
    focus_count: usize,
}

impl MemorySurface {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self.selection = Selection::caret(self.html.len());
        self
    }

    /// Places the caret or selection, clamped to the field and to character
    /// boundaries.
    pub fn select(&mut self, start: usize, end: usize) {
        let start = self.clamp(start);
        let end = self.clamp(end).max(start);
        self.selection = Selection { start, end };
    }

    /// What a modal window does to the host's selection.
    pub fn lose_selection(&mut self) {
        self.selection = Selection::caret(self.html.len());
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn styles(&self) -> Option<&str> {
        self.styles.as_deref()
    }

    pub fn listener_delay(&self) -> Option<Duration> {
        self.listener_delay
    }

    pub fn focus_count(&self) -> usize {
        self.focus_count
    }

    fn clamp(&self, pos: usize) -> usize {
        let mut pos = pos.min(self.html.len());
        while !self.html.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }
}

impl EditorSurface for MemorySurface {
    fn surface_id(&self) -> SurfaceId {
        SurfaceId(self.id)
    }

    fn save_selection(&mut self) -> Selection {
        self.selection
    }

    fn restore_selection(&mut self, selection: &Selection) {
        self.select(selection.start, selection.end);
    }

    fn insert_html(&mut self, html: &str) {
        let Selection { start, end } = self.selection;
        self.html.replace_range(start..end, html);
        self.selection = Selection::caret(start + html.len());
    }

    fn field_html(&self) -> String {
        self.html.clone()
    }

    fn set_field_html(&mut self, html: String) {
        self.html = html;
        let caret = self.clamp(self.selection.end);
        self.selection = Selection::caret(caret);
    }

    fn install_styles(&mut self, css: &str) {
        self.styles = Some(css.to_string());
    }

    fn attach_block_listener(&mut self, after: Duration) {
        self.listener_delay = Some(after);
    }

    fn focus(&mut self) {
        self.focus_count += 1;
    }
}
