//! # Codefield Architecture
//!
//! Codefield puts syntax-highlighted, re-editable code blocks into flashcard
//! note fields. It is a **UI-agnostic library**: the flashcard host's add-on
//! binding (toolbar button, webview message hook, note-save hook, field-check
//! slot, configuration dialog) is a thin client that calls into [`api`].
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host binding (outside this crate)                          │
//! │  - Widgets, webviews, menus, progress bars                  │
//! │  - Implements the traits in host.rs and store/              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs, init.rs)                                │
//! │  - Owns the stores and the loaded configuration             │
//! │  - Hook entry points never fail; problems are reported      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Components                                                 │
//! │  - commands/ (template sync, note compaction, configure)    │
//! │  - session.rs (edit dialogs), assets.rs (media publishing)  │
//! │  - validation.rs (field-check override), bridge.rs          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Markup and Storage                                         │
//! │  - codec.rs / html.rs: rich and compact block forms         │
//! │  - store/: MediaStore, NoteTypeStore (fs and memory)        │
//! │  - config.rs: ConfigStore (file and memory)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Block Lifecycle
//!
//! While a note is edited a block is a *rich span* with an identity and its
//! raw source attached. When the note is saved it becomes a *compact span*:
//! language plus raw source, nothing else. At review time card templates carry
//! a hidden *resource block* that loads the highlighter and paints compact
//! spans with the active theme.
//!
//! ## Key Principle: No Ambient State
//!
//! The configuration is loaded once, held by the API and passed to whatever
//! needs it. The one process-wide value is the field-check override slot,
//! because the host itself has exactly one such slot.
//!
//! ## Module Overview
//!
//! - [`api`]: the facade; [`init`]: wiring against real directories
//! - [`commands`]: template synchronization, note compaction, configuration
//! - [`session`]: edit dialog state machine and dialog bootstrap
//! - [`assets`]: publishing bundled files to the media store
//! - [`codec`], [`html`]: block representations and fragment rewriting
//! - [`bridge`]: the dialog/editor message type
//! - [`validation`]: the field-check override
//! - [`config`], [`store`], [`host`]: collaborators
//! - [`model`], [`starter`], [`error`], [`logging`]

pub mod api;
pub mod assets;
pub mod bridge;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod html;
pub mod init;
pub mod logging;
pub mod model;
pub mod session;
pub mod starter;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;
