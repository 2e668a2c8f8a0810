//! # API Facade
//!
//! The single entry point the host binding calls: toolbar button, editor
//! webview messages, dialog messages, the note-save hook, the field-check
//! slot and the configuration dialog all land here.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Owns the collaborators**: media store, note type store, config store
//! - **Holds the configuration** loaded at startup and passes it explicitly
//!   to every component; it is replaced only after a successful save
//! - **Dispatches** to `commands/*`, [`crate::session`] and [`crate::validation`]
//!
//! It does no presentation. Hook-style entry points (`on_webview_message`,
//! `on_note_will_save`, `fields_check`) never fail: problems are logged and
//! reported through the returned value so the host is never interrupted.
//!
//! ## Generic Over Stores
//!
//! - Production: `CodefieldApi<FsMediaStore, FileNoteTypeStore, FileConfigStore>`
//! - Testing: `CodefieldApi<MemoryMediaStore, MemoryNoteTypeStore, MemoryConfigStore>`

use crate::assets::{self, ResourceBlock};
use crate::bridge::BridgeMessage;
use crate::codec::{self, Highlighter, PlainText};
use crate::commands::configure::{self, ConfigAction, ConfigSelection};
use crate::commands::{self, CmdMessage, CmdResult, CodefieldPaths};
use crate::config::{CodefieldConfig, ConfigStore};
use crate::error::Result;
use crate::host::{EditorSurface, NoProgress, Progress, SurfaceId};
use crate::model::{BlockId, Note};
use crate::session::{DialogPage, OpenOutcome, SessionOutcome, SessionRegistry};
use crate::store::{MediaStore, NoteTypeStore};
use crate::validation::{FieldsCheck, FieldsCheckResult, FIELD_CHECK_OVERRIDE};
use std::path::PathBuf;

pub struct CodefieldApi<M: MediaStore, N: NoteTypeStore, C: ConfigStore> {
    media: M,
    note_types: N,
    config_store: C,
    paths: CodefieldPaths,
    config: CodefieldConfig,
    sessions: SessionRegistry,
}

impl<M: MediaStore, N: NoteTypeStore, C: ConfigStore> CodefieldApi<M, N, C> {
    /// Loads the configuration; an unreadable one is replaced by defaults.
    pub fn new(media: M, note_types: N, config_store: C, paths: CodefieldPaths) -> Self {
        let config = config_store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load configuration, using defaults");
            CodefieldConfig::default()
        });
        Self {
            media,
            note_types,
            config_store,
            paths,
            config,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn config(&self) -> &CodefieldConfig {
        &self.config
    }

    pub fn paths(&self) -> &CodefieldPaths {
        &self.paths
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn note_types(&self) -> &N {
        &self.note_types
    }

    pub fn config_store(&self) -> &C {
        &self.config_store
    }

    pub fn reload_config(&mut self) -> Result<()> {
        self.config = self.config_store.load()?;
        Ok(())
    }

    // --- Editing ---

    /// Toolbar button: opens a dialog for a new block, or asks the host to
    /// raise the one already open on this surface.
    pub fn open_editor(&mut self, surface: &mut dyn EditorSurface) -> Result<OpenOutcome> {
        self.sessions.open(surface, &self.paths, &self.config, None)
    }

    /// Messages from the editing surface. Returns true when the message was
    /// ours; anything else is left to other handlers.
    pub fn on_webview_message(&mut self, surface: &mut dyn EditorSurface, message: &str) -> bool {
        match message.parse::<BridgeMessage>() {
            Ok(BridgeMessage::EditCode { id, encoded_source }) => {
                if let Err(e) = self.open_block(surface, id, encoded_source) {
                    tracing::error!(error = %e, "could not open code block for editing");
                }
                true
            }
            _ => false,
        }
    }

    fn open_block(
        &mut self,
        surface: &mut dyn EditorSurface,
        id: BlockId,
        encoded_source: String,
    ) -> Result<OpenOutcome> {
        self.sessions
            .open(surface, &self.paths, &self.config, Some((id, encoded_source)))
    }

    /// Messages from a dialog.
    pub fn on_dialog_message(
        &mut self,
        surface: &mut dyn EditorSurface,
        message: &str,
    ) -> Result<SessionOutcome> {
        let message: BridgeMessage = message.parse()?;
        let outcome = self
            .sessions
            .dispatch(message, surface, &mut self.config_store, &self.paths)?;
        if let SessionOutcome::LanguageSaved(language) = &outcome {
            self.config.last_language = language.clone();
        }
        Ok(outcome)
    }

    /// Dialog dismissed without submitting.
    pub fn close_editor(&mut self, surface: SurfaceId) -> bool {
        self.sessions.close(surface)
    }

    pub fn dialog_page(&self, surface: SurfaceId) -> Option<&DialogPage> {
        self.sessions.get(surface).map(|s| s.page())
    }

    /// Rebuilds rich spans from stored compact spans, so a note loaded into
    /// the editor is editable again.
    pub fn expand_field(&self, html: &str) -> String {
        self.expand_field_with(html, &PlainText)
    }

    pub fn expand_field_with(&self, html: &str, highlighter: &dyn Highlighter) -> String {
        codec::expand_document(html, &self.config.active_theme, highlighter)
    }

    // --- Saving ---

    /// Note-save hook: stores every block in compact form.
    pub fn on_note_will_save(&self, note: &mut Note) -> CmdResult {
        commands::compact::run(note)
    }

    /// Captures the host's original field check. Later calls keep the first.
    pub fn install_field_check(&self, original: Box<dyn FieldsCheck>) -> bool {
        FIELD_CHECK_OVERRIDE.install(original)
    }

    pub fn fields_check(&self, note: &Note) -> FieldsCheckResult {
        FIELD_CHECK_OVERRIDE.check(note, &self.config)
    }

    // --- Configuration and templates ---

    pub fn show_config(&mut self) -> Result<CmdResult> {
        configure::run(
            &mut self.config_store,
            &mut self.media,
            &mut self.note_types,
            &self.paths,
            ConfigAction::Show,
            &mut NoProgress,
        )
    }

    /// Configuration dialog "Save": validate, persist, re-synchronize.
    pub fn apply_config(
        &mut self,
        selection: ConfigSelection,
        progress: &mut dyn Progress,
    ) -> Result<CmdResult> {
        let result = configure::run(
            &mut self.config_store,
            &mut self.media,
            &mut self.note_types,
            &self.paths,
            ConfigAction::Apply(selection),
            progress,
        )?;
        if let Some(config) = &result.config {
            self.config = config.clone();
        }
        Ok(result)
    }

    /// Republishes assets and synchronizes templates for the current
    /// configuration.
    pub fn sync_templates(&mut self, progress: &mut dyn Progress) -> Result<CmdResult> {
        commands::inject::run(
            &mut self.media,
            &mut self.note_types,
            &self.paths,
            &self.config,
            progress,
        )
    }

    pub fn resource_block(&mut self) -> ResourceBlock {
        assets::publish_resource_block(
            &mut self.media,
            &self.paths.user_files,
            &self.config.active_theme,
        )
    }

    pub fn list_themes(&self) -> Result<Vec<String>> {
        assets::list_themes(&self.paths.user_files)
    }

    /// The user-editable stylesheet folder, when present.
    pub fn styles_dir(&self) -> Option<PathBuf> {
        let dir = self.paths.styles_dir();
        if dir.is_dir() {
            Some(dir)
        } else {
            tracing::warn!(path = %dir.display(), "styles folder not found");
            None
        }
    }

    /// Like [`Self::styles_dir`], as a message for hosts that only report.
    pub fn styles_dir_result(&self) -> CmdResult {
        let mut result = CmdResult::default();
        match self.styles_dir() {
            Some(dir) => result.add_message(CmdMessage::info(dir.display().to_string())),
            None => result.add_message(CmdMessage::error(format!(
                "Styles folder not found at {}",
                self.paths.styles_dir().display()
            ))),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_source;
    use crate::config::MemoryConfigStore;
    use crate::host::MemorySurface;
    use crate::model::NoteTypeId;
    use crate::store::memory::{MemoryMediaStore, MemoryNoteTypeStore};
    use crate::test_utils::{sample_note_types, UserFiles};
    use serde_json::json;

    type TestApi = CodefieldApi<MemoryMediaStore, MemoryNoteTypeStore, MemoryConfigStore>;

    fn api(files: &UserFiles, document: serde_json::Value) -> TestApi {
        CodefieldApi::new(
            MemoryMediaStore::new(),
            MemoryNoteTypeStore::new(sample_note_types()),
            MemoryConfigStore::with_document(document),
            files.paths(),
        )
    }

    #[test]
    fn broken_config_falls_back_to_defaults() {
        let files = UserFiles::new();
        let api = api(&files, json!("not an object"));
        assert_eq!(api.config(), &CodefieldConfig::default());
    }

    #[test]
    fn foreign_webview_messages_are_not_handled() {
        let files = UserFiles::new();
        let mut api = api(&files, json!({}));
        let mut surface = MemorySurface::new(1);
        assert!(!api.on_webview_message(&mut surface, "key:0:1:x"));
        assert!(!api.on_webview_message(&mut surface, "set_lang:python"));
        assert!(api.dialog_page(surface.surface_id()).is_none());
    }

    #[test]
    fn double_click_opens_an_editing_dialog() {
        let files = UserFiles::new();
        let mut api = api(&files, json!({}));
        let mut surface = MemorySurface::new(9);
        let message = format!("edit_code:code-block-1:{}", encode_source("x = 1"));

        assert!(api.on_webview_message(&mut surface, &message));
        let page = api.dialog_page(SurfaceId(9)).unwrap();
        assert!(page.body.contains("x = 1"));
        assert!(api.close_editor(SurfaceId(9)));
    }

    #[test]
    fn language_choice_updates_the_held_config() {
        let files = UserFiles::new();
        let mut api = api(&files, json!({}));
        let mut surface = MemorySurface::new(1);
        api.open_editor(&mut surface).unwrap();

        api.on_dialog_message(&mut surface, "set_lang:text/x-java").unwrap();
        assert_eq!(api.config().last_language, "text/x-java");
        assert_eq!(
            api.config_store().document()["last_language"],
            "text/x-java"
        );
    }

    #[test]
    fn malformed_dialog_message_is_an_error() {
        let files = UserFiles::new();
        let mut api = api(&files, json!({}));
        let mut surface = MemorySurface::new(1);
        assert!(api.on_dialog_message(&mut surface, "insert_code:x").is_err());
    }

    #[test]
    fn apply_config_replaces_the_held_config() {
        let files = UserFiles::new();
        let mut api = api(&files, json!({}));
        let result = api
            .apply_config(
                ConfigSelection {
                    theme: "eclipse".into(),
                    injected: vec![NoteTypeId(2)],
                    bypassed: vec![],
                },
                &mut NoProgress,
            )
            .unwrap();
        assert!(!result.has_errors());
        assert_eq!(api.config().active_theme, "eclipse");
        assert!(api.config().should_inject(NoteTypeId(2)));
    }

    #[test]
    fn held_config_follows_a_save_even_when_sync_fails() {
        let files = UserFiles::new();
        let mut note_types = MemoryNoteTypeStore::new(sample_note_types());
        note_types.set_simulate_read_error(true);
        let mut api = CodefieldApi::new(
            MemoryMediaStore::new(),
            note_types,
            MemoryConfigStore::new(),
            files.paths(),
        );

        let result = api
            .apply_config(
                ConfigSelection {
                    theme: "monokai".into(),
                    injected: vec![],
                    bypassed: vec![NoteTypeId(1)],
                },
                &mut NoProgress,
            )
            .unwrap();

        assert!(!result.has_errors());
        assert_eq!(api.config().active_theme, "monokai");
        assert!(api.config().is_bypassed(NoteTypeId(1)));
        assert_eq!(
            api.fields_check(&Note::new(1).with_field("Text", "")),
            FieldsCheckResult::Normal
        );
    }

    #[test]
    fn styles_dir_requires_the_folder() {
        let files = UserFiles::new();
        let api = api(&files, json!({}));
        assert_eq!(api.styles_dir(), Some(files.path().join("styles")));

        let empty = UserFiles::empty();
        let api = CodefieldApi::new(
            MemoryMediaStore::new(),
            MemoryNoteTypeStore::default(),
            MemoryConfigStore::new(),
            empty.paths(),
        );
        assert!(api.styles_dir().is_none());
        assert!(api.styles_dir_result().has_errors());
    }
}
