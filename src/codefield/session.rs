//! # Edit Sessions
//!
//! One dialog per editing surface. A session starts either empty (`New`, from
//! the toolbar button) or with a decoded block (`Editing`, from a double-click
//! on a rich span), and ends `Closed` on insert, update or cancel.
//!
//! ```text
//!   New ──insert──▶ Closed ◀──update── Editing
//!    └────────cancel───┘└──────cancel─────┘
//! ```
//!
//! Opening a modal dialog can take the host's text selection away, so the
//! selection is snapshotted when the session opens and restored just before
//! inserting. Language changes are persisted the moment they happen, not
//! only on insert.

use crate::assets;
use crate::bridge::BridgeMessage;
use crate::codec::{self, Prerendered, RICH_CLASS};
use crate::commands::CodefieldPaths;
use crate::config::{CodefieldConfig, ConfigStore};
use crate::error::{CodefieldError, Result};
use crate::host::{EditorSurface, Selection, SurfaceId};
use crate::html;
use crate::model::BlockId;
use crate::starter::STARTER_CODE;
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

/// How long the surface is left to settle after an insertion before block
/// listeners are attached.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Base document of the dialog, relative to `user_files`.
pub const DIALOG_DOCUMENT: &str = "codemirror_index.html";

/// Id of the textarea the dialog's editor widget is created from.
pub const EDITOR_TEXTAREA_ID: &str = "code-editor";

const BASE_CSS: &str = "codemirror/lib/codemirror.css";
const DIALOG_STYLES: &str = "styles/styles.css";

/// Dialog scripts, in load order.
pub const DIALOG_SCRIPTS: &[&str] = &[
    "codemirror/lib/codemirror.js",
    "codemirror/addon/edit/closebrackets.js",
    "codemirror/addon/edit/matchbrackets.js",
    "codemirror/mode/clike/clike.js",
    "codemirror/mode/python/python.js",
    "codemirror/mode/javascript/javascript.js",
    "codemirror/mode/ruby/ruby.js",
    "codemirror/mode/sql/sql.js",
    "codemirror/mode/css/css.js",
    "codemirror/mode/xml/xml.js",
    "codemirror/mode/htmlmixed/htmlmixed.js",
    "scripts/script.js",
];

const BLOCK_STYLE_RULE: &str = ".anki-code-block {
    display: inline-block;
    vertical-align: middle;
    height: auto;
    border-radius: 6px;
    padding: 4px 8px;
    padding-left: 2em;
    font-family: 'Fira Code', monospace;
    font-size: 16px;
    max-width: 100%;
    overflow-x: auto;
    text-align: left;
}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    New,
    Editing { id: BlockId, source: String },
    Closed,
}

/// Everything the host needs to show the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogPage {
    /// Body markup of the base document, with the editor textarea filled.
    pub body: String,
    /// Inline head markup exposing `window.CM_CONFIG`.
    pub head: String,
    /// Stylesheet URLs, in load order.
    pub stylesheets: Vec<String>,
    /// Script URLs, in load order.
    pub scripts: Vec<String>,
}

impl DialogPage {
    /// A standalone document, for hosts that load raw HTML.
    pub fn to_html(&self) -> String {
        let links: String = self
            .stylesheets
            .iter()
            .map(|href| {
                format!(
                    "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">",
                    html::escape_attr(href)
                )
            })
            .collect();
        let scripts: String = self
            .scripts
            .iter()
            .map(|src| format!("<script src=\"{}\"></script>", html::escape_attr(src)))
            .collect();
        format!(
            "<!doctype html><html><head><meta charset=\"utf-8\">{}{}</head><body>{}{}</body></html>",
            links, self.head, self.body, scripts
        )
    }
}

/// What handling one dialog message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    LanguageSaved(String),
    Inserted(BlockId),
    Updated(BlockId),
    /// The block was no longer in the surface; nothing was written.
    UpdateDropped(BlockId),
    /// Not meaningful in the current state.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    surface: SurfaceId,
    state: SessionState,
    selection: Selection,
    theme: String,
    language: String,
    page: DialogPage,
}

impl EditSession {
    /// Opens a dialog for a new block.
    pub fn open_new(
        surface: &mut dyn EditorSurface,
        paths: &CodefieldPaths,
        config: &CodefieldConfig,
    ) -> Result<Self> {
        Self::open(surface, paths, config, SessionState::New)
    }

    /// Opens a dialog on an existing rich span. An undecodable payload opens
    /// with the placeholder text instead.
    pub fn open_existing(
        surface: &mut dyn EditorSurface,
        paths: &CodefieldPaths,
        config: &CodefieldConfig,
        id: BlockId,
        encoded_source: &str,
    ) -> Result<Self> {
        let source = codec::decode_source(encoded_source).unwrap_or_else(|e| {
            tracing::warn!(block = %id, error = %e, "could not decode block for editing");
            codec::DECODE_PLACEHOLDER.to_string()
        });
        Self::open(surface, paths, config, SessionState::Editing { id, source })
    }

    fn open(
        surface: &mut dyn EditorSurface,
        paths: &CodefieldPaths,
        config: &CodefieldConfig,
        state: SessionState,
    ) -> Result<Self> {
        let selection = surface.save_selection();
        let language = match &state {
            SessionState::Editing { id, .. } => block_language(&surface.field_html(), id)
                .unwrap_or_else(|| config.last_language.clone()),
            _ => config.last_language.clone(),
        };
        let page = build_page(paths, &config.active_theme, &language, &state)?;
        tracing::debug!(surface = %surface.surface_id(), "edit session opened");
        Ok(Self {
            surface: surface.surface_id(),
            state,
            selection,
            theme: config.active_theme.clone(),
            language,
            page,
        })
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn page(&self) -> &DialogPage {
        &self.page
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Dismisses the dialog. Never touches the surface.
    pub fn cancel(&mut self) {
        self.state = SessionState::Closed;
    }

    pub fn handle(
        &mut self,
        message: BridgeMessage,
        surface: &mut dyn EditorSurface,
        config_store: &mut dyn ConfigStore,
        paths: &CodefieldPaths,
    ) -> Result<SessionOutcome> {
        match message {
            BridgeMessage::SetLanguage(language) => {
                let mut config = config_store.load()?;
                config.last_language = language.clone();
                config_store.save(&config)?;
                self.language = language.clone();
                Ok(SessionOutcome::LanguageSaved(language))
            }
            BridgeMessage::InsertCode {
                language,
                source,
                markup,
            } => {
                let state = std::mem::replace(&mut self.state, SessionState::Closed);
                match state {
                    SessionState::New => {
                        Ok(self.insert(surface, paths, &language, &source, &markup))
                    }
                    SessionState::Editing { id, .. } => {
                        Ok(update(surface, id, &language, &source, &markup))
                    }
                    SessionState::Closed => Ok(SessionOutcome::Ignored),
                }
            }
            BridgeMessage::EditCode { .. } => Ok(SessionOutcome::Ignored),
        }
    }

    fn insert(
        &self,
        surface: &mut dyn EditorSurface,
        paths: &CodefieldPaths,
        language: &str,
        source: &str,
        markup: &str,
    ) -> SessionOutcome {
        let rich = codec::to_rich_form(source, language, &self.theme, &Prerendered(markup));
        surface.focus();
        surface.restore_selection(&self.selection);
        surface.insert_html(&format!("{}<br>", rich.as_html()));
        surface.install_styles(&block_styles(paths, &self.theme));
        surface.attach_block_listener(SETTLE_DELAY);
        tracing::debug!(block = %rich.id, language, "inserted code block");
        SessionOutcome::Inserted(rich.id)
    }
}

fn update(
    surface: &mut dyn EditorSurface,
    id: BlockId,
    language: &str,
    source: &str,
    markup: &str,
) -> SessionOutcome {
    surface.focus();
    let field = surface.field_html();
    match codec::update_in_place(&field, &id, source, language, &Prerendered(markup)) {
        Some(updated) => {
            surface.set_field_html(updated);
            SessionOutcome::Updated(id)
        }
        None => {
            tracing::debug!(block = %id, "block no longer in the surface, update dropped");
            SessionOutcome::UpdateDropped(id)
        }
    }
}

fn block_language(field_html: &str, id: &BlockId) -> Option<String> {
    codec::locate(field_html, id)
        .and_then(|span| span.attr("data-language").map(str::to_string))
        .filter(|language| !language.trim().is_empty())
}

/// Stylesheet for code blocks inside the editing surface.
pub fn block_styles(paths: &CodefieldPaths, theme: &str) -> String {
    format!(
        "{}\n{}\n{}\n",
        assets::read_text(&paths.user_files, BASE_CSS),
        assets::read_text(&paths.user_files, &assets::theme_source(theme)),
        BLOCK_STYLE_RULE
    )
}

/// Builds the dialog from its base document. Fails, with nothing shown, when
/// the document cannot be read.
pub fn build_page(
    paths: &CodefieldPaths,
    theme: &str,
    language: &str,
    state: &SessionState,
) -> Result<DialogPage> {
    let path = paths.user_files.join(DIALOG_DOCUMENT);
    let document = fs::read_to_string(&path).map_err(|e| {
        CodefieldError::EditorDocument(format!("cannot read {}: {}", path.display(), e))
    })?;

    let mut body = match html::find_elements(&document, |e| e.tag == "body").first() {
        Some(element) => element.inner_html(&document).to_string(),
        None => document.clone(),
    };

    let (button_text, initial) = match state {
        SessionState::Editing { source, .. } => ("Update Code", Some(source.as_str())),
        _ => ("Insert Code", None),
    };
    if let Some(source) = initial {
        let textarea = html::find_elements(&body, |e| {
            e.tag == "textarea" && e.id() == Some(EDITOR_TEXTAREA_ID)
        })
        .into_iter()
        .next();
        if let Some(textarea) = textarea {
            body = html::replace_inner(&body, &textarea, &html::escape_text(source));
        }
    }

    let cm_config = serde_json::json!({
        "buttonText": button_text,
        "language": language,
        "activeTheme": theme,
        "starterCode": &*STARTER_CODE,
    });
    // "</" would end the inline script early.
    let literal = cm_config.to_string().replace("</", "<\\/");
    let head = format!("<script>window.CM_CONFIG = {};</script>", literal);

    let stylesheets = [
        BASE_CSS.to_string(),
        assets::theme_source(theme),
        DIALOG_STYLES.to_string(),
    ]
    .iter()
    .map(|relative| paths.web_url(relative))
    .collect();
    let scripts = DIALOG_SCRIPTS.iter().map(|s| paths.web_url(s)).collect();

    Ok(DialogPage {
        body,
        head,
        stylesheets,
        scripts,
    })
}

/// Whether opening went ahead or an existing dialog should be raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    Refocused,
}

/// Open sessions, at most one per surface.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SurfaceId, EditSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for the surface unless one is already open there.
    /// `existing` carries the block id and its encoded source when editing.
    pub fn open(
        &mut self,
        surface: &mut dyn EditorSurface,
        paths: &CodefieldPaths,
        config: &CodefieldConfig,
        existing: Option<(BlockId, String)>,
    ) -> Result<OpenOutcome> {
        let id = surface.surface_id();
        if self.sessions.contains_key(&id) {
            tracing::debug!(surface = %id, "dialog already open, refocusing");
            return Ok(OpenOutcome::Refocused);
        }
        let session = match existing {
            Some((block, encoded)) => {
                EditSession::open_existing(surface, paths, config, block, &encoded)?
            }
            None => EditSession::open_new(surface, paths, config)?,
        };
        self.sessions.insert(id, session);
        Ok(OpenOutcome::Opened)
    }

    pub fn get(&self, surface: SurfaceId) -> Option<&EditSession> {
        self.sessions.get(&surface)
    }

    pub fn is_open(&self, surface: SurfaceId) -> bool {
        self.sessions.contains_key(&surface)
    }

    /// Routes a dialog message to the surface's session, dropping the session
    /// once it closes. Messages for surfaces without a session are ignored.
    pub fn dispatch(
        &mut self,
        message: BridgeMessage,
        surface: &mut dyn EditorSurface,
        config_store: &mut dyn ConfigStore,
        paths: &CodefieldPaths,
    ) -> Result<SessionOutcome> {
        let id = surface.surface_id();
        let Some(session) = self.sessions.get_mut(&id) else {
            tracing::debug!(surface = %id, "message for a surface without a dialog");
            return Ok(SessionOutcome::Ignored);
        };
        let outcome = session.handle(message, surface, config_store, paths);
        if session.is_closed() {
            self.sessions.remove(&id);
        }
        outcome
    }

    /// Cancels the surface's session. True when one was open.
    pub fn close(&mut self, surface: SurfaceId) -> bool {
        match self.sessions.remove(&surface) {
            Some(mut session) => {
                session.cancel();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// True for markup that holds at least one rich block.
pub fn has_rich_blocks(field_html: &str) -> bool {
    !html::find_elements(field_html, |e| e.has_class(RICH_CLASS)).is_empty()
}
