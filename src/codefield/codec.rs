//! # Encoding Codec
//!
//! A code block lives in three shapes:
//!
//! 1. **Rich span**: interactive markup shown while a note is being edited.
//!    Carries the block identity, the language, the theme's style class, the
//!    highlighted markup, and the raw source as a base64 `data-raw-code`
//!    attribute so an edit never depends on parsing highlighted output.
//! 2. **Compact span**: what is persisted in the note. Only the language and
//!    the raw source (HTML-escaped text content); no markup, no theme.
//! 3. **Resource block**: asset links injected into card templates so the
//!    compact span can be painted at review time (see [`crate::assets`]).
//!
//! This module converts between (1) and (2). The compact form is the source
//! of truth at rest; the rich form is always rebuilt from it plus the active
//! theme.

use crate::error::{CodefieldError, Result};
use crate::html::{self, Element};
use crate::model::{BlockId, CodeBlock, DEFAULT_LANGUAGE};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Class carried by rich spans inside the editing surface.
pub const RICH_CLASS: &str = "anki-code-block";

/// Class carried by compact spans in stored note content. The review-time
/// script looks for this class.
pub const COMPACT_CLASS: &str = "codemirror-anki";

/// Class of the element wrapping highlighted markup inside a rich span.
pub const CODE_CONTAINER_CLASS: &str = "CodeMirror-code";

/// Visible text substituted when a raw-source payload cannot be decoded.
pub const DECODE_PLACEHOLDER: &str = "Error decoding code.";

/// The external highlighting capability: source + language in, markup out.
pub trait Highlighter {
    fn highlight(&self, source: &str, language: &str) -> String;
}

/// Markup the editor widget already produced for this source.
#[derive(Debug, Clone, Copy)]
pub struct Prerendered<'a>(pub &'a str);

impl Highlighter for Prerendered<'_> {
    fn highlight(&self, _source: &str, _language: &str) -> String {
        self.0.to_string()
    }
}

/// Unhighlighted lines in the widget's line structure. The widget repaints
/// them when the surface loads its scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl Highlighter for PlainText {
    fn highlight(&self, source: &str, _language: &str) -> String {
        source
            .split('\n')
            .map(|line| {
                format!(
                    "<pre class=\"CodeMirror-line\"><span>{}</span></pre>",
                    html::escape_text(line)
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactSpan(String);

impl CompactSpan {
    pub fn as_html(&self) -> &str {
        &self.0
    }

    pub fn into_html(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichSpan {
    pub id: BlockId,
    html: String,
}

impl RichSpan {
    pub fn as_html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

pub fn encode_source(source: &str) -> String {
    BASE64.encode(source.as_bytes())
}

pub fn decode_source(encoded: &str) -> Result<String> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| CodefieldError::Decode(format!("invalid base64 payload: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| CodefieldError::Decode(format!("payload is not UTF-8: {}", e)))
}

fn language_or_default(language: &str) -> &str {
    if language.trim().is_empty() {
        DEFAULT_LANGUAGE
    } else {
        language
    }
}

/// Builds the stored form. Deterministic: equal inputs give identical bytes.
pub fn to_compact_form(source: &str, language: &str) -> CompactSpan {
    CompactSpan(format!(
        "<span class=\"{}\" data-language=\"{}\">{}</span>",
        COMPACT_CLASS,
        html::escape_attr(language_or_default(language)),
        html::escape_text(source)
    ))
}

/// Builds an editable span with a fresh identity.
pub fn to_rich_form(
    source: &str,
    language: &str,
    theme: &str,
    highlighter: &dyn Highlighter,
) -> RichSpan {
    to_rich_form_with_id(BlockId::generate(), source, language, theme, highlighter)
}

pub fn to_rich_form_with_id(
    id: BlockId,
    source: &str,
    language: &str,
    theme: &str,
    highlighter: &dyn Highlighter,
) -> RichSpan {
    let class = format!("{} CodeMirror cm-s-{}", RICH_CLASS, theme);
    let language = language_or_default(language);
    let markup = highlighter.highlight(source, language);
    let html = rich_markup(&id, &class, language, &encode_source(source), &markup);
    RichSpan { id, html }
}

fn rich_markup(id: &BlockId, class: &str, language: &str, encoded: &str, markup: &str) -> String {
    format!(
        "<span id=\"{}\" class=\"{}\" contenteditable=\"false\" data-raw-code=\"{}\" data-language=\"{}\"><div class=\"{}\">{}</div></span>",
        html::escape_attr(id.as_str()),
        html::escape_attr(class),
        encoded,
        html::escape_attr(language),
        CODE_CONTAINER_CLASS,
        markup
    )
}

/// Result of compacting one fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactedDocument {
    pub html: String,
    /// Blocks that were compacted, in document order.
    pub blocks: Vec<CodeBlock>,
    /// One line per span that could not be handled cleanly.
    pub diagnostics: Vec<String>,
}

impl CompactedDocument {
    pub fn changed(&self) -> bool {
        !self.blocks.is_empty()
    }
}

/// Replaces every rich span in `html` with its compact form.
///
/// Spans without a raw-source attribute are left exactly as they are; spans
/// whose payload does not decode are stored with [`DECODE_PLACEHOLDER`].
/// Neither case fails the pass.
pub fn compact_document(html: &str) -> CompactedDocument {
    let spans = html::find_elements(html, |e| e.has_class(RICH_CLASS));
    let mut result = CompactedDocument::default();
    let mut edits = Vec::new();

    for span in spans {
        let label = span.id().unwrap_or("<no id>").to_string();
        let encoded = match span.attr("data-raw-code") {
            Some(encoded) => encoded,
            None => {
                tracing::warn!(
                    block = %label,
                    "code block has no raw source, leaving it untouched"
                );
                result
                    .diagnostics
                    .push(format!("Code block {} has no raw source; left untouched.", label));
                continue;
            }
        };

        let language = language_or_default(span.attr("data-language").unwrap_or(""));
        let source = match decode_source(encoded) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(block = %label, error = %e, "could not decode code block");
                result
                    .diagnostics
                    .push(format!("Code block {} could not be decoded: {}", label, e));
                DECODE_PLACEHOLDER.to_string()
            }
        };

        edits.push((span.outer.clone(), to_compact_form(&source, language).into_html()));
        result.blocks.push(CodeBlock::new(language, source));
    }

    result.html = html::splice(html, edits);
    result
}

/// Rebuilds rich spans from the compact spans stored in `html`.
pub fn expand_document(html: &str, theme: &str, highlighter: &dyn Highlighter) -> String {
    let spans = html::find_elements(html, |e| {
        e.has_class(COMPACT_CLASS) && e.attr("data-language").is_some()
    });
    let edits = spans
        .into_iter()
        .map(|span| {
            let block = read_compact(html, &span);
            let rich = to_rich_form(&block.source, &block.language, theme, highlighter);
            (span.outer, rich.into_html())
        })
        .collect();
    html::splice(html, edits)
}

/// Reads the block held by a compact span.
pub fn read_compact(html: &str, span: &Element) -> CodeBlock {
    CodeBlock::new(
        span.attr("data-language").unwrap_or(""),
        span.text_content(html),
    )
}

/// Reads the block held by a rich span; `None` when the span has no payload.
pub fn read_rich(span: &Element) -> Option<CodeBlock> {
    let encoded = span.attr("data-raw-code")?;
    let source = decode_source(encoded).unwrap_or_else(|_| DECODE_PLACEHOLDER.to_string());
    Some(CodeBlock::new(span.attr("data-language").unwrap_or(""), source))
}

/// Finds the rich span with this identity. A miss is not an error: the
/// surface may have been edited since the block was opened.
pub fn locate(html: &str, id: &BlockId) -> Option<Element> {
    html::find_by_id(html, id.as_str()).filter(|e| e.has_class(RICH_CLASS))
}

/// Rewrites the raw source, language and rendered markup of the rich span
/// `id`, keeping its identity and style classes. `None` when not found.
pub fn update_in_place(
    html: &str,
    id: &BlockId,
    source: &str,
    language: &str,
    highlighter: &dyn Highlighter,
) -> Option<String> {
    let span = locate(html, id)?;
    let class = span.attr("class").unwrap_or(RICH_CLASS).to_string();
    let language = language_or_default(language);
    let markup = highlighter.highlight(source, language);
    let replacement = rich_markup(id, &class, language, &encode_source(source), &markup);
    Some(html::replace_element(html, &span, &replacement))
}
