use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Language used when a block or message carries no language tag.
pub const DEFAULT_LANGUAGE: &str = "python";

/// Theme used when the configuration has none.
pub const DEFAULT_THEME: &str = "dracula";

/// Host-owned identifier of a note type. We only ever store references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteTypeId(pub i64);

impl fmt::Display for NoteTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NoteTypeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Locally-unique token identifying a rich span inside one editing surface.
///
/// Only meaningful while the surface is open; never persisted in compact form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(String);

impl BlockId {
    pub fn generate() -> Self {
        Self(format!("code-block-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for BlockId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The unit of content: a language tag plus the user's unmodified source.
///
/// Rendered markup is never part of a `CodeBlock`; it is derived on demand
/// from `source`, `language` and the active theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub source: String,
}

impl CodeBlock {
    /// Creates a block, falling back to [`DEFAULT_LANGUAGE`] for an empty tag.
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        let language = language.into();
        let language = if language.trim().is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            language
        };
        Self {
            language,
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateSide {
    Question,
    Answer,
}

impl TemplateSide {
    pub const ALL: [TemplateSide; 2] = [TemplateSide::Question, TemplateSide::Answer];
}

/// One card template of a note type: a question side and an answer side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub name: String,
    #[serde(rename = "qfmt")]
    pub question: String,
    #[serde(rename = "afmt")]
    pub answer: String,
}

impl CardTemplate {
    pub fn new(
        name: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn side(&self, side: TemplateSide) -> &str {
        match side {
            TemplateSide::Question => &self.question,
            TemplateSide::Answer => &self.answer,
        }
    }

    pub fn side_mut(&mut self, side: TemplateSide) -> &mut String {
        match side {
            TemplateSide::Question => &mut self.question,
            TemplateSide::Answer => &mut self.answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteType {
    pub id: NoteTypeId,
    pub name: String,
    #[serde(default)]
    pub is_cloze: bool,
    #[serde(rename = "tmpls")]
    pub templates: Vec<CardTemplate>,
}

impl NoteType {
    pub fn new(id: impl Into<NoteTypeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_cloze: false,
            templates: Vec::new(),
        }
    }

    pub fn with_template(mut self, template: CardTemplate) -> Self {
        self.templates.push(template);
        self
    }

    pub fn cloze(mut self) -> Self {
        self.is_cloze = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteField {
    pub name: String,
    pub html: String,
}

/// A host note: ordered fields of HTML, tagged with its note type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub notetype_id: NoteTypeId,
    #[serde(default)]
    pub is_cloze: bool,
    pub fields: Vec<NoteField>,
}

impl Note {
    pub fn new(notetype_id: impl Into<NoteTypeId>) -> Self {
        Self {
            notetype_id: notetype_id.into(),
            is_cloze: false,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, html: impl Into<String>) -> Self {
        self.fields.push(NoteField {
            name: name.into(),
            html: html.into(),
        });
        self
    }

    pub fn cloze(mut self) -> Self {
        self.is_cloze = true;
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.html.as_str())
    }
}
