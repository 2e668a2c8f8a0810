//! # Dialog / Editor Bridge
//!
//! The editor dialog and the host's editing surface talk to us over a textual
//! command channel. Three message shapes exist on the wire, all colon
//! delimited, with base64 payload segments:
//!
//! ```text
//! set_lang:<language>
//! insert_code:<language>:<base64 raw source>:<base64 highlighted markup>
//! edit_code:<block id>:<base64 raw source>
//! ```
//!
//! Messages are decoded once, at the boundary, into [`BridgeMessage`]. Payloads
//! are validated during decoding so that handlers only ever see text.

use crate::codec::{decode_source, encode_source};
use crate::error::{CodefieldError, Result};
use crate::model::BlockId;
use std::fmt;
use std::str::FromStr;

const SET_LANGUAGE: &str = "set_lang";
const INSERT_CODE: &str = "insert_code";
const EDIT_CODE: &str = "edit_code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeMessage {
    /// The user picked another language in the dialog.
    SetLanguage(String),
    /// The dialog submitted code: raw source plus the widget's markup.
    InsertCode {
        language: String,
        source: String,
        markup: String,
    },
    /// The user double-clicked an existing block in the editing surface.
    EditCode {
        id: BlockId,
        /// Still encoded; decoding failures are handled by the dialog.
        encoded_source: String,
    },
}

impl BridgeMessage {
    /// True for messages that come from the editing surface rather than the
    /// dialog.
    pub fn is_surface_message(&self) -> bool {
        matches!(self, BridgeMessage::EditCode { .. })
    }
}

impl FromStr for BridgeMessage {
    type Err = CodefieldError;

    fn from_str(raw: &str) -> Result<Self> {
        let (kind, rest) = raw
            .split_once(':')
            .ok_or_else(|| CodefieldError::Bridge(format!("not a bridge command: {:?}", raw)))?;

        match kind {
            SET_LANGUAGE => {
                let language = rest.trim();
                if language.is_empty() {
                    return Err(CodefieldError::Bridge("set_lang without a language".into()));
                }
                Ok(BridgeMessage::SetLanguage(language.to_string()))
            }
            INSERT_CODE => {
                let mut parts = rest.splitn(3, ':');
                let (Some(language), Some(raw_source), Some(raw_markup)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    return Err(CodefieldError::Bridge(
                        "insert_code needs language, source and markup".into(),
                    ));
                };
                Ok(BridgeMessage::InsertCode {
                    language: language.to_string(),
                    source: decode_payload(raw_source, "source")?,
                    markup: decode_payload(raw_markup, "markup")?,
                })
            }
            EDIT_CODE => {
                let (id, encoded) = rest.split_once(':').ok_or_else(|| {
                    CodefieldError::Bridge("edit_code needs a block id and source".into())
                })?;
                if id.is_empty() {
                    return Err(CodefieldError::Bridge("edit_code without a block id".into()));
                }
                Ok(BridgeMessage::EditCode {
                    id: BlockId::from(id),
                    encoded_source: encoded.to_string(),
                })
            }
            other => Err(CodefieldError::Bridge(format!(
                "unknown bridge command: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for BridgeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeMessage::SetLanguage(language) => write!(f, "{}:{}", SET_LANGUAGE, language),
            BridgeMessage::InsertCode {
                language,
                source,
                markup,
            } => write!(
                f,
                "{}:{}:{}:{}",
                INSERT_CODE,
                language,
                encode_source(source),
                encode_source(markup)
            ),
            BridgeMessage::EditCode { id, encoded_source } => {
                write!(f, "{}:{}:{}", EDIT_CODE, id, encoded_source)
            }
        }
    }
}

fn decode_payload(raw: &str, what: &str) -> Result<String> {
    decode_source(raw).map_err(|e| CodefieldError::Bridge(format!("bad {} payload: {}", what, e)))
}
