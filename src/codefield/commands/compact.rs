//! Note-save pass: every rich block in every field is stored in compact form.
//!
//! Rendered markup is large and theme-specific; only the language and the raw
//! source are worth keeping. Blocks are expanded again when edited or
//! reviewed.

use super::{CmdMessage, CmdResult};
use crate::codec;
use crate::model::Note;

pub fn run(note: &mut Note) -> CmdResult {
    let mut result = CmdResult::default();
    let mut blocks = Vec::new();

    for field in &mut note.fields {
        let compacted = codec::compact_document(&field.html);
        for diagnostic in &compacted.diagnostics {
            result.add_message(CmdMessage::warning(format!("{}: {}", field.name, diagnostic)));
        }
        if compacted.changed() {
            tracing::debug!(
                field = %field.name,
                blocks = compacted.blocks.len(),
                "compacted code blocks"
            );
            field.html = compacted.html;
            blocks.extend(compacted.blocks);
        }
    }

    result.with_compacted_blocks(blocks)
}
