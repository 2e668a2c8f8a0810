//! Template Injector: keeps the review-time resource block in card templates
//! in step with the configuration.
//!
//! For every note type and every side of every card template:
//!
//! - selected for injection, no block: append the block at the end
//! - selected, block differs from the fresh one (theme change): replace it
//! - selected, block identical: nothing
//! - not selected, block present: remove it
//!
//! Only note types that actually changed are saved, so a second run with the
//! same configuration writes nothing.

use super::{CmdMessage, CmdResult, CodefieldPaths};
use crate::assets::{self, INJECTION_ID};
use crate::config::CodefieldConfig;
use crate::error::Result;
use crate::host::Progress;
use crate::html;
use crate::model::{NoteType, TemplateSide};
use crate::store::{MediaStore, NoteTypeStore};

const PROGRESS_LABEL: &str = "Updating note types...";

/// Publishes the assets for the configured theme, then synchronizes
/// templates against the resulting block.
pub fn run<M, N>(
    media: &mut M,
    note_types: &mut N,
    paths: &CodefieldPaths,
    config: &CodefieldConfig,
    progress: &mut dyn Progress,
) -> Result<CmdResult>
where
    M: MediaStore + ?Sized,
    N: NoteTypeStore + ?Sized,
{
    let block = assets::publish_resource_block(media, &paths.user_files, &config.active_theme);
    let mut result = synchronize(note_types, config, &block.html, progress)?;
    for (asset, error) in block.report.failed {
        result.add_message(CmdMessage::warning(format!(
            "Could not publish {}: {}",
            asset, error
        )));
    }
    Ok(result)
}

/// Brings every template in line with `resource_block`.
pub fn synchronize<N>(
    note_types: &mut N,
    config: &CodefieldConfig,
    resource_block: &str,
    progress: &mut dyn Progress,
) -> Result<CmdResult>
where
    N: NoteTypeStore + ?Sized,
{
    let all = note_types.all_note_types()?;
    progress.start(all.len(), PROGRESS_LABEL);

    let mut changed = Vec::new();
    for (i, mut note_type) in all.into_iter().enumerate() {
        progress.update(i + 1, &format!("Processing: {}", note_type.name));
        let should_inject = config.should_inject(note_type.id);
        if apply_to_note_type(&mut note_type, should_inject, resource_block) {
            changed.push(note_type);
        }
    }

    let mut result = CmdResult::default();
    let mut saved = Vec::new();
    for note_type in &changed {
        match note_types.save_note_type(note_type) {
            Ok(()) => saved.push(note_type.id),
            Err(e) => {
                tracing::warn!(note_type = %note_type.id, error = %e, "failed to save note type");
                result.add_message(CmdMessage::warning(format!(
                    "Could not save note type {}: {}",
                    note_type.name, e
                )));
            }
        }
    }
    progress.finish();

    if !saved.is_empty() {
        note_types.invalidate_rendering();
        result.add_message(CmdMessage::success(format!(
            "Updated {} note type(s).",
            saved.len()
        )));
    } else if changed.is_empty() {
        result.add_message(CmdMessage::info("Note types already up to date."));
    }
    tracing::info!(changed = saved.len(), "template synchronization finished");
    Ok(result.with_changed_note_types(saved))
}

/// Rewrites every template side of one note type. True when anything changed
/// on any side of any template.
fn apply_to_note_type(note_type: &mut NoteType, should_inject: bool, block: &str) -> bool {
    let mut changed = false;
    for template in &mut note_type.templates {
        for side in TemplateSide::ALL {
            let current = template.side_mut(side);
            if let Some(updated) = sync_side(current, should_inject, block) {
                *current = updated;
                changed = true;
            }
        }
    }
    changed
}

/// New text for one template side, or `None` when it is already correct.
///
/// Only the first block is kept; stray duplicates from earlier runs are
/// dropped either way.
pub fn sync_side(html: &str, should_inject: bool, block: &str) -> Option<String> {
    let existing = html::find_elements(html, |e| e.tag == "div" && e.id() == Some(INJECTION_ID));

    if !should_inject {
        if existing.is_empty() {
            return None;
        }
        let edits = existing.into_iter().map(|e| (e.outer, String::new())).collect();
        return Some(html::splice(html, edits));
    }

    match existing.split_first() {
        None => Some(format!("{}{}", html, block)),
        Some((first, rest)) => {
            if rest.is_empty() && first.outer_html(html) == block {
                return None;
            }
            let mut edits = vec![(first.outer.clone(), block.to_string())];
            edits.extend(rest.iter().map(|e| (e.outer.clone(), String::new())));
            Some(html::splice(html, edits))
        }
    }
}
