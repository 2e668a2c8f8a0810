use super::{inject, CmdMessage, CmdResult, CodefieldPaths, NoteTypeSummary};
use crate::assets;
use crate::config::{CodefieldConfig, ConfigStore};
use crate::error::{CodefieldError, Result};
use crate::host::Progress;
use crate::model::NoteTypeId;
use crate::store::{MediaStore, NoteTypeStore};
use std::collections::BTreeSet;

/// What the configuration dialog submits. Lists keep the user's row order so
/// duplicates can be detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSelection {
    pub theme: String,
    pub injected: Vec<NoteTypeId>,
    pub bypassed: Vec<NoteTypeId>,
}

#[derive(Debug, Clone)]
pub enum ConfigAction {
    /// Current settings plus the choices the dialog offers.
    Show,
    /// Validate, save, then re-synchronize templates.
    Apply(ConfigSelection),
}

pub fn run<C, M, N>(
    config_store: &mut C,
    media: &mut M,
    note_types: &mut N,
    paths: &CodefieldPaths,
    action: ConfigAction,
    progress: &mut dyn Progress,
) -> Result<CmdResult>
where
    C: ConfigStore + ?Sized,
    M: MediaStore + ?Sized,
    N: NoteTypeStore + ?Sized,
{
    match action {
        ConfigAction::Show => {
            let config = config_store.load()?;
            let themes = assets::list_themes(&paths.user_files)?;
            let listed = note_types
                .all_note_types()?
                .into_iter()
                .map(|nt| NoteTypeSummary {
                    id: nt.id,
                    name: nt.name,
                })
                .collect();
            Ok(CmdResult::default()
                .with_config(config)
                .with_themes(themes)
                .with_listed_note_types(listed))
        }
        ConfigAction::Apply(selection) => {
            let themes = assets::list_themes(&paths.user_files)?;
            if let Err(e) = validate(&selection, &themes) {
                let mut res = CmdResult::default();
                res.add_message(CmdMessage::error(e.to_string()));
                return Ok(res);
            }

            let mut config = config_store.load()?;
            config.active_theme = selection.theme;
            config.injected = selection.injected.into_iter().collect();
            config.bypassed = selection.bypassed.into_iter().collect();
            config_store.save(&config)?;
            tracing::info!(theme = %config.active_theme, "configuration saved");

            // The save has happened; a failed sync must not hide the new config.
            let mut result = CmdResult::default();
            match inject::run(media, note_types, paths, &config, progress) {
                Ok(synced) => {
                    result.merge(synced);
                    result.add_message(CmdMessage::success("Configuration saved and applied."));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "configuration saved but templates not synchronized");
                    result.add_message(CmdMessage::warning(format!(
                        "Configuration saved, but note types could not be updated: {}",
                        e
                    )));
                }
            }
            Ok(result.with_config(config))
        }
    }
}

/// Refuses selections the dialog must not save.
///
/// A theme outside the catalogue is accepted only when there is no catalogue
/// to check against.
pub fn validate(selection: &ConfigSelection, themes: &[String]) -> Result<()> {
    if selection.theme.trim().is_empty() {
        return Err(CodefieldError::Validation("Please select a theme.".into()));
    }
    if !themes.is_empty() && !themes.iter().any(|t| t == &selection.theme) {
        return Err(CodefieldError::Validation(format!(
            "Unknown theme: {}",
            selection.theme
        )));
    }
    for (list, label) in [
        (&selection.injected, "highlighting"),
        (&selection.bypassed, "cloze bypass"),
    ] {
        if has_duplicates(list) {
            return Err(CodefieldError::Validation(format!(
                "One or more note types were selected multiple times for {}. Remove the duplicates before saving.",
                label
            )));
        }
    }
    Ok(())
}

fn has_duplicates(ids: &[NoteTypeId]) -> bool {
    let mut seen = BTreeSet::new();
    ids.iter().any(|id| !seen.insert(*id))
}

/// The selection the dialog starts from.
pub fn selection_of(config: &CodefieldConfig) -> ConfigSelection {
    ConfigSelection {
        theme: config.active_theme.clone(),
        injected: config.injected.iter().copied().collect(),
        bypassed: config.bypassed.iter().copied().collect(),
    }
}
