use super::{hashed_variant, MediaStore, NoteTypeStore};
use crate::error::{CodefieldError, Result};
use crate::model::{NoteType, NoteTypeId};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory media folder.
///
/// Reproduces the host's conflict behaviour: writing different bytes to a
/// taken name stores them under a hashed variant instead.
#[derive(Debug, Clone, Default)]
pub struct MemoryMediaStore {
    files: BTreeMap<String, Vec<u8>>,
    trashed: Vec<String>,
    pending_sync: BTreeSet<String>,
    simulate_write_error: bool,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file without marking it for sync, as if left by an earlier run.
    pub fn insert(&mut self, name: &str, data: &[u8]) {
        self.files.insert(name.to_string(), data.to_vec());
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|d| d.as_slice())
    }

    pub fn trashed(&self) -> &[String] {
        &self.trashed
    }

    pub fn pending_sync(&self) -> &BTreeSet<String> {
        &self.pending_sync
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&mut self, simulate: bool) {
        self.simulate_write_error = simulate;
    }
}

impl MediaStore for MemoryMediaStore {
    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn trash_files(&mut self, names: &[String]) -> Result<()> {
        for name in names {
            if self.files.remove(name).is_some() {
                self.pending_sync.remove(name);
                self.trashed.push(name.clone());
            }
        }
        Ok(())
    }

    fn write_data(&mut self, name: &str, data: &[u8]) -> Result<String> {
        if self.simulate_write_error {
            return Err(CodefieldError::Store("Simulated write error".to_string()));
        }
        let stored = match self.files.get(name) {
            Some(existing) if existing.as_slice() != data => hashed_variant(name, data),
            _ => name.to_string(),
        };
        self.files.insert(stored.clone(), data.to_vec());
        self.pending_sync.insert(stored.clone());
        Ok(stored)
    }
}

/// In-memory note type collection that records every save.
#[derive(Debug, Clone, Default)]
pub struct MemoryNoteTypeStore {
    note_types: Vec<NoteType>,
    saved: Vec<NoteTypeId>,
    invalidations: usize,
    failing: BTreeSet<NoteTypeId>,
    simulate_read_error: bool,
}

impl MemoryNoteTypeStore {
    pub fn new(note_types: Vec<NoteType>) -> Self {
        Self {
            note_types,
            ..Self::default()
        }
    }

    pub fn get(&self, id: NoteTypeId) -> Option<&NoteType> {
        self.note_types.iter().find(|nt| nt.id == id)
    }

    /// Ids passed to `save_note_type`, in call order.
    pub fn saved(&self) -> &[NoteTypeId] {
        &self.saved
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations
    }

    pub fn clear_history(&mut self) {
        self.saved.clear();
        self.invalidations = 0;
    }

    /// Makes saving this note type fail, for testing per-item recovery.
    pub fn fail_saves_for(&mut self, id: NoteTypeId) {
        self.failing.insert(id);
    }

    /// Makes listing note types fail, as an unreadable collection would.
    pub fn set_simulate_read_error(&mut self, simulate: bool) {
        self.simulate_read_error = simulate;
    }
}

impl NoteTypeStore for MemoryNoteTypeStore {
    fn all_note_types(&self) -> Result<Vec<NoteType>> {
        if self.simulate_read_error {
            return Err(CodefieldError::Store(
                "Simulated read failure for note types".to_string(),
            ));
        }
        Ok(self.note_types.clone())
    }

    fn save_note_type(&mut self, note_type: &NoteType) -> Result<()> {
        if self.failing.contains(&note_type.id) {
            return Err(CodefieldError::Store(format!(
                "Simulated save failure for note type {}",
                note_type.id
            )));
        }
        match self.note_types.iter_mut().find(|nt| nt.id == note_type.id) {
            Some(slot) => *slot = note_type.clone(),
            None => self.note_types.push(note_type.clone()),
        }
        self.saved.push(note_type.id);
        Ok(())
    }

    fn invalidate_rendering(&mut self) {
        self.invalidations += 1;
    }
}
