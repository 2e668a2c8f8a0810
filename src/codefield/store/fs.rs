use super::{hashed_variant, MediaStore, NoteTypeStore};
use crate::error::{CodefieldError, Result};
use crate::model::NoteType;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

const TRASH_DIR: &str = ".trash";
const NOTETYPES_FILENAME: &str = "notetypes.json";

/// A media folder on disk.
///
/// Trashed files are moved into `.trash/` rather than deleted, so the user
/// can still recover them the way the host's own trash allows.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    dir: PathBuf,
    pending_sync: BTreeSet<String>,
}

impl FsMediaStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            pending_sync: BTreeSet::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names written since this store was opened.
    pub fn pending_sync(&self) -> &BTreeSet<String> {
        &self.pending_sync
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(CodefieldError::Io)?;
        }
        Ok(())
    }
}

impl MediaStore for FsMediaStore {
    fn list_files(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(CodefieldError::Io)? {
            let entry = entry.map_err(CodefieldError::Io)?;
            if entry.file_type().map_err(CodefieldError::Io)?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn trash_files(&mut self, names: &[String]) -> Result<()> {
        let trash = self.dir.join(TRASH_DIR);
        for name in names {
            let path = self.dir.join(name);
            if !path.is_file() {
                continue;
            }
            self.ensure_dir(&trash)?;
            fs::rename(&path, trash.join(name)).map_err(CodefieldError::Io)?;
            self.pending_sync.remove(name);
        }
        Ok(())
    }

    fn write_data(&mut self, name: &str, data: &[u8]) -> Result<String> {
        self.ensure_dir(&self.dir)?;

        let target = self.dir.join(name);
        let stored = if target.exists() {
            let existing = fs::read(&target).map_err(CodefieldError::Io)?;
            if existing == data {
                name.to_string()
            } else {
                hashed_variant(name, data)
            }
        } else {
            name.to_string()
        };

        fs::write(self.dir.join(&stored), data).map_err(CodefieldError::Io)?;
        self.pending_sync.insert(stored.clone());
        Ok(stored)
    }
}

/// Note types kept as a JSON array in `notetypes.json`.
#[derive(Debug, Clone)]
pub struct FileNoteTypeStore {
    dir: PathBuf,
}

impl FileNoteTypeStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn data_file(&self) -> PathBuf {
        self.dir.join(NOTETYPES_FILENAME)
    }

    fn write_all(&self, note_types: &[NoteType]) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(CodefieldError::Io)?;
        }
        let content =
            serde_json::to_string_pretty(note_types).map_err(CodefieldError::Serialization)?;
        fs::write(self.data_file(), content).map_err(CodefieldError::Io)?;
        Ok(())
    }
}

impl NoteTypeStore for FileNoteTypeStore {
    fn all_note_types(&self) -> Result<Vec<NoteType>> {
        let data_file = self.data_file();
        if !data_file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(data_file).map_err(CodefieldError::Io)?;
        let note_types: Vec<NoteType> =
            serde_json::from_str(&content).map_err(CodefieldError::Serialization)?;
        Ok(note_types)
    }

    fn save_note_type(&mut self, note_type: &NoteType) -> Result<()> {
        let mut note_types = self.all_note_types()?;
        match note_types.iter_mut().find(|nt| nt.id == note_type.id) {
            Some(slot) => *slot = note_type.clone(),
            None => note_types.push(note_type.clone()),
        }
        self.write_all(&note_types)
    }

    fn invalidate_rendering(&mut self) {
        tracing::debug!(dir = %self.dir.display(), "note types changed; nothing cached on disk");
    }
}
