//! # Host Stores
//!
//! The host owns two stores this crate writes to. Both are abstracted behind
//! traits so the synchronizers can be driven against real storage or an
//! in-memory double.
//!
//! - [`MediaStore`]: the shared, sync-to-remote media folder. Keyed by
//!   filename. Writing a name that already holds *different* bytes makes the
//!   host keep both, storing the new bytes under a content-hashed variant
//!   (`stem-<sha1>.ext`). That behaviour is why asset publishing deletes a
//!   whole name family before writing.
//! - [`NoteTypeStore`]: note types and their card templates. Saving persists
//!   every template side of one note type at once.
//!
//! ## Implementations
//!
//! - [`memory::MemoryMediaStore`], [`memory::MemoryNoteTypeStore`]: no I/O
//! - [`fs::FsMediaStore`]: a media directory, with a `.trash/` folder
//! - [`fs::FileNoteTypeStore`]: note types kept in `notetypes.json`

use crate::error::Result;
use crate::model::NoteType;
use sha1::{Digest, Sha1};
use std::path::Path;

pub mod fs;
pub mod memory;

pub trait MediaStore {
    /// Every filename currently in the store.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Moves files to the host's trash. Unknown names are ignored.
    fn trash_files(&mut self, names: &[String]) -> Result<()>;

    /// Writes `data` under `name` and marks it for remote sync.
    ///
    /// Returns the name the bytes were actually stored under, which differs
    /// from `name` when another file already holds it.
    fn write_data(&mut self, name: &str, data: &[u8]) -> Result<String>;
}

pub trait NoteTypeStore {
    fn all_note_types(&self) -> Result<Vec<NoteType>>;

    fn save_note_type(&mut self, note_type: &NoteType) -> Result<()>;

    /// Drops any cached rendering state after templates changed.
    fn invalidate_rendering(&mut self);
}

/// The name the host uses when `name` is already taken by other bytes.
pub(crate) fn hashed_variant(name: &str, data: &[u8]) -> String {
    let digest = Sha1::digest(data);
    let hash = format!("{:x}", digest);
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, hash, ext.to_string_lossy()),
        None => format!("{}-{}", stem, hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_variant_keeps_stem_and_extension() {
        let name = hashed_variant("_codemirror_anki_python.js", b"abc");
        assert!(name.starts_with("_codemirror_anki_python-"));
        assert!(name.ends_with(".js"));
        assert_eq!(
            name,
            "_codemirror_anki_python-a9993e364706816aba3e25717850c26c9cd0d89d.js"
        );
    }
}
