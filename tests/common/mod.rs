#![allow(dead_code)]

use codefield::init::HostDirs;
use codefield::model::{CardTemplate, NoteType};
use codefield::store::fs::FileNoteTypeStore;
use codefield::store::NoteTypeStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DIALOG_DOCUMENT: &str = "<!doctype html><html><head><title>Code Editor</title></head>\
<body><textarea id=\"code-editor\"></textarea></body></html>";

const ASSETS: &[(&str, &str)] = &[
    ("codemirror/lib/codemirror.css", ".CodeMirror {}"),
    ("codemirror/lib/codemirror.js", "window.CodeMirror = {};"),
    ("codemirror/addon/runmode/runmode.js", "// runmode"),
    ("codemirror/mode/meta.js", "// meta"),
    ("codemirror/mode/python/python.js", "// python"),
    ("codemirror/theme/dracula.css", ".cm-s-dracula {}"),
    ("codemirror/theme/monokai.css", ".cm-s-monokai {}"),
    ("styles/reviewer_style.css", ".codemirror-anki {}"),
    ("scripts/reviewer_script.js", "// reviewer"),
];

/// A fake host profile: add-on folder with bundled files, media folder,
/// collection and config folders, all under one temporary directory.
pub struct TestHost {
    _temp_dir: TempDir,
    pub dirs: HostDirs,
}

impl TestHost {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path();
        let dirs = HostDirs {
            addon_dir: root.join("codefield"),
            media_dir: root.join("collection.media"),
            collection_dir: root.join("collection"),
            config_dir: Some(root.join("config")),
        };

        let user_files = dirs.addon_dir.join("user_files");
        for (relative, body) in ASSETS {
            write(&user_files, relative, body);
        }
        write(&user_files, "codemirror_index.html", DIALOG_DOCUMENT);

        let mut store = FileNoteTypeStore::new(&dirs.collection_dir);
        for note_type in note_types() {
            store
                .save_note_type(&note_type)
                .expect("failed to seed note types");
        }

        Self {
            _temp_dir: temp_dir,
            dirs,
        }
    }

    pub fn media_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.dirs.media_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn note_types(&self) -> Vec<NoteType> {
        FileNoteTypeStore::new(&self.dirs.collection_dir)
            .all_note_types()
            .expect("failed to read note types")
    }
}

fn write(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create fixture dir");
    }
    fs::write(path, body).expect("failed to write fixture");
}

fn note_types() -> Vec<NoteType> {
    vec![
        NoteType::new(1, "Basic").with_template(CardTemplate::new(
            "Card 1",
            "{{Front}}",
            "{{FrontSide}}<hr id=answer>{{Back}}",
        )),
        NoteType::new(2, "Cloze").cloze().with_template(CardTemplate::new(
            "Cloze",
            "{{cloze:Text}}",
            "{{cloze:Text}}<br>{{Extra}}",
        )),
    ]
}
