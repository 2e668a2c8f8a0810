use crate::commands::CodefieldPaths;
use crate::model::{CardTemplate, NoteType};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DIALOG_DOCUMENT: &str = "<!doctype html><html><head><title>Code Editor</title></head>\
<body><div class=\"toolbar\"><select id=\"language-select\"></select>\
<button id=\"insert-btn\"></button></div><textarea id=\"code-editor\"></textarea></body></html>";

/// Every file the asset manifests and the dialog refer to, with small bodies.
const FIXTURE_FILES: &[(&str, &str)] = &[
    ("codemirror/lib/codemirror.css", ".CodeMirror { font-family: monospace; }"),
    ("codemirror/lib/codemirror.js", "window.CodeMirror = {};"),
    ("codemirror/addon/runmode/runmode.js", "// runmode"),
    ("codemirror/addon/edit/closebrackets.js", "// closebrackets"),
    ("codemirror/addon/edit/matchbrackets.js", "// matchbrackets"),
    ("codemirror/mode/meta.js", "// meta"),
    ("codemirror/mode/python/python.js", "// python mode"),
    ("codemirror/mode/javascript/javascript.js", "// javascript mode"),
    ("codemirror/mode/clike/clike.js", "// clike mode"),
    ("codemirror/mode/ruby/ruby.js", "// ruby mode"),
    ("codemirror/mode/sql/sql.js", "// sql mode"),
    ("codemirror/mode/css/css.js", "// css mode"),
    ("codemirror/mode/xml/xml.js", "// xml mode"),
    ("codemirror/mode/htmlmixed/htmlmixed.js", "// htmlmixed mode"),
    ("codemirror/theme/dracula.css", ".cm-s-dracula { background: #282a36; }"),
    ("codemirror/theme/eclipse.css", ".cm-s-eclipse { background: #fff; }"),
    ("codemirror/theme/monokai.css", ".cm-s-monokai { background: #272822; }"),
    ("styles/reviewer_style.css", ".codemirror-anki { display: block; }"),
    ("styles/styles.css", "body { margin: 0; }"),
    ("scripts/reviewer_script.js", "// paints .codemirror-anki spans"),
    ("scripts/script.js", "// dialog script"),
];

/// A populated `user_files` tree in a temporary directory.
pub struct UserFiles {
    // Kept so the directory lives as long as the fixture
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Default for UserFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl UserFiles {
    pub fn new() -> Self {
        let fixture = Self::empty();
        for (relative, body) in FIXTURE_FILES {
            fixture.write(relative, body);
        }
        fixture.write("codemirror_index.html", DIALOG_DOCUMENT);
        fixture
    }

    /// A `user_files` directory with nothing in it.
    pub fn empty() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().join("user_files");
        fs::create_dir_all(&root).expect("failed to create user_files");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> CodefieldPaths {
        CodefieldPaths::new(&self.root, "/_addons/codefield/user_files")
    }

    pub fn write(&self, relative: &str, body: &str) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        fs::write(path, body).expect("failed to write fixture file");
    }
}

/// Basic (1), Basic and reversed (2, two templates), Cloze (3).
pub fn sample_note_types() -> Vec<NoteType> {
    vec![
        NoteType::new(1, "Basic").with_template(CardTemplate::new(
            "Card 1",
            "{{Front}}",
            "{{FrontSide}}<hr id=answer>{{Back}}",
        )),
        NoteType::new(2, "Basic (and reversed card)")
            .with_template(CardTemplate::new(
                "Card 1",
                "{{Front}}",
                "{{FrontSide}}<hr id=answer>{{Back}}",
            ))
            .with_template(CardTemplate::new(
                "Card 2",
                "{{Back}}",
                "{{FrontSide}}<hr id=answer>{{Front}}",
            )),
        NoteType::new(3, "Cloze").cloze().with_template(CardTemplate::new(
            "Cloze",
            "{{cloze:Text}}",
            "{{cloze:Text}}<br>{{Extra}}",
        )),
    ]
}
