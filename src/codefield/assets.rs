//! # Asset Synchronizer
//!
//! Review-time rendering needs the highlighting library, its language modes,
//! the reviewer script and stylesheets, and the active theme to be reachable
//! from card templates. The host only serves files from its shared media
//! store, so every asset under `user_files` is published there under a stable,
//! prefixed name.
//!
//! Publishing is delete-then-write: the whole family of names an asset may
//! have accumulated (the stable name plus any content-hashed variants the host
//! created on an earlier, different write) is trashed before the fresh bytes
//! are written. Writing first would leave the stale variant in place.
//!
//! Missing source files are skipped: assets are optional, and a partial
//! `user_files` tree must never stop the caller.

use crate::error::{CodefieldError, Result};
use crate::html;
use crate::store::MediaStore;
use std::fs;
use std::path::Path;

/// Prefix of every published media name.
pub const PREFIX: &str = "_codemirror_anki_";

/// Element id of the resource block inside card templates.
pub const INJECTION_ID: &str = "_codemirror_anki_resources";

/// Stylesheets, in load order. The theme stylesheet follows them.
pub const CSS_FILES: &[&str] = &["codemirror/lib/codemirror.css", "styles/reviewer_style.css"];

/// Scripts, in load order: core, addons, language modes, reviewer script.
pub const JS_FILES: &[&str] = &[
    "codemirror/lib/codemirror.js",
    "codemirror/addon/runmode/runmode.js",
    "codemirror/mode/meta.js",
    "codemirror/mode/python/python.js",
    "codemirror/mode/javascript/javascript.js",
    "codemirror/mode/clike/clike.js",
    "codemirror/mode/ruby/ruby.js",
    "codemirror/mode/sql/sql.js",
    "codemirror/mode/css/css.js",
    "codemirror/mode/xml/xml.js",
    "codemirror/mode/htmlmixed/htmlmixed.js",
    "scripts/reviewer_script.js",
];

const THEME_DIR: &str = "codemirror/theme";

/// Path of a theme stylesheet, relative to `user_files`.
pub fn theme_source(theme: &str) -> String {
    format!("{}/{}.css", THEME_DIR, theme)
}

/// The stable media name for a source path: prefix plus the file name.
pub fn published_name(relative: &str) -> String {
    let file_name = Path::new(relative)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| relative.to_string());
    format!("{}{}", PREFIX, file_name)
}

/// True when `candidate` belongs to the name family of `stable`: same stem
/// prefix, any infix, same extension.
pub fn in_family(stable: &str, candidate: &str) -> bool {
    let path = Path::new(stable);
    let stem = match path.file_stem() {
        Some(stem) => stem.to_string_lossy(),
        None => return candidate == stable,
    };
    match path.extension() {
        Some(ext) => {
            let suffix = format!(".{}", ext.to_string_lossy());
            candidate.len() >= stem.len() + suffix.len()
                && candidate.starts_with(stem.as_ref())
                && candidate.ends_with(&suffix)
        }
        None => candidate.starts_with(stem.as_ref()) && Path::new(candidate).extension().is_none(),
    }
}

/// What happened to one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    /// Written; carries the name the store used.
    Written(String),
    /// No source file under `user_files`.
    Skipped,
}

/// Publishes one asset, removing every earlier version of it first.
pub fn ensure_published<M: MediaStore + ?Sized>(
    media: &mut M,
    user_files: &Path,
    relative: &str,
) -> Result<Published> {
    // Nothing in the store is touched until the source has been read.
    let data = match fs::read(user_files.join(relative)) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(asset = relative, "asset source missing, skipping");
            return Ok(Published::Skipped);
        }
        Err(e) => return Err(CodefieldError::Io(e)),
    };

    let stable = published_name(relative);
    let family: Vec<String> = media
        .list_files()?
        .into_iter()
        .filter(|name| in_family(&stable, name))
        .collect();
    if !family.is_empty() {
        tracing::debug!(asset = %stable, count = family.len(), "trashing earlier versions");
        media.trash_files(&family)?;
    }

    let stored = media.write_data(&stable, &data)?;
    if stored != stable {
        tracing::warn!(asset = %stable, stored = %stored, "media store renamed published asset");
    }
    Ok(Published::Written(stored))
}

/// Outcome of publishing the whole manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    /// `(asset, error)` for entries that failed; the rest still ran.
    pub failed: Vec<(String, String)>,
}

/// Publishes every manifest entry plus the theme stylesheet.
pub fn publish_all<M: MediaStore + ?Sized>(
    media: &mut M,
    user_files: &Path,
    theme: &str,
) -> PublishReport {
    let theme_css = theme_source(theme);
    let entries = CSS_FILES
        .iter()
        .chain(JS_FILES.iter())
        .map(|s| s.to_string())
        .chain(std::iter::once(theme_css));

    let mut report = PublishReport::default();
    for relative in entries {
        match ensure_published(media, user_files, &relative) {
            Ok(Published::Written(name)) => report.written.push(name),
            Ok(Published::Skipped) => report.skipped.push(relative),
            Err(e) => {
                tracing::warn!(asset = %relative, error = %e, "failed to publish asset");
                report.failed.push((relative, e.to_string()));
            }
        }
    }
    report
}

/// The hidden fragment that loads every published asset during review.
///
/// Pure: depends only on the theme name, so two runs with the same theme
/// produce identical text.
pub fn resource_block(theme: &str) -> String {
    let mut css_links = String::new();
    for file in CSS_FILES {
        css_links.push_str(&stylesheet_tag(&published_name(file)));
    }
    css_links.push_str(&stylesheet_tag(&published_name(&format!("{}.css", theme))));

    let mut js_tags = String::new();
    for file in JS_FILES {
        js_tags.push_str(&format!(
            "<script src=\"{}\"></script>",
            html::escape_attr(&published_name(file))
        ));
    }

    let theme_literal = serde_json::Value::from(theme).to_string();
    format!(
        "<div id=\"{}\" style=\"display: none;\">{}<script>window.CODE_MIRROR_GLOBAL_THEME = {};</script>{}</div>",
        INJECTION_ID, css_links, theme_literal, js_tags
    )
}

fn stylesheet_tag(name: &str) -> String {
    format!(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">",
        html::escape_attr(name)
    )
}

/// A resource block together with the publishing pass that backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBlock {
    pub html: String,
    pub report: PublishReport,
}

/// Republishes all assets for `theme`, then builds the resource block.
pub fn publish_resource_block<M: MediaStore + ?Sized>(
    media: &mut M,
    user_files: &Path,
    theme: &str,
) -> ResourceBlock {
    let report = publish_all(media, user_files, theme);
    tracing::info!(
        theme,
        written = report.written.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "published review assets"
    );
    ResourceBlock {
        html: resource_block(theme),
        report,
    }
}

/// Theme names available under `user_files`, sorted. Empty when the theme
/// directory does not exist.
pub fn list_themes(user_files: &Path) -> Result<Vec<String>> {
    let dir = user_files.join(THEME_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut themes = Vec::new();
    for entry in fs::read_dir(&dir).map_err(CodefieldError::Io)? {
        let path = entry.map_err(CodefieldError::Io)?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("css") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            themes.push(stem.to_string());
        }
    }
    themes.sort();
    Ok(themes)
}

/// Reads a text asset, or an empty string when it is missing or unreadable.
pub fn read_text(user_files: &Path, relative: &str) -> String {
    match fs::read_to_string(user_files.join(relative)) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(asset = relative, error = %e, "text asset unavailable");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryMediaStore;
    use crate::test_utils::UserFiles;

    #[test]
    fn published_name_uses_prefix_and_basename() {
        assert_eq!(
            published_name("codemirror/mode/python/python.js"),
            "_codemirror_anki_python.js"
        );
        assert_eq!(published_name("dracula.css"), "_codemirror_anki_dracula.css");
    }

    #[test]
    fn family_matches_hashed_variants_only() {
        let stable = "_codemirror_anki_css.js";
        assert!(in_family(stable, "_codemirror_anki_css.js"));
        assert!(in_family(stable, "_codemirror_anki_css-0a1b2c.js"));
        assert!(!in_family(stable, "_codemirror_anki_css.css"));
        assert!(!in_family(stable, "_codemirror_anki_clike.js"));
        assert!(!in_family(stable, "other_css.js"));
    }

    #[test]
    fn ensure_published_twice_leaves_one_variant() {
        let files = UserFiles::new();
        let mut media = MemoryMediaStore::new();
        let entry = "codemirror/mode/python/python.js";

        ensure_published(&mut media, files.path(), entry).unwrap();
        ensure_published(&mut media, files.path(), entry).unwrap();

        let family: Vec<_> = media
            .list_files()
            .unwrap()
            .into_iter()
            .filter(|n| in_family("_codemirror_anki_python.js", n))
            .collect();
        assert_eq!(family, vec!["_codemirror_anki_python.js".to_string()]);
    }

    #[test]
    fn stale_hashed_copies_are_removed_before_writing() {
        let files = UserFiles::new();
        let mut media = MemoryMediaStore::new();
        media.insert("_codemirror_anki_python.js", b"old bytes");
        media.insert("_codemirror_anki_python-deadbeef.js", b"older bytes");
        media.insert("unrelated.js", b"keep me");

        let outcome =
            ensure_published(&mut media, files.path(), "codemirror/mode/python/python.js")
                .unwrap();

        assert_eq!(
            outcome,
            Published::Written("_codemirror_anki_python.js".to_string())
        );
        assert_eq!(media.trashed().len(), 2);
        assert!(media.get("_codemirror_anki_python-deadbeef.js").is_none());
        assert!(media.get("unrelated.js").is_some());
        assert!(media.pending_sync().contains("_codemirror_anki_python.js"));
    }

    #[test]
    fn missing_source_is_skipped() {
        let files = UserFiles::new();
        let mut media = MemoryMediaStore::new();
        let outcome = ensure_published(&mut media, files.path(), "nope/missing.js").unwrap();
        assert_eq!(outcome, Published::Skipped);
        assert!(media.list_files().unwrap().is_empty());
    }

    #[test]
    fn unreadable_source_leaves_published_copy_in_place() {
        let files = UserFiles::empty();
        files.write("scripts/reviewer_script.js/nested", "not a file");
        let mut media = MemoryMediaStore::new();
        media.insert("_codemirror_anki_reviewer_script.js", b"published");

        let result = ensure_published(&mut media, files.path(), "scripts/reviewer_script.js");

        assert!(matches!(result, Err(CodefieldError::Io(_))));
        assert!(media.trashed().is_empty());
        assert_eq!(
            media.get("_codemirror_anki_reviewer_script.js"),
            Some(&b"published"[..])
        );
    }

    #[test]
    fn publish_all_keeps_going_after_failures() {
        let files = UserFiles::new();
        let mut media = MemoryMediaStore::new();
        media.set_simulate_write_error(true);

        let report = publish_all(&mut media, files.path(), "dracula");
        assert!(report.written.is_empty());
        assert_eq!(
            report.failed.len() + report.skipped.len(),
            CSS_FILES.len() + JS_FILES.len() + 1
        );
    }

    #[test]
    fn resource_block_orders_tags_and_names_theme() {
        let block = resource_block("monokai");
        assert!(block.starts_with(
            "<div id=\"_codemirror_anki_resources\" style=\"display: none;\">"
        ));
        assert!(block.contains("window.CODE_MIRROR_GLOBAL_THEME = \"monokai\";"));
        assert!(block.contains("href=\"_codemirror_anki_monokai.css\""));

        let core = block.find("_codemirror_anki_codemirror.js").unwrap();
        let mode = block.find("_codemirror_anki_python.js").unwrap();
        let script = block.find("_codemirror_anki_reviewer_script.js").unwrap();
        assert!(core < mode && mode < script);

        let base_css = block.find("_codemirror_anki_codemirror.css").unwrap();
        let theme_css = block.find("_codemirror_anki_monokai.css").unwrap();
        assert!(base_css < theme_css);
    }

    #[test]
    fn publish_resource_block_publishes_theme() {
        let files = UserFiles::new();
        let mut media = MemoryMediaStore::new();
        let block = publish_resource_block(&mut media, files.path(), "monokai");
        assert!(block.report.failed.is_empty());
        assert!(media.get("_codemirror_anki_monokai.css").is_some());
        assert!(media.get("_codemirror_anki_dracula.css").is_none());
        assert_eq!(block.html, resource_block("monokai"));
    }

    #[test]
    fn list_themes_is_sorted() {
        let files = UserFiles::new();
        assert_eq!(
            list_themes(files.path()).unwrap(),
            vec!["dracula", "eclipse", "monokai"]
        );
        assert!(list_themes(&files.path().join("absent")).unwrap().is_empty());
    }
}
