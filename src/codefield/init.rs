use crate::api::CodefieldApi;
use crate::commands::CodefieldPaths;
use crate::config::FileConfigStore;
use crate::logging;
use crate::store::fs::{FileNoteTypeStore, FsMediaStore};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const USER_FILES: &str = "user_files";

pub type FileApi = CodefieldApi<FsMediaStore, FileNoteTypeStore, FileConfigStore>;

/// Everything the host binding keeps after startup. The live configuration
/// is `api.config()`.
pub struct CodefieldContext {
    pub api: FileApi,
}

/// Directories the host hands over at startup.
#[derive(Debug, Clone)]
pub struct HostDirs {
    /// The add-on's installation folder; contains `user_files/`.
    pub addon_dir: PathBuf,
    /// The collection's shared media folder.
    pub media_dir: PathBuf,
    /// Where note types are kept.
    pub collection_dir: PathBuf,
    /// Host-managed configuration folder, if the host provides one.
    pub config_dir: Option<PathBuf>,
}

/// The configuration folder: the host's if given, else the platform data
/// directory, else the add-on folder itself.
pub fn config_dir(addon_dir: &Path, host_config_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = host_config_dir {
        return dir.to_path_buf();
    }
    match ProjectDirs::from("net", "ankiweb", "codefield") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => addon_dir.to_path_buf(),
    }
}

/// URL prefix under which the host's webviews serve the add-on's files.
pub fn web_base(addon_dir: &Path) -> String {
    let package = addon_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "codefield".to_string());
    format!("/_addons/{}/{}", package, USER_FILES)
}

pub fn initialize(dirs: &HostDirs) -> CodefieldContext {
    logging::init_logging("codefield=info");

    let config_store =
        FileConfigStore::new(config_dir(&dirs.addon_dir, dirs.config_dir.as_deref()));
    let config_path = config_store.path();

    let paths = CodefieldPaths::new(
        dirs.addon_dir.join(USER_FILES),
        web_base(&dirs.addon_dir),
    );
    let media = FsMediaStore::new(&dirs.media_dir);
    let note_types = FileNoteTypeStore::new(&dirs.collection_dir);
    let api = CodefieldApi::new(media, note_types, config_store, paths);

    tracing::info!(
        theme = %api.config().active_theme,
        config = %config_path.display(),
        "codefield initialized"
    );
    CodefieldContext { api }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::configure::ConfigSelection;
    use crate::config::CodefieldConfig;
    use crate::host::NoProgress;
    use crate::model::NoteTypeId;
    use std::fs;
    use tempfile::TempDir;

    fn host_dirs(root: &Path) -> HostDirs {
        HostDirs {
            addon_dir: root.join("1234567"),
            media_dir: root.join("collection.media"),
            collection_dir: root.join("collection"),
            config_dir: Some(root.join("config")),
        }
    }

    #[test]
    fn web_base_uses_the_package_folder_name() {
        assert_eq!(
            web_base(Path::new("/addons21/1234567")),
            "/_addons/1234567/user_files"
        );
    }

    #[test]
    fn host_config_dir_wins() {
        let temp = TempDir::new().unwrap();
        let dir = config_dir(temp.path(), Some(&temp.path().join("cfg")));
        assert_eq!(dir, temp.path().join("cfg"));
    }

    #[test]
    fn initialize_reads_existing_config() {
        let temp = TempDir::new().unwrap();
        let dirs = host_dirs(temp.path());
        fs::create_dir_all(dirs.config_dir.as_ref().unwrap()).unwrap();
        fs::write(
            dirs.config_dir.as_ref().unwrap().join("config.json"),
            r#"{"global_theme": "eclipse"}"#,
        )
        .unwrap();

        let ctx = initialize(&dirs);
        assert_eq!(ctx.api.config().active_theme, "eclipse");
        assert_eq!(ctx.api.paths().user_files, dirs.addon_dir.join("user_files"));
    }

    #[test]
    fn initialize_survives_a_corrupt_config() {
        let temp = TempDir::new().unwrap();
        let dirs = host_dirs(temp.path());
        fs::create_dir_all(dirs.config_dir.as_ref().unwrap()).unwrap();
        fs::write(dirs.config_dir.as_ref().unwrap().join("config.json"), "{oops").unwrap();

        let ctx = initialize(&dirs);
        assert_eq!(ctx.api.config(), &CodefieldConfig::default());
    }

    #[test]
    fn context_config_tracks_applied_changes() {
        let temp = TempDir::new().unwrap();
        let dirs = host_dirs(temp.path());

        let mut ctx = initialize(&dirs);
        let result = ctx
            .api
            .apply_config(
                ConfigSelection {
                    theme: "monokai".into(),
                    injected: vec![],
                    bypassed: vec![NoteTypeId(1)],
                },
                &mut NoProgress,
            )
            .unwrap();

        assert!(!result.has_errors());
        assert_eq!(ctx.api.config().active_theme, "monokai");
        assert!(ctx.api.config().is_bypassed(NoteTypeId(1)));
    }
}
