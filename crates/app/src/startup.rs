use std::path::{Path, PathBuf};

use crate::Result;

pub const HOME_ENV_VAR: &str = "SUPPLY_CHAIN_HOME";
pub const CONFIG_FILE_NAME: &str = "data_ingestion.toml";

/// Well-known locations below the project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub raw_data_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub data_ingestion_dir: PathBuf,
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub logs_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let artifacts_dir = root.join("artifacts");
        let config_dir = root.join("configs");
        Self {
            raw_data_dir: root.join("data").join("raw"),
            data_ingestion_dir: artifacts_dir.join("data_ingestion"),
            artifacts_dir,
            config_file: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
            logs_dir: root.join("logs"),
            root,
        }
    }

    /// Resolves `path` against the project root unless it is already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Explicit root first, then `SUPPLY_CHAIN_HOME`, then the working directory.
pub fn resolve_project_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root);
    }
    if let Some(home) = std::env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    Ok(std::env::current_dir()?)
}

pub fn ensure_project_dirs(paths: &ProjectPaths) -> Result<()> {
    ingest::create_directories(&[
        &paths.raw_data_dir,
        &paths.data_ingestion_dir,
        &paths.config_dir,
        &paths.logs_dir,
    ])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_project_layout() {
        let paths = ProjectPaths::new("/srv/supply");
        assert_eq!(paths.raw_data_dir, PathBuf::from("/srv/supply/data/raw"));
        assert_eq!(
            paths.data_ingestion_dir,
            PathBuf::from("/srv/supply/artifacts/data_ingestion")
        );
        assert_eq!(
            paths.config_file,
            PathBuf::from("/srv/supply/configs/data_ingestion.toml")
        );
        assert_eq!(paths.resolve(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
        assert_eq!(
            paths.resolve(Path::new("data/raw")),
            PathBuf::from("/srv/supply/data/raw")
        );
    }

    #[test]
    fn explicit_root_wins() {
        let root = resolve_project_root(Some(PathBuf::from("/opt/project"))).expect("root");
        assert_eq!(root, PathBuf::from("/opt/project"));
    }

    #[test]
    fn ensure_creates_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = ProjectPaths::new(dir.path());
        ensure_project_dirs(&paths).expect("dirs");
        assert!(paths.raw_data_dir.is_dir());
        assert!(paths.logs_dir.is_dir());
        assert!(paths.data_ingestion_dir.is_dir());
    }
}
