use std::path::PathBuf;

use supply_chain_app::{ProjectPaths, Result, resolve_project_root};

#[derive(Debug, Clone)]
pub struct ProjectResolution {
    pub paths: ProjectPaths,
    pub config_file: PathBuf,
}

pub fn resolve_project(root: Option<PathBuf>, config: Option<PathBuf>) -> Result<ProjectResolution> {
    let root = resolve_project_root(root)?;
    let paths = ProjectPaths::new(root);
    let config_file = match config {
        Some(file) => paths.resolve(&file),
        None => paths.config_file.clone(),
    };
    Ok(ProjectResolution { paths, config_file })
}
