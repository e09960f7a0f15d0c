use std::path::{Path, PathBuf};

use supply_chain_app::{IngestionSettings, Result};

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub settings: IngestionSettings,
    pub file: PathBuf,
    pub created: bool,
}

pub fn load_or_create(file: &Path) -> Result<ConfigLoad> {
    if file.exists() {
        let settings = IngestionSettings::load(file)?;
        return Ok(ConfigLoad {
            settings,
            file: file.to_path_buf(),
            created: false,
        });
    }

    let settings = IngestionSettings::default();
    settings.write(file)?;
    Ok(ConfigLoad {
        settings,
        file: file.to_path_buf(),
        created: true,
    })
}
