use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Logical names of the raw files every run expects, in processing order.
pub const REQUIRED_RAW_FILES: [&str; 7] = [
    "train",
    "test",
    "items",
    "stores",
    "holidays_events",
    "oil",
    "transactions",
];

pub fn default_raw_file_path(raw_data_dir: &Path, name: &str) -> PathBuf {
    raw_data_dir.join(format!("{}.csv", name))
}

pub fn create_directories<P: AsRef<Path>>(dirs: &[P]) -> io::Result<()> {
    for dir in dirs {
        fs::create_dir_all(dir.as_ref())?;
        debug!("directory ensured: {}", dir.as_ref().display());
    }
    Ok(())
}

/// Human-readable size of a file on disk, e.g. `"1.50 KB"`.
pub fn file_size_label(path: &Path) -> String {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return "File not found".to_string(),
        Err(err) => {
            warn!("could not stat {}: {}", path.display(), err);
            return "Unknown".to_string();
        }
    };
    format_bytes(metadata.len())
}

fn format_bytes(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}
