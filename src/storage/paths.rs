//! Application paths for configuration.

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};

/// Application paths.
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
}

impl AppPaths {
    /// Create paths for the sfcost application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("com", "sfcost", "sfcost") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
            }
        } else {
            // Fallback to home directory
            let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
            Self {
                config: home.join(".config/sfcost"),
            }
        }
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// The user's home directory.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Expand a leading `~/` to the home directory.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
