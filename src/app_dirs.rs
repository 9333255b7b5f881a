use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "repcoach";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }

    /// Where exported event timelines land when no explicit path is given
    pub fn export_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_a_json_file() {
        if let Some(path) = AppDirs::config_path() {
            assert_eq!(path.file_name().unwrap(), "config.json");
        }
    }

    #[test]
    fn export_dir_is_app_scoped() {
        if let Some(dir) = AppDirs::export_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
