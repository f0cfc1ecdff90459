use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("typex"))
        } else {
            ProjectDirs::from("", "", "typex").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("typex.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("typex.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_the_state_dir() {
        let (Some(db), Some(log)) = (AppDirs::db_path(), AppDirs::log_path()) else {
            return;
        };
        assert_eq!(db.parent(), log.parent());
        assert!(db.ends_with("typex.db"));
    }
}
