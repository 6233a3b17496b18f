use crate::constants::CACHE_FILE_NAME;
use crate::error::{Result, StatusError};
use std::path::{Path, PathBuf};

// Per-user configuration directory for ccstat
pub fn default_cache_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|home| home.join(".config").join("ccstat"))
        .ok_or(StatusError::HomeNotFound)
}

// Location of the usage cache store inside a directory
pub fn cache_file_in(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_file_in() {
        let path = cache_file_in(Path::new("/tmp/ccstat"));
        assert_eq!(path, PathBuf::from("/tmp/ccstat/usage-cache.json"));
    }
}
