//! Path utilities for forgekeeper.
//!
//! Local state lives under `~/.forgekeeper/`:
//! - `~/.forgekeeper/config.toml` - main configuration
//! - `~/.forgekeeper/keystores/` - encrypted wallet keystores

use std::path::PathBuf;

/// Returns the forgekeeper home directory (`~/.forgekeeper/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".forgekeeper")
}

/// Returns the default config file path (`~/.forgekeeper/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default keystore directory (`~/.forgekeeper/keystores/`).
pub fn keystore_dir() -> PathBuf {
    home_dir().join("keystores")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_forgekeeper_home() {
        assert!(home_dir().ends_with(".forgekeeper"));
        assert!(default_config().starts_with(home_dir()));
        assert!(keystore_dir().starts_with(home_dir()));
    }
}
