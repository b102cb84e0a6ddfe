use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "unipm";
const PACKAGES_FILE: &str = "packages.json";
const SETTINGS_FILE: &str = "config.toml";
const HISTORY_FILE: &str = "history.log";

/// Environment variable naming a package table to use instead of the
/// system one and its fallbacks.
pub const PACKAGES_ENV: &str = "UNIPM_PACKAGES";

/// Environment variable relocating the system package table. Unlike
/// [`PACKAGES_ENV`] a missing file still falls back to the built-in table.
pub const SYSTEM_PACKAGES_ENV: &str = "UNIPM_SYSTEM_PACKAGES";

/// Location of the package table installed alongside unipm.
pub fn system_packages_path() -> PathBuf {
    if let Some(path) = env::var_os(SYSTEM_PACKAGES_ENV).filter(|path| !path.is_empty()) {
        return PathBuf::from(path);
    }

    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files\unipm").join(PACKAGES_FILE)
    } else {
        PathBuf::from("/usr/local/share/unipm").join(PACKAGES_FILE)
    }
}

/// Get the unipm config directory
///
/// Returns `$XDG_CONFIG_HOME/unipm`, falling back to the platform config
/// directory (`~/.config` on Linux).
pub fn config_dir() -> Result<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => base_dirs()?.config_dir().to_path_buf(),
    };
    Ok(base.join(APP_DIR))
}

/// Get the unipm state directory
///
/// Returns `$XDG_STATE_HOME/unipm` or `~/.local/state/unipm`. Windows has no
/// state directory, so the local data directory is used there.
pub fn state_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_STATE_HOME").filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_DIR));
    }

    let dirs = base_dirs()?;
    let base = if cfg!(windows) {
        dirs.data_local_dir().to_path_buf()
    } else {
        dirs.home_dir().join(".local/state")
    };
    Ok(base.join(APP_DIR))
}

/// Per-user package table layered over the system one.
pub fn user_packages_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(PACKAGES_FILE))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SETTINGS_FILE))
}

/// Default audit log location.
pub fn history_path() -> Result<PathBuf> {
    Ok(state_dir()?.join(HISTORY_FILE))
}

fn base_dirs() -> Result<directories::BaseDirs> {
    directories::BaseDirs::new().context("Failed to get home directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn xdg_overrides_are_honoured() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config");
        let state = temp.path().join("state");
        env::set_var("XDG_CONFIG_HOME", &config);
        env::set_var("XDG_STATE_HOME", &state);

        assert_eq!(
            user_packages_path().unwrap(),
            config.join("unipm/packages.json")
        );
        assert_eq!(settings_path().unwrap(), config.join("unipm/config.toml"));
        assert_eq!(history_path().unwrap(), state.join("unipm/history.log"));

        env::remove_var("XDG_CONFIG_HOME");
        env::remove_var("XDG_STATE_HOME");
    }

    #[test]
    #[serial]
    fn defaults_live_under_home() {
        env::remove_var("XDG_CONFIG_HOME");
        env::remove_var("XDG_STATE_HOME");

        let config = config_dir().unwrap();
        assert!(config.is_absolute());
        assert!(config.ends_with("unipm"));

        let history = history_path().unwrap();
        assert!(history.ends_with("unipm/history.log"));
        if cfg!(unix) {
            assert!(history.to_string_lossy().contains(".local/state"));
        }
    }

    #[test]
    #[serial]
    fn system_table_is_absolute() {
        env::remove_var(SYSTEM_PACKAGES_ENV);
        let path = system_packages_path();
        assert!(path.ends_with("packages.json"));
        if cfg!(unix) {
            assert_eq!(path, PathBuf::from("/usr/local/share/unipm/packages.json"));
        }
    }

    #[test]
    #[serial]
    fn system_table_can_be_relocated() {
        let temp = TempDir::new().unwrap();
        let table = temp.path().join("packages.json");
        env::set_var(SYSTEM_PACKAGES_ENV, &table);
        assert_eq!(system_packages_path(), table);

        env::set_var(SYSTEM_PACKAGES_ENV, "");
        assert!(system_packages_path().is_absolute());
        env::remove_var(SYSTEM_PACKAGES_ENV);
    }
}
