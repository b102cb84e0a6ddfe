use crate::package_manager::PackageManager;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// User preferences read from `config.toml`.
///
/// ```toml
/// package_manager = "brew"
/// assume_yes = false
/// history_file = "~/.unipm-history.log"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Used when neither `--pm` nor `UNIPM_PM` is given.
    pub package_manager: Option<PackageManager>,
    /// Skip confirmation prompts.
    pub assume_yes: bool,
    /// Audit log location; `~` and environment variables are expanded.
    pub history_file: Option<String>,
}

impl Settings {
    /// Load settings, returning defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse settings file {:?}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Expanded `history_file`, if one is configured.
    pub fn history_path(&self) -> Result<Option<PathBuf>> {
        let Some(raw) = &self.history_file else {
            return Ok(None);
        };
        let expanded = shellexpand::full(raw)
            .with_context(|| format!("Failed to expand history_file '{raw}'"))?;
        Ok(Some(PathBuf::from(expanded.as_ref())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(&temp.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.history_path().unwrap().is_none());
    }

    #[test]
    fn parses_all_keys() {
        let settings = Settings::parse(
            r#"
package_manager = "pacman"
assume_yes = true
history_file = "/var/tmp/unipm.log"
"#,
        )
        .unwrap();
        assert_eq!(settings.package_manager, Some(PackageManager::Pacman));
        assert!(settings.assume_yes);
        assert_eq!(
            settings.history_path().unwrap(),
            Some(PathBuf::from("/var/tmp/unipm.log"))
        );
    }

    #[test]
    fn rejects_unknown_keys_and_managers() {
        assert!(Settings::parse("colour = true").is_err());
        assert!(Settings::parse("package_manager = \"zypper\"").is_err());
    }

    #[test]
    fn load_reports_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "assume_yes = \"maybe\"").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn history_file_expands_variables() {
        let settings = Settings {
            history_file: Some("$HOME/unipm.log".to_string()),
            ..Settings::default()
        };
        let path = settings.history_path().unwrap().unwrap();
        assert!(!path.to_string_lossy().contains('$'));
        assert!(path.ends_with("unipm.log"));
    }
}
