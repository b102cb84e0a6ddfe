use crate::package_manager::PackageManager;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Package table shipped inside the binary, used when no system table is installed.
const BUILTIN_TABLE: &str = include_str!("../data/packages.json");

/// Reasons a package table document could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("package table {0:?} does not exist")]
    NotFound(PathBuf),
    #[error("failed to read package table {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse package table {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed package table {path:?}: {message}")]
    Malformed { path: PathBuf, message: String },
}

/// A single package known to the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageEntry {
    /// Canonical name, unique within a table.
    pub name: String,
    pub aliases: Vec<String>,
    /// Native package name per package manager.
    pub mappings: BTreeMap<PackageManager, String>,
    /// Version-specific overrides of `mappings`.
    pub versions: BTreeMap<String, BTreeMap<PackageManager, String>>,
}

impl PackageEntry {
    pub fn mapping(&self, pm: PackageManager) -> Option<&str> {
        self.mappings.get(&pm).map(String::as_str)
    }

    pub fn version_mapping(&self, version: &str, pm: PackageManager) -> Option<&str> {
        self.versions
            .get(version)
            .and_then(|mappings| mappings.get(&pm))
            .map(String::as_str)
    }

    pub fn has_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|alias| alias == name)
    }
}

/// Immutable name -> native package mapping table.
///
/// Built once at startup and then only read. Loading never mutates an
/// existing table: [`PackageTable::overlay`] returns a new value, so a failed
/// load leaves the caller with whatever table it already had.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageTable {
    entries: BTreeMap<String, PackageEntry>,
}

impl PackageTable {
    /// Load a package table document from disk.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_json_str(&contents, path)?;
        debug!(path = %path.display(), packages = table.len(), "loaded package table");
        Ok(table)
    }

    /// The table compiled into the binary.
    pub fn builtin() -> Result<Self, LoadError> {
        Self::from_json_str(BUILTIN_TABLE, Path::new("<builtin>"))
    }

    /// Parse a package table document. `source` is only used in error messages.
    pub fn from_json_str(contents: &str, source: &Path) -> Result<Self, LoadError> {
        let raw: RawDocument =
            serde_json::from_str(contents).map_err(|err| LoadError::Parse {
                path: source.to_path_buf(),
                source: err,
            })?;

        let mut entries = BTreeMap::new();
        for (name, raw_entry) in raw.packages.unwrap_or_default() {
            let entry = raw_entry
                .into_entry(&name)
                .map_err(|message| LoadError::Malformed {
                    path: source.to_path_buf(),
                    message,
                })?;
            entries.insert(name, entry);
        }

        Ok(Self { entries })
    }

    /// Overlay a user document on top of this table.
    ///
    /// Merging is per canonical name: a package defined by the user document
    /// replaces the existing entry wholesale.
    pub fn overlay(&self, path: &Path) -> Result<Self, LoadError> {
        let user = Self::load(path)?;
        Ok(self.clone().merged(user))
    }

    /// Merge `other` into this table, `other` winning per canonical name.
    pub fn merged(mut self, other: PackageTable) -> Self {
        for (name, entry) in other.entries {
            if self.entries.insert(name.clone(), entry).is_some() {
                debug!(package = %name, "user table replaces package entry");
            }
        }
        self
    }

    /// Whether `name` is a canonical name or an alias of one.
    pub fn has_package(&self, name: &str) -> bool {
        self.package_info(name).is_some()
    }

    /// Look up an entry by canonical name, falling back to a scan of aliases.
    pub fn package_info(&self, name: &str) -> Option<&PackageEntry> {
        self.entries
            .get(name)
            .or_else(|| self.entries.values().find(|entry| entry.has_alias(name)))
    }

    /// Native name of `name` for `pm`.
    ///
    /// Returns `name` unchanged when the package or its mapping is unknown;
    /// this means "no mapping", not that the name is valid.
    pub fn mapping<'a>(&'a self, name: &'a str, pm: PackageManager) -> &'a str {
        self.package_info(name)
            .and_then(|entry| entry.mapping(pm))
            .unwrap_or(name)
    }

    /// Canonical package names in ascending order.
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PackageEntry> for PackageTable {
    fn from_iter<I: IntoIterator<Item = PackageEntry>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    packages: Option<BTreeMap<String, RawPackage>>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    versions: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    /// Package manager keys plus anything else the document carries.
    #[serde(flatten)]
    fields: BTreeMap<String, serde_json::Value>,
}

impl RawPackage {
    fn into_entry(self, name: &str) -> Result<PackageEntry, String> {
        let mappings = pm_mappings(&self.fields)
            .map_err(|key| format!("package '{name}': field '{key}' must be a string"))?;

        let mut versions = BTreeMap::new();
        for (version, fields) in &self.versions {
            let mappings = pm_mappings(fields).map_err(|key| {
                format!("package '{name}', version '{version}': field '{key}' must be a string")
            })?;
            versions.insert(version.clone(), mappings);
        }

        Ok(PackageEntry {
            name: name.to_string(),
            aliases: self.aliases,
            mappings,
            versions,
        })
    }
}

/// Pick the package manager keys out of a raw object. Unknown keys are ignored.
fn pm_mappings(
    fields: &BTreeMap<String, serde_json::Value>,
) -> Result<BTreeMap<PackageManager, String>, &'static str> {
    let mut mappings = BTreeMap::new();
    for pm in PackageManager::ALL {
        match fields.get(pm.as_str()) {
            None => {}
            Some(serde_json::Value::String(native)) => {
                mappings.insert(pm, native.clone());
            }
            Some(_) => return Err(pm.as_str()),
        }
    }
    Ok(mappings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
{
  "packages": {
    "docker": {
      "aliases": ["docker-ce", "docker-engine"],
      "apt": "docker.io",
      "pacman": "docker",
      "brew": "docker",
      "winget": "Docker.DockerDesktop",
      "description": "ignored"
    },
    "python": {
      "aliases": ["python3", "py"],
      "apt": "python3",
      "brew": "python",
      "versions": {
        "3.11": { "apt": "python3.11", "brew": "python@3.11" }
      }
    }
  }
}
"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_parses_entries_aliases_and_versions() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "packages.json", SAMPLE);

        let table = PackageTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.package_names().collect::<Vec<_>>(), vec!["docker", "python"]);

        let docker = table.package_info("docker").unwrap();
        assert_eq!(docker.aliases, vec!["docker-ce", "docker-engine"]);
        assert_eq!(docker.mapping(PackageManager::Apt), Some("docker.io"));
        assert_eq!(docker.mapping(PackageManager::Dnf), None);

        let python = table.package_info("python").unwrap();
        assert_eq!(
            python.version_mapping("3.11", PackageManager::Brew),
            Some("python@3.11")
        );
        assert_eq!(python.version_mapping("3.12", PackageManager::Brew), None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = PackageTable::load(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "broken.json", "{ \"packages\": ");
        let err = PackageTable::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn non_string_mapping_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "bad.json", r#"{ "packages": { "git": { "apt": 42 } } }"#);
        let err = PackageTable::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
        assert!(err.to_string().contains("field 'apt' must be a string"));
    }

    #[test]
    fn document_without_packages_is_empty() {
        let table = PackageTable::from_json_str("{}", Path::new("inline")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn lookup_falls_back_to_aliases() {
        let table = PackageTable::from_json_str(SAMPLE, Path::new("inline")).unwrap();
        assert!(table.has_package("docker"));
        assert!(table.has_package("py"));
        assert!(!table.has_package("dock"));
        assert_eq!(table.package_info("python3").unwrap().name, "python");
    }

    #[test]
    fn mapping_returns_input_when_unknown() {
        let table = PackageTable::from_json_str(SAMPLE, Path::new("inline")).unwrap();
        assert_eq!(table.mapping("docker-ce", PackageManager::Apt), "docker.io");
        assert_eq!(table.mapping("docker", PackageManager::Dnf), "docker");
        assert_eq!(table.mapping("htop", PackageManager::Apt), "htop");
    }

    #[test]
    fn overlay_replaces_whole_entries() {
        let temp = TempDir::new().unwrap();
        let base = PackageTable::from_json_str(SAMPLE, Path::new("inline")).unwrap();
        let user = write(
            &temp,
            "user.json",
            r#"{ "packages": { "docker": { "apt": "docker-ce" }, "htop": { "apt": "htop" } } }"#,
        );

        let merged = base.overlay(&user).unwrap();
        assert_eq!(merged.len(), 3);

        let docker = merged.package_info("docker").unwrap();
        assert_eq!(docker.mapping(PackageManager::Apt), Some("docker-ce"));
        // Entry was replaced, not field-merged.
        assert_eq!(docker.mapping(PackageManager::Brew), None);
        assert!(docker.aliases.is_empty());

        // The original table is untouched.
        assert_eq!(base.len(), 2);
        assert_eq!(base.mapping("docker", PackageManager::Apt), "docker.io");
    }

    #[test]
    fn failed_overlay_leaves_table_intact() {
        let temp = TempDir::new().unwrap();
        let base = PackageTable::from_json_str(SAMPLE, Path::new("inline")).unwrap();
        let broken = write(&temp, "user.json", "not json");

        assert!(base.overlay(&broken).is_err());
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn builtin_table_parses() {
        let table = PackageTable::builtin().unwrap();
        assert!(!table.is_empty());
        assert_eq!(table.mapping("docker", PackageManager::Apt), "docker.io");
    }
}
