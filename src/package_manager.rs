use anyhow::{bail, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Native package managers unipm knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Apt,
    Pacman,
    Brew,
    Dnf,
    Yum,
    Winget,
    Choco,
    Snap,
    Flatpak,
}

impl PackageManager {
    /// Every identifier, in detection priority order.
    pub const ALL: [PackageManager; 9] = [
        PackageManager::Apt,
        PackageManager::Pacman,
        PackageManager::Brew,
        PackageManager::Dnf,
        PackageManager::Yum,
        PackageManager::Winget,
        PackageManager::Choco,
        PackageManager::Snap,
        PackageManager::Flatpak,
    ];

    /// Identifier as used in package tables and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Pacman => "pacman",
            PackageManager::Brew => "brew",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Winget => "winget",
            PackageManager::Choco => "choco",
            PackageManager::Snap => "snap",
            PackageManager::Flatpak => "flatpak",
        }
    }

    /// Name of the executable looked up on `PATH`.
    pub fn binary(self) -> &'static str {
        self.as_str()
    }

    /// Whether modifying operations need superuser rights.
    ///
    /// Homebrew refuses to run as root and the Windows managers handle
    /// elevation themselves.
    pub fn requires_root(self) -> bool {
        match self {
            PackageManager::Apt
            | PackageManager::Pacman
            | PackageManager::Dnf
            | PackageManager::Yum
            | PackageManager::Snap
            | PackageManager::Flatpak => true,
            PackageManager::Brew | PackageManager::Winget | PackageManager::Choco => false,
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "apt" => Ok(PackageManager::Apt),
            "pacman" => Ok(PackageManager::Pacman),
            "brew" => Ok(PackageManager::Brew),
            "dnf" => Ok(PackageManager::Dnf),
            "yum" => Ok(PackageManager::Yum),
            "winget" => Ok(PackageManager::Winget),
            "choco" | "chocolatey" => Ok(PackageManager::Choco),
            "snap" => Ok(PackageManager::Snap),
            "flatpak" => Ok(PackageManager::Flatpak),
            _ => bail!(
                "Unknown package manager '{s}'. Expected one of: {}.",
                PackageManager::ALL.map(PackageManager::as_str).join(", ")
            ),
        }
    }
}
