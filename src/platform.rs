use crate::package_manager::PackageManager;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const OS_RELEASE: &str = "/etc/os-release";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Linux,
    MacOs,
    Windows,
    Unknown,
}

impl OsType {
    pub fn current() -> Self {
        Self::from_consts(std::env::consts::OS)
    }

    fn from_consts(os: &str) -> Self {
        match os {
            "linux" => OsType::Linux,
            "macos" => OsType::MacOs,
            "windows" => OsType::Windows,
            _ => OsType::Unknown,
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsType::Linux => write!(f, "Linux"),
            OsType::MacOs => write!(f, "macOS"),
            OsType::Windows => write!(f, "Windows"),
            OsType::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinuxDistro {
    Ubuntu,
    Debian,
    Arch,
    Fedora,
    Rhel,
    CentOs,
    OpenSuse,
    Gentoo,
    Unknown,
}

impl LinuxDistro {
    /// Map an os-release `ID` to a distribution.
    pub fn from_id(id: &str) -> Self {
        match id {
            "ubuntu" => LinuxDistro::Ubuntu,
            "debian" => LinuxDistro::Debian,
            "arch" => LinuxDistro::Arch,
            "fedora" => LinuxDistro::Fedora,
            "rhel" => LinuxDistro::Rhel,
            "centos" => LinuxDistro::CentOs,
            "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" => LinuxDistro::OpenSuse,
            "gentoo" => LinuxDistro::Gentoo,
            _ => LinuxDistro::Unknown,
        }
    }

    /// Best-effort match on free-form text such as `lsb_release -is` output.
    fn from_description(text: &str) -> Self {
        let text = text.to_lowercase();
        [
            ("ubuntu", LinuxDistro::Ubuntu),
            ("debian", LinuxDistro::Debian),
            ("arch", LinuxDistro::Arch),
            ("fedora", LinuxDistro::Fedora),
        ]
        .into_iter()
        .find(|(needle, _)| text.contains(needle))
        .map(|(_, distro)| distro)
        .unwrap_or(LinuxDistro::Unknown)
    }
}

impl fmt::Display for LinuxDistro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinuxDistro::Ubuntu => "Ubuntu",
            LinuxDistro::Debian => "Debian",
            LinuxDistro::Arch => "Arch Linux",
            LinuxDistro::Fedora => "Fedora",
            LinuxDistro::Rhel => "Red Hat Enterprise Linux",
            LinuxDistro::CentOs => "CentOS",
            LinuxDistro::OpenSuse => "openSUSE",
            LinuxDistro::Gentoo => "Gentoo",
            LinuxDistro::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Host operating system as seen by unipm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    pub os: OsType,
    /// Only meaningful on Linux.
    pub distro: LinuxDistro,
    pub version: Option<String>,
    pub codename: Option<String>,
}

impl OsInfo {
    pub fn detect() -> Self {
        let os = OsType::current();
        let mut info = Self {
            os,
            distro: LinuxDistro::Unknown,
            version: None,
            codename: None,
        };

        match os {
            OsType::Linux => {
                if let Ok(contents) = fs::read_to_string(OS_RELEASE) {
                    info = parse_os_release(&contents);
                }
                if info.distro == LinuxDistro::Unknown {
                    if let Some(text) = first_line_of("lsb_release", &["-is"]) {
                        info.distro = LinuxDistro::from_description(&text);
                    }
                }
            }
            OsType::MacOs => info.version = first_line_of("sw_vers", &["-productVersion"]),
            OsType::Windows | OsType::Unknown => {}
        }

        debug!(os = %info.os, distro = %info.distro, "detected operating system");
        info
    }
}

/// Parse the contents of `/etc/os-release`.
pub fn parse_os_release(contents: &str) -> OsInfo {
    let mut id = String::new();
    let mut version = None;
    let mut codename = None;

    for line in contents.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().replace('"', "");
        match key.trim() {
            "ID" => id = value,
            "VERSION_ID" => version = Some(value),
            "VERSION_CODENAME" => codename = Some(value).filter(|v| !v.is_empty()),
            _ => {}
        }
    }

    OsInfo {
        os: OsType::Linux,
        distro: LinuxDistro::from_id(&id),
        version,
        codename,
    }
}

/// An installed package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmInfo {
    pub manager: PackageManager,
    pub path: PathBuf,
    pub version: Option<String>,
}

/// Whether `pm`'s executable is on `PATH`.
pub fn is_available(pm: PackageManager) -> bool {
    which::which(pm.binary()).is_ok()
}

/// Look up `pm` on PATH, including its version.
pub fn detect(pm: PackageManager) -> Option<PmInfo> {
    let path = which::which(pm.binary()).ok()?;
    let version = match pm {
        PackageManager::Snap | PackageManager::Flatpak => None,
        _ => first_line_of(&path, &["--version"]),
    };
    Some(PmInfo {
        manager: pm,
        path,
        version,
    })
}

/// Every package manager found on this host, in [`PackageManager::ALL`] order.
pub fn detect_all() -> Vec<PmInfo> {
    PackageManager::ALL.into_iter().filter_map(detect).collect()
}

/// Package managers to try for an OS, most preferred first.
pub fn preferred_managers(os: &OsInfo) -> &'static [PackageManager] {
    match os.os {
        OsType::Linux => match os.distro {
            LinuxDistro::Ubuntu | LinuxDistro::Debian => &[PackageManager::Apt],
            LinuxDistro::Arch => &[PackageManager::Pacman],
            LinuxDistro::Fedora | LinuxDistro::Rhel | LinuxDistro::CentOs => {
                &[PackageManager::Dnf, PackageManager::Yum]
            }
            _ => &[],
        },
        OsType::MacOs => &[PackageManager::Brew],
        OsType::Windows => &[PackageManager::Winget, PackageManager::Choco],
        OsType::Unknown => &[],
    }
}

/// Choose the package manager to use given the OS and what is installed.
///
/// Prefers the OS's native manager; otherwise falls back to the first
/// available manager in detection order.
pub fn select_default(os: &OsInfo, available: &[PackageManager]) -> Option<PackageManager> {
    preferred_managers(os)
        .iter()
        .copied()
        .find(|pm| available.contains(pm))
        .or_else(|| {
            PackageManager::ALL
                .into_iter()
                .find(|pm| available.contains(pm))
        })
}

/// Default package manager for this host.
pub fn detect_default(os: &OsInfo) -> Option<PackageManager> {
    let available: Vec<PackageManager> = PackageManager::ALL
        .into_iter()
        .filter(|pm| is_available(*pm))
        .collect();
    select_default(os, &available)
}

fn first_line_of(program: impl AsRef<Path>, args: &[&str]) -> Option<String> {
    let output = Command::new(program.as_ref()).args(args).output().ok()?;
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    String::from_utf8_lossy(&text)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}
