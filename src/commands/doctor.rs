use super::load_table;
use crate::platform::{self, OsInfo, OsType};
use crate::settings::Settings;
use crate::{paths, ui};
use anyhow::{bail, Result};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

pub fn execute(packages: Option<&Path>) -> Result<()> {
    let exe = env::current_exe().ok();
    let checks = [
        ("installation", check_installation(exe.as_deref())),
        ("PATH", check_path(exe.as_deref())),
        ("package managers", check_package_managers()),
        ("package database", check_database(packages)),
        ("configuration", check_configuration()?),
    ];

    let passed = checks.iter().filter(|(_, ok)| *ok).count();
    ui::status("Summary", format!("Checks passed: {}/{}", passed, checks.len()));

    let failed: Vec<&str> = checks
        .iter()
        .filter(|(_, ok)| !*ok)
        .map(|(name, _)| *name)
        .collect();
    if !failed.is_empty() {
        bail!("Doctor found problems with: {}", failed.join(", "));
    }
    ui::success("Healthy", "unipm is ready to use");
    Ok(())
}

fn check_installation(exe: Option<&Path>) -> bool {
    ui::status("Checking", "installation");
    ui::success("Version", env!("CARGO_PKG_VERSION"));
    match exe {
        Some(exe) => {
            ui::success("Binary", exe.display());
            true
        }
        None => {
            ui::error("Could not locate the unipm binary");
            false
        }
    }
}

fn check_path(exe: Option<&Path>) -> bool {
    ui::status("Checking", "PATH");
    let Some(path_var) = env::var_os("PATH") else {
        ui::error("PATH is not set");
        return false;
    };

    let candidates = install_dirs(exe.and_then(Path::parent));
    match find_on_path(&candidates, &path_var) {
        Some(dir) => {
            ui::success("PATH", format!("Found in {}", dir.display()));
            true
        }
        None => {
            ui::error("unipm's directory is not on PATH");
            ui::info("Add the directory containing unipm to your PATH");
            false
        }
    }
}

/// Directories unipm may be installed into, the running binary's first.
fn install_dirs(exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = exe_dir.map(Path::to_path_buf).into_iter().collect();
    if cfg!(windows) {
        dirs.push(PathBuf::from(r"C:\Program Files\unipm"));
        if let Some(local) = env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("unipm"));
        }
    } else {
        dirs.push(PathBuf::from("/usr/local/bin"));
        dirs.push(PathBuf::from("/usr/bin"));
        if let Some(home) = directories::BaseDirs::new() {
            dirs.push(home.home_dir().join(".local/bin"));
        }
    }
    dirs
}

/// First of `candidates` that appears as an entry of `path_var`. Entries are
/// compared after resolving symlinks where possible.
fn find_on_path(candidates: &[PathBuf], path_var: &OsStr) -> Option<PathBuf> {
    let entries: Vec<PathBuf> = env::split_paths(path_var)
        .filter(|entry| !entry.as_os_str().is_empty())
        .map(|entry| canonical(&entry))
        .collect();
    candidates
        .iter()
        .find(|candidate| entries.contains(&canonical(candidate)))
        .cloned()
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn check_package_managers() -> bool {
    ui::status("Checking", "package managers");
    let os = OsInfo::detect();
    ui::info(describe_os(&os));

    let available = platform::detect_all();
    for pm in &available {
        let version = pm.version.as_deref().unwrap_or("unknown version");
        ui::success(
            pm.manager.as_str(),
            format!("{} ({})", version, pm.path.display()),
        );
    }
    if available.is_empty() {
        ui::error("No supported package manager found");
        return false;
    }

    let managers: Vec<_> = available.iter().map(|pm| pm.manager).collect();
    if let Some(default) = platform::select_default(&os, &managers) {
        ui::info(format!("Default package manager: {default}"));
    }
    true
}

fn check_database(packages: Option<&Path>) -> bool {
    ui::status("Checking", "package database");
    match load_table(packages) {
        Ok((table, source)) => {
            ui::success("Packages", format!("{} packages from {source}", table.len()));
            true
        }
        Err(err) => {
            ui::error(format!("{err:#}"));
            false
        }
    }
}

fn check_configuration() -> Result<bool> {
    ui::status("Checking", "configuration");
    let overlay = paths::user_packages_path()?;
    ui::info(format!("User packages: {}", presence(&overlay)));
    let settings_path = paths::settings_path()?;
    ui::info(format!("Settings: {}", presence(&settings_path)));

    let (history, ok) = match Settings::load(&settings_path) {
        Ok(settings) => match settings.history_path()? {
            Some(path) => (path, true),
            None => (paths::history_path()?, true),
        },
        Err(err) => {
            ui::error(format!("{err:#}"));
            (paths::history_path()?, false)
        }
    };
    ui::info(format!("History log: {}", history.display()));
    Ok(ok)
}

fn describe_os(os: &OsInfo) -> String {
    let mut line = match os.os {
        OsType::Linux => format!("Operating system: {} ({})", os.os, os.distro),
        _ => format!("Operating system: {}", os.os),
    };
    if let Some(version) = &os.version {
        line.push(' ');
        line.push_str(version);
    }
    if let Some(codename) = &os.codename {
        line.push(' ');
        line.push_str(codename);
    }
    line
}

fn presence(path: &Path) -> String {
    if path.exists() {
        format!("{} (found)", path.display())
    } else {
        format!("{} (not present)", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::LinuxDistro;
    use tempfile::TempDir;

    #[test]
    fn os_line_includes_distro_and_version() {
        let os = OsInfo {
            os: OsType::Linux,
            distro: LinuxDistro::Debian,
            version: Some("12".to_string()),
            codename: Some("bookworm".to_string()),
        };
        assert_eq!(
            describe_os(&os),
            "Operating system: Linux (Debian) 12 bookworm"
        );

        let mac = OsInfo {
            os: OsType::MacOs,
            distro: LinuxDistro::Unknown,
            version: Some("14.5".to_string()),
            codename: None,
        };
        assert_eq!(describe_os(&mac), "Operating system: macOS 14.5");
    }

    #[test]
    fn finds_install_dir_among_path_entries() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        let other = temp.path().join("other");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(&other).unwrap();

        let path_var = env::join_paths([&other, &bin]).unwrap();
        assert_eq!(find_on_path(&[bin.clone()], &path_var), Some(bin.clone()));
        assert_eq!(
            find_on_path(&[temp.path().join("missing"), bin.clone()], &path_var),
            Some(bin.clone())
        );

        let path_var = env::join_paths([&other]).unwrap();
        assert_eq!(find_on_path(&[bin], &path_var), None);
    }

    #[test]
    fn empty_path_entries_never_match() {
        let path_var = env::join_paths(["", "/nonexistent/unipm-bin"]).unwrap();
        assert_eq!(find_on_path(&[PathBuf::new()], &path_var), None);
    }

    #[cfg(unix)]
    #[test]
    fn path_entries_match_through_symlinks() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        let link = temp.path().join("link");
        fs::create_dir_all(&real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let path_var = env::join_paths([&link]).unwrap();
        assert_eq!(find_on_path(&[real.clone()], &path_var), Some(real));
    }

    #[test]
    fn running_binary_directory_comes_first() {
        let dirs = install_dirs(Some(Path::new("/opt/unipm/bin")));
        assert_eq!(dirs[0], PathBuf::from("/opt/unipm/bin"));
        assert!(dirs.len() > 1);
    }
}
