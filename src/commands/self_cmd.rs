use crate::cli::SelfAction;
use crate::{paths, ui};
use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Shell startup files that may carry a PATH entry for unipm.
const SHELL_CONFIGS: [&str; 4] = [".bashrc", ".zshrc", ".profile", ".config/fish/config.fish"];

pub fn execute(action: &SelfAction, assume_yes: bool) -> Result<()> {
    match action {
        SelfAction::Uninstall { force } => {
            let binary = env::current_exe().context("Failed to locate the unipm binary")?;
            Uninstall::for_host(binary)?.run(*force || assume_yes)
        }
    }
}

/// Everything `unipm self uninstall` removes.
#[derive(Debug)]
struct Uninstall {
    binary: PathBuf,
    config_dir: PathBuf,
    state_dir: PathBuf,
    shell_configs: Vec<PathBuf>,
}

impl Uninstall {
    fn for_host(binary: PathBuf) -> Result<Self> {
        let home = directories::BaseDirs::new()
            .context("Failed to get home directory")?
            .home_dir()
            .to_path_buf();

        Ok(Self {
            binary,
            config_dir: paths::config_dir()?,
            state_dir: paths::state_dir()?,
            shell_configs: SHELL_CONFIGS.iter().map(|file| home.join(file)).collect(),
        })
    }

    fn run(&self, force: bool) -> Result<()> {
        ui::status("Uninstall", "the following will be removed:");
        ui::status("", format!("binary: {}", self.binary.display()));
        ui::status("", format!("configuration: {}", self.config_dir.display()));
        ui::status("", format!("history: {}", self.state_dir.display()));
        ui::status("", "unipm PATH entries in shell startup files");

        if !force && !ui::confirm("Uninstall unipm?")? {
            ui::warn("Cancelled");
            return Ok(());
        }

        let failed = self.remove_all();
        if failed > 0 {
            bail!("Uninstall incomplete: {failed} step(s) failed");
        }
        ui::success("Uninstalled", "unipm has been removed");
        Ok(())
    }

    /// Run every step even if an earlier one fails. Returns the failure count.
    fn remove_all(&self) -> usize {
        let mut failed = 0;

        let steps = [
            ("binary", remove_path(&self.binary, |path| fs::remove_file(path))),
            ("configuration", remove_path(&self.config_dir, |path| fs::remove_dir_all(path))),
            ("history", remove_path(&self.state_dir, |path| fs::remove_dir_all(path))),
        ];
        let paths = [&self.binary, &self.config_dir, &self.state_dir];
        for ((what, outcome), path) in steps.into_iter().zip(paths) {
            match outcome {
                Ok(true) => ui::success("Removed", format!("{what} {}", path.display())),
                Ok(false) => ui::info(format!("No {what} at {}", path.display())),
                Err(err) => {
                    ui::warn(format!("Could not remove {}: {err}", path.display()));
                    failed += 1;
                }
            }
        }

        for config in &self.shell_configs {
            match clean_shell_config(config) {
                Ok(true) => ui::success("Cleaned", config.display()),
                Ok(false) => {}
                Err(err) => {
                    ui::warn(format!("Could not update {}: {err}", config.display()));
                    failed += 1;
                }
            }
        }

        failed
    }
}

/// Remove `path` with `remove`. `Ok(false)` when there was nothing to remove.
fn remove_path(path: &Path, remove: fn(&Path) -> io::Result<()>) -> io::Result<bool> {
    match remove(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Drop unipm PATH lines from a shell startup file. `Ok(true)` if it changed.
fn clean_shell_config(path: &Path) -> io::Result<bool> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    match strip_path_entries(&contents) {
        Some(cleaned) => {
            fs::write(path, cleaned)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// `contents` without lines that put unipm on PATH, or `None` if there are
/// none.
fn strip_path_entries(contents: &str) -> Option<String> {
    let mut removed = false;
    let mut cleaned = String::with_capacity(contents.len());
    for line in contents.split_inclusive('\n') {
        if is_unipm_path_line(line) {
            removed = true;
        } else {
            cleaned.push_str(line);
        }
    }
    removed.then_some(cleaned)
}

fn is_unipm_path_line(line: &str) -> bool {
    line.contains("unipm") && (line.contains("PATH") || line.contains("fish_add_path"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox(temp: &TempDir) -> Uninstall {
        let root = temp.path();
        let binary = root.join("bin/unipm");
        fs::create_dir_all(binary.parent().unwrap()).unwrap();
        fs::write(&binary, "binary").unwrap();

        let config_dir = root.join("config/unipm");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), "assume_yes = true\n").unwrap();

        let state_dir = root.join("state/unipm");
        fs::create_dir_all(&state_dir).unwrap();
        fs::write(state_dir.join("history.log"), "[x] ATTEMPT: apt list\n").unwrap();

        Uninstall {
            binary,
            config_dir,
            state_dir,
            shell_configs: vec![root.join(".bashrc"), root.join(".zshrc")],
        }
    }

    #[test]
    fn strips_only_unipm_path_lines() {
        let rc = "alias ll='ls -l'\nexport PATH=\"$HOME/.unipm/bin:$PATH\"\nexport EDITOR=vim\n";
        assert_eq!(
            strip_path_entries(rc).as_deref(),
            Some("alias ll='ls -l'\nexport EDITOR=vim\n")
        );

        assert_eq!(
            strip_path_entries("fish_add_path ~/.unipm/bin").as_deref(),
            Some("")
        );
        assert_eq!(strip_path_entries("export PATH=$HOME/bin:$PATH\n"), None);
        assert_eq!(strip_path_entries("alias u=unipm\n"), None);
    }

    #[test]
    fn forced_uninstall_removes_everything() {
        let temp = TempDir::new().unwrap();
        let plan = sandbox(&temp);
        fs::write(
            &plan.shell_configs[0],
            "export PATH=/opt/unipm/bin:$PATH\nset -o vi\n",
        )
        .unwrap();

        plan.run(true).unwrap();

        assert!(!plan.binary.exists());
        assert!(!plan.config_dir.exists());
        assert!(!plan.state_dir.exists());
        assert_eq!(
            fs::read_to_string(&plan.shell_configs[0]).unwrap(),
            "set -o vi\n"
        );
        // Missing startup files are left alone.
        assert!(!plan.shell_configs[1].exists());
    }

    #[test]
    fn already_removed_items_are_not_failures() {
        let temp = TempDir::new().unwrap();
        let plan = sandbox(&temp);
        fs::remove_file(&plan.binary).unwrap();
        fs::remove_dir_all(&plan.state_dir).unwrap();

        assert_eq!(plan.remove_all(), 0);
        assert!(!plan.config_dir.exists());
    }

    #[test]
    fn failed_steps_are_counted_and_others_still_run() {
        let temp = TempDir::new().unwrap();
        let mut plan = sandbox(&temp);
        // A directory where a file is expected cannot be removed with remove_file.
        plan.binary = temp.path().join("bin");

        assert_eq!(plan.remove_all(), 1);
        assert!(plan.binary.exists());
        assert!(!plan.config_dir.exists());
        assert!(!plan.state_dir.exists());
    }
}
