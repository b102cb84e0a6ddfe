use crate::package_manager::PackageManager;
use crate::paths::PACKAGES_ENV;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Universal package manager front end
///
/// unipm takes the package names you know ("docker", "vscode", "python")
/// and translates them into the right package for the native package
/// manager on this machine: apt, pacman, dnf, brew, winget or choco.
/// Typos are matched against the package table and suggestions are shown
/// when a name is not recognised.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Package manager to use instead of the detected default
    #[arg(long, global = true, env = "UNIPM_PM", value_name = "PM")]
    pub pm: Option<PackageManager>,

    /// Package table to load instead of the system one
    #[arg(id = "packages_file", long = "packages", global = true, env = PACKAGES_ENV, value_name = "FILE")]
    pub packages: Option<PathBuf>,

    /// Show the command that would run without running it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install one or more packages
    Install {
        /// Package names, e.g. docker or vscode
        #[arg(value_name = "PACKAGE", required = true)]
        packages: Vec<String>,

        /// Version key from the package table (e.g. lts, 3.12)
        #[arg(long, value_name = "VERSION")]
        version: Option<String>,
    },

    /// Remove one or more packages
    #[command(visible_alias = "uninstall")]
    Remove {
        #[arg(value_name = "PACKAGE", required = true)]
        packages: Vec<String>,
    },

    /// Refresh package lists and upgrade everything
    #[command(visible_alias = "upgrade")]
    Update,

    /// Search the package manager's repositories
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// List installed packages
    List,

    /// Show details for a package
    Info {
        #[arg(value_name = "PACKAGE")]
        package: String,
    },

    /// Show how a name resolves without touching the system
    Resolve {
        #[arg(value_name = "PACKAGE")]
        package: String,

        #[arg(long, value_name = "VERSION")]
        version: Option<String>,
    },

    /// Check the installation, package managers and configuration
    Doctor,

    /// Manage unipm itself
    #[command(subcommand, name = "self")]
    Self_(SelfAction),
}

#[derive(Subcommand, Debug)]
pub enum SelfAction {
    /// Remove unipm, its configuration, its history and its PATH entries
    #[command(name = "uninstall")]
    Uninstall {
        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },
}
