use crate::adapter::Adapter;
use crate::cli::{Cli, Commands};
use crate::executor::{AuditLog, ExecutionResult, Executor};
use crate::package_manager::PackageManager;
use crate::packages::{LoadError, PackageTable};
use crate::resolver::{ResolvedPackage, Resolver};
use crate::settings::Settings;
use crate::{paths, platform, safety, ui};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

mod doctor;
mod info;
mod install;
mod list;
mod remove;
mod resolve;
mod search;
mod self_cmd;
mod update;

pub fn execute(cli: Cli) -> Result<()> {
    let session = || Session::new(&cli);

    match &cli.command {
        Commands::Install { packages, version } => {
            install::execute(&session()?, packages, version.as_deref())
        }
        Commands::Remove { packages } => remove::execute(&session()?, packages),
        Commands::Update => update::execute(&session()?),
        Commands::Search { query } => search::execute(&session()?, query),
        Commands::List => list::execute(&session()?),
        Commands::Info { package } => info::execute(&session()?, package),
        Commands::Resolve { package, version } => {
            resolve::execute(&session()?, package, version.as_deref())
        }
        Commands::Doctor => doctor::execute(cli.packages.as_deref()),
        Commands::Self_(action) => self_cmd::execute(action, cli.yes),
    }
}

/// Where the active package table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    File(PathBuf),
    Builtin,
}

impl std::fmt::Display for TableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSource::File(path) => write!(f, "{}", path.display()),
            TableSource::Builtin => write!(f, "built-in table"),
        }
    }
}

/// Everything a command needs, assembled once from flags, settings and the
/// host.
pub struct Session {
    pub table: PackageTable,
    pub package_manager: PackageManager,
    pub dry_run: bool,
    pub assume_yes: bool,
    executor: Executor,
}

impl Session {
    fn new(cli: &Cli) -> Result<Self> {
        let settings = Settings::load(&paths::settings_path()?)?;
        let (table, source) = load_table(cli.packages.as_deref())?;
        debug!(%source, packages = table.len(), "package table ready");

        let package_manager = match cli.pm.or(settings.package_manager) {
            Some(pm) => pm,
            None => {
                let os = platform::OsInfo::detect();
                platform::detect_default(&os)
                    .context("No supported package manager found; pass one with --pm")?
            }
        };
        debug!(%package_manager, "using package manager");

        let audit = match settings.history_path()? {
            Some(path) => AuditLog::new(path),
            None => AuditLog::new(paths::history_path()?),
        };

        Ok(Self {
            table,
            package_manager,
            dry_run: cli.dry_run,
            assume_yes: cli.yes || settings.assume_yes,
            executor: Executor::for_host(audit),
        })
    }

    pub fn adapter(&self) -> Result<Adapter> {
        match Adapter::create(self.package_manager) {
            Some(adapter) => Ok(adapter),
            None => bail!("Unsupported package manager: {}", self.package_manager),
        }
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.table)
    }

    /// Sanitize and validate every name, then resolve them. One bad name
    /// rejects the whole batch.
    pub fn resolve_all(
        &self,
        names: &[String],
        version: Option<&str>,
    ) -> Result<Vec<ResolvedPackage>> {
        let cleaned = names
            .iter()
            .map(|name| safety::check_package_name(name))
            .collect::<Result<Vec<_>, _>>()?;

        let resolver = self.resolver();
        let resolved: Vec<_> = cleaned
            .iter()
            .map(|name| resolver.resolve(name, self.package_manager, version))
            .collect();
        for package in &resolved {
            report_resolution(package);
        }
        Ok(resolved)
    }

    /// Preview or run `command`, asking first for modifying actions unless
    /// told not to.
    ///
    /// Returns `Ok(None)` when nothing was run (dry run or declined).
    pub fn run(&self, command: &str, action: Action) -> Result<Option<ExecutionResult>> {
        let requires_root = action.modifies() && self.package_manager.requires_root();

        if self.dry_run {
            ui::status("Would run", self.executor.preview(command, requires_root));
            return Ok(None);
        }

        if action.modifies() && !self.assume_yes {
            let shown = self.executor.preview(command, requires_root);
            if !ui::confirm(format!("{action}: run `{shown}`?"))? {
                ui::warn("Cancelled");
                return Ok(None);
            }
        }

        let result = if action.modifies() {
            let progress = ui::Progress::new(action.to_string(), command);
            let result = self.executor.execute(command, requires_root);
            if result.success {
                progress.success("Done");
            } else {
                progress.fail("Failed", format!("exit code {}", result.exit_code));
            }
            result
        } else {
            self.executor.execute(command, requires_root)
        };
        ui::passthrough(&result.stdout, false);
        ui::passthrough(&result.stderr, true);
        Ok(Some(result))
    }
}

/// What a command does to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Remove,
    Update,
    /// Read-only: never elevated, never confirmed.
    Query,
}

impl Action {
    pub fn modifies(self) -> bool {
        !matches!(self, Action::Query)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::Install => "Installing",
            Action::Remove => "Removing",
            Action::Update => "Updating",
            Action::Query => "Querying",
        };
        f.write_str(label)
    }
}

/// Turn a failed execution into an error carrying its exit code.
pub fn ensure_success(result: Option<ExecutionResult>) -> Result<()> {
    match result {
        Some(result) if !result.success => bail!(
            "Command `{}` failed with exit code {}",
            result.command,
            result.exit_code
        ),
        _ => Ok(()),
    }
}

/// Build a command that embeds user input and refuse it if it looks unsafe.
pub fn checked(command: String) -> Result<String> {
    safety::check_command(&command)?;
    Ok(command)
}

fn report_resolution(package: &ResolvedPackage) {
    if package.is_exact() {
        return;
    }
    if package.is_pass_through() {
        ui::warn(format!(
            "'{}' is not in the package table; using it as-is",
            package.original_name
        ));
        return;
    }
    ui::info(format!(
        "'{}' resolved to '{}' ({:.0}% match). Did you mean: {}?",
        package.original_name,
        package.resolved_name,
        package.confidence * 100.0,
        package.suggestions.join(", ")
    ));
}

/// Load the package table.
///
/// An explicit path must load. Otherwise the system table is tried, then the
/// built-in one, and the user's table is layered on top when present.
pub fn load_table(explicit: Option<&Path>) -> Result<(PackageTable, TableSource)> {
    let (base, source) = match explicit {
        Some(path) => (PackageTable::load(path)?, TableSource::File(path.to_path_buf())),
        None => {
            let system = paths::system_packages_path();
            match PackageTable::load(&system) {
                Ok(table) => (table, TableSource::File(system)),
                Err(err) => {
                    if matches!(err, LoadError::NotFound(_)) {
                        debug!("{err}; using built-in table");
                    } else {
                        ui::warn(format!(
                            "{:#}; using built-in table",
                            anyhow::Error::from(err)
                        ));
                    }
                    (
                        PackageTable::builtin().context("Built-in package table is invalid")?,
                        TableSource::Builtin,
                    )
                }
            }
        }
    };

    let user = paths::user_packages_path()?;
    let table = match base.overlay(&user) {
        Ok(table) => table,
        Err(LoadError::NotFound(_)) => base,
        Err(err) => {
            ui::warn(format!("Ignoring {:#}", anyhow::Error::from(err)));
            base
        }
    };
    Ok((table, source))
}
