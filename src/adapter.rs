use crate::package_manager::PackageManager;

/// Command-line builders for the package managers unipm can drive.
///
/// Builders are pure string templates: they do not validate or escape their
/// input. Callers sanitize names before building and validate the result
/// before executing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapter {
    Apt,
    Pacman,
    Brew,
    Dnf,
    Winget,
    Choco,
}

impl Adapter {
    /// Adapter for `pm`, or `None` when unipm cannot build commands for it.
    pub fn create(pm: PackageManager) -> Option<Self> {
        match pm {
            PackageManager::Apt => Some(Adapter::Apt),
            PackageManager::Pacman => Some(Adapter::Pacman),
            PackageManager::Brew => Some(Adapter::Brew),
            PackageManager::Dnf => Some(Adapter::Dnf),
            PackageManager::Winget => Some(Adapter::Winget),
            PackageManager::Choco => Some(Adapter::Choco),
            PackageManager::Yum | PackageManager::Snap | PackageManager::Flatpak => None,
        }
    }

    pub fn package_manager(self) -> PackageManager {
        match self {
            Adapter::Apt => PackageManager::Apt,
            Adapter::Pacman => PackageManager::Pacman,
            Adapter::Brew => PackageManager::Brew,
            Adapter::Dnf => PackageManager::Dnf,
            Adapter::Winget => PackageManager::Winget,
            Adapter::Choco => PackageManager::Choco,
        }
    }

    pub fn install<S: AsRef<str>>(self, packages: &[S]) -> String {
        match self {
            Adapter::Apt => with_packages("apt install -y", packages),
            Adapter::Pacman => with_packages("pacman -S --noconfirm", packages),
            Adapter::Brew => with_packages("brew install", packages),
            Adapter::Dnf => with_packages("dnf install -y", packages),
            Adapter::Winget => per_package(
                "winget install",
                packages,
                "--silent --accept-package-agreements --accept-source-agreements",
            ),
            Adapter::Choco => with_packages("choco install -y", packages),
        }
    }

    pub fn remove<S: AsRef<str>>(self, packages: &[S]) -> String {
        match self {
            Adapter::Apt => with_packages("apt remove -y", packages),
            Adapter::Pacman => with_packages("pacman -R --noconfirm", packages),
            Adapter::Brew => with_packages("brew uninstall", packages),
            Adapter::Dnf => with_packages("dnf remove -y", packages),
            Adapter::Winget => per_package("winget uninstall", packages, "--silent"),
            Adapter::Choco => with_packages("choco uninstall -y", packages),
        }
    }

    pub fn update(self) -> String {
        match self {
            Adapter::Apt => "apt update && apt upgrade -y",
            Adapter::Pacman => "pacman -Syu --noconfirm",
            Adapter::Brew => "brew update && brew upgrade",
            Adapter::Dnf => "dnf upgrade -y",
            Adapter::Winget => {
                "winget upgrade --all --silent --accept-package-agreements --accept-source-agreements"
            }
            Adapter::Choco => "choco upgrade all -y",
        }
        .to_string()
    }

    pub fn search(self, query: &str) -> String {
        let prefix = match self {
            Adapter::Apt => "apt search",
            Adapter::Pacman => "pacman -Ss",
            Adapter::Brew => "brew search",
            Adapter::Dnf => "dnf search",
            Adapter::Winget => "winget search",
            Adapter::Choco => "choco search",
        };
        format!("{prefix} {query}")
    }

    pub fn list(self) -> String {
        match self {
            Adapter::Apt => "apt list --installed",
            Adapter::Pacman => "pacman -Q",
            Adapter::Brew => "brew list",
            Adapter::Dnf => "dnf list installed",
            Adapter::Winget => "winget list",
            Adapter::Choco => "choco list --local-only",
        }
        .to_string()
    }

    pub fn info(self, package: &str) -> String {
        let prefix = match self {
            Adapter::Apt => "apt show",
            Adapter::Pacman => "pacman -Si",
            Adapter::Brew => "brew info",
            Adapter::Dnf => "dnf info",
            Adapter::Winget => "winget show --id",
            Adapter::Choco => "choco info",
        };
        format!("{prefix} {package}")
    }
}

fn with_packages<S: AsRef<str>>(prefix: &str, packages: &[S]) -> String {
    let mut command = prefix.to_string();
    for package in packages {
        command.push(' ');
        command.push_str(package.as_ref());
    }
    command
}

// winget takes one `--id` per package, each followed by its own flags.
fn per_package<S: AsRef<str>>(prefix: &str, packages: &[S], flags: &str) -> String {
    let mut command = prefix.to_string();
    for package in packages {
        command.push_str(" --id ");
        command.push_str(package.as_ref());
        command.push(' ');
        command.push_str(flags);
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Adapter::Apt, "apt install -y git curl", "apt remove -y git curl")]
    #[case(
        Adapter::Pacman,
        "pacman -S --noconfirm git curl",
        "pacman -R --noconfirm git curl"
    )]
    #[case(Adapter::Brew, "brew install git curl", "brew uninstall git curl")]
    #[case(Adapter::Dnf, "dnf install -y git curl", "dnf remove -y git curl")]
    #[case(
        Adapter::Choco,
        "choco install -y git curl",
        "choco uninstall -y git curl"
    )]
    fn install_and_remove_templates(
        #[case] adapter: Adapter,
        #[case] install: &str,
        #[case] remove: &str,
    ) {
        let packages = ["git", "curl"];
        assert_eq!(adapter.install(&packages), install);
        assert_eq!(adapter.remove(&packages), remove);
    }

    #[test]
    fn winget_repeats_id_per_package() {
        assert_eq!(
            Adapter::Winget.install(&["Git.Git"]),
            "winget install --id Git.Git --silent --accept-package-agreements --accept-source-agreements"
        );
        assert_eq!(
            Adapter::Winget.install(&["Git.Git", "Mozilla.Firefox"]),
            "winget install --id Git.Git --silent --accept-package-agreements --accept-source-agreements \
             --id Mozilla.Firefox --silent --accept-package-agreements --accept-source-agreements"
        );
        assert_eq!(
            Adapter::Winget.remove(&["Git.Git"]),
            "winget uninstall --id Git.Git --silent"
        );
    }

    #[rstest]
    #[case(Adapter::Apt, "apt update && apt upgrade -y", "apt list --installed")]
    #[case(Adapter::Pacman, "pacman -Syu --noconfirm", "pacman -Q")]
    #[case(Adapter::Brew, "brew update && brew upgrade", "brew list")]
    #[case(Adapter::Dnf, "dnf upgrade -y", "dnf list installed")]
    #[case(
        Adapter::Winget,
        "winget upgrade --all --silent --accept-package-agreements --accept-source-agreements",
        "winget list"
    )]
    #[case(Adapter::Choco, "choco upgrade all -y", "choco list --local-only")]
    fn fixed_templates(#[case] adapter: Adapter, #[case] update: &str, #[case] list: &str) {
        assert_eq!(adapter.update(), update);
        assert_eq!(adapter.list(), list);
    }

    #[rstest]
    #[case(Adapter::Apt, "apt search vim", "apt show vim")]
    #[case(Adapter::Pacman, "pacman -Ss vim", "pacman -Si vim")]
    #[case(Adapter::Brew, "brew search vim", "brew info vim")]
    #[case(Adapter::Dnf, "dnf search vim", "dnf info vim")]
    #[case(Adapter::Winget, "winget search vim", "winget show --id vim")]
    #[case(Adapter::Choco, "choco search vim", "choco info vim")]
    fn query_templates(#[case] adapter: Adapter, #[case] search: &str, #[case] info: &str) {
        assert_eq!(adapter.search("vim"), search);
        assert_eq!(adapter.info("vim"), info);
    }

    #[test]
    fn factory_covers_supported_managers_only() {
        for pm in PackageManager::ALL {
            match Adapter::create(pm) {
                Some(adapter) => assert_eq!(adapter.package_manager(), pm),
                None => assert!(matches!(
                    pm,
                    PackageManager::Yum | PackageManager::Snap | PackageManager::Flatpak
                )),
            }
        }
    }
}
