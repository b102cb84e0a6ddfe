use super::Session;
use crate::{safety, ui};
use anyhow::Result;

pub fn execute(session: &Session, package: &str, version: Option<&str>) -> Result<()> {
    let name = safety::check_package_name(package)?;
    let resolved = session
        .resolver()
        .resolve(&name, session.package_manager, version);

    ui::status("Package", &resolved.original_name);
    if let Some(version) = &resolved.version {
        ui::status("Version", version);
    }
    ui::success(
        "Resolved",
        format!("{} ({})", resolved.resolved_name, resolved.package_manager),
    );
    ui::status(
        "Confidence",
        format!("{:.0}%", resolved.confidence * 100.0),
    );

    if resolved.is_pass_through() {
        ui::warn(format!("'{name}' is not in the package table"));
    } else if !resolved.is_exact() {
        ui::info(format!("Did you mean: {}", resolved.suggestions.join(", ")));
    }

    if let Some(entry) = session.table.package_info(&name) {
        if !entry.aliases.is_empty() {
            ui::status("Aliases", entry.aliases.join(", "));
        }
        let mappings: Vec<String> = entry
            .mappings
            .iter()
            .map(|(pm, native)| format!("{pm}: {native}"))
            .collect();
        ui::status("Mappings", mappings.join("\n"));
        if !entry.versions.is_empty() {
            let versions: Vec<&str> = entry.versions.keys().map(String::as_str).collect();
            ui::status("Versions", versions.join(", "));
        }
    }
    Ok(())
}
