use super::{checked, ensure_success, Action, Session};
use crate::ui;
use anyhow::Result;

pub fn execute(session: &Session, packages: &[String]) -> Result<()> {
    let resolved = session.resolve_all(packages, None)?;
    let adapter = session.adapter()?;

    let names: Vec<&str> = resolved
        .iter()
        .map(|package| package.resolved_name.as_str())
        .collect();
    let command = checked(adapter.remove(&names))?;

    let result = session.run(&command, Action::Remove)?;
    if result.as_ref().is_some_and(|result| result.success) {
        ui::success("Removed", names.join(", "));
    }
    ensure_success(result)
}
