use super::{checked, ensure_success, Action, Session};
use anyhow::Result;

pub fn execute(session: &Session, package: &str) -> Result<()> {
    let resolved = session.resolve_all(&[package.to_string()], None)?;
    let adapter = session.adapter()?;

    let name = resolved
        .first()
        .map(|package| package.resolved_name.as_str())
        .unwrap_or(package);
    let command = checked(adapter.info(name))?;
    ensure_success(session.run(&command, Action::Query)?)
}
