use super::{checked, ensure_success, Action, Session};
use crate::resolver::MAX_SUGGESTIONS;
use crate::{safety, ui};
use anyhow::{bail, Result};

pub fn execute(session: &Session, query: &str) -> Result<()> {
    let query = safety::sanitize(query);
    let query = query.trim();
    if query.is_empty() {
        bail!("Search query is empty");
    }

    let known = session.resolver().suggestions(query, MAX_SUGGESTIONS);
    if !known.is_empty() {
        ui::info(format!("Known packages: {}", known.join(", ")));
    }

    let command = checked(session.adapter()?.search(query))?;
    ensure_success(session.run(&command, Action::Query)?)
}
