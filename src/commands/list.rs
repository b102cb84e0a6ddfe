use super::{ensure_success, Action, Session};
use anyhow::Result;

pub fn execute(session: &Session) -> Result<()> {
    let command = session.adapter()?.list();
    ensure_success(session.run(&command, Action::Query)?)
}
