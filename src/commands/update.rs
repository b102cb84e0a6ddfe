use super::{ensure_success, Action, Session};
use crate::ui;
use anyhow::Result;

pub fn execute(session: &Session) -> Result<()> {
    // Fixed template; may chain with `&&`, so it is not command-validated.
    let command = session.adapter()?.update();

    let result = session.run(&command, Action::Update)?;
    if result.as_ref().is_some_and(|result| result.success) {
        ui::success("Updated", format!("{} packages", session.package_manager));
    }
    ensure_success(result)
}
