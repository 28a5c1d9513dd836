use crate::GlobalArgs;
use crate::output;
use crate::session::{self, Session};
use colored::Colorize;

pub async fn handle(args: &GlobalArgs) -> anyhow::Result<bool> {
    let session = Session::load(args)?;
    let engine = session.engine(session::cancel_on_ctrl_c())?;
    let (lock, mut state) = session.open_state().await?;

    let before = state.len();
    let diags = engine.refresh(&mut state).await;
    session.save_state(&state).await?;
    lock.release().await?;

    let ok = output::print_diagnostics(&diags);
    println!(
        "{} {} tracked resources ({} dropped)",
        "Refreshed".green(),
        state.len(),
        before.saturating_sub(state.len())
    );
    Ok(ok)
}
