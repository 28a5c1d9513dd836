use crate::GlobalArgs;
use crate::output;
use crate::session::{self, Session};
use colored::Colorize;

pub async fn handle(args: &GlobalArgs, auto_approve: bool) -> anyhow::Result<bool> {
    let session = Session::load(args)?;
    let engine = session.engine(session::cancel_on_ctrl_c())?;
    let (lock, mut state) = session.open_state().await?;

    if state.is_empty() {
        println!("{}", "Nothing to destroy.".green());
        lock.release().await?;
        return Ok(true);
    }

    println!("{}", "Tracked resources to delete:".bold());
    for key in state.resources.keys() {
        println!("  {} {}", "-".red(), key);
    }
    println!();
    if !auto_approve && !output::confirm("Destroy every tracked resource?")? {
        println!("{}", "Destroy cancelled.".yellow());
        lock.release().await?;
        return Ok(true);
    }

    let (result, diags) = engine.destroy(&mut state).await;
    session.save_state(&state).await?;
    lock.release().await?;

    output::print_apply_result(&result);
    let clean = output::print_diagnostics(&diags);
    Ok(clean && result.is_success())
}
