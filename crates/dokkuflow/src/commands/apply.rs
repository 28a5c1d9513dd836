use crate::GlobalArgs;
use crate::commands::plan::prepare;
use crate::output;
use crate::session::{self, Session};
use colored::Colorize;

pub async fn handle(args: &GlobalArgs, auto_approve: bool, refresh: bool) -> anyhow::Result<bool> {
    let session = Session::load(args)?;
    let engine = session.engine(session::cancel_on_ctrl_c())?;
    let (lock, mut state) = session.open_state().await?;

    let Some((plan, refreshed)) = prepare(&session, &engine, &mut state, refresh).await? else {
        lock.release().await?;
        return Ok(false);
    };
    output::print_plan(&plan);
    if !plan.has_changes {
        lock.release().await?;
        return Ok(refreshed);
    }

    println!();
    if !auto_approve && !output::confirm("Apply these changes?")? {
        println!("{}", "Apply cancelled.".yellow());
        lock.release().await?;
        return Ok(true);
    }

    println!();
    println!("{}", "Applying...".blue());
    let (result, diags) = engine.apply(&plan, &mut state).await;
    session.save_state(&state).await?;
    lock.release().await?;

    output::print_apply_result(&result);
    let clean = output::print_diagnostics(&diags);
    Ok(refreshed && clean && result.is_success())
}
