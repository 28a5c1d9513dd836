use crate::GlobalArgs;
use crate::output;
use crate::session::{self, Session};
use dokkuflow_resource::{Engine, GlobalState, Plan};

pub async fn handle(args: &GlobalArgs, refresh: bool) -> anyhow::Result<bool> {
    let session = Session::load(args)?;
    let engine = session.engine(session::cancel_on_ctrl_c())?;
    let (lock, mut state) = session.open_state().await?;

    let prepared = prepare(&session, &engine, &mut state, refresh).await;
    lock.release().await?;

    match prepared? {
        Some((plan, ok)) => {
            output::print_plan(&plan);
            Ok(ok)
        }
        None => Ok(false),
    }
}

/// Validate, optionally refresh, then diff against the state
///
/// Returns `None` when validation fails. The flag is false when the
/// refresh reported errors.
pub async fn prepare(
    session: &Session,
    engine: &Engine,
    state: &mut GlobalState,
    refresh: bool,
) -> anyhow::Result<Option<(Plan, bool)>> {
    if !output::print_diagnostics(&Engine::validate(&session.manifest.resources)) {
        return Ok(None);
    }

    let mut ok = true;
    if refresh && !state.is_empty() {
        let diags = engine.refresh(state).await;
        ok = output::print_diagnostics(&diags);
        session.save_state(state).await?;
    }

    let plan = engine.plan(&session.manifest.resources, state)?;
    Ok(Some((plan, ok)))
}
