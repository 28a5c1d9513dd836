//! Reconciliation engine
//!
//! Compares the declared resources with the tracked state, then drives
//! the controllers to close the gap. Successful results are committed to
//! [`GlobalState`]; failed operations leave the prior entry untouched.

use crate::any::{AnyResource, changed_attributes};
use crate::controller::Context;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{ResourceError, Result};
use crate::plan::{Action, ActionType, ApplyResult, Plan};
use crate::state::GlobalState;
use std::collections::HashSet;
use std::time::Instant;

pub struct Engine {
    ctx: Context,
}

impl Engine {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Local checks on the declared resources; no remote calls
    pub fn validate(desired: &[AnyResource]) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let mut seen = HashSet::new();
        for resource in desired {
            let key = resource.key();
            let mut own = Diagnostics::new();
            if !seen.insert(key.clone()) {
                own.push(Diagnostic::error(
                    DiagnosticKind::Validation,
                    "Resource is declared more than once",
                ));
            }
            resource.validate(&mut own);
            diags.extend(own.scoped(&key));
        }
        diags
    }

    /// Read every tracked resource, dropping the ones gone from the host
    pub async fn refresh(&self, state: &mut GlobalState) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let tracked: Vec<AnyResource> = state
            .resources
            .values()
            .map(|s| s.resource.clone())
            .collect();

        for resource in tracked {
            let key = resource.key();
            let (refreshed, own) = resource.read(&self.ctx).await;
            let failed = own.has_errors();
            let cancelled = own.is_cancelled();
            diags.extend(own.scoped(&key));

            match refreshed {
                Some(current) if current != resource => {
                    tracing::info!(resource = %key, "Drift detected, updating state");
                    state.set_resource(current);
                }
                Some(_) => {}
                None if !failed => {
                    state.remove_resource(&key);
                }
                None => {}
            }
            if cancelled {
                break;
            }
        }
        diags
    }

    /// Diff `desired` against `state`
    pub fn plan(&self, desired: &[AnyResource], state: &GlobalState) -> Result<Plan> {
        let mut seen = HashSet::new();
        for resource in desired {
            let key = resource.key();
            if !seen.insert(key.clone()) {
                return Err(ResourceError::DuplicateResource(key));
            }
        }

        let mut actions = deletions(state, |key| !seen.contains(key));
        for planned in desired {
            let key = planned.key();
            let action = match state.get_resource(&key) {
                None => Action::create(planned.clone()),
                Some(prior) if prior == planned => Action {
                    action_type: ActionType::NoOp,
                    key,
                    prior: Some(prior.clone()),
                    planned: Some(planned.clone()),
                    changes: Vec::new(),
                },
                Some(prior) => {
                    let replace = prior
                        .immutable_changes(planned)
                        .is_none_or(|changed| !changed.is_empty());
                    Action {
                        action_type: if replace {
                            ActionType::Replace
                        } else {
                            ActionType::Update
                        },
                        key,
                        prior: Some(prior.clone()),
                        planned: Some(planned.clone()),
                        changes: changed_attributes(prior, planned),
                    }
                }
            };
            actions.push(action);
        }

        Ok(Plan::new(actions))
    }

    /// Run every action of `plan`, committing results into `state`
    ///
    /// Failed actions are reported and the rest still run. A cancellation
    /// stops the apply; remaining actions are listed as skipped.
    pub async fn apply(&self, plan: &Plan, state: &mut GlobalState) -> (ApplyResult, Diagnostics) {
        let started = Instant::now();
        let mut result = ApplyResult::new();
        let mut diags = Diagnostics::new();

        let mut pending = plan.changes();
        while let Some(action) = pending.next() {
            if self.ctx.cancel_token().is_cancelled() {
                result.skipped.push(action.key.clone());
                result.skipped.extend(pending.by_ref().map(|a| a.key.clone()));
                break;
            }

            tracing::info!(resource = %action.key, action = %action.action_type, "Applying");
            let own = self.run(action, state).await;
            let cancelled = own.is_cancelled();
            match own.errors().next() {
                Some(first) => {
                    result.add_failure(action.key.clone(), first.to_string());
                }
                None => {
                    result.add_success(action.key.clone(), action.description());
                }
            }
            diags.extend(own.scoped(&action.key));

            if cancelled {
                result.skipped.extend(pending.by_ref().map(|a| a.key.clone()));
                break;
            }
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        (result, diags)
    }

    /// Delete every tracked resource
    pub async fn destroy(&self, state: &mut GlobalState) -> (ApplyResult, Diagnostics) {
        let plan = Plan::new(deletions(state, |_| true));
        self.apply(&plan, state).await
    }

    async fn run(&self, action: &Action, state: &mut GlobalState) -> Diagnostics {
        match (action.action_type, &action.prior, &action.planned) {
            (ActionType::Create, _, Some(planned)) => self.create(planned, state).await,
            (ActionType::Update, Some(prior), Some(planned)) => {
                let (updated, diags) = planned.update(prior, &self.ctx).await;
                if let Some(updated) = updated {
                    state.set_resource(updated);
                }
                diags
            }
            (ActionType::Replace, Some(prior), Some(planned)) => {
                let mut diags = self.delete(prior, state).await;
                if !diags.has_errors() {
                    diags.extend(self.create(planned, state).await);
                }
                diags
            }
            (ActionType::Delete, Some(prior), _) => self.delete(prior, state).await,
            _ => Diagnostics::new(),
        }
    }

    async fn create(&self, planned: &AnyResource, state: &mut GlobalState) -> Diagnostics {
        let (created, diags) = planned.create(&self.ctx).await;
        if let Some(created) = created {
            state.set_resource(created);
        }
        diags
    }

    async fn delete(&self, prior: &AnyResource, state: &mut GlobalState) -> Diagnostics {
        let diags = prior.delete(&self.ctx).await;
        if !diags.has_errors() {
            state.remove_resource(&prior.key());
        }
        diags
    }
}

/// Delete actions for tracked keys matching `select`, links first and apps last
fn deletions(state: &GlobalState, select: impl Fn(&str) -> bool) -> Vec<Action> {
    let mut doomed: Vec<&AnyResource> = state
        .resources
        .iter()
        .filter(|(key, _)| select(key))
        .map(|(_, s)| &s.resource)
        .collect();
    doomed.sort_by(|a, b| b.tier().cmp(&a.tier()).then_with(|| b.key().cmp(&a.key())));
    doomed
        .into_iter()
        .map(|resource| Action::delete(resource.clone()))
        .collect()
}
