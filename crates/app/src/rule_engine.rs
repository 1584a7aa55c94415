//! Rule engine: edge-triggered evaluation and ordered execution of rules.
//!
//! Each pass takes one snapshot, evaluates every enabled rule's trigger and
//! fires the rules whose trigger went from false to true since the previous
//! pass (a rule that is true the first time it is seen fires too). Fired
//! rules run concurrently; within a rule, actions run strictly in order and
//! each one is awaited before the next starts.
//!
//! Per rule: `Idle → Evaluating → NotSatisfied → Idle` or
//! `Idle → Evaluating → Satisfied → Executing → Done | Failed → Idle`.
//!
//! No timeout is applied while waiting for an action's outcome. An
//! actuation queue that never answers blocks the rest of that rule's action
//! list, and the rule's lock, indefinitely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;

use looprule_domain::automation::{Action, Rule};
use looprule_domain::command::Outcome;
use looprule_domain::error::LoopRuleError;
use looprule_domain::event::{Event, EventType};
use looprule_domain::id::RuleId;

use crate::callback;
use crate::executor::{ActionExecutor, preflight};
use crate::ports::{ActuationQueue, EventPublisher, Notifier, RuleRepository, RuntimeState};

/// Where a rule currently is in its evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulePhase {
    Idle,
    Evaluating,
    NotSatisfied,
    Satisfied,
    Executing,
    Done,
    Failed,
}

/// What happened to one action of a fired rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReport {
    /// The action ran and reported an outcome.
    Executed {
        index: usize,
        kind: &'static str,
        outcome: Outcome,
    },
    /// The action was not run.
    Skipped {
        index: usize,
        kind: &'static str,
        reason: String,
    },
}

impl ActionReport {
    /// `true` when the action ran and succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Executed { outcome, .. } if outcome.success)
    }
}

/// Result of firing one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRun {
    pub rule_id: RuleId,
    pub rule_name: String,
    /// [`RulePhase::Done`] or [`RulePhase::Failed`].
    pub phase: RulePhase,
    pub reports: Vec<ActionReport>,
}

/// Drives rules against the runtime state and the actuation queue.
pub struct RuleEngine<R, Q, S, N, P> {
    repo: R,
    executor: ActionExecutor<Q, S, N>,
    publisher: P,
    last_seen: Mutex<HashMap<RuleId, bool>>,
    phases: Mutex<HashMap<RuleId, RulePhase>>,
    locks: Mutex<HashMap<RuleId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<R, Q, S, N, P> RuleEngine<R, Q, S, N, P>
where
    R: RuleRepository + Send + Sync,
    Q: ActuationQueue + Send + Sync,
    S: RuntimeState + Send + Sync,
    N: Notifier + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    /// Create a new engine.
    pub fn new(repo: R, executor: ActionExecutor<Q, S, N>, publisher: P) -> Self {
        Self {
            repo,
            executor,
            publisher,
            last_seen: Mutex::new(HashMap::new()),
            phases: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Current phase of a rule. Rules never seen are [`RulePhase::Idle`].
    pub fn phase(&self, id: RuleId) -> RulePhase {
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(RulePhase::Idle)
    }

    /// Run one evaluation pass and execute every rule that fired.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules or the runtime snapshot cannot be
    /// loaded. Failures inside a fired rule are reported in its [`RuleRun`].
    pub async fn run_pass(&self) -> Result<Vec<RuleRun>, LoopRuleError> {
        let rules = self.repo.get_enabled().await?;
        let snapshot = self.executor.snapshot().await?;
        let fired = self.fired_rules(&rules, |rule| rule.trigger.evaluate(&snapshot));
        if !fired.is_empty() {
            tracing::debug!(count = fired.len(), "rules fired");
        }
        let runs = fired.into_iter().map(|rule| self.execute_rule(rule));
        Ok(futures::future::join_all(runs).await)
    }

    /// Update edge state and return the rules whose trigger just became true.
    fn fired_rules<'a>(
        &self,
        rules: &'a [Rule],
        evaluate: impl Fn(&Rule) -> bool,
    ) -> Vec<&'a Rule> {
        let mut last_seen = self
            .last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last_seen.retain(|id, _| rules.iter().any(|rule| rule.id == *id));
        self.forget_missing(rules);

        let mut fired = Vec::new();
        for rule in rules {
            self.set_phase(rule.id, RulePhase::Evaluating);
            if !rule.trigger.is_valid() {
                tracing::warn!(rule = %rule.name, "skipping rule with invalid trigger");
                last_seen.insert(rule.id, false);
                self.set_phase(rule.id, RulePhase::Idle);
                continue;
            }
            let now = evaluate(rule);
            let before = last_seen.insert(rule.id, now).unwrap_or(false);
            if now && !before {
                self.set_phase(rule.id, RulePhase::Satisfied);
                fired.push(rule);
            } else {
                if !now {
                    self.set_phase(rule.id, RulePhase::NotSatisfied);
                }
                self.set_phase(rule.id, RulePhase::Idle);
            }
        }
        fired
    }

    /// Execute one rule's actions in order. Runs of the same rule never
    /// overlap.
    pub async fn execute_rule(&self, rule: &Rule) -> RuleRun {
        let lock = self.lock_for(rule.id);
        let _guard = lock.lock().await;
        self.set_phase(rule.id, RulePhase::Executing);
        tracing::info!(rule = %rule.name, trigger = %rule.trigger, "rule fired");

        self.emit(
            EventType::RuleFired,
            rule,
            json!({ "rule_name": rule.name, "trigger": rule.trigger.to_string() }),
        )
        .await;
        if let Err(err) = self
            .repo
            .record_fired(rule.id, looprule_domain::time::now())
            .await
        {
            tracing::warn!(rule = %rule.name, error = %err, "failed to record last fired time");
        }

        let mut reports = Vec::with_capacity(rule.actions.len());
        for (index, action) in rule.actions.iter().enumerate() {
            let report = self.execute_action(rule, index, action).await;
            reports.push(report);
        }

        let phase = if reports.iter().all(ActionReport::succeeded) {
            RulePhase::Done
        } else {
            RulePhase::Failed
        };
        tracing::info!(rule = %rule.name, ?phase, "rule finished");
        self.set_phase(rule.id, RulePhase::Idle);
        RuleRun {
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            phase,
            reports,
        }
    }

    async fn execute_action(&self, rule: &Rule, index: usize, action: &Action) -> ActionReport {
        let kind = action.kind();
        let description = action.short_description();

        let checked = match self.executor.snapshot().await {
            Ok(snapshot) => preflight(action, &snapshot)
                .map(|()| snapshot)
                .map_err(|refusal| refusal.to_string()),
            Err(err) => Err(format!("runtime state unavailable: {err}")),
        };
        let snapshot = match checked {
            Ok(snapshot) => snapshot,
            Err(reason) => {
                tracing::warn!(rule = %rule.name, action = %description, %reason, "action skipped");
                self.emit(
                    EventType::ActionSkipped,
                    rule,
                    json!({ "index": index, "kind": kind, "action": description, "reason": reason }),
                )
                .await;
                return ActionReport::Skipped {
                    index,
                    kind,
                    reason,
                };
            }
        };

        let (callback, completion) = callback::channel();
        self.executor.dispatch(action, &snapshot, callback).await;
        let outcome = completion.wait().await;

        let event_type = if outcome.success {
            tracing::info!(rule = %rule.name, action = %description, comment = %outcome.comment, "action succeeded");
            EventType::ActionSucceeded
        } else {
            tracing::warn!(rule = %rule.name, action = %description, comment = %outcome.comment, "action failed");
            EventType::ActionFailed
        };
        self.emit(
            event_type,
            rule,
            json!({ "index": index, "kind": kind, "action": description, "comment": outcome.comment }),
        )
        .await;
        ActionReport::Executed {
            index,
            kind,
            outcome,
        }
    }

    async fn emit(&self, event_type: EventType, rule: &Rule, data: serde_json::Value) {
        let event = Event::new(event_type, Some(rule.id), data);
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(error = %err, %event_type, "failed to publish event");
        }
    }

    fn lock_for(&self, id: RuleId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    /// Drop phases of rules no longer loaded, and locks nobody holds for them.
    fn forget_missing(&self, rules: &[Rule]) {
        let known = |id: &RuleId| rules.iter().any(|rule| rule.id == *id);
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, _| known(id));
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, lock| known(id) || Arc::strong_count(lock) > 1);
    }

    fn set_phase(&self, id: RuleId, phase: RulePhase) {
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, phase);
    }
}
