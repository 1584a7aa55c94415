//! In-memory port implementations shared by the unit tests of this crate.

use std::future::Future;
use std::sync::Mutex;

use looprule_domain::automation::Rule;
use looprule_domain::command::{Command, Outcome};
use looprule_domain::error::{LoopRuleError, NotFoundError};
use looprule_domain::event::Event;
use looprule_domain::id::RuleId;
use looprule_domain::snapshot::RuntimeSnapshot;
use looprule_domain::time::Timestamp;

use crate::callback::Callback;
use crate::ports::{ActuationQueue, EventPublisher, Notifier, RuleRepository, RuntimeState};

// ── Rule repo ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRuleRepo {
    pub store: Mutex<Vec<Rule>>,
    pub fired: Mutex<Vec<RuleId>>,
}

impl InMemoryRuleRepo {
    pub fn with(rules: Vec<Rule>) -> Self {
        Self {
            store: Mutex::new(rules),
            fired: Mutex::new(Vec::new()),
        }
    }

    pub fn replace(&self, rules: Vec<Rule>) {
        *self.store.lock().unwrap() = rules;
    }
}

impl RuleRepository for InMemoryRuleRepo {
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, LoopRuleError>> + Send {
        self.store.lock().unwrap().push(rule.clone());
        async { Ok(rule) }
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, LoopRuleError>> + Send {
        let r = self.store.lock().unwrap().iter().find(|r| r.id == id).cloned();
        async { Ok(r) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, LoopRuleError>> + Send {
        let r = self.store.lock().unwrap().clone();
        async { Ok(r) }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Rule>, LoopRuleError>> + Send {
        let r: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .collect();
        async { Ok(r) }
    }

    fn update(&self, rule: Rule) -> impl Future<Output = Result<Rule, LoopRuleError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = match store.iter_mut().find(|r| r.id == rule.id) {
            Some(slot) => {
                *slot = rule.clone();
                Ok(rule)
            }
            None => Err(NotFoundError {
                entity: "Rule",
                id: rule.id.to_string(),
            }
            .into()),
        };
        async { result }
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        self.store.lock().unwrap().retain(|r| r.id != id);
        async { Ok(()) }
    }

    fn record_fired(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        if let Some(rule) = self.store.lock().unwrap().iter_mut().find(|r| r.id == id) {
            rule.last_fired = Some(at);
        }
        self.fired.lock().unwrap().push(id);
        async { Ok(()) }
    }
}

// ── Runtime state ──────────────────────────────────────────────

#[derive(Default)]
pub struct FakeState {
    pub snapshot: Mutex<RuntimeSnapshot>,
}

impl FakeState {
    pub fn update(&self, f: impl FnOnce(&mut RuntimeSnapshot)) {
        f(&mut self.snapshot.lock().unwrap());
    }
}

impl RuntimeState for FakeState {
    fn snapshot(&self) -> impl Future<Output = Result<RuntimeSnapshot, LoopRuleError>> + Send {
        let s = self.snapshot.lock().unwrap().clone();
        async { Ok(s) }
    }
}

// ── Actuation queue ────────────────────────────────────────────

/// How the recording queue answers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Succeed,
    Fail,
    /// Keep the callback without completing it.
    Hold,
}

pub struct RecordingQueue {
    pub reply: Mutex<Reply>,
    pub commands: Mutex<Vec<Command>>,
    pub held: Mutex<Vec<Callback>>,
}

impl RecordingQueue {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            commands: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    /// Complete every held callback with `outcome`.
    pub fn release(&self, outcome: &Outcome) {
        for callback in self.held.lock().unwrap().drain(..) {
            callback.complete(outcome.clone());
        }
    }
}

impl Default for RecordingQueue {
    fn default() -> Self {
        Self::new(Reply::Succeed)
    }
}

impl ActuationQueue for RecordingQueue {
    fn enqueue(&self, command: Command, callback: Callback) {
        let comment = command.to_string();
        self.commands.lock().unwrap().push(command);
        match *self.reply.lock().unwrap() {
            Reply::Succeed => callback.succeed(comment),
            Reply::Fail => callback.fail(format!("{comment} rejected")),
            Reply::Hold => self.held.lock().unwrap().push(callback),
        }
    }
}

// ── Notifier ───────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub alarms: Mutex<Vec<String>>,
    pub notifications: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn alarm(&self, text: String) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        self.alarms.lock().unwrap().push(text);
        async { Ok(()) }
    }

    fn notify(&self, text: String) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        self.notifications.lock().unwrap().push(text);
        async { Ok(()) }
    }
}

// ── Spy publisher ──────────────────────────────────────────────

#[derive(Default)]
pub struct SpyPublisher {
    pub events: Mutex<Vec<Event>>,
}

impl EventPublisher for SpyPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}
