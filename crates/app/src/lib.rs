//! # looprule-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RuleRepository`: CRUD for rules
//!   - `RuntimeState`: snapshot of current therapy state
//!   - `ActuationQueue`: therapy commands, answered through a `Callback`
//!   - `Notifier`: alarms and notifications
//!   - `EventPublisher`: engine events
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RuleService`: create, update, list, get, delete, import, export
//!   - `ActionExecutor`: run one action to exactly one outcome
//!   - `RuleEngine`: edge-triggered evaluation and ordered execution
//! - Provide **in-process infrastructure** (event bus, callbacks) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `looprule-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod callback;
pub mod event_bus;
pub mod executor;
pub mod ports;
pub mod rule_engine;
pub mod services;

#[cfg(test)]
mod testing;
