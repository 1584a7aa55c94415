//! # looprule-domain
//!
//! Pure domain model for the looprule automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **runtime snapshot** triggers are evaluated against
//! - Define **Triggers** (comparison and flag leaves, `And`/`Or`/`Not`)
//! - Define **Actions** (profile switch, loop suspend/resume, alarms, temp targets)
//! - Define **Commands** sent to the actuation queue and their **Outcomes**
//! - Define the tagged-record codec and the variant **Registry**
//! - Define **Rules** and the **Events** the engine emits
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod command;
pub mod event;
pub mod snapshot;
