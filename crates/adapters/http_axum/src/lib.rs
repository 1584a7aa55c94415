//! # looprule-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for rule editors (`/api/rules`, `/api/registry`)
//! - Import and export whole rule sets in the persisted JSON format
//! - Map HTTP requests into [`RuleService`](looprule_app::services::rule_service::RuleService)
//!   calls and results back into JSON responses
//!
//! ## Dependency rule
//! Depends on `looprule-app` (for port traits and services) and
//! `looprule-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
