//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod registry;
#[allow(clippy::missing_errors_doc)]
pub mod rules;

use axum::Router;
use axum::routing::{get, post};

use looprule_app::ports::RuleRepository;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R>() -> Router<AppState<R>>
where
    R: RuleRepository + Send + Sync + 'static,
{
    Router::new()
        // Rules
        .route("/rules", get(rules::list::<R>).post(rules::create::<R>))
        .route("/rules/export", get(rules::export::<R>))
        .route("/rules/import", post(rules::import::<R>))
        .route(
            "/rules/{id}",
            get(rules::get::<R>)
                .put(rules::update::<R>)
                .delete(rules::delete::<R>),
        )
        // Registry
        .route("/registry", get(registry::list::<R>))
}
