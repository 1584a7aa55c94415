//! Variant catalogue for rule editors.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use looprule_app::ports::RuleRepository;
use looprule_domain::automation::{Presentation, Registry};

use crate::state::AppState;

/// One registered variant with its default record.
#[derive(Serialize)]
pub struct VariantView {
    pub kind: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    /// Default parameters, in the persisted record form.
    pub defaults: serde_json::Value,
}

/// Every trigger and action kind this build understands.
#[derive(Serialize)]
pub struct RegistryView {
    pub triggers: Vec<VariantView>,
    pub actions: Vec<VariantView>,
}

impl From<&Registry> for RegistryView {
    fn from(registry: &Registry) -> Self {
        let triggers = registry
            .trigger_kinds()
            .filter_map(|kind| {
                let trigger = registry.new_trigger(kind)?;
                Some(VariantView {
                    kind,
                    name: trigger.friendly_name(),
                    icon: trigger.icon(),
                    defaults: trigger.to_record().to_value(),
                })
            })
            .collect();
        let actions = registry
            .action_kinds()
            .filter_map(|kind| {
                let action = registry.new_action(kind)?;
                Some(VariantView {
                    kind,
                    name: action.friendly_name(),
                    icon: action.icon(),
                    defaults: action.to_record().to_value(),
                })
            })
            .collect();
        Self { triggers, actions }
    }
}

/// Possible responses from the registry endpoint.
pub enum ListResponse {
    Ok(Json<RegistryView>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/registry`: list registered trigger and action kinds.
pub async fn list<R>(State(state): State<AppState<R>>) -> ListResponse
where
    R: RuleRepository + Send + Sync + 'static,
{
    ListResponse::Ok(Json(RegistryView::from(state.registry)))
}
