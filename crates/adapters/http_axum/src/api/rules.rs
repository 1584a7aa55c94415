//! JSON handlers for rules and rule sets.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use looprule_app::ports::RuleRepository;
use looprule_app::services::rule_service::ImportSummary;
use looprule_domain::automation::{Action, Rule, Trigger};
use looprule_domain::id::RuleId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a rule.
#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub name: String,
    pub enabled: Option<bool>,
    pub trigger: Trigger,
    pub actions: Vec<Action>,
}

/// Request body for replacing a rule.
#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub name: String,
    pub enabled: bool,
    pub trigger: Trigger,
    pub actions: Vec<Action>,
}

/// A rule together with the text an editor shows for it.
#[derive(Serialize)]
pub struct RuleView {
    #[serde(flatten)]
    pub rule: Rule,
    pub valid: bool,
    /// The trigger in readable form, e.g. `glucose > 180 mg/dL`.
    pub condition: String,
    /// One line per action, in execution order.
    pub steps: Vec<String>,
}

impl From<Rule> for RuleView {
    fn from(rule: Rule) -> Self {
        Self {
            valid: rule.is_valid(),
            condition: rule.trigger.to_string(),
            steps: rule.actions.iter().map(Action::short_description).collect(),
            rule,
        }
    }
}

/// Counts returned by the import endpoint.
#[derive(Serialize)]
pub struct ImportResponse {
    pub created: usize,
    pub updated: usize,
    pub invalid: usize,
}

impl From<ImportSummary> for ImportResponse {
    fn from(summary: ImportSummary) -> Self {
        Self {
            created: summary.created,
            updated: summary.updated,
            invalid: summary.invalid,
        }
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<RuleView>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<RuleView>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<RuleView>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Possible responses from the export endpoint.
pub enum ExportResponse {
    Ok(String),
}

impl IntoResponse for ExportResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        }
    }
}

/// Possible responses from the import endpoint.
pub enum ImportResult {
    Ok(Json<ImportResponse>),
}

impl IntoResponse for ImportResult {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<RuleId, ApiError> {
    RuleId::from_str(raw).map_err(|_| ApiError::invalid_id(raw))
}

/// `GET /api/rules`: list all rules in evaluation order.
pub async fn list<R>(State(state): State<AppState<R>>) -> Result<ListResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
{
    let rules = state.rule_service.list_rules().await?;
    Ok(ListResponse::Ok(Json(
        rules.into_iter().map(RuleView::from).collect(),
    )))
}

/// `GET /api/rules/:id`: get rule by ID.
pub async fn get<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
{
    let rule = state.rule_service.get_rule(parse_id(&id)?).await?;
    Ok(GetResponse::Ok(Json(rule.into())))
}

/// `POST /api/rules`: create a new rule.
pub async fn create<R>(
    State(state): State<AppState<R>>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<CreateResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
{
    let rule = Rule::builder()
        .name(req.name)
        .enabled(req.enabled.unwrap_or(true))
        .trigger(req.trigger)
        .actions(req.actions)
        .build()?;
    let created = state.rule_service.create_rule(rule).await?;
    Ok(CreateResponse::Created(Json(created.into())))
}

/// `PUT /api/rules/:id`: replace an existing rule.
pub async fn update<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRuleRequest>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
{
    let rule = Rule::builder()
        .id(parse_id(&id)?)
        .name(req.name)
        .enabled(req.enabled)
        .trigger(req.trigger)
        .actions(req.actions)
        .build()?;
    let updated = state.rule_service.update_rule(rule).await?;
    Ok(GetResponse::Ok(Json(updated.into())))
}

/// `DELETE /api/rules/:id`: delete a rule.
pub async fn delete<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
{
    state.rule_service.delete_rule(parse_id(&id)?).await?;
    Ok(DeleteResponse::NoContent)
}

/// `GET /api/rules/export`: the whole rule set as a JSON array.
pub async fn export<R>(State(state): State<AppState<R>>) -> Result<ExportResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
{
    let body = state.rule_service.export_rules().await?;
    Ok(ExportResponse::Ok(body))
}

/// `POST /api/rules/import`: merge a JSON array of rules into the store.
///
/// The body is read as text so that unknown variants can be dropped one by
/// one instead of rejecting the whole document.
pub async fn import<R>(
    State(state): State<AppState<R>>,
    body: String,
) -> Result<ImportResult, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
{
    let summary = state.rule_service.import_rules(&body).await?;
    Ok(ImportResult::Ok(Json(summary.into())))
}
