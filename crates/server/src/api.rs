//! JSON API over the routing service.
//!
//! - `POST   /api/v1/routing/evaluate`: assign a ticket
//! - `POST   /api/v1/routing/simulate`: dry-run the same decision
//! - `GET    /api/v1/contract-versions/{id}/routing-rules`: list rules, empty when denied
//! - `POST   /api/v1/contract-versions/{id}/routing-rules`: create a rule
//! - `PATCH  /api/v1/routing-rules/{id}`: partial update
//! - `DELETE /api/v1/routing-rules/{id}`
//!
//! The caller identifies itself on every request through the `x-actor-*`
//! and `x-company-*` headers.

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Path, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ticketroute_core::errors::{ApplicationError, InterfaceError};
use ticketroute_core::{
    Actor, ContractVersionId, CreateRuleInput, EvaluationContext, EvaluationResult, RoutingRule,
    RoutingService, RuleId, RulePatch,
};
use tracing::{info, warn};
use uuid::Uuid;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const COMPANY_ID_HEADER: &str = "x-company-id";
pub const ACTOR_SCOPES_HEADER: &str = "x-actor-scopes";
pub const COMPANY_SCOPES_HEADER: &str = "x-company-scopes";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ApiState {
    routing: RoutingService,
}

pub fn router(routing: RoutingService) -> Router {
    Router::new()
        .route("/api/v1/routing/evaluate", post(evaluate))
        .route("/api/v1/routing/simulate", post(simulate))
        .route(
            "/api/v1/contract-versions/{contract_version_id}/routing-rules",
            get(list_rules).post(create_rule),
        )
        .route("/api/v1/routing-rules/{rule_id}", patch(update_rule).delete(delete_rule))
        .with_state(ApiState { routing })
}

// ---------------------------------------------------------------------------
// Request identity
// ---------------------------------------------------------------------------

/// Actor and correlation id of the current request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub actor: Actor,
    pub correlation_id: String,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let correlation_id = header(headers, CORRELATION_ID_HEADER)
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let Some(actor_id) = header(headers, ACTOR_ID_HEADER) else {
            return Err(ApiError::Unauthorized { correlation_id });
        };

        let actor = Actor {
            id: actor_id.to_owned(),
            company_id: header(headers, COMPANY_ID_HEADER).map(str::to_owned),
            scope_strings: list_header(headers, ACTOR_SCOPES_HEADER),
            company_scope_ids: list_header(headers, COMPANY_SCOPES_HEADER),
        };
        Ok(Self { actor, correlation_id })
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn list_header(headers: &HeaderMap, name: &str) -> Vec<String> {
    header(headers, name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    Unauthorized { correlation_id: String },
    Interface(InterfaceError),
}

impl ApiError {
    fn application(error: ApplicationError, correlation_id: &str) -> Self {
        Self::Interface(error.into_interface(correlation_id))
    }
}

fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    request: &RequestContext,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::Interface(InterfaceError::BadRequest {
            message: rejection.body_text(),
            correlation_id: request.correlation_id.clone(),
        })
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub user_message: &'static str,
    pub correlation_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unauthorized { correlation_id } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "unauthorized",
                    message: format!("missing `{ACTOR_ID_HEADER}` header"),
                    user_message: "Identify the calling actor and retry.",
                    correlation_id,
                },
            ),
            Self::Interface(error) => {
                let (status, class) = classify(&error);
                // Backend details stay in the log.
                let message = match &error {
                    InterfaceError::ServiceUnavailable { .. } | InterfaceError::Internal { .. } => {
                        error.user_message().to_owned()
                    }
                    _ => error.message().to_owned(),
                };
                if status.is_server_error() {
                    warn!(
                        event_name = "api.request.failed",
                        correlation_id = %error.correlation_id(),
                        error_class = class,
                        detail = %error.message(),
                        "request failed"
                    );
                }
                (
                    status,
                    ErrorBody {
                        error: class,
                        message,
                        user_message: error.user_message(),
                        correlation_id: error.correlation_id().to_owned(),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn classify(error: &InterfaceError) -> (StatusCode, &'static str) {
    match error {
        InterfaceError::BadRequest { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
        InterfaceError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
        InterfaceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        InterfaceError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
        }
        InterfaceError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub condition: Option<Value>,
    #[serde(default)]
    pub action: Value,
}

async fn evaluate(
    State(state): State<ApiState>,
    request: RequestContext,
    body: Result<Json<EvaluationContext>, JsonRejection>,
) -> Result<Json<EvaluationResult>, ApiError> {
    let ctx = json_body(body, &request)?;
    state
        .routing
        .evaluate(&request.actor, &ctx)
        .await
        .map(Json)
        .map_err(|error| ApiError::application(error, &request.correlation_id))
}

async fn simulate(
    State(state): State<ApiState>,
    request: RequestContext,
    body: Result<Json<EvaluationContext>, JsonRejection>,
) -> Result<Json<EvaluationResult>, ApiError> {
    let ctx = json_body(body, &request)?;
    state
        .routing
        .simulate(&request.actor, &ctx)
        .await
        .map(Json)
        .map_err(|error| ApiError::application(error, &request.correlation_id))
}

async fn list_rules(
    State(state): State<ApiState>,
    request: RequestContext,
    Path(contract_version_id): Path<String>,
) -> Result<Json<Vec<RoutingRule>>, ApiError> {
    state
        .routing
        .list_rules(&request.actor, &ContractVersionId(contract_version_id))
        .await
        .map(Json)
        .map_err(|error| ApiError::application(error, &request.correlation_id))
}

async fn create_rule(
    State(state): State<ApiState>,
    request: RequestContext,
    Path(contract_version_id): Path<String>,
    body: Result<Json<CreateRuleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoutingRule>), ApiError> {
    let body = json_body(body, &request)?;
    let input = CreateRuleInput {
        contract_version_id: ContractVersionId(contract_version_id),
        priority: body.priority,
        condition: body.condition.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        action: body.action,
    };

    let rule = state
        .routing
        .create_rule(&request.actor, input)
        .await
        .map_err(|error| ApiError::application(error, &request.correlation_id))?;
    info!(
        event_name = "api.routing_rule.created",
        correlation_id = %request.correlation_id,
        rule_id = %rule.id,
        "routing rule created over http"
    );
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn update_rule(
    State(state): State<ApiState>,
    request: RequestContext,
    Path(rule_id): Path<String>,
    body: Result<Json<RulePatch>, JsonRejection>,
) -> Result<Json<RoutingRule>, ApiError> {
    let patch = json_body(body, &request)?;
    state
        .routing
        .update_rule(&request.actor, &RuleId(rule_id), patch)
        .await
        .map(Json)
        .map_err(|error| ApiError::application(error, &request.correlation_id))
}

async fn delete_rule(
    State(state): State<ApiState>,
    request: RequestContext,
    Path(rule_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .routing
        .delete_rule(&request.actor, &RuleId(rule_id))
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|error| ApiError::application(error, &request.correlation_id))
}
