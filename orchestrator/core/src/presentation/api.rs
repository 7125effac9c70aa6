// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

// HTTP API
//
// JSON routes over AgentService. Error bodies use `{error}` or
// `{error, details}`; status codes come from the ServiceError kind.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::agent_service::{AgentService, ServiceError};
use crate::application::validation::{malformed_body, CreateAgentRequest, ValidationIssue};
use crate::domain::agent::{AgentId, AgentStatus};

const PROMPT_REQUIRED: &str = "Prompt is required and must be a string";

pub struct AppState {
    pub service: Arc<AgentService>,
    pub start_time: Instant,
}

pub fn app(service: Arc<AgentService>) -> Router {
    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/agents", get(list_agents))
        .route("/api/agents/create", post(create_agent))
        .route("/api/agents/{id}", get(get_agent).delete(delete_agent))
        .route("/api/agents/{id}/status", put(set_status))
        .route("/api/agents/{id}/execute", post(execute_agent))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error response with a JSON body
struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    fn new(status: StatusCode, error: &str) -> Self {
        Self {
            status,
            body: json!({ "error": error }),
        }
    }

    fn with_details(status: StatusCode, error: &str, details: impl serde::Serialize) -> Self {
        Self {
            status,
            body: json!({ "error": error, "details": details }),
        }
    }

    fn validation(issues: Vec<ValidationIssue>) -> Self {
        Self::with_details(StatusCode::BAD_REQUEST, "Validation failed", issues)
    }

    /// Map a service error. `failure` labels unexpected errors for this route.
    fn from_service(err: ServiceError, failure: &str) -> Self {
        match err {
            ServiceError::Validation(issues) => Self::validation(issues),
            ServiceError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Agent not found"),
            ServiceError::ExecutionFailed { message, .. } => Self::with_details(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Agent execution failed",
                message,
            ),
            other => {
                error!("{}: {}", failure, other);
                Self::with_details(StatusCode::INTERNAL_SERVER_ERROR, failure, other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::validation(vec![malformed_body(e.to_string())]))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "models": state.service.available_models(),
    }))
}

async fn list_agents(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let agents = state
        .service
        .list_agents()
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to get agents"))?;

    Ok(Json(json!({ "success": true, "agents": agents })))
}

async fn create_agent(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request: CreateAgentRequest = parse_body(&body)?;

    let created = state
        .service
        .create_agent(request)
        .await
        .map_err(|e| ApiError::from_service(e, "Agent creation failed"))?;

    let mut response = json!({
        "success": true,
        "agentId": created.agent_id,
        "message": created.message(),
    });
    if !created.dropped_tools.is_empty() {
        response["droppedTools"] = json!(created.dropped_tools);
    }
    Ok(Json(response))
}

async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let agent = state
        .service
        .get_agent(&AgentId::from(id))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to get agent"))?;

    Ok(Json(json!({ "success": true, "agent": agent })))
}

async fn delete_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .service
        .delete_agent(&AgentId::from(id))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to delete agent"))?;

    Ok(Json(json!({ "success": true, "message": "Agent deleted successfully" })))
}

#[derive(Deserialize)]
struct StatusRequest {
    status: AgentStatus,
}

async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request: StatusRequest = parse_body(&body)?;

    let agent = state
        .service
        .set_agent_status(&AgentId::from(id), request.status)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to update agent status"))?;

    Ok(Json(json!({ "success": true, "agent": agent })))
}

async fn execute_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, PROMPT_REQUIRED))?;
    let prompt = match payload.get("prompt") {
        Some(serde_json::Value::String(prompt)) => prompt.clone(),
        _ => return Err(ApiError::new(StatusCode::BAD_REQUEST, PROMPT_REQUIRED)),
    };

    let agent_id = AgentId::from(id);
    match state.service.execute_agent(&agent_id, &prompt).await {
        Ok(result) => Ok(Json(json!({
            "success": true,
            "result": result,
            "agentId": agent_id,
        }))),
        Err(ServiceError::Validation(_)) => Err(ApiError::new(StatusCode::BAD_REQUEST, PROMPT_REQUIRED)),
        Err(ServiceError::NotFound { .. }) => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "Agent not found or not cached. Please recreate the agent.",
        )),
        Err(e) => Err(ApiError::from_service(e, "Agent execution failed")),
    }
}
