//! Router assembly, shared state, and the JSON error type.
//!
//! # Invariants
//! - Store calls run on the blocking pool; handlers never block the runtime.
//! - Internal failures are logged and answered with a generic 500 body.

mod collections;
mod login;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::error;
use ppgee_core::auth::CredentialVerifier;
use ppgee_core::model::records::{
    AlunoEspecial, AlunoRegular, Conferencia, Docente, Graduate, Periodico, Projeto, Turma,
};
use ppgee_core::{Entity, RepoError, Repositories};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    /// `None` when no login secret is configured.
    pub verifier: Option<Arc<dyn CredentialVerifier>>,
}

impl AppState {
    pub fn new(repos: Repositories, verifier: Option<Arc<dyn CredentialVerifier>>) -> Self {
        Self { repos, verifier }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(&collection_path::<Graduate>(), collections::routes::<Graduate>())
        .route(&collection_path::<Docente>(), collections::routes::<Docente>())
        .route(&collection_path::<Projeto>(), collections::routes::<Projeto>())
        .route(&collection_path::<Turma>(), collections::routes::<Turma>())
        .route(
            &collection_path::<AlunoRegular>(),
            collections::routes::<AlunoRegular>(),
        )
        .route(
            &collection_path::<AlunoEspecial>(),
            collections::routes::<AlunoEspecial>(),
        )
        .route(&collection_path::<Periodico>(), collections::routes::<Periodico>())
        .route(
            &collection_path::<Conferencia>(),
            collections::routes::<Conferencia>(),
        )
        .route(
            "/api/login",
            post(login::login).fallback(login::method_not_allowed),
        )
        .with_state(state)
}

fn collection_path<E: Entity>() -> String {
    format!("/api/{}", E::KIND.api_segment())
}

/// JSON error response.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub(crate) fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "message": message.into() }))
    }

    pub(crate) fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal server error" }),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        if err.is_invalid_input() {
            return Self::message(StatusCode::BAD_REQUEST, err.to_string());
        }
        error!("event=http_request module=http status=error error={err}");
        Self::internal()
    }
}

/// Runs store work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        error!("event=http_request module=http status=error error_code=worker_join error={err}");
        ApiError::internal()
    })?
}
