//! Per-collection CRUD handlers, generic over the entity type.

use super::{run_blocking, ApiError, AppState};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::Json;
use log::info;
use ppgee_core::Entity;
use serde::Deserialize;
use serde_json::json;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";

pub(super) fn routes<E: Entity>() -> MethodRouter<AppState> {
    get(list::<E>)
        .post(create::<E>)
        .put(update::<E>)
        .delete(delete::<E>)
        .fallback(method_not_allowed)
}

/// POST body: one record or an array of records.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<E> {
    Many(Vec<E>),
    One(E),
}

async fn list<E: Entity>(State(state): State<AppState>) -> Result<Json<Vec<E>>, ApiError> {
    let repo = state.repos.of::<E>();
    let records = run_blocking(move || Ok(repo.list()?)).await?;
    Ok(Json(records))
}

async fn create<E: Entity>(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let payload: OneOrMany<E> = parse_body(&body)?;
    let repo = state.repos.of::<E>();

    match payload {
        OneOrMany::One(record) => {
            require_id(record.id())?;
            let created = run_blocking(move || Ok(repo.create(&record)?)).await?;
            Ok((StatusCode::CREATED, Json(created)).into_response())
        }
        OneOrMany::Many(records) => {
            for record in &records {
                require_id(record.id())?;
            }
            let created = run_blocking(move || Ok(repo.create_many(&records)?)).await?;
            info!(
                "event=http_bulk_create module=http status=ok collection={} rows={}",
                E::KIND.collection(),
                created.len()
            );
            Ok((StatusCode::CREATED, Json(created)).into_response())
        }
    }
}

async fn update<E: Entity>(State(state): State<AppState>, body: Bytes) -> Result<Json<E>, ApiError> {
    let record: E = parse_body(&body)?;
    require_id(record.id())?;
    let repo = state.repos.of::<E>();

    let updated = run_blocking(move || {
        if repo.get(record.id())?.is_none() {
            return Err(ApiError::message(
                StatusCode::NOT_FOUND,
                format!("{} not found", E::KIND.label()),
            ));
        }
        Ok(repo.update(&record)?)
    })
    .await?;
    Ok(Json(updated))
}

async fn delete<E: Entity>(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut ids = params.into_iter().filter(|(key, _)| key == "id").map(|(_, value)| value);
    let id = match (ids.next(), ids.next()) {
        (Some(id), None) if !id.trim().is_empty() => id,
        _ => return Err(ApiError::message(StatusCode::BAD_REQUEST, "Invalid ID")),
    };

    let repo = state.repos.of::<E>();
    run_blocking(move || Ok(repo.delete(&id)?)).await?;
    Ok(Json(json!({ "message": format!("{} deleted", E::KIND.label()) })))
}

async fn method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
        format!("Method {method} Not Allowed"),
    )
        .into_response()
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|err| ApiError::message(StatusCode::BAD_REQUEST, format!("Invalid body: {err}")))
}

fn require_id(id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::message(StatusCode::BAD_REQUEST, "Invalid ID"));
    }
    Ok(())
}
