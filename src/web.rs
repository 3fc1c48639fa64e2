//! HTTP sidecar exposing the engine: edit authorization, change sets,
//! relation identity, and the per-entity field registry.
use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::authz::resolver::PermissionResolver;
use crate::authz::types::{
    ChangesRequest, FieldInfo, PermissionMapRequest, RelationIdsResponse, RelationKeysResponse,
    RelationRequest,
};
use crate::diff::pick_changes;
use crate::errors::FieldgateError;
use crate::permission_map::build_permission_map;
use crate::registry::{self, PermissionEntity};
use crate::relation::{extract_relation_id, extract_relation_key};
use crate::settings::Settings;

pub fn router(resolver: Arc<dyn PermissionResolver>) -> Router {
    Router::new()
        .route("/v1/changes", post(handle_changes))
        .route("/v1/relations/ids", post(handle_relation_ids))
        .route("/v1/relations/keys", post(handle_relation_keys))
        .route("/v1/entities/:entity/fields", get(handle_fields))
        .route(
            "/v1/entities/:entity/permission-map",
            post(handle_permission_map),
        )
        .route("/healthz", get(health))
        .merge(crate::authz::web::router(resolver))
}

pub async fn serve(
    settings: Settings,
    resolver: Arc<dyn PermissionResolver>,
) -> Result<(), FieldgateError> {
    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "fieldgate listening");
    axum::serve(listener, router(resolver)).await?;
    Ok(())
}

impl IntoResponse for FieldgateError {
    fn into_response(self) -> Response {
        let status = match &self {
            FieldgateError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn handle_changes(Json(req): Json<ChangesRequest>) -> impl IntoResponse {
    Json(pick_changes(&req.dto, &req.original))
}

async fn handle_relation_ids(Json(req): Json<RelationRequest>) -> impl IntoResponse {
    Json(RelationIdsResponse {
        ids: extract_relation_id(req.change.as_ref()),
    })
}

async fn handle_relation_keys(Json(req): Json<RelationRequest>) -> impl IntoResponse {
    let keys = req
        .change
        .as_ref()
        .map(extract_relation_key)
        .unwrap_or_default();
    Json(RelationKeysResponse { keys })
}

async fn handle_fields(Path(entity): Path<String>) -> Result<Json<Vec<FieldInfo>>, FieldgateError> {
    let entity: PermissionEntity = entity.parse()?;
    let fields = registry::all_fields(entity)
        .iter()
        .enumerate()
        .map(|(i, name)| FieldInfo {
            name: *name,
            bit: i as u32,
        })
        .collect();
    Ok(Json(fields))
}

async fn handle_permission_map(
    Path(entity): Path<String>,
    Json(req): Json<PermissionMapRequest>,
) -> Result<impl IntoResponse, FieldgateError> {
    let entity: PermissionEntity = entity.parse()?;
    Ok(Json(build_permission_map(req.groups, entity)))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
