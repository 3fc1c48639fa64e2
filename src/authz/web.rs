use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::authz::engine;
use crate::authz::resolver::PermissionResolver;
use crate::authz::types::{AuthorizeRequest, AuthorizeResponse};

pub fn router(resolver: Arc<dyn PermissionResolver>) -> Router {
    Router::new()
        .route("/v1/authorize", post(handle_authorize))
        .with_state(resolver)
}

async fn handle_authorize(
    State(resolver): State<Arc<dyn PermissionResolver>>,
    Json(req): Json<AuthorizeRequest>,
) -> impl IntoResponse {
    match engine::authorize(&req.policy, resolver.as_ref(), &req.actor, &req.body).await {
        Ok(()) => Json(AuthorizeResponse { allowed: true }).into_response(),
        Err(e) => e.into_response(),
    }
}
