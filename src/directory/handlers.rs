use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::memory::InMemoryDirectory;
use super::protocol::{ListResponse, LookupResponse, RegisterRequest, RegisterResponse};

pub async fn handle_register(
    Extension(directory): Extension<Arc<InMemoryDirectory>>,
    Json(req): Json<RegisterRequest>,
) -> (StatusCode, Json<RegisterResponse>) {
    if req.name.is_empty() {
        tracing::warn!("Rejected registration with empty name");
        return (
            StatusCode::BAD_REQUEST,
            Json(RegisterResponse { success: false }),
        );
    }

    directory.bind(&req.name, req.endpoint);
    (StatusCode::OK, Json(RegisterResponse { success: true }))
}

pub async fn handle_lookup(
    Extension(directory): Extension<Arc<InMemoryDirectory>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<LookupResponse>) {
    match directory.resolve(&name) {
        Some(endpoint) => (
            StatusCode::OK,
            Json(LookupResponse {
                endpoint: Some(endpoint),
            }),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(LookupResponse { endpoint: None }),
        ),
    }
}

pub async fn handle_list(
    Extension(directory): Extension<Arc<InMemoryDirectory>>,
) -> (StatusCode, Json<ListResponse>) {
    (
        StatusCode::OK,
        Json(ListResponse {
            names: directory.names(),
        }),
    )
}
