use axum::response::Response;
use serde::Serialize;

pub mod auth;
pub mod dashboard;
pub mod events;
pub mod todos;

use crate::utils::response::success;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "hacktrack-api",
    };

    success(payload, "Health check successful")
}
