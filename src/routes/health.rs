use axum::response::Json;
use serde::Serialize;

use super::ApiResponse;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;
        assert!(response.code);
        assert_eq!(response.data.map(|d| d.status).as_deref(), Some("healthy"));
    }
}
