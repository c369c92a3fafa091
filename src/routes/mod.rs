use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

pub mod health;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(_code: i32, message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.config.import.max_upload_size + MULTIPART_OVERHEAD;

    // API routes
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // User routes
        .route(
            "/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route(
            "/users/upload",
            post(handlers::import::upload_users)
                .layer::<_, std::convert::Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(upload_limit)),
        )
        // Role routes
        .route("/roles", get(handlers::role::list_roles));

    Router::new()
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(404, "Not Found")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(json["code"], true);
        assert_eq!(json["message"], "success");
        assert_eq!(json["data"], 3);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error(400, "bad")).unwrap();
        assert_eq!(json["code"], false);
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn test_fallback_is_not_found() {
        let (status, Json(body)) = fallback().await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Not Found");
    }
}
