//! Authentication Middleware
//!
//! JWT validation and role checks applied in front of protected routes.

use crate::models::auth::AuthContext;
use crate::service::JwtService;
use crate::utils::error::AppError;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Extension type carrying the authenticated identity
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

/// Validates the Bearer token and attaches the identity to the request.
///
/// Requests without a valid token get a 401 response.
pub async fn auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Invalid Authorization header format".into()))?;

    let context = jwt_service
        .validate_token(token)
        .map_err(|_| AppError::Authentication("Invalid or expired token".into()))?;

    request.extensions_mut().insert(AuthUser(context));

    Ok(next.run(request).await)
}

/// Rejects requests whose authenticated identity lacks the administrator
/// role. Must run after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let context = request
        .extensions()
        .get::<AuthUser>()
        .map(|auth_user| &auth_user.0)
        .ok_or_else(|| AppError::Authentication("Authentication required".into()))?;

    if !context.is_admin() {
        return Err(AppError::Authorization(
            "Administrator role required".into(),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::{
        body::Body,
        http::{Method, Request},
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Extension, Router,
    };
    use uuid::Uuid;

    fn jwt_service() -> Arc<JwtService> {
        Arc::new(JwtService::new(
            "test_signing_secret_for_unit_tests".to_string(),
            2,
        ))
    }

    fn token_for_role(service: &JwtService, role_name: &str) -> String {
        let account = crate::models::account::Account {
            id: Uuid::new_v4(),
            name: "Test Holder".to_string(),
            email: "holder@example.com".to_string(),
            role_id: 1,
            phone: None,
            national_id: None,
            active: true,
            verified: true,
            two_factor_enabled: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        service.issue_token(&account, role_name).unwrap()
    }

    async fn test_handler() -> &'static str {
        "OK"
    }

    async fn whoami(Extension(AuthUser(context)): Extension<AuthUser>) -> String {
        context.email
    }

    fn protected_app(service: Arc<JwtService>) -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .layer(from_fn_with_state(service, auth_middleware))
    }

    fn admin_app(service: Arc<JwtService>) -> Router {
        Router::new()
            .route("/admin", get(test_handler))
            .layer(from_fn(require_admin))
            .layer(from_fn_with_state(service, auth_middleware))
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        use tower::util::ServiceExt;

        let app = protected_app(jwt_service());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_header_is_unauthorized() {
        use tower::util::ServiceExt;

        let app = protected_app(jwt_service());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .header(AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        use tower::util::ServiceExt;

        let service = jwt_service();
        let token = token_for_role(&service, "Cliente");

        let app = protected_app(service);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_identity_reaches_handler() {
        use tower::util::ServiceExt;

        let service = jwt_service();
        let token = token_for_role(&service, "Cliente");

        let app = Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(service, auth_middleware));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/whoami")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"holder@example.com");
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        use tower::util::ServiceExt;

        let service = jwt_service();
        let token = token_for_role(&service, "Cliente");

        let app = admin_app(service);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/admin")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_passes_role_check() {
        use tower::util::ServiceExt;

        let service = jwt_service();
        let token = token_for_role(&service, "Administrador");

        let app = admin_app(service);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/admin")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
