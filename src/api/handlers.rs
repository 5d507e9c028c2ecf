//! HTTP Request Handlers
//!
//! Axum handlers for processing HTTP requests and responses.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    api::middleware::AuthUser,
    models::{
        account::{Account, Role},
        citizen::CitizenLookupResponse,
        requests::*,
    },
    service::{AccountService, CitizenService, JwtService, LoginOutcome},
    utils::error::{AppError, AppResult},
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub account_service: Arc<AccountService>,
    pub jwt_service: Arc<JwtService>,
    pub citizen_service: Option<Arc<CitizenService>>,
}

/// Standard success response wrapper
#[derive(serde::Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Capture request metadata for the audit trail.
///
/// The client address is taken from the usual proxy headers since the
/// service runs behind a reverse proxy.
fn request_context(headers: &HeaderMap) -> RequestContext {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        });

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    RequestContext {
        ip_address,
        user_agent,
    }
}

fn handle_validation_error(err: validator::ValidationErrors) -> AppError {
    let mut messages = Vec::new();

    for (field, errors) in err.field_errors() {
        for error in errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for field '{}'", field));
            messages.push(format!("{}: {}", field, message));
        }
    }

    AppError::Validation(messages.join(", "))
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<SuccessResponse<RegisterResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let ctx = request_context(&headers);
    let account = state.account_service.register(&request, &ctx).await?;

    let response = RegisterResponse {
        id: account.id,
        name: account.name,
        email: account.email,
        verified: account.verified,
        created_at: account.created_at,
    };

    Ok(Json(SuccessResponse::new(response)))
}

/// List the roles open for self-registration, so a client can pick a valid
/// role id before calling register
pub async fn list_registration_roles(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<Vec<Role>>>> {
    let roles = state.account_service.list_registration_roles().await?;
    Ok(Json(SuccessResponse::new(roles)))
}

/// Verify a freshly registered account with the emailed code
pub async fn verify_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<VerifyAccountRequest>,
) -> AppResult<Json<SuccessResponse<Account>>> {
    request.validate().map_err(handle_validation_error)?;

    let ctx = request_context(&headers);
    let account = state
        .account_service
        .verify_account(&request.email, &request.code, &ctx)
        .await?;

    Ok(Json(SuccessResponse::new(account)))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<SuccessResponse<LoginResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let ctx = request_context(&headers);
    let outcome = state
        .account_service
        .login(&request.email, &request.password, &ctx)
        .await?;

    Ok(Json(SuccessResponse::new(login_response(outcome))))
}

/// Complete a two-factor login
pub async fn verify_two_factor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TwoFactorVerifyRequest>,
) -> AppResult<Json<SuccessResponse<LoginResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let ctx = request_context(&headers);
    let outcome = state
        .account_service
        .verify_two_factor(&request.email, &request.code, &ctx)
        .await?;

    Ok(Json(SuccessResponse::new(login_response(outcome))))
}

fn login_response(outcome: LoginOutcome) -> LoginResponse {
    match outcome {
        LoginOutcome::Authenticated {
            account,
            access_token,
            expires_in,
        } => LoginResponse::with_token(account, access_token, expires_in),
        LoginOutcome::TwoFactorRequired => LoginResponse::two_factor_pending(),
    }
}

/// Start a password reset
pub async fn request_password_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PasswordResetRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let ctx = request_context(&headers);
    state
        .account_service
        .request_password_reset(&request.email, &ctx)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse::new(
        "If the email is registered, a reset code has been sent",
    ))))
}

/// Complete a password reset with the emailed code
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let ctx = request_context(&headers);
    state
        .account_service
        .confirm_password_reset(&request.email, &request.code, &request.new_password, &ctx)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse::new(
        "Password has been reset",
    ))))
}

/// Get the authenticated account's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthUser(context)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<Account>>> {
    let account = state.account_service.get_account(context.account_id).await?;
    Ok(Json(SuccessResponse::new(account)))
}

/// Change the authenticated account's password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(AuthUser(context)): Extension<AuthUser>,
    headers: HeaderMap,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let ctx = request_context(&headers);
    state
        .account_service
        .change_password(
            context.account_id,
            &request.current_password,
            &request.new_password,
            &ctx,
        )
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse::new(
        "Password updated",
    ))))
}

/// Enable or disable the second login factor
pub async fn set_two_factor(
    State(state): State<AppState>,
    Extension(AuthUser(context)): Extension<AuthUser>,
    headers: HeaderMap,
    Json(request): Json<TwoFactorToggleRequest>,
) -> AppResult<Json<SuccessResponse<Account>>> {
    let ctx = request_context(&headers);
    let account = state
        .account_service
        .set_two_factor(context.account_id, request.enabled, &ctx)
        .await?;

    Ok(Json(SuccessResponse::new(account)))
}

/// Block or unblock an account by national id (administrators only)
pub async fn set_account_state(
    State(state): State<AppState>,
    Extension(AuthUser(context)): Extension<AuthUser>,
    Path(national_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SetAccountStateRequest>,
) -> AppResult<Json<SuccessResponse<SetAccountStateResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    if !crate::utils::validation::validate_national_id(&national_id) {
        return Err(AppError::Validation("Invalid national id".into()));
    }

    let ctx = request_context(&headers);
    let (account, changed) = state
        .account_service
        .set_account_state(context.account_id, &national_id, &request, &ctx)
        .await?;

    Ok(Json(SuccessResponse::new(SetAccountStateResponse {
        account,
        changed,
    })))
}

/// Look up an account by national id (administrators only)
pub async fn find_account_by_national_id(
    State(state): State<AppState>,
    Path(national_id): Path<String>,
) -> AppResult<Json<SuccessResponse<Account>>> {
    if !crate::utils::validation::validate_national_id(&national_id) {
        return Err(AppError::Validation("Invalid national id".into()));
    }

    let account = state.account_service.find_by_national_id(&national_id).await?;
    Ok(Json(SuccessResponse::new(account)))
}

/// Look up a citizen record in the registry (administrators only)
pub async fn lookup_citizen(
    State(state): State<AppState>,
    Path(national_id): Path<String>,
) -> AppResult<Json<SuccessResponse<CitizenLookupResponse>>> {
    if !crate::utils::validation::validate_national_id(&national_id) {
        return Err(AppError::Validation("Invalid national id".into()));
    }

    let service = state
        .citizen_service
        .as_ref()
        .ok_or_else(|| AppError::Configuration("Citizen registry is not configured".into()))?;

    let record = service.lookup(&national_id).await?;
    Ok(Json(SuccessResponse::new(record.into())))
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<HealthCheckResponse>>> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    };

    Ok(Json(SuccessResponse::new(response)))
}
