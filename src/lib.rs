//! Account Service Library
//!
//! A user-account service providing registration with emailed verification
//! codes, password and two-factor login, password reset, administrative
//! blocking, and a full audit trail. Includes a cached lookup against an
//! external citizen registry.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use account_service::{
//!     api::{create_routes, AppState},
//!     config::AppConfig,
//!     database,
//!     service::{AccountService, AuditRecorder, EmailService, JwtService, OtpEngine},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pool = database::create_pool(&config.database).await?;
//!
//!     let audit = AuditRecorder::load(&pool).await?;
//!     let jwt = Arc::new(JwtService::new(
//!         config.jwt.secret.clone(),
//!         config.jwt.expires_hours,
//!     ));
//!     let mailer = Arc::new(EmailService::new(config.email.clone())?);
//!     let accounts = AccountService::new(
//!         pool.clone(),
//!         OtpEngine::new(6, 15, 5),
//!         audit,
//!         (*jwt).clone(),
//!         mailer,
//!     );
//!
//!     let app = create_routes(AppState {
//!         pool,
//!         account_service: Arc::new(accounts),
//!         jwt_service: jwt,
//!         citizen_service: None,
//!     });
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers, routing, and authentication middleware
//! - **Service Layer**: Account lifecycle, one-time codes, auditing, tokens,
//!   outbound email/SMS, and the citizen registry cache
//! - **Models**: Data structures and request/response payloads
//! - **Database**: Connection pooling and migrations
//! - **Utils**: Password hashing, validation, and error handling

/// HTTP API layer with handlers, routes, and middleware
pub mod api;

/// Configuration loaded from the environment and the database
pub mod config;

/// Database connection management
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Business logic services
pub mod service;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{create_routes, AppState};
pub use models::{
    account::{Account, Role},
    audit::{AuditAction, AuditOutcome, NewAuditEvent},
    auth::{AuthContext, Claims},
    citizen::CitizenRecord,
    otp::OtpPurpose,
    requests::{
        ChangePasswordRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
        PasswordResetRequest, RegisterRequest, SetAccountStateRequest, TwoFactorVerifyRequest,
        VerifyAccountRequest,
    },
};
pub use service::{
    AccountService, AuditRecorder, CitizenService, EmailService, JwtService, LoginOutcome, Mailer,
    OtpEngine, SmsService,
};
pub use utils::error::{AppError, AppResult, ErrorResponse};

pub use config::{AppConfig, SystemParameters};
pub use database::DatabasePool;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
