//! Account Service Server
//!
//! Binds the HTTP server with every service wired up: account lifecycle,
//! audit trail, email delivery, and the optional SMS and citizen registry
//! integrations.

use std::sync::Arc;

use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use account_service::{
    api::{create_routes, AppState},
    config::{AppConfig, SystemParameters},
    database,
    service::{
        AccountService, AuditRecorder, CitizenService, EmailService, JwtService, OtpEngine,
        SmsService,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    log::info!("Starting account service v{}", account_service::VERSION);

    let config = AppConfig::from_env()?;
    config.validate()?;
    log::info!("Configuration loaded for {} environment", config.environment);

    let pool = database::create_pool(&config.database).await?;

    log::info!("Running database migrations");
    database::run_migrations(&pool).await?;

    let parameters = SystemParameters::load(&pool, &config.environment).await?;

    // A missing catalog entry aborts startup rather than dropping audit
    // events later.
    let audit = AuditRecorder::load(&pool).await?;

    let jwt_service = Arc::new(JwtService::new(
        config.jwt.secret.clone(),
        config.jwt.expires_hours,
    ));

    let mailer = Arc::new(EmailService::new(config.email.clone())?);

    let otp_engine = OtpEngine::new(
        parameters.otp_length(),
        parameters.otp_expiration_minutes(),
        parameters.otp_max_attempts(),
    );

    let mut account_service = AccountService::new(
        pool.clone(),
        otp_engine,
        audit,
        (*jwt_service).clone(),
        mailer,
    );

    if let Some(sms_config) = config.sms.clone() {
        log::info!("SMS gateway configured");
        account_service = account_service.with_sms(Arc::new(SmsService::new(sms_config)?));
    } else {
        log::info!("SMS gateway not configured");
    }

    let account_service = Arc::new(account_service);

    let citizen_service = match config.citizen_api.clone() {
        Some(citizen_config) => {
            log::info!("Citizen registry lookup enabled");
            Some(Arc::new(CitizenService::new(pool.clone(), citizen_config)?))
        }
        None => {
            log::info!("Citizen registry lookup not configured");
            None
        }
    };

    let app_state = AppState {
        pool,
        account_service,
        jwt_service,
        citizen_service,
    };

    let app = create_routes(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .into_inner(),
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
