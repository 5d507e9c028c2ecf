//! Account Service
//!
//! Core business logic for registration, login, verification, password
//! management, and administrative state changes. Every security-relevant
//! operation records an audit event; failure-path events are written
//! best-effort so the primary error always reaches the caller.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::account::{Account, AccountWithPassword, Role, ROLE_ADMIN};
use crate::models::audit::{AuditAction, AuditOutcome, NewAuditEvent};
use crate::models::otp::OtpPurpose;
use crate::models::requests::{RegisterRequest, RequestContext, SetAccountStateRequest};
use crate::service::audit::{AuditError, AuditRecorder};
use crate::service::email::Mailer;
use crate::service::jwt::{JwtError, JwtService};
use crate::service::otp::{OtpEngine, OtpError};
use crate::service::sms::SmsService;
use crate::utils::error::AppError;
use crate::utils::security;
use crate::utils::validation::normalize_email;

/// Errors produced by account operations
#[derive(Error, Debug)]
pub enum AccountServiceError {
    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account exists but has been blocked by an administrator
    #[error("Account is blocked")]
    AccountLocked,

    /// The account has not completed verification yet
    #[error("Account is not verified")]
    AccountNotVerified,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("National id is already registered")]
    DuplicateNationalId,

    /// Administrators cannot change their own account state
    #[error("Cannot change the state of your own account")]
    SelfTarget,

    /// Administrator accounts cannot be blocked or unblocked
    #[error("Administrator accounts cannot be blocked")]
    ProtectedRole,

    /// The requested role does not exist or is closed for self-registration
    #[error("Selected role is not available")]
    RoleNotAvailable,

    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl From<AccountServiceError> for AppError {
    fn from(err: AccountServiceError) -> Self {
        match err {
            AccountServiceError::InvalidCredentials => {
                AppError::Authentication("Invalid email or password".to_string())
            }
            AccountServiceError::AccountLocked => {
                AppError::Authorization("Account is blocked".to_string())
            }
            AccountServiceError::AccountNotVerified => {
                AppError::Authorization("Account is not verified".to_string())
            }
            AccountServiceError::AccountNotFound => {
                AppError::NotFound("Account not found".to_string())
            }
            AccountServiceError::DuplicateEmail => {
                AppError::Conflict("Email is already registered".to_string())
            }
            AccountServiceError::DuplicateNationalId => {
                AppError::Conflict("National id is already registered".to_string())
            }
            AccountServiceError::SelfTarget => {
                AppError::Validation("Cannot change the state of your own account".to_string())
            }
            AccountServiceError::ProtectedRole => {
                AppError::Authorization("Administrator accounts cannot be blocked".to_string())
            }
            AccountServiceError::RoleNotAvailable => {
                AppError::Validation("Selected role is not available".to_string())
            }
            AccountServiceError::EmailDelivery(msg) => AppError::ExternalService(msg),
            AccountServiceError::Otp(e) => e.into(),
            AccountServiceError::Audit(e) => e.into(),
            AccountServiceError::Jwt(e) => e.into(),
            AccountServiceError::Database(e) => AppError::Database(e),
            AccountServiceError::Hashing(e) => AppError::Hashing(e),
        }
    }
}

/// Result of a successful credential check
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials accepted, token issued
    Authenticated {
        account: Account,
        access_token: String,
        expires_in: i64,
    },
    /// Credentials accepted, a second-factor code was sent
    TwoFactorRequired,
}

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, role_id, phone, national_id, \
                               active, verified, two_factor_enabled, created_at, updated_at";

/// Account lifecycle operations
#[derive(Clone)]
pub struct AccountService {
    pool: PgPool,
    otp: OtpEngine,
    audit: AuditRecorder,
    jwt: JwtService,
    mailer: Arc<dyn Mailer>,
    sms: Option<Arc<SmsService>>,
}

impl AccountService {
    pub fn new(
        pool: PgPool,
        otp: OtpEngine,
        audit: AuditRecorder,
        jwt: JwtService,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            pool,
            otp,
            audit,
            jwt,
            mailer,
            sms: None,
        }
    }

    /// Also deliver second-factor codes over SMS when the holder has a
    /// phone number on file
    pub fn with_sms(mut self, sms: Arc<SmsService>) -> Self {
        self.sms = Some(sms);
        self
    }

    /// Register a new client account.
    ///
    /// The account row, client profile, verification challenge, audit event,
    /// and verification email all succeed or fail together: a failed email
    /// rolls everything back so the holder can retry with the same data.
    pub async fn register(
        &self,
        request: &RegisterRequest,
        ctx: &RequestContext,
    ) -> Result<Account, AccountServiceError> {
        let email = normalize_email(&request.email);
        let password_hash = security::hash_password(&request.password)?;

        let mut tx = self.pool.begin().await?;

        // The administrator role is not open for self-registration
        let role_id: i32 = sqlx::query_scalar(
            "SELECT id FROM roles
             WHERE id = $1 AND active = TRUE AND visible_at_registration = TRUE",
        )
        .bind(request.role_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AccountServiceError::RoleNotAvailable)?;

        let account: AccountWithPassword = sqlx::query_as(&format!(
            "INSERT INTO accounts (name, email, password_hash, role_id, phone, national_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(request.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(role_id)
        .bind(&request.phone)
        .bind(&request.national_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_duplicate_account)?;

        sqlx::query("INSERT INTO client_profiles (account_id, address) VALUES ($1, $2)")
            .bind(account.id)
            .bind(&request.address)
            .execute(&mut *tx)
            .await?;

        let challenge = self
            .otp
            .issue(&mut tx, account.id, OtpPurpose::AccountVerification)
            .await?;

        let event = NewAuditEvent::new(AuditAction::UserRegistered, AuditOutcome::Success)
            .actor(account.id)
            .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
        self.audit.record(&mut *tx, &event).await?;

        let expires_in_minutes =
            (challenge.expires_at - chrono::Utc::now()).num_minutes().max(1);
        self.mailer
            .send_verification_code(&account.email, &account.name, &challenge.code, expires_in_minutes)
            .await
            .map_err(|e| AccountServiceError::EmailDelivery(e.to_string()))?;

        tx.commit().await?;

        // SMS is a best-effort secondary channel
        if let (Some(sms), Some(phone)) = (&self.sms, &account.phone) {
            if let Err(err) = sms.send_code(phone, &challenge.code, expires_in_minutes).await {
                log::warn!("Verification SMS to account {} failed: {}", account.id, err);
            }
        }

        log::info!("Registered account {} ({})", account.id, account.email);
        Ok(account.into())
    }

    /// Roles a client may pick at registration
    pub async fn list_registration_roles(&self) -> Result<Vec<Role>, AccountServiceError> {
        let roles = sqlx::query_as(
            "SELECT id, name, active, visible_at_registration
             FROM roles
             WHERE active = TRUE AND visible_at_registration = TRUE
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// Check credentials and either issue a token or start the second
    /// factor.
    ///
    /// Guard order matters: a blocked account is reported as blocked even
    /// when the password is wrong, and an unverified account is reported
    /// before the password is checked.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ctx: &RequestContext,
    ) -> Result<LoginOutcome, AccountServiceError> {
        let email = normalize_email(email);

        let Some(account) = self.fetch_by_email(&email).await? else {
            let event = NewAuditEvent::new(AuditAction::LoginFailed, AuditOutcome::Failure)
                .request_info(ctx.ip_address.clone(), ctx.user_agent.clone())
                .details(serde_json::json!({"email": email, "reason": "unknown_email"}));
            self.audit.record_best_effort(&self.pool, &event).await;
            return Err(AccountServiceError::InvalidCredentials);
        };

        if !account.active {
            let event = NewAuditEvent::new(AuditAction::LoginFailedLocked, AuditOutcome::Failure)
                .actor(account.id)
                .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
            self.audit.record_best_effort(&self.pool, &event).await;
            return Err(AccountServiceError::AccountLocked);
        }

        if !account.verified {
            let event =
                NewAuditEvent::new(AuditAction::LoginFailedUnverified, AuditOutcome::Failure)
                    .actor(account.id)
                    .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
            self.audit.record_best_effort(&self.pool, &event).await;
            return Err(AccountServiceError::AccountNotVerified);
        }

        if !security::verify_password(password, &account.password_hash)? {
            let event = NewAuditEvent::new(AuditAction::LoginFailed, AuditOutcome::Failure)
                .actor(account.id)
                .request_info(ctx.ip_address.clone(), ctx.user_agent.clone())
                .details(serde_json::json!({"reason": "wrong_password"}));
            self.audit.record_best_effort(&self.pool, &event).await;
            return Err(AccountServiceError::InvalidCredentials);
        }

        if account.two_factor_enabled {
            let mut tx = self.pool.begin().await?;
            let challenge = self
                .otp
                .issue(&mut tx, account.id, OtpPurpose::LoginTwoFactor)
                .await?;
            tx.commit().await?;

            let expires_in_minutes =
                (challenge.expires_at - chrono::Utc::now()).num_minutes().max(1);
            self.mailer
                .send_two_factor_code(&account.email, &account.name, &challenge.code, expires_in_minutes)
                .await
                .map_err(|e| AccountServiceError::EmailDelivery(e.to_string()))?;

            // SMS is a best-effort secondary channel
            if let (Some(sms), Some(phone)) = (&self.sms, &account.phone) {
                if let Err(err) = sms.send_code(phone, &challenge.code, expires_in_minutes).await {
                    log::warn!("SMS code to account {} failed: {}", account.id, err);
                }
            }

            return Ok(LoginOutcome::TwoFactorRequired);
        }

        self.grant_access(&account, ctx).await
    }

    /// Complete a two-factor login with the emailed code
    pub async fn verify_two_factor(
        &self,
        email: &str,
        code: &str,
        ctx: &RequestContext,
    ) -> Result<LoginOutcome, AccountServiceError> {
        let email = normalize_email(email);

        let Some(account) = self.fetch_by_email(&email).await? else {
            return Err(AccountServiceError::InvalidCredentials);
        };

        if !account.active {
            return Err(AccountServiceError::AccountLocked);
        }

        let mut tx = self.pool.begin().await?;
        let validation = self
            .otp
            .validate(&mut tx, account.id, OtpPurpose::LoginTwoFactor, code)
            .await;

        match validation {
            Ok(()) => {
                tx.commit().await?;
                self.grant_access(&account, ctx).await
            }
            Err(err) => {
                tx.commit().await?;
                let event = NewAuditEvent::new(AuditAction::LoginFailed, AuditOutcome::Failure)
                    .actor(account.id)
                    .request_info(ctx.ip_address.clone(), ctx.user_agent.clone())
                    .details(serde_json::json!({"reason": "second_factor"}));
                self.audit.record_best_effort(&self.pool, &event).await;
                Err(err.into())
            }
        }
    }

    /// Verify a freshly registered account with the emailed code
    pub async fn verify_account(
        &self,
        email: &str,
        code: &str,
        ctx: &RequestContext,
    ) -> Result<Account, AccountServiceError> {
        let email = normalize_email(email);

        let Some(account) = self.fetch_by_email(&email).await? else {
            return Err(AccountServiceError::AccountNotFound);
        };

        let mut tx = self.pool.begin().await?;
        let validation = self
            .otp
            .validate(&mut tx, account.id, OtpPurpose::AccountVerification, code)
            .await;

        match validation {
            Ok(()) => {
                let updated: AccountWithPassword = sqlx::query_as(&format!(
                    "UPDATE accounts SET verified = TRUE, updated_at = NOW()
                     WHERE id = $1
                     RETURNING {ACCOUNT_COLUMNS}"
                ))
                .bind(account.id)
                .fetch_one(&mut *tx)
                .await?;

                let event =
                    NewAuditEvent::new(AuditAction::VerifyAccountSuccess, AuditOutcome::Success)
                        .actor(account.id)
                        .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
                self.audit.record(&mut *tx, &event).await?;

                tx.commit().await?;
                Ok(updated.into())
            }
            Err(err) => {
                // Keep attempt-counter and voiding updates from the engine
                tx.commit().await?;
                let event =
                    NewAuditEvent::new(AuditAction::VerifyAccountFailed, AuditOutcome::Failure)
                        .actor(account.id)
                        .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
                self.audit.record_best_effort(&self.pool, &event).await;
                Err(err.into())
            }
        }
    }

    /// Change the password of the authenticated account.
    ///
    /// Nothing is mutated when the current password does not match.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        current_password: &str,
        new_password: &str,
        ctx: &RequestContext,
    ) -> Result<(), AccountServiceError> {
        let Some(account) = self.fetch_by_id(account_id).await? else {
            return Err(AccountServiceError::AccountNotFound);
        };

        if !security::verify_password(current_password, &account.password_hash)? {
            let event =
                NewAuditEvent::new(AuditAction::PasswordUpdateFailed, AuditOutcome::Failure)
                    .actor(account.id)
                    .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
            self.audit.record_best_effort(&self.pool, &event).await;
            return Err(AccountServiceError::InvalidCredentials);
        }

        let password_hash = security::hash_password(new_password)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(account.id)
            .bind(&password_hash)
            .execute(&mut *tx)
            .await?;

        let event = NewAuditEvent::new(AuditAction::PasswordUpdated, AuditOutcome::Success)
            .actor(account.id)
            .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
        self.audit.record(&mut *tx, &event).await?;
        tx.commit().await?;

        if let Err(err) = self
            .mailer
            .send_password_changed(&account.email, &account.name)
            .await
        {
            log::warn!("Password-changed notice to {} failed: {}", account.email, err);
        }

        Ok(())
    }

    /// Start a password reset.
    ///
    /// Always reports success so the endpoint cannot be used to probe which
    /// emails are registered; even a failed send is only logged, since an
    /// error here would reveal that the email has an account. A code is only
    /// issued for active accounts.
    pub async fn request_password_reset(
        &self,
        email: &str,
        ctx: &RequestContext,
    ) -> Result<(), AccountServiceError> {
        let email = normalize_email(email);

        let Some(account) = self.fetch_by_email(&email).await? else {
            log::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        if !account.active {
            log::debug!("Password reset requested for blocked account {}", account.id);
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        let challenge = self
            .otp
            .issue(&mut tx, account.id, OtpPurpose::PasswordReset)
            .await?;

        let event = NewAuditEvent::new(AuditAction::PasswordResetRequested, AuditOutcome::Success)
            .actor(account.id)
            .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
        self.audit.record(&mut *tx, &event).await?;

        tx.commit().await?;

        let expires_in_minutes =
            (challenge.expires_at - chrono::Utc::now()).num_minutes().max(1);
        if let Err(err) = self
            .mailer
            .send_password_reset_code(&account.email, &account.name, &challenge.code, expires_in_minutes)
            .await
        {
            log::warn!("Password reset code to {} failed to send: {}", account.email, err);
        }

        Ok(())
    }

    /// Complete a password reset with the emailed code
    pub async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
        ctx: &RequestContext,
    ) -> Result<(), AccountServiceError> {
        let email = normalize_email(email);

        // Unknown emails get the same error as a missing challenge
        let Some(account) = self.fetch_by_email(&email).await? else {
            return Err(OtpError::NoPendingChallenge.into());
        };

        let mut tx = self.pool.begin().await?;
        let validation = self
            .otp
            .validate(&mut tx, account.id, OtpPurpose::PasswordReset, code)
            .await;

        match validation {
            Ok(()) => {
                let password_hash = security::hash_password(new_password)?;
                sqlx::query(
                    "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(account.id)
                .bind(&password_hash)
                .execute(&mut *tx)
                .await?;

                let event =
                    NewAuditEvent::new(AuditAction::PasswordResetCompleted, AuditOutcome::Success)
                        .actor(account.id)
                        .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
                self.audit.record(&mut *tx, &event).await?;
                tx.commit().await?;

                if let Err(err) = self
                    .mailer
                    .send_password_changed(&account.email, &account.name)
                    .await
                {
                    log::warn!(
                        "Password-changed notice to {} failed: {}",
                        account.email,
                        err
                    );
                }

                Ok(())
            }
            Err(err) => {
                tx.commit().await?;
                let event =
                    NewAuditEvent::new(AuditAction::PasswordResetFailed, AuditOutcome::Failure)
                        .actor(account.id)
                        .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
                self.audit.record_best_effort(&self.pool, &event).await;
                Err(err.into())
            }
        }
    }

    /// Block or unblock an account (administrators only).
    ///
    /// Targets are named by national id, the identifier administrators work
    /// with. Administrators cannot target themselves or other administrator
    /// accounts. Setting the state an account already has is a no-op that
    /// records nothing.
    pub async fn set_account_state(
        &self,
        actor_id: Uuid,
        target_national_id: &str,
        request: &SetAccountStateRequest,
        ctx: &RequestContext,
    ) -> Result<(Account, bool), AccountServiceError> {
        let Some(target) = self.fetch_by_national_id(target_national_id).await? else {
            return Err(AccountServiceError::AccountNotFound);
        };

        if target.id == actor_id {
            return Err(AccountServiceError::SelfTarget);
        }

        let role_name: String = sqlx::query_scalar("SELECT name FROM roles WHERE id = $1")
            .bind(target.role_id)
            .fetch_one(&self.pool)
            .await?;
        if role_name == ROLE_ADMIN {
            return Err(AccountServiceError::ProtectedRole);
        }

        if target.active == request.active {
            return Ok((target.into(), false));
        }

        let mut tx = self.pool.begin().await?;
        let updated: AccountWithPassword = sqlx::query_as(&format!(
            "UPDATE accounts SET active = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(target.id)
        .bind(request.active)
        .fetch_one(&mut *tx)
        .await?;

        let action = if request.active {
            AuditAction::UserUnblocked
        } else {
            AuditAction::UserBlocked
        };
        let mut event = NewAuditEvent::new(action, AuditOutcome::Success)
            .actor(actor_id)
            .target(target.id)
            .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
        if let Some(reason) = &request.reason {
            event = event.details(serde_json::json!({"reason": reason}));
        }
        self.audit.record(&mut *tx, &event).await?;
        tx.commit().await?;

        if let Err(err) = self
            .mailer
            .send_status_change(&updated.email, &updated.name, request.active)
            .await
        {
            log::warn!("Status-change notice to {} failed: {}", updated.email, err);
        }

        Ok((updated.into(), true))
    }

    /// Enable or disable the second login factor for an account
    pub async fn set_two_factor(
        &self,
        account_id: Uuid,
        enabled: bool,
        ctx: &RequestContext,
    ) -> Result<Account, AccountServiceError> {
        let Some(account) = self.fetch_by_id(account_id).await? else {
            return Err(AccountServiceError::AccountNotFound);
        };

        if account.two_factor_enabled == enabled {
            return Ok(account.into());
        }

        let mut tx = self.pool.begin().await?;
        let updated: AccountWithPassword = sqlx::query_as(&format!(
            "UPDATE accounts SET two_factor_enabled = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(account.id)
        .bind(enabled)
        .fetch_one(&mut *tx)
        .await?;

        let action = if enabled {
            AuditAction::TwoFactorEnabled
        } else {
            AuditAction::TwoFactorDisabled
        };
        let event = NewAuditEvent::new(action, AuditOutcome::Success)
            .actor(account.id)
            .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
        self.audit.record(&mut *tx, &event).await?;
        tx.commit().await?;

        Ok(updated.into())
    }

    /// Look up an account by id
    pub async fn get_account(&self, account_id: Uuid) -> Result<Account, AccountServiceError> {
        self.fetch_by_id(account_id)
            .await?
            .map(Into::into)
            .ok_or(AccountServiceError::AccountNotFound)
    }

    /// Look up an account by national id (administrators only)
    pub async fn find_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Account, AccountServiceError> {
        self.fetch_by_national_id(national_id)
            .await?
            .map(Into::into)
            .ok_or(AccountServiceError::AccountNotFound)
    }

    /// Issue a token, record the successful login, and send the alert
    async fn grant_access(
        &self,
        account: &AccountWithPassword,
        ctx: &RequestContext,
    ) -> Result<LoginOutcome, AccountServiceError> {
        let role_name: String = sqlx::query_scalar("SELECT name FROM roles WHERE id = $1")
            .bind(account.role_id)
            .fetch_one(&self.pool)
            .await?;

        let public = Account {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role_id: account.role_id,
            phone: account.phone.clone(),
            national_id: account.national_id.clone(),
            active: account.active,
            verified: account.verified,
            two_factor_enabled: account.two_factor_enabled,
            created_at: account.created_at,
            updated_at: account.updated_at,
        };

        let access_token = self.jwt.issue_token(&public, &role_name)?;

        let event = NewAuditEvent::new(AuditAction::LoginSuccess, AuditOutcome::Success)
            .actor(account.id)
            .request_info(ctx.ip_address.clone(), ctx.user_agent.clone());
        self.audit.record_best_effort(&self.pool, &event).await;

        if let Err(err) = self
            .mailer
            .send_login_alert(
                &account.email,
                &account.name,
                ctx.ip_address.as_deref(),
                ctx.user_agent.as_deref(),
            )
            .await
        {
            log::warn!("Login alert to {} failed: {}", account.email, err);
        }

        Ok(LoginOutcome::Authenticated {
            account: public,
            access_token,
            expires_in: self.jwt.expires_in_seconds(),
        })
    }

    async fn fetch_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountWithPassword>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<AccountWithPassword>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn fetch_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<AccountWithPassword>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE national_id = $1"
        ))
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Translate unique-constraint violations into duplicate errors
fn map_duplicate_account(err: sqlx::Error) -> AccountServiceError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("accounts_email_key") => return AccountServiceError::DuplicateEmail,
            Some("accounts_national_id_key") => return AccountServiceError::DuplicateNationalId,
            _ => {}
        }
    }
    AccountServiceError::Database(err)
}
