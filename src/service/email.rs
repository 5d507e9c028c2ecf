//! Email Service
//!
//! Outbound email delivery for verification codes and account notifications.
//! Delivery sits behind the [`Mailer`] trait so the account service can be
//! tested without an SMTP server.

use async_trait::async_trait;
use chrono::Datelike;
use lettre::{
    message::{header, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::{error, info};
use tera::{Context, Tera};

use crate::config::EmailConfig;
use crate::utils::error::{AppError, AppResult};

/// Outbound mail delivery seam
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver the account verification code issued at registration
    async fn send_verification_code(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> AppResult<()>;

    /// Deliver the second-factor login code
    async fn send_two_factor_code(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> AppResult<()>;

    /// Deliver the password reset code
    async fn send_password_reset_code(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> AppResult<()>;

    /// Notify the holder of a successful login, with the request origin
    /// when known
    async fn send_login_alert(
        &self,
        to_email: &str,
        name: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> AppResult<()>;

    /// Notify the holder that their password was changed
    async fn send_password_changed(&self, to_email: &str, name: &str) -> AppResult<()>;

    /// Notify the holder that their account was blocked or unblocked
    async fn send_status_change(&self, to_email: &str, name: &str, active: bool) -> AppResult<()>;
}

/// SMTP-backed mailer using embedded templates
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    templates: Tera,
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| AppError::Configuration(format!("Failed to configure SMTP relay: {}", e)))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        let mut templates = Tera::default();
        Self::add_embedded_templates(&mut templates)?;

        Ok(Self {
            transport,
            templates,
            config,
        })
    }

    fn add_embedded_templates(tera: &mut Tera) -> AppResult<()> {
        let code_html = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{ subject }}</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { text-align: center; background: #f8f9fa; padding: 20px; border-radius: 8px 8px 0 0; }
        .content { background: white; padding: 30px; border: 1px solid #dee2e6; }
        .code { font-size: 32px; font-weight: bold; color: #007bff; letter-spacing: 4px; text-align: center; margin: 20px 0; padding: 15px; background: #f8f9fa; border-radius: 4px; }
        .footer { background: #f8f9fa; padding: 20px; border-radius: 0 0 8px 8px; text-align: center; font-size: 12px; color: #666; }
    </style>
</head>
<body>
    <div class="header">
        <h1>{{ subject }}</h1>
    </div>
    <div class="content">
        <p>Hello {{ name }},</p>

        <p>{{ intro }}</p>

        <div class="code">{{ code }}</div>

        <p>This code will expire in <strong>{{ expires_in_minutes }} minutes</strong>.</p>

        <p>If you didn't request this code, you can safely ignore this email.</p>

        <p>Best regards,<br>The {{ app_name }} Team</p>
    </div>
    <div class="footer">
        <p>© {{ current_year }} {{ app_name }}. All rights reserved.</p>
    </div>
</body>
</html>
        "#;

        let code_text = r#"
{{ subject }}

Hello {{ name }},

{{ intro }}

Code: {{ code }}

This code will expire in {{ expires_in_minutes }} minutes.

If you didn't request this code, you can safely ignore this email.

Best regards,
The {{ app_name }} Team

© {{ current_year }} {{ app_name }}. All rights reserved.
        "#;

        tera.add_raw_template("code_email.html", code_html)
            .map_err(|e| AppError::Configuration(format!("Failed to add HTML template: {}", e)))?;

        tera.add_raw_template("code_email.txt", code_text)
            .map_err(|e| AppError::Configuration(format!("Failed to add text template: {}", e)))?;

        Ok(())
    }

    /// Render and send a code-carrying email
    async fn send_code_email(
        &self,
        to_email: &str,
        name: &str,
        subject: &str,
        intro: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> AppResult<()> {
        let mut context = Context::new();
        context.insert("subject", subject);
        context.insert("name", name);
        context.insert("intro", intro);
        context.insert("code", code);
        context.insert("expires_in_minutes", &expires_in_minutes);
        context.insert("app_name", &self.config.from_name);
        context.insert("current_year", &chrono::Utc::now().year());

        let html_body = self
            .templates
            .render("code_email.html", &context)
            .map_err(|e| AppError::Internal(format!("Failed to render HTML template: {}", e)))?;

        let text_body = self
            .templates
            .render("code_email.txt", &context)
            .map_err(|e| AppError::Internal(format!("Failed to render text template: {}", e)))?;

        self.send_multipart(to_email, subject, text_body, html_body)
            .await
    }

    /// Send a short notification email without a code
    async fn send_notice_email(&self, to_email: &str, subject: &str, body: &str) -> AppResult<()> {
        let html_body = format!(
            "<p>{}</p><p>Best regards,<br>The {} Team</p>",
            body, self.config.from_name
        );
        let text_body = format!("{}\n\nBest regards,\nThe {} Team", body, self.config.from_name);

        self.send_multipart(to_email, subject, text_body, html_body)
            .await
    }

    async fn send_multipart(
        &self,
        to_email: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> AppResult<()> {
        let message = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| AppError::Configuration(format!("Invalid from address: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::Validation(format!("Invalid recipient email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!("Email '{}' sent to: {}", subject, to_email);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email '{}' to {}: {}", subject, to_email, e);
                Err(AppError::ExternalService(format!(
                    "Failed to send email: {}",
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_verification_code(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> AppResult<()> {
        self.send_code_email(
            to_email,
            name,
            "Verify Your Account",
            "Thank you for signing up! Enter the code below to verify your account:",
            code,
            expires_in_minutes,
        )
        .await
    }

    async fn send_two_factor_code(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> AppResult<()> {
        self.send_code_email(
            to_email,
            name,
            "Your Sign-in Code",
            "Enter the code below to complete your sign-in:",
            code,
            expires_in_minutes,
        )
        .await
    }

    async fn send_password_reset_code(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> AppResult<()> {
        self.send_code_email(
            to_email,
            name,
            "Password Reset Code",
            "We received a request to reset your password. Enter the code below to continue:",
            code,
            expires_in_minutes,
        )
        .await
    }

    async fn send_login_alert(
        &self,
        to_email: &str,
        name: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> AppResult<()> {
        let mut body = format!("Hello {}, we detected a new sign-in to your account.", name);
        if let Some(ip) = ip_address {
            body.push_str(&format!(" IP address: {}.", ip));
        }
        if let Some(agent) = user_agent {
            body.push_str(&format!(" Device: {}.", agent));
        }
        body.push_str(" If this was you, no action is needed.");

        self.send_notice_email(to_email, "New Sign-in to Your Account", &body)
            .await
    }

    async fn send_password_changed(&self, to_email: &str, name: &str) -> AppResult<()> {
        self.send_notice_email(
            to_email,
            "Your Password Was Changed",
            &format!(
                "Hello {}, your password was just changed. If you didn't do this, contact support immediately.",
                name
            ),
        )
        .await
    }

    async fn send_status_change(&self, to_email: &str, name: &str, active: bool) -> AppResult<()> {
        let (subject, body) = if active {
            (
                "Your Account Was Reactivated",
                format!("Hello {}, your account has been reactivated and you can sign in again.", name),
            )
        } else {
            (
                "Your Account Was Blocked",
                format!("Hello {}, your account has been blocked. Contact support for details.", name),
            )
        };

        self.send_notice_email(to_email, subject, &body).await
    }
}
