//! Service Layer
//!
//! Business logic for accounts, one-time codes, auditing, tokens, and
//! outbound delivery channels.

pub mod account;
pub mod audit;
pub mod citizen;
pub mod email;
pub mod jwt;
pub mod otp;
pub mod sms;

pub use account::{AccountService, AccountServiceError, LoginOutcome};
pub use audit::{AuditError, AuditRecorder};
pub use citizen::{CitizenError, CitizenService};
pub use email::{EmailService, Mailer};
pub use jwt::{JwtError, JwtService};
pub use otp::{OtpEngine, OtpError};
pub use sms::SmsService;
