//! Data Models
//!
//! Core data structures for accounts, one-time codes, audit events, and API
//! request/response payloads.

pub mod account;
pub mod audit;
pub mod auth;
pub mod citizen;
pub mod otp;
pub mod requests;

pub use account::{Account, Role};
pub use audit::{AuditAction, AuditOutcome, NewAuditEvent};
pub use auth::{AuthContext, Claims};
pub use citizen::CitizenRecord;
pub use otp::{OtpChallenge, OtpPurpose};
pub use requests::*;
