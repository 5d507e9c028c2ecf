//! Security Utilities
//!
//! Password hashing and one-time-code generation.

use chrono::{DateTime, Utc};
use rand::Rng;

/// bcrypt cost used for every stored password hash
pub const BCRYPT_COST: u32 = 10;

/// Hash a password using bcrypt with the service-wide cost factor
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Verify a password against its stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Generate a numeric one-time code of the given length.
///
/// Leading zeros are allowed, so a 6-digit code covers the full
/// 000000..=999999 range.
pub fn generate_otp_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Create an expiration timestamp the given number of minutes from now
pub fn expiration_in_minutes(minutes: i64) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::minutes(minutes)
}

/// Check if a timestamp has expired
pub fn is_expired(expiry: DateTime<Utc>) -> bool {
    Utc::now() > expiry
}
