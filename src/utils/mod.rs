//! Shared utilities for security, validation, and error handling

pub mod error;
pub mod security;
pub mod validation;
