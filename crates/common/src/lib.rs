//! Common utilities shared across Beacon components.

#![warn(clippy::pedantic)]

/// Module for access-token utilities (issuance, validation, claims)
pub mod token;
