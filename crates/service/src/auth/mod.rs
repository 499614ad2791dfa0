//! Authentication: credential checks at login, token issuance and verification.
//!
//! Tokens are self-contained; verifying one never touches the store.

pub mod domain;
pub mod password;
pub mod service;
pub mod token;

pub use password::Passwords;
pub use service::AuthService;
pub use token::TokenKeys;
