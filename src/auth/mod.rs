//! Auth module
//!
//! Credential verification and bearer token issuance. Passwords are stored
//! only as salted one-way hashes; tokens are stateless and signed.

pub mod password;
pub mod service;
pub mod token;

pub use service::AuthService;
pub use token::TokenService;
