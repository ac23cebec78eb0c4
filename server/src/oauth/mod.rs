//! OAuth2 authorization-code client for the Google identity provider
//! This covers the authorization URL, the code exchange and the userinfo lookup

pub mod client;
pub mod state;
pub mod token;

// Re-export main types and functions
pub use client::*;
pub use state::*;
pub use token::*;
