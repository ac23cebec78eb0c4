pub mod auth;
pub mod cookies;
pub mod errors;
pub mod jwt;
pub mod oauth;
pub mod payment;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use state::{AppState, Config};
