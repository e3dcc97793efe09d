pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod platform;
pub mod ratelimit;
pub mod server;
pub mod services;
pub mod site;
pub mod state;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use server::app;
pub use state::AppState;
