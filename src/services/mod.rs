pub mod auth_service;
pub mod catalog_service;

pub use auth_service::{AuthService, LoginError};
pub use catalog_service::{CatalogError, CatalogService};
