// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Storefront reads, site information and the rate-limited login.
//
// Security Level: None (anonymous access)
// Route Prefix: /api/products, /api/site, /auth/login
// Middleware: none beyond the global layers; login applies its own rate limit

pub mod login;
pub mod products;
pub mod site;

pub use login::login_post;
pub use products::{product_get, product_metadata, products_list};
pub use site::site_get;
