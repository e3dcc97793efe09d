// handlers/protected/mod.rs - Protected handlers (session required)
//
// Security Level: platform access token (Bearer header or session cookie)
// Route Prefix: /api/admin/*, /api/auth/*
// Middleware: session_auth_middleware injects AuthUser; writes reuse the
// caller's token so the table's row-level policies apply

pub mod products;
pub mod session;

pub use products::{admin_product_create, admin_product_delete, admin_product_update, admin_products_list};
pub use session::{session_logout, session_whoami};
