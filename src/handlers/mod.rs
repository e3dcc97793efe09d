// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) -> Protected (session auth)
pub mod protected; // Tier 2: session required (/api/admin/*, /api/auth/*)
pub mod public; // Tier 1: no authentication (/api/products, /api/site, /auth/login)
