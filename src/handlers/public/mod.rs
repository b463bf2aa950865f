// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, password reset, health, and read-only resource views.
// Route Prefix: /api/v1/auth/*, /api/*, /health
// Middleware: advanced results on list routes only

pub mod auth;
pub mod health;
pub mod incidents;
pub mod missions;
pub mod reports;
