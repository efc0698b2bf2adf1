// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token, owner-scoped)
pub mod protected;
pub mod public;
