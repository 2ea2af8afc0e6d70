// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (Bearer JWT, caller injected as AuthUser)
pub mod protected;
pub mod public;
