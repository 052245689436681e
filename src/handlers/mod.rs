// handlers/mod.rs - three security tiers
//
// Public (no token) → Protected (bearer token) → Elevated (admin token).
// The tier decides which middleware the router wraps the routes in; the
// handlers themselves only translate between HTTP and the services.

pub mod elevated;
pub mod protected;
pub mod public;
