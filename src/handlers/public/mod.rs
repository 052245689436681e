// handlers/public/mod.rs - endpoints reachable without a token
//
// Service discovery, health and token acquisition (register, login).

pub mod meta;
pub mod users;

pub use meta::{health, root};
pub use users::{login, register};
