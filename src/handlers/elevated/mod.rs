// handlers/elevated/mod.rs - admin-only endpoints
//
// Mounted behind the same token middleware as the protected tier; the
// services refuse non-admin principals with 403.

pub mod users;

pub use users::{user_delete, user_get, user_list};
