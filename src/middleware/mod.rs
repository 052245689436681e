pub mod auth;
pub mod cors;
pub mod extract;
pub mod response;

pub use auth::jwt_auth_middleware;
pub use cors::{cors_layer, preflight_no_content};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use response::{ApiResponse, ApiResult, Deleted, Paginated};
