// handlers/protected/mod.rs - endpoints that require a bearer token
//
// The auth middleware has already placed a `Principal` in the request;
// every handler here takes it as an extractor.

pub mod campaigns;
pub mod characters;
pub mod content;
pub mod dice;
pub mod homebrew;
pub mod instances;
pub mod users;

use serde::Serialize;

use crate::middleware::ApiResponse;
use crate::services::Generated;

/// 201 for generated content, saved or not.
pub(crate) fn generated<T: Serialize>(what: &str, generated: Generated<T>) -> ApiResponse<T> {
    if generated.saved {
        ApiResponse::created(format!("{} generated", what), generated.entity)
    } else {
        ApiResponse::created("generated but not saved", generated.entity)
    }
}
