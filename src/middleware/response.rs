use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::models::{Id, Page};

/// `{message, data}` envelope used for mutations.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: Option<T>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, data, StatusCode::OK)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, data, StatusCode::CREATED)
    }

    pub fn with_status(message: impl Into<String>, data: T, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            status_code,
        }
    }
}

impl ApiResponse<()> {
    /// `{message}` alone, for operations with nothing to return.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            status_code: StatusCode::OK,
        }
    }
}

impl ApiResponse<Deleted> {
    pub fn deleted(message: impl Into<String>, id: Id) -> Self {
        Self::ok(message, Deleted { id })
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Id,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = match self.data {
            Some(data) => json!({ "message": self.message, "data": data }),
            None => json!({ "message": self.message }),
        };
        (self.status_code, Json(body)).into_response()
    }
}

/// `{results, limit, offset, count}` envelope; `count` is the total across pages.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub results: Vec<T>,
    pub limit: i64,
    pub offset: i64,
    pub count: i64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new((results, count): (Vec<T>, i64), page: Page) -> Self {
        Self {
            results,
            limit: page.limit,
            offset: page.offset,
            count,
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
