//! Handler results and their conversion into HTTP responses.

use crate::Reflect;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// The JSON body used for error replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Reflect, thiserror::Error)]
#[error("{status_code}: {error}")]
pub struct ApiError {
    /// Error code
    pub status_code: u16,
    /// Error message
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            error: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        json_response(status, serde_json::to_vec(&self))
    }
}

/// What a handler answers with
///
/// `T` is the documented success body. Other statuses carry whatever body
/// they were given; keeping those in line with the documented responses is
/// up to the handler.
#[derive(Debug)]
pub struct Reply<T> {
    inner: ReplyInner<T>,
}

#[derive(Debug)]
enum ReplyInner<T> {
    /// Success body, sent with the route's primary status
    Ok(T),
    Encoded {
        status: StatusCode,
        body: Result<Vec<u8>, serde_json::Error>,
    },
    Raw(Response),
}

impl<T> Reply<T> {
    /// Answer with the route's primary status
    pub fn ok(body: T) -> Self {
        Self {
            inner: ReplyInner::Ok(body),
        }
    }

    /// Answer with any status and any JSON body
    pub fn with_status<B: Serialize>(status: StatusCode, body: B) -> Self {
        Self {
            inner: ReplyInner::Encoded {
                status,
                body: serde_json::to_vec(&body),
            },
        }
    }

    /// Answer with an [`ApiError`] body
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::with_status(status, ApiError::new(status, message))
    }

    /// Take full control of the response
    pub fn raw(response: impl IntoResponse) -> Self {
        Self {
            inner: ReplyInner::Raw(response.into_response()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.inner, ReplyInner::Ok(_))
    }
}

impl<T: Serialize> Reply<T> {
    /// Encode into a response, using `primary` for successful bodies
    pub fn into_response_with(self, primary: StatusCode) -> Response {
        match self.inner {
            ReplyInner::Ok(body) => json_response(primary, serde_json::to_vec(&body)),
            ReplyInner::Encoded { status, body } => json_response(status, body),
            ReplyInner::Raw(response) => response,
        }
    }
}

impl<T> From<ApiError> for Reply<T> {
    fn from(error: ApiError) -> Self {
        Self::with_status(error.status(), error)
    }
}

/// Handler return types
///
/// `Body` is the success payload; its schema is what gets documented.
pub trait IntoReply: Send {
    type Body: Reflect + Serialize + Send + 'static;

    fn into_reply(self) -> Reply<Self::Body>;
}

impl<T> IntoReply for Reply<T>
where
    T: Reflect + Serialize + Send + 'static,
{
    type Body = T;

    fn into_reply(self) -> Reply<T> {
        self
    }
}

impl<T> IntoReply for Result<T, ApiError>
where
    T: Reflect + Serialize + Send + 'static,
{
    type Body = T;

    fn into_reply(self) -> Reply<T> {
        match self {
            Ok(body) => Reply::ok(body),
            Err(error) => error.into(),
        }
    }
}

fn json_response(status: StatusCode, body: Result<Vec<u8>, serde_json::Error>) -> Response {
    match body {
        Ok(bytes) => (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "error encoding response");
            let fallback = ApiError::internal("could not encode response");
            match serde_json::to_vec(&fallback) {
                Ok(bytes) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                    bytes,
                )
                    .into_response(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
    }
}
