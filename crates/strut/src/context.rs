//! Per-request context handed to handlers.

use crate::reply::ApiError;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::str::FromStr;

/// Everything a handler may need from the inbound request except its body
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let query_params = uri
            .query()
            .map(|query| {
                serde_urlencoded::from_str::<HashMap<String, String>>(query).unwrap_or_default()
            })
            .unwrap_or_default();

        Self {
            method,
            uri,
            headers,
            path_params: HashMap::new(),
            query_params,
        }
    }

    /// Build the context from request parts, pulling path parameters from the router
    pub(crate) async fn from_parts(parts: &mut Parts) -> Self {
        let path_params = Path::<HashMap<String, String>>::from_request_parts(parts, &())
            .await
            .map(|Path(params)| params)
            .unwrap_or_default();

        let mut context = Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone());
        context.path_params = path_params;
        context
    }

    /// Attach a path parameter
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Parse a path parameter, answering 400 when it is missing or malformed
    pub fn parse_path_param<T: FromStr>(&self, name: &str) -> Result<T, ApiError> {
        self.path_param(name)
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| {
                ApiError::new(StatusCode::BAD_REQUEST, format!("invalid path parameter '{}'", name))
            })
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Decode the whole query string into `T`
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_urlencoded::from_str(self.uri.query().unwrap_or_default())
            .map_err(|err| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid query: {}", err)))
    }
}
