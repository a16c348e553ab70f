//! Endpoints serving the generated document.

use crate::config::DocsConfig;
use crate::specification::Definition;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Router with the JSON and YAML documentation routes
pub fn routes(definition: Arc<Definition>, config: &DocsConfig) -> Router {
    Router::new()
        .route(&config.json_path, get(serve_json))
        .route(&config.yaml_path, get(serve_yaml))
        .with_state(definition)
}

/// `GET` handler returning the document as `application/json`
pub async fn serve_json(State(definition): State<Arc<Definition>>) -> Response {
    document(definition.to_json(false), "application/json")
}

/// `GET` handler returning the document as `application/yaml`
pub async fn serve_yaml(State(definition): State<Arc<Definition>>) -> Response {
    document(definition.to_yaml(), "application/yaml")
}

fn document(rendered: crate::StrutResult<String>, content_type: &'static str) -> Response {
    match rendered {
        Ok(body) => (
            [(CONTENT_TYPE, HeaderValue::from_static(content_type))],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "error encoding schema");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
