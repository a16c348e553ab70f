use axum::body::Body;
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strut::{
    ApiError, DuplicatePolicy, Op, Reflect, Reply, RequestContext, Strut, StrutConfig,
};
use tower::util::MapResponseLayer;
use tower::ServiceExt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct Pet {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct NewPet {
    pub name: String,
}

async fn get_pet(ctx: RequestContext) -> Result<Pet, ApiError> {
    let id: u64 = ctx.parse_path_param("id")?;
    if id == 0 {
        return Err(ApiError::not_found("Pet not found"));
    }
    Ok(Pet {
        id,
        name: ctx.query_param("name").unwrap_or("Rex").to_string(),
    })
}

async fn create_pet(_ctx: RequestContext, pet: NewPet) -> Reply<Pet> {
    Reply::ok(Pet { id: 7, name: pet.name })
}

async fn teapot(_ctx: RequestContext) -> Reply<Pet> {
    Reply::error(StatusCode::IM_A_TEAPOT, "short and stout")
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };

    router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn pet_api() -> Strut {
    let mut strut = Strut::new(StrutConfig::new("Pets", "1.0.0")).unwrap();
    strut
        .get("/pets/{id}", get_pet, Op::new().operation_id("getPet"))
        .unwrap()
        .post("/pets", create_pet, Op::new().operation_id("createPet").status(201))
        .unwrap();
    strut
}

#[tokio::test]
async fn test_get_with_path_and_query() {
    let router = pet_api().into_router();

    let response = send(&router, Method::GET, "/pets/3?name=Tom", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(body_json(response).await, json!({"id": 3, "name": "Tom"}));
}

#[tokio::test]
async fn test_handler_errors_use_api_error_body() {
    let router = pet_api().into_router();

    let response = send(&router, Method::GET, "/pets/0", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"status_code": 404, "error": "Pet not found"})
    );

    let response = send(&router, Method::GET, "/pets/abc", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_handler_controls_status() {
    let mut strut = Strut::default();
    strut
        .get(
            "/teapot",
            teapot,
            Op::new().response_description(418, "I'm a teapot"),
        )
        .unwrap();
    let router = strut.into_router();

    let response = send(&router, Method::GET, "/teapot", None).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_json(response).await["status_code"], 418);
}

#[tokio::test]
async fn test_post_uses_primary_status() {
    let router = pet_api().into_router();

    let response = send(&router, Method::POST, "/pets", Some(json!({"name": "Kitty"}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"id": 7, "name": "Kitty"}));
}

#[tokio::test]
async fn test_decode_failure_skips_handler() {
    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);

    let mut strut = Strut::default();
    strut
        .put(
            "/pets/{id}",
            move |_ctx: RequestContext, pet: NewPet| {
                let flag = Arc::clone(&flag);
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Reply::ok(Pet { id: 1, name: pet.name })
                }
            },
            Op::new(),
        )
        .unwrap();
    let router = strut.into_router();

    let response = send(&router, Method::PUT, "/pets/1", Some(json!({"nickname": 5}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"status_code": 400, "error": "could not decode request"})
    );

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/pets/1")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_body_limit() {
    let config = StrutConfig::default().with_body_limit(16);
    let mut strut = Strut::new(config).unwrap();
    strut.patch("/pets/{id}", create_pet, Op::new()).unwrap();
    let router = strut.into_router();

    let long_name = "x".repeat(64);
    let response = send(&router, Method::PATCH, "/pets/1", Some(json!({"name": long_name}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_method_routing() {
    let mut strut = Strut::default();
    strut
        .get("/pets/{id}", get_pet, Op::new())
        .unwrap()
        .delete(
            "/pets/{id}",
            |_ctx: RequestContext| async { Reply::<Pet>::raw(StatusCode::NO_CONTENT) },
            Op::new().response_description(204, "Deleted"),
        )
        .unwrap();
    let router = strut.into_router();

    let response = send(&router, Method::DELETE, "/pets/1", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&router, Method::POST, "/pets/1", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_overwrite_replaces_handler() {
    let mut strut =
        Strut::new(StrutConfig::default().with_duplicate_policy(DuplicatePolicy::Overwrite)).unwrap();
    strut.get("/pets/{id}", get_pet, Op::new()).unwrap();
    strut.get("/pets/{id}", teapot, Op::new()).unwrap();
    let router = strut.into_router();

    let response = send(&router, Method::GET, "/pets/1", None).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
}

#[tokio::test]
async fn test_docs_endpoints() {
    let (router, definition) = pet_api().into_parts();

    let response = send(&router, Method::GET, "/.well-known/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    let json = body_json(response).await;
    assert_eq!(json, serde_json::to_value(definition.as_ref()).unwrap());
    assert_eq!(json["info"]["title"], "Pets");
    assert!(json["paths"]["/pets/{id}"]["get"].is_object());

    let response = send(&router, Method::GET, "/.well-known/openapi.yaml", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/yaml");
    let yaml: Value = serde_yaml::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(yaml, json);
}

#[tokio::test]
async fn test_docs_paths_are_configurable() {
    let config = StrutConfig::default().with_docs_paths("/docs/api.json", "/docs/api.yaml");
    let router = Strut::new(config).unwrap().into_router();

    let response = send(&router, Method::GET, "/docs/api.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&router, Method::GET, "/.well-known/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_relative_docs_path_is_rejected_before_routing() {
    let config = StrutConfig::default().with_docs_paths("openapi.json", "/openapi.yaml");
    assert!(matches!(Strut::new(config), Err(strut::StrutError::Config(_))));
}

#[tokio::test]
async fn test_docs_can_be_disabled() {
    let router = Strut::new(StrutConfig::default().without_docs())
        .unwrap()
        .into_router();

    let response = send(&router, Method::GET, "/.well-known/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn tag_response(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert("x-layered", HeaderValue::from_static("yes"));
    response
}

#[tokio::test]
async fn test_layers_apply_to_earlier_routes_only() {
    let mut strut = Strut::default();
    strut.get("/before", teapot, Op::new()).unwrap();
    strut.layer(MapResponseLayer::new(tag_response));
    strut.get("/after", teapot, Op::new()).unwrap();
    let router = strut.into_router();

    let response = send(&router, Method::GET, "/before", None).await;
    assert_eq!(response.headers()["x-layered"], "yes");

    let response = send(&router, Method::GET, "/after", None).await;
    assert!(response.headers().get("x-layered").is_none());
}

#[tokio::test]
async fn test_group_layers_stay_local() {
    let mut strut = Strut::default();
    strut.get("/public", teapot, Op::new()).unwrap();
    strut
        .group(|admin| {
            admin.get("/admin/pets/{id}", get_pet, Op::new().tag("admin"))?;
            admin.layer(MapResponseLayer::new(tag_response));
            Ok(())
        })
        .unwrap();
    let router = strut.into_router();

    let response = send(&router, Method::GET, "/admin/pets/2", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-layered"], "yes");

    let response = send(&router, Method::GET, "/public", None).await;
    assert!(response.headers().get("x-layered").is_none());
}

#[tokio::test]
async fn test_existing_router_routes_are_kept() {
    let base = Router::new().route("/health", axum::routing::get(|| async { "ok" }));
    let router = Strut::with_router(base, StrutConfig::default())
        .unwrap()
        .into_router();

    let response = send(&router, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}
