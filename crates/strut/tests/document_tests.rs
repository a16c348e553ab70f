use serde::{Deserialize, Serialize};
use serde_json::Value;
use strut::{
    reflect, ApiError, DuplicatePolicy, Op, ParamLocation, Reflect, Reply, RequestContext,
    Response, SchemaKind, Strut, StrutConfig, TypeIdentity, Verb,
};

#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct Item {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct Priced {
    #[schema(minimum = "0.01")]
    pub price: f64,
    #[schema(minimum = "not-a-number")]
    pub discount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct NewItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

async fn get_item(ctx: RequestContext) -> Reply<Item> {
    Reply::ok(Item {
        id: ctx.path_param("id").unwrap_or_default().to_string(),
    })
}

async fn list_items(_ctx: RequestContext) -> Result<Vec<Item>, ApiError> {
    Ok(Vec::new())
}

async fn create_item(_ctx: RequestContext, item: NewItem) -> Reply<Item> {
    Reply::ok(Item { id: item.id })
}

fn document(strut: &Strut) -> Value {
    serde_json::to_value(strut.definition()).unwrap()
}

#[test]
fn test_path_parameter_and_response_reference() {
    let mut strut = Strut::default();
    strut.get("/items/{id}", get_item, Op::new()).unwrap();

    let doc = document(&strut);
    let get = &doc["paths"]["/items/{id}"]["get"];

    let params = get["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0]["name"], "id");
    assert_eq!(params[0]["in"], "path");
    assert_eq!(params[0]["required"], true);

    let reference = get["responses"]["200"]["content"]["application/json"]["schema"]["$ref"]
        .as_str()
        .unwrap();
    let name = reference.strip_prefix("#/components/schemas/").unwrap();
    assert_eq!(name, TypeIdentity::of::<Item>().component_name());
    assert_eq!(
        doc["components"]["schemas"][name]["properties"]["id"]["type"],
        "string"
    );
}

#[test]
fn test_numeric_bounds() {
    let schema = serde_json::to_value(reflect::<Priced>()).unwrap();

    assert_eq!(
        schema["properties"]["price"],
        serde_json::json!({"type": "number", "minimum": 0.01})
    );
    assert_eq!(
        schema["properties"]["discount"],
        serde_json::json!({"type": "number"})
    );
}

#[test]
fn test_shared_type_has_one_component() {
    let mut strut = Strut::default();
    strut
        .get("/items/{id}", get_item, Op::new().operation_id("getItem"))
        .unwrap()
        .post("/items", create_item, Op::new().operation_id("createItem"))
        .unwrap();

    let definition = strut.definition();
    let get = definition.operation("/items/{id}", Verb::Get).unwrap();
    let post = definition.operation("/items", Verb::Post).unwrap();

    let get_ref = get.responses["200"].json_schema().unwrap().reference.clone();
    let post_ref = post.responses["200"].json_schema().unwrap().reference.clone();
    assert_eq!(get_ref, post_ref);

    let item = TypeIdentity::of::<Item>().component_name();
    let new_item = TypeIdentity::of::<NewItem>().component_name();
    let names: Vec<_> = definition.components.schemas.keys().cloned().collect();
    assert_eq!(names.iter().filter(|name| **name == item).count(), 1);
    assert!(names.contains(&new_item));
    assert_eq!(names.len(), 2);
}

#[test]
fn test_register_schema_is_idempotent() {
    let mut strut = Strut::default();
    let mut definition = strut.definition().clone();

    let first = definition.register_type::<Item>();
    let second = definition.register_type::<Item>();
    assert_eq!(first, second);
    assert_eq!(definition.components.schemas.len(), 1);

    // Binding two routes that answer with the same type is just as stable
    strut.get("/a", get_item, Op::new()).unwrap();
    strut.get("/b", get_item, Op::new()).unwrap();
    assert_eq!(strut.definition().components.schemas.len(), 1);
}

#[test]
fn test_request_body_is_a_reference() {
    let mut strut = Strut::default();
    strut
        .post(
            "/items",
            create_item,
            Op::new().request_description("The item to create"),
        )
        .unwrap();

    let post = strut.definition().operation("/items", Verb::Post).unwrap();
    let body = post.request_body.as_ref().unwrap();
    assert!(body.required);
    assert_eq!(body.description.as_deref(), Some("The item to create"));

    let schema = body.json_schema().unwrap();
    assert!(schema.is_reference());
    let resolved = strut.definition().resolve(schema).unwrap();
    assert!(resolved.is_required("id"));
    assert!(!resolved.is_required("note"));
}

#[test]
fn test_description_options_merge_with_injected_schemas() {
    let mut strut = Strut::default();
    strut
        .get(
            "/items",
            list_items,
            Op::new()
                .response_description(200, "All items")
                .response_description(404, "No items"),
        )
        .unwrap();

    let get = strut.definition().operation("/items", Verb::Get).unwrap();
    let ok = &get.responses["200"];
    assert_eq!(ok.description.as_deref(), Some("All items"));
    assert!(ok.json_schema().unwrap().is_reference());

    let missing = &get.responses["404"];
    assert_eq!(missing.description.as_deref(), Some("No items"));
    assert!(missing.content.is_empty());
}

#[test]
fn test_primary_status_reuses_described_slot() {
    let mut strut = Strut::default();
    strut
        .post(
            "/items",
            create_item,
            Op::new()
                .response_description(201, "Created")
                .response_of::<ApiError>(400, "Bad request"),
        )
        .unwrap();

    let post = strut.definition().operation("/items", Verb::Post).unwrap();
    assert!(!post.responses.contains_key("200"));

    let created = &post.responses["201"];
    assert_eq!(created.description.as_deref(), Some("Created"));
    assert!(created.json_schema().unwrap().is_reference());

    let bad = post.responses["400"].json_schema().unwrap();
    assert!(!bad.is_reference());
    assert_eq!(bad.kind, Some(SchemaKind::Object));
}

#[test]
fn test_options_are_recorded() {
    let mut strut = Strut::default();
    strut
        .get(
            "/items",
            list_items,
            Op::new()
                .operation_id("listItems")
                .summary("List items")
                .tags(["items", "catalogue"])
                .query_param::<u32>("limit", "Page size")
                .header_param::<String>("x-tenant", "")
                .response(503, Response::new("Maintenance"))
                .deprecated(),
        )
        .unwrap();

    let get = strut.definition().operation("/items", Verb::Get).unwrap();
    assert_eq!(get.operation_id.as_deref(), Some("listItems"));
    assert_eq!(get.tags, vec!["items", "catalogue"]);
    assert!(get.deprecated);

    let limit = get.parameter("limit", ParamLocation::Query).unwrap();
    assert!(!limit.is_required());
    assert_eq!(limit.description.as_deref(), Some("Page size"));
    assert_eq!(
        limit.schema.as_ref().and_then(|schema| schema.kind),
        Some(SchemaKind::Integer)
    );

    let tenant = get.parameter("x-tenant", ParamLocation::Header).unwrap();
    assert!(tenant.description.is_none());
    assert!(get.responses.contains_key("503"));
}

#[test]
fn test_duplicates_are_rejected_by_default() {
    let mut strut = Strut::default();
    strut
        .get("/items/{id}", get_item, Op::new().operation_id("getItem"))
        .unwrap();

    let err = strut
        .get("/items/{id}", get_item, Op::new())
        .unwrap_err();
    assert!(err.is_conflict());

    let err = strut
        .get("/other", get_item, Op::new().operation_id("getItem"))
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(strut.definition().operation("/other", Verb::Get).is_none());
}

#[test]
fn test_duplicates_overwrite_when_configured() {
    let config = StrutConfig::default().with_duplicate_policy(DuplicatePolicy::Overwrite);
    let mut strut = Strut::new(config).unwrap();

    strut
        .get("/items/{id}", get_item, Op::new().summary("first"))
        .unwrap();
    strut
        .get("/items/{id}", get_item, Op::new().summary("second"))
        .unwrap();

    let get = strut.definition().operation("/items/{id}", Verb::Get).unwrap();
    assert_eq!(get.summary.as_deref(), Some("second"));
}

#[test]
fn test_documents_serialize() {
    let mut strut = Strut::new(
        StrutConfig::new("Items", "2.0.0")
            .with_description("Item catalogue")
            .with_server("https://items.example.com", "Production"),
    )
    .unwrap();
    strut.get("/items/{id}", get_item, Op::new()).unwrap();

    let json: Value = serde_json::from_str(&strut.definition().to_json(true).unwrap()).unwrap();
    assert_eq!(json["openapi"], "3.0.3");
    assert_eq!(json["info"]["title"], "Items");
    assert_eq!(json["servers"][0]["url"], "https://items.example.com");

    let yaml = strut.definition().to_yaml().unwrap();
    let parsed: Value = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, json);
}
