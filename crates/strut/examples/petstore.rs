//! Example: a small pet store whose routes document themselves
//!
//! Run with `cargo run -p strut --example petstore`, then fetch
//! `http://127.0.0.1:8080/.well-known/openapi.yaml`.
//!
//! An optional TOML file can be passed as the first argument to override
//! the document metadata and docs paths.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strut::{ApiError, Op, Reflect, Reply, RequestContext, Strut, StrutConfig};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Cat,
    Dog,
    Parrot,
}

#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct Pet {
    /// Identifier assigned by the store
    pub id: u64,
    #[schema(min_length = 1, max_length = 64)]
    pub name: String,
    pub species: Species,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(max_items = 8)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct NewPet {
    #[schema(min_length = 1, max_length = 64)]
    pub name: String,
    pub species: Species,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct PetList {
    pub pets: Vec<Pet>,
    pub total: usize,
}

#[derive(Default)]
struct Store {
    next_id: AtomicU64,
    pets: RwLock<BTreeMap<u64, Pet>>,
}

impl Store {
    async fn insert(&self, new: NewPet) -> Pet {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let pet = Pet {
            id,
            name: new.name,
            species: new.species,
            tags: new.tags,
        };
        self.pets.write().await.insert(id, pet.clone());
        pet
    }
}

fn load_config() -> anyhow::Result<StrutConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => StrutConfig::from_file(path)?,
        None => StrutConfig::new("Pet Store", "1.0.0")
            .with_description("A tiny pet store")
            .with_server("http://127.0.0.1:8080", "Local"),
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,strut=debug")),
        )
        .init();

    let store = Arc::new(Store::default());
    let mut api = Strut::new(load_config()?)?;

    let s = Arc::clone(&store);
    api.get(
        "/pets",
        move |ctx: RequestContext| {
            let store = Arc::clone(&s);
            async move {
                let limit = ctx
                    .query_param("limit")
                    .and_then(|limit| limit.parse().ok())
                    .unwrap_or(usize::MAX);
                let pets = store.pets.read().await;
                Reply::ok(PetList {
                    total: pets.len(),
                    pets: pets.values().take(limit).cloned().collect(),
                })
            }
        },
        Op::new()
            .operation_id("listPets")
            .summary("List pets")
            .tag("pets")
            .query_param::<u32>("limit", "Maximum number of pets to return"),
    )?;

    let s = Arc::clone(&store);
    api.get(
        "/pets/{id}",
        move |ctx: RequestContext| {
            let store = Arc::clone(&s);
            async move {
                let id: u64 = ctx.parse_path_param("id")?;
                store
                    .pets
                    .read()
                    .await
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| ApiError::not_found("Pet not found"))
            }
        },
        Op::new()
            .operation_id("getPet")
            .summary("Fetch a pet")
            .tag("pets")
            .response_of::<ApiError>(404, "Pet not found"),
    )?;

    let s = Arc::clone(&store);
    api.post(
        "/pets",
        move |_ctx: RequestContext, new: NewPet| {
            let store = Arc::clone(&s);
            async move { Reply::ok(store.insert(new).await) }
        },
        Op::new()
            .operation_id("createPet")
            .summary("Add a pet")
            .tag("pets")
            .request_description("The pet to add")
            .response_description(201, "Pet created")
            .response_of::<ApiError>(400, "Malformed pet"),
    )?;

    let s = Arc::clone(&store);
    api.put(
        "/pets/{id}",
        move |ctx: RequestContext, new: NewPet| {
            let store = Arc::clone(&s);
            async move {
                let id: u64 = ctx.parse_path_param("id")?;
                let mut pets = store.pets.write().await;
                let pet = pets
                    .get_mut(&id)
                    .ok_or_else(|| ApiError::not_found("Pet not found"))?;
                pet.name = new.name;
                pet.species = new.species;
                pet.tags = new.tags;
                Ok::<_, ApiError>(pet.clone())
            }
        },
        Op::new()
            .operation_id("updatePet")
            .summary("Replace a pet")
            .tag("pets")
            .response_of::<ApiError>(404, "Pet not found"),
    )?;

    let s = Arc::clone(&store);
    api.delete(
        "/pets/{id}",
        move |ctx: RequestContext| {
            let store = Arc::clone(&s);
            async move {
                let id: u64 = match ctx.parse_path_param("id") {
                    Ok(id) => id,
                    Err(err) => return err.into(),
                };
                match store.pets.write().await.remove(&id) {
                    Some(_) => Reply::<()>::raw(axum::http::StatusCode::NO_CONTENT),
                    None => Reply::error(axum::http::StatusCode::NOT_FOUND, "Pet not found"),
                }
            }
        },
        Op::new()
            .operation_id("deletePet")
            .summary("Remove a pet")
            .tag("pets")
            .response_description(204, "Pet removed")
            .response_of::<ApiError>(404, "Pet not found"),
    )?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!(address = %listener.local_addr()?, "pet store listening");
    axum::serve(listener, api.into_router()).await?;

    Ok(())
}
