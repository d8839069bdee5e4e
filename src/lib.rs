use crate::external_connections::ExternalConnectivity;
use crate::persistence::mem_code_driven_ports::InMemoryCodeStore;
use crate::persistence::mem_todo_driven_ports::InMemoryTaskStore;
use axum::Router;
use axum::extract::State;
use std::sync::{Arc, RwLock};

pub mod api;
pub mod app_env;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod routing_utils;

/// Everything request handlers share. The stores live here so every request sees the same data.
pub struct SharedData {
    pub ext_cxn: ExternalConnectivity,
    pub task_store: RwLock<InMemoryTaskStore>,
    pub code_store: RwLock<InMemoryCodeStore>,
    /// Hand verification codes back in the response when they can't be mailed
    pub demo_code_fallback: bool,
}

impl SharedData {
    /// Fresh application state with the sample todos and no outstanding verification codes
    pub fn new(ext_cxn: ExternalConnectivity, demo_code_fallback: bool) -> SharedData {
        SharedData {
            ext_cxn,
            task_store: InMemoryTaskStore::new_seeded_locked(),
            code_store: InMemoryCodeStore::new_locked(),
            demo_code_fallback,
        }
    }
}

pub type AppState = State<Arc<SharedData>>;

/// Assembles every route of the application along with the API docs and request tracing
pub fn build_router(shared_data: Arc<SharedData>) -> Router {
    let router = Router::new()
        .nest("/api/todos", api::todo::todo_routes())
        .merge(api::verification::verification_routes())
        .merge(api::media::media_routes())
        .merge(api::swagger_main::build_documentation());

    logging::attach_tracing_http(router).with_state(shared_data)
}
