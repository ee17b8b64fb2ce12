use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::db::{DenunciaStore, Resolution};
use crate::handlers::{denuncias, health, pages};

#[derive(Clone)]
pub struct AppState {
    pub store: DenunciaStore,
    /// How the database was chosen at startup.
    pub resolution: Arc<Resolution>,
}

impl AppState {
    pub fn new(store: DenunciaStore, resolution: Resolution) -> Self {
        Self {
            store,
            resolution: Arc::new(resolution),
        }
    }
}

pub fn denuncias_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/menu", get(pages::menu))
        .route("/introduccion", get(pages::introduccion))
        .route("/tips", get(pages::tips))
        .route("/juego", get(pages::juego))
        .route(
            "/denuncias",
            get(denuncias::list_denuncias).post(denuncias::create_denuncia),
        )
        .route(
            "/editar/{id}",
            get(denuncias::edit_form).post(denuncias::apply_edit),
        )
        .route(
            "/eliminar/{id}",
            get(denuncias::confirm_delete).post(denuncias::delete_denuncia),
        )
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
