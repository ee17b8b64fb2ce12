//! Complaint list, create, edit and delete pages.
//!
//! Every mutation answers with a redirect to `/denuncias` so refreshing the
//! browser never resubmits a form. Deleting takes two steps: `GET
//! /eliminar/{id}` shows a confirmation page and only the `POST` removes
//! the record.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tracing::info;

use super::HtmlTemplate;
use crate::db::{Denuncia, DenunciaForm, DenunciaStore};
use crate::error::AppError;
use crate::router::AppState;

const LIST_PATH: &str = "/denuncias";

#[derive(Template)]
#[template(path = "denuncias.html")]
struct DenunciasTemplate {
    denuncias: Vec<Denuncia>,
}

#[derive(Template)]
#[template(path = "editar_denuncia.html")]
struct EditarTemplate {
    denuncia: Denuncia,
}

#[derive(Template)]
#[template(path = "eliminar_denuncia.html")]
struct EliminarTemplate {
    denuncia: Denuncia,
}

/// Route ids are unsigned integers; anything else is treated as a missing
/// record.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidId(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| AppError::InvalidId(raw.to_string()))
}

async fn load(store: &DenunciaStore, raw_id: &str) -> Result<Denuncia, AppError> {
    let id = parse_id(raw_id)?;
    store.get_by_id(id).await?.ok_or(AppError::NotFound(id))
}

/// GET /denuncias
pub async fn list_denuncias(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let denuncias = state.store.list_all().await?;
    Ok(HtmlTemplate(DenunciasTemplate { denuncias }))
}

/// POST /denuncias
pub async fn create_denuncia(
    State(state): State<AppState>,
    Form(form): Form<DenunciaForm>,
) -> Result<Redirect, AppError> {
    let id = state
        .store
        .create(form.nombre_or_anonimo(), &form.lugar)
        .await?;
    info!(id, "denuncia created");
    Ok(Redirect::to(LIST_PATH))
}

/// GET /editar/{id}
pub async fn edit_form(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let denuncia = load(&state.store, &raw_id).await?;
    Ok(HtmlTemplate(EditarTemplate { denuncia }))
}

/// POST /editar/{id}
pub async fn apply_edit(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(form): Form<DenunciaForm>,
) -> Result<Redirect, AppError> {
    let denuncia = load(&state.store, &raw_id).await?;
    state
        .store
        .update(denuncia.id, form.nombre_or_anonimo(), &form.lugar)
        .await?;
    info!(id = denuncia.id, "denuncia updated");
    Ok(Redirect::to(LIST_PATH))
}

/// GET /eliminar/{id}
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let denuncia = load(&state.store, &raw_id).await?;
    Ok(HtmlTemplate(EliminarTemplate { denuncia }))
}

/// POST /eliminar/{id}
pub async fn delete_denuncia(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let denuncia = load(&state.store, &raw_id).await?;
    state.store.delete(denuncia.id).await?;
    info!(id = denuncia.id, "denuncia deleted");
    Ok(Redirect::to(LIST_PATH))
}
