//! Route handlers. Each one decodes its request, runs one coordinator call
//! on the blocking pool and encodes the result.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use picshelf_core::{
    Catalogues, CatalogueRecord, ImageRecord, Shelf, ShelfResult, TagReport, TagScope,
    TagStatistics, UploadFile,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Multipart field carrying image files.
pub const UPLOAD_FIELD: &str = "image";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    shelf: Arc<Shelf>,
}

impl AppState {
    pub fn new(shelf: Arc<Shelf>) -> Self {
        Self { shelf }
    }

    pub fn shelf(&self) -> &Arc<Shelf> {
        &self.shelf
    }

    /// Run a coordinator call off the async workers. The coordinator holds
    /// store locks across file I/O.
    async fn run<T, F>(&self, op: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Shelf) -> ShelfResult<T> + Send + 'static,
    {
        let shelf = Arc::clone(&self.shelf);
        let outcome = tokio::task::spawn_blocking(move || op(&shelf))
            .await
            .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?;
        Ok(outcome?)
    }
}

fn message(text: String) -> Json<Value> {
    Json(json!({ "message": text }))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "picshelf-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---- images ----

pub async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<Value>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "ignoring multipart field");
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ServerError::BadRequest("image part without a file name".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
        files.push(UploadFile::new(name, bytes.to_vec()));
    }

    let report = state.run(move |shelf| shelf.upload(files)).await?;
    Ok(Json(json!({
        "message": format!("{} files uploaded and thumbnails created", report.processed.len()),
        "processed": report.processed,
        "failed": report.failed,
    })))
}

pub async fn list_images(State(state): State<AppState>) -> ServerResult<Json<Vec<ImageRecord>>> {
    Ok(Json(state.run(|shelf| shelf.list_images()).await?))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Json<ImageRecord>> {
    Ok(Json(state.run(move |shelf| shelf.get_image(&name)).await?))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Json<Value>> {
    let target = name.clone();
    state.run(move |shelf| shelf.delete_image(&target)).await?;
    Ok(message(format!("image '{name}' deleted")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameImageBody {
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub new_name: String,
}

pub async fn rename_image(
    State(state): State<AppState>,
    Json(body): Json<RenameImageBody>,
) -> ServerResult<Json<Value>> {
    let RenameImageBody {
        original_name,
        new_name,
    } = body;
    let text = format!("image '{original_name}' renamed to '{new_name}'");
    state
        .run(move |shelf| shelf.rename_image(&original_name, &new_name))
        .await?;
    Ok(message(text))
}

fn content_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

pub async fn download_original(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let target = name.clone();
    let bytes = state.run(move |shelf| shelf.read_original(&target)).await?;
    let headers = [
        (header::CONTENT_TYPE, content_type(&name).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        ),
    ];
    Ok((headers, bytes))
}

pub async fn download_thumbnail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let target = name.clone();
    let bytes = state.run(move |shelf| shelf.read_thumbnail(&target)).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&name))], bytes))
}

// ---- catalogues ----

#[derive(Debug, Deserialize)]
pub struct CreateCatalogueBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
}

pub async fn create_catalogue(
    State(state): State<AppState>,
    Json(body): Json<CreateCatalogueBody>,
) -> ServerResult<(StatusCode, Json<CatalogueRecord>)> {
    let record = state
        .run(move |shelf| shelf.create_catalogue(&body.name, &body.images))
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_catalogues(State(state): State<AppState>) -> ServerResult<Json<Catalogues>> {
    Ok(Json(state.run(|shelf| shelf.list_catalogues()).await?))
}

pub async fn get_catalogue(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Json<CatalogueRecord>> {
    Ok(Json(state.run(move |shelf| shelf.get_catalogue(&name)).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNamesBody {
    #[serde(default)]
    pub image_names: Vec<String>,
}

pub async fn add_images(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<ImageNamesBody>,
) -> ServerResult<Json<Value>> {
    let target = name.clone();
    let added = state
        .run(move |shelf| shelf.add_images_to_catalogue(&target, &body.image_names))
        .await?;
    Ok(Json(json!({
        "message": format!("images added to catalogue '{name}'"),
        "added": added,
    })))
}

pub async fn remove_images(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<ImageNamesBody>,
) -> ServerResult<Json<Value>> {
    let target = name.clone();
    let removal = state
        .run(move |shelf| shelf.remove_images_from_catalogue(&target, &body.image_names))
        .await?;
    Ok(Json(json!({
        "message": format!("{} images removed from catalogue '{name}'", removal.removed),
        "removed": removal.removed,
        "notFound": removal.not_found,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameCatalogueBody {
    #[serde(default)]
    pub new_name: String,
}

pub async fn rename_catalogue(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<RenameCatalogueBody>,
) -> ServerResult<Json<Value>> {
    let text = format!("catalogue '{name}' renamed to '{}'", body.new_name);
    state
        .run(move |shelf| shelf.rename_catalogue(&name, &body.new_name))
        .await?;
    Ok(message(text))
}

pub async fn delete_catalogue(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Json<Value>> {
    let target = name.clone();
    state.run(move |shelf| shelf.delete_catalogue(&target)).await?;
    Ok(message(format!("catalogue '{name}' deleted")))
}

// ---- tags ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagQuery {
    pub catalogue_name: Option<String>,
}

pub async fn tag_images(
    State(state): State<AppState>,
    Query(query): Query<TagQuery>,
) -> ServerResult<Json<TagReport>> {
    let scope = TagScope::from_catalogue(query.catalogue_name);
    Ok(Json(state.run(move |shelf| shelf.tag_images(scope)).await?))
}

pub async fn tag_statistics(State(state): State<AppState>) -> ServerResult<Json<TagStatistics>> {
    Ok(Json(state.run(|shelf| shelf.tag_statistics()).await?))
}

pub async fn tag_logs(State(state): State<AppState>) -> ServerResult<impl IntoResponse> {
    let text = state.run(|shelf| shelf.tag_log()).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}
