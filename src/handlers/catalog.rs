// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};

use crate::{
    common::{error::AppError, extract::AppJson},
    config::AppState,
    models::{
        catalog::{
            CatalogBatchPayload, CatalogEntry, CatalogKind, CatalogSearchHit, CatalogSearchQuery,
            Classification, CreateClassificationPayload, CreateMovieCategoryPayload, DescribedKind,
            MovieCategory, NewCatalogEntry,
        },
        users::MessageResponse,
    },
};

// ---
// Lógica compartilhada entre categorias de produto e unidades de medida
// ---

async fn list_entries(app_state: &AppState, kind: CatalogKind) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let entries = app_state
        .catalog_service
        .list(kind)
        .await
        .map_err(|e| e.context(&format!("Error al listar {}.", kind.plural())))?;
    Ok(Json(entries))
}

async fn search_entries(
    app_state: &AppState,
    kind: CatalogKind,
    query: CatalogSearchQuery,
) -> Result<Json<Vec<CatalogSearchHit>>, AppError> {
    let hits = app_state
        .catalog_service
        .search(kind, query.q.as_deref())
        .await
        .map_err(|e| e.context(&format!("Error al buscar {}.", kind.plural())))?;
    Ok(Json(hits))
}

/// Corpo de resposta do lote: `{ message, <categorias|unidades>: [...] }`
fn batch_body(kind: CatalogKind, entries: Vec<NewCatalogEntry>) -> Value {
    let mut body = Map::new();
    body.insert(
        "message".into(),
        json!(format!("{} {} agregadas correctamente.", entries.len(), kind.plural())),
    );
    body.insert(kind.batch_key().into(), json!(entries));
    Value::Object(body)
}

async fn create_entries(
    app_state: &AppState,
    kind: CatalogKind,
    payload: CatalogBatchPayload,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let entries = app_state
        .catalog_service
        .create_batch(kind, payload.into_items(kind))
        .await
        .map_err(|e| e.context(&format!("Error al guardar {}.", kind.plural())))?;

    Ok((StatusCode::CREATED, Json(batch_body(kind, entries))))
}

async fn delete_entry(
    app_state: &AppState,
    kind: CatalogKind,
    codigo: &str,
) -> Result<Json<MessageResponse>, AppError> {
    let message = app_state
        .catalog_service
        .delete(kind, codigo)
        .await
        .map_err(|e| e.context(&format!("Error al eliminar {}.", kind.singular().to_lowercase())))?;
    Ok(Json(MessageResponse::new(message)))
}

// =============================================================================
//  CATEGORIAS DE PRODUTO (/api/categoria-productos)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/categoria-productos",
    tag = "Catálogos",
    responses((status = 200, description = "Categorias ordenadas por código", body = Vec<CatalogEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_product_categories(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    list_entries(&app_state, CatalogKind::ProductCategory).await
}

#[utoipa::path(
    get,
    path = "/api/categoria-productos/buscar",
    tag = "Catálogos",
    params(("q" = Option<String>, Query, description = "Trecho do código ou do nome")),
    responses((status = 200, description = "Categorias encontradas (vazio sem busca)", body = Vec<CatalogSearchHit>)),
    security(("api_jwt" = []))
)]
pub async fn search_product_categories(
    State(app_state): State<AppState>,
    Query(query): Query<CatalogSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    search_entries(&app_state, CatalogKind::ProductCategory, query).await
}

#[utoipa::path(
    post,
    path = "/api/categoria-productos/lote",
    tag = "Catálogos",
    request_body = CatalogBatchPayload,
    responses(
        (status = 201, description = "Categorias criadas com códigos CATnnn"),
        (status = 400, description = "Lote vazio, nomes inválidos ou já existentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product_categories(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CatalogBatchPayload>,
) -> Result<impl IntoResponse, AppError> {
    create_entries(&app_state, CatalogKind::ProductCategory, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/categoria-productos/{codigo}",
    tag = "Catálogos",
    params(("codigo" = String, Path, description = "Código da categoria (ex: CAT003)")),
    responses(
        (status = 200, description = "Categoria excluída", body = MessageResponse),
        (status = 400, description = "Categoria em uso por produtos"),
        (status = 404, description = "Categoría no encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product_category(
    State(app_state): State<AppState>,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    delete_entry(&app_state, CatalogKind::ProductCategory, &codigo).await
}

// =============================================================================
//  UNIDADES DE MEDIDA (/api/unidadmedida)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/unidadmedida",
    tag = "Catálogos",
    responses((status = 200, description = "Unidades ordenadas por código", body = Vec<CatalogEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_units(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    list_entries(&app_state, CatalogKind::UnitOfMeasure).await
}

#[utoipa::path(
    get,
    path = "/api/unidadmedida/buscar",
    tag = "Catálogos",
    params(("q" = Option<String>, Query, description = "Trecho do código ou do nome")),
    responses((status = 200, description = "Unidades encontradas (vazio sem busca)", body = Vec<CatalogSearchHit>)),
    security(("api_jwt" = []))
)]
pub async fn search_units(
    State(app_state): State<AppState>,
    Query(query): Query<CatalogSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    search_entries(&app_state, CatalogKind::UnitOfMeasure, query).await
}

#[utoipa::path(
    post,
    path = "/api/unidadmedida/lote",
    tag = "Catálogos",
    request_body = CatalogBatchPayload,
    responses(
        (status = 201, description = "Unidades criadas com códigos UMnnn"),
        (status = 400, description = "Lote vazio, nomes inválidos ou já existentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_units(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CatalogBatchPayload>,
) -> Result<impl IntoResponse, AppError> {
    create_entries(&app_state, CatalogKind::UnitOfMeasure, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/unidadmedida/{codigo}",
    tag = "Catálogos",
    params(("codigo" = String, Path, description = "Código da unidade (ex: UM002)")),
    responses(
        (status = 200, description = "Unidade excluída", body = MessageResponse),
        (status = 400, description = "Unidade em uso por produtos"),
        (status = 404, description = "Unidad de medida no encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_unit(
    State(app_state): State<AppState>,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    delete_entry(&app_state, CatalogKind::UnitOfMeasure, &codigo).await
}

// =============================================================================
//  CATÁLOGO DE FILMES
// =============================================================================

async fn create_described(
    app_state: &AppState,
    kind: DescribedKind,
    nombre: Option<&str>,
    text: Option<&str>,
    error_message: &str,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = app_state
        .catalog_service
        .create_described(kind, nombre, text)
        .await
        .map_err(|e| e.context(error_message))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": kind.rules().created_message, "ID": id })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/categorias",
    tag = "Películas",
    responses((status = 200, description = "Categorias de filmes (mais recentes primeiro)", body = Vec<MovieCategory>)),
    security(("api_jwt" = []))
)]
pub async fn list_movie_categories(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = app_state
        .catalog_service
        .list_movie_categories()
        .await
        .map_err(|e| e.context("Error al obtener categorías"))?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/categorias",
    tag = "Películas",
    request_body = CreateMovieCategoryPayload,
    responses(
        (status = 201, description = "Categoría registrada correctamente"),
        (status = 400, description = "Campos ausentes ou longos demais"),
        (status = 409, description = "Nome ou sinopse duplicados")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_movie_category(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CreateMovieCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    create_described(
        &app_state,
        DescribedKind::MovieCategory,
        payload.nombre.as_deref(),
        payload.sinopsis.as_deref(),
        "Error al registrar la categoría",
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/clasificaciones",
    tag = "Películas",
    responses((status = 200, description = "Classificações (mais recentes primeiro)", body = Vec<Classification>)),
    security(("api_jwt" = []))
)]
pub async fn list_classifications(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let classifications = app_state
        .catalog_service
        .list_classifications()
        .await
        .map_err(|e| e.context("Error al obtener clasificaciones"))?;
    Ok(Json(classifications))
}

#[utoipa::path(
    post,
    path = "/api/clasificaciones",
    tag = "Películas",
    request_body = CreateClassificationPayload,
    responses(
        (status = 201, description = "Clasificación registrada correctamente"),
        (status = 400, description = "Campos ausentes ou longos demais"),
        (status = 409, description = "Nome ou descrição duplicados")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_classification(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CreateClassificationPayload>,
) -> Result<impl IntoResponse, AppError> {
    create_described(
        &app_state,
        DescribedKind::Classification,
        payload.nombre.as_deref(),
        payload.descripcion.as_deref(),
        "Error al registrar la clasificación",
    )
    .await
}
