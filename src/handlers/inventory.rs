// src/handlers/inventory.rs

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    common::{error::AppError, extract::AppJson},
    config::AppState,
    handlers::forms::read_multipart,
    models::inventory::{
        ProductDetail, ProductListItem, ProductNameQuery, ProductSearchHit, ProductStats,
        ProductStatusLabel, UpdateProductPayload, UpdateProductResponse,
    },
    services::inventory_service::parse_product_id,
};

// ---
// Listagem e busca (tela de inventário)
// ---

#[utoipa::path(
    get,
    path = "/api/productos",
    tag = "Productos",
    responses((status = 200, description = "Produtos com categoria, unidade e estados", body = Vec<ProductListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let products = app_state
        .inventory_service
        .list_products()
        .await
        .map_err(|e| e.context("Error interno al obtener productos"))?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/productos/buscar",
    tag = "Productos",
    params(("nombre" = String, Query, description = "Trecho do nome")),
    responses(
        (status = 200, description = "Produtos cujo nome contém o trecho", body = Vec<ProductListItem>),
        (status = 400, description = "El nombre de búsqueda es obligatorio.")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_products(
    State(app_state): State<AppState>,
    Query(query): Query<ProductNameQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state
        .inventory_service
        .search_products(query.nombre.as_deref())
        .await
        .map_err(|e| e.context("Error interno al buscar productos"))?;
    Ok(Json(products))
}

// POST /api/productos/nuevo-producto (multipart, `imagen` opcional)
#[utoipa::path(
    post,
    path = "/api/productos/nuevo-producto",
    tag = "Productos",
    request_body(content_type = "multipart/form-data", description = "codigo_barras, nombre, categoria_id, unidad_medida_id, cantidad, fecha_vencimiento, precio_costo, precio_venta, usuario_id, rol_id, imagen"),
    responses(
        (status = 201, description = "Producto creado correctamente."),
        (status = 400, description = "Faltan campos obligatorios."),
        (status = 403, description = "Usuario o rol inválido."),
        (status = 409, description = "Código ou nome duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (fields, image) = read_multipart(multipart?).await?;

    let id = app_state
        .inventory_service
        .create_product(&fields, image)
        .await
        .map_err(|e| e.context("Error interno al crear producto."))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Producto creado correctamente.", "id": id })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/producto-estados",
    tag = "Productos",
    responses((status = 200, description = "Estados derivados distintos", body = Vec<ProductStatusLabel>)),
    security(("api_jwt" = []))
)]
pub async fn list_status_labels(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let labels = app_state.inventory_service.status_labels().await?;
    Ok(Json(labels))
}

#[utoipa::path(
    get,
    path = "/api/calculo-productos",
    tag = "Productos",
    responses((status = 200, description = "Indicadores do inventário", body = ProductStats)),
    security(("api_jwt" = []))
)]
pub async fn product_stats(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = app_state
        .inventory_service
        .stats()
        .await
        .map_err(|e| e.context("Error al obtener cálculos de productos"))?;
    Ok(Json(stats))
}

// ---
// Tela de atualização (/api/actualizar-producto)
// ---

#[utoipa::path(
    get,
    path = "/api/actualizar-producto/buscar",
    tag = "Productos",
    params(("nombre" = String, Query, description = "Trecho do nome")),
    responses(
        (status = 200, description = "Id, código e nome dos produtos encontrados", body = Vec<ProductSearchHit>),
        (status = 400, description = "El nombre de búsqueda es obligatorio.")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_products_for_update(
    State(app_state): State<AppState>,
    Query(query): Query<ProductNameQuery>,
) -> Result<impl IntoResponse, AppError> {
    let hits = app_state
        .inventory_service
        .search_product_hits(query.nombre.as_deref())
        .await
        .map_err(|e| e.context("Error interno al buscar productos."))?;
    Ok(Json(hits))
}

#[utoipa::path(
    get,
    path = "/api/actualizar-producto/{id}",
    tag = "Productos",
    params(("id" = i32, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Dados completos do produto", body = ProductDetail),
        (status = 400, description = "ID inválido"),
        (status = 404, description = "Producto no encontrado.")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_product_id(&id)?;
    let product = app_state
        .inventory_service
        .product_detail(id)
        .await
        .map_err(|e| e.context("Error interno al obtener producto."))?;
    Ok(Json(product))
}

// PUT: só os campos enviados mudam
#[utoipa::path(
    put,
    path = "/api/actualizar-producto/{id}",
    tag = "Productos",
    params(("id" = i32, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Campos atualizados", body = UpdateProductResponse),
        (status = 400, description = "Nenhum campo ou valor inválido"),
        (status = 404, description = "Producto no encontrado o sin cambios."),
        (status = 409, description = "Nome ou código já usados por outro produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_product_id(&id)?;
    let response = app_state
        .inventory_service
        .update_product(id, &payload)
        .await
        .map_err(|e| e.context("Error interno al actualizar producto."))?;
    Ok(Json(response))
}
