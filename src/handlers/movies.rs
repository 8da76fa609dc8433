// src/handlers/movies.rs

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::forms::read_multipart,
    models::movies::{CreateMovieResponse, SelectData},
};

#[utoipa::path(
    get,
    path = "/api/peliculas/select-data",
    tag = "Películas",
    responses((status = 200, description = "Idiomas, classificações, formatos, salas e categorias", body = SelectData)),
    security(("api_jwt" = []))
)]
pub async fn select_data(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = app_state
        .movie_service
        .select_data()
        .await
        .map_err(|e| e.context("Error al obtener datos de referencia"))?;
    Ok(Json(data))
}

// POST /api/peliculas (multipart, `imagen` obrigatória)
#[utoipa::path(
    post,
    path = "/api/peliculas",
    tag = "Películas",
    request_body(content_type = "multipart/form-data", description = "titulo, duracionMin, fecha, horario (ou fechaHora), precio, id_idioma, id_clasificacion, id_formato, id_categoria, id_sala, imagen"),
    responses(
        (status = 201, description = "Película registrada correctamente", body = CreateMovieResponse),
        (status = 400, description = "Imagem ausente, campo inválido ou referência inexistente"),
        (status = 409, description = "La película ya existe con esa configuración")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_movie(
    State(app_state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (fields, image) = read_multipart(multipart?).await?;

    let response = app_state
        .movie_service
        .create_movie(&fields, image)
        .await
        .map_err(|e| e.context("Error al registrar la película"))?;

    Ok((StatusCode::CREATED, Json(response)))
}
