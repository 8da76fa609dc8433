// src/handlers/users.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{error::AppError, extract::AppJson},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::users::{CreateUserPayload, MessageResponse, UserListEntry, UserStatus},
};

#[utoipa::path(
    get,
    path = "/api/usuarios",
    tag = "Usuarios",
    responses(
        (status = 200, description = "Usuários com role e status (mais recentes primeiro)", body = Vec<UserListEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = app_state
        .user_service
        .list_users()
        .await
        .map_err(|e| e.context("Error interno al obtener usuarios"))?;

    Ok(Json(users))
}

// POST /api/usuarios
// `id_admin` vem do corpo; sem ele, o usuário do token assina a auditoria
#[utoipa::path(
    post,
    path = "/api/usuarios",
    tag = "Usuarios",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = MessageResponse),
        (status = 400, description = "Campos inválidos"),
        (status = 409, description = "Usuário ou e-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    user: Option<AuthenticatedUser>,
    AppJson(payload): AppJson<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let acting_user_id = user.map(|AuthenticatedUser(claims)| claims.id);

    app_state
        .user_service
        .create_user(payload, acting_user_id)
        .await
        .map_err(|e| e.context("Error interno al crear usuario"))?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("Usuario creado exitosamente"))))
}

#[utoipa::path(
    get,
    path = "/api/estados",
    tag = "Usuarios",
    responses(
        (status = 200, description = "Status de usuário", body = Vec<UserStatus>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_statuses(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let statuses = app_state.user_service.list_statuses().await?;
    Ok(Json(statuses))
}
