// src/handlers/auth.rs

use axum::{extract::State, Json};

use crate::{
    common::{error::AppError, extract::AppJson},
    config::AppState,
    models::auth::{GoogleLoginPayload, GoogleLoginResponse, LoginPayload, LoginResponse},
};

// Handler de login (usuário + senha)
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login bem-sucedido", body = LoginResponse),
        (status = 401, description = "Usuário não encontrado ou senha incorreta"),
        (status = 403, description = "Usuário inativo")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = app_state
        .auth_service
        .login_user(payload.username.trim(), &payload.password)
        .await
        .map_err(|e| e.context("Error interno del servidor"))?;

    Ok(Json(response))
}

// Login com a conta Google (o front já validou o token do Google)
#[utoipa::path(
    post,
    path = "/api/login-google",
    tag = "Auth",
    request_body = GoogleLoginPayload,
    responses(
        (status = 200, description = "Sessão criada (token de 3 minutos)", body = GoogleLoginResponse),
        (status = 400, description = "Datos incompletos de Google")
    )
)]
pub async fn login_google(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<GoogleLoginPayload>,
) -> Result<Json<GoogleLoginResponse>, AppError> {
    let response = app_state
        .auth_service
        .login_with_google(payload.email.as_deref(), payload.name.as_deref())
        .await
        .map_err(|e| e.context("Error al autenticar con Google"))?;

    Ok(Json(response))
}
