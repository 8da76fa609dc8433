// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{error::AppError, extract::AppJson},
    config::AppState,
    models::{
        rbac::{
            AssignPermissionsPayload, AssignPermissionsResponse, CreateRolePayload, MenuModule,
            ModuleNode, PermissionCount, PermissionKey, Role,
        },
        users::MessageResponse,
    },
};

// Ids de role na URL: inteiro positivo ou 400
fn parse_role_param(raw: &str, message: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request(message))
}

// GET /api/roles (sem o role de cliente)
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    responses((status = 200, description = "Roles administráveis", body = Vec<Role>)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let roles = app_state.rbac_service.list_roles().await?;
    Ok(Json(roles))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Roles",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Role criado", body = MessageResponse),
        (status = 400, description = "Nombre de rol inválido"),
        (status = 409, description = "El rol ya existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state.rbac_service.create_role(payload.nombre.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Rol registrado correctamente"))))
}

// POST /api/permisos
// O role administrador só ganha permissões por aqui, nunca perde.
#[utoipa::path(
    post,
    path = "/api/permisos",
    tag = "Roles",
    request_body = AssignPermissionsPayload,
    responses(
        (status = 200, description = "Permissões reconciliadas", body = AssignPermissionsResponse),
        (status = 400, description = "ID de rol inválido"),
        (status = 403, description = "Remoção de permissões do administrador"),
        (status = 404, description = "Rol no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_permissions(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<AssignPermissionsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state
        .rbac_service
        .assign_permissions(payload)
        .await
        .map_err(|e| e.context("Error al asignar permisos"))?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/asignacion-modulos",
    tag = "Roles",
    responses((status = 200, description = "Árvore de módulos e submódulos", body = Vec<ModuleNode>)),
    security(("api_jwt" = []))
)]
pub async fn list_modules(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let tree = app_state
        .rbac_service
        .module_tree()
        .await
        .map_err(|e| e.context("Error al obtener módulos"))?;

    Ok(Json(tree))
}

#[utoipa::path(
    get,
    path = "/api/permisos-por-rol",
    tag = "Roles",
    responses((status = 200, description = "Quantidade de permissões ativas por role", body = Vec<PermissionCount>)),
    security(("api_jwt" = []))
)]
pub async fn permission_counts(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let counts = app_state
        .rbac_service
        .permission_counts()
        .await
        .map_err(|e| e.context("Error al contar permisos por rol"))?;

    Ok(Json(counts))
}

#[utoipa::path(
    get,
    path = "/api/permisos-por-rol/{rolId}",
    tag = "Roles",
    params(("rolId" = i32, Path, description = "ID do role")),
    responses(
        (status = 200, description = "Pares (módulo, submódulo) ativos", body = Vec<PermissionKey>),
        (status = 400, description = "ID de rol inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn permissions_for_role(
    State(app_state): State<AppState>,
    Path(rol_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rol_id = parse_role_param(&rol_id, "ID de rol inválido")?;

    let permissions = app_state
        .rbac_service
        .permissions_for_role(rol_id)
        .await
        .map_err(|e| e.context("Error al obtener permisos del rol"))?;

    Ok(Json(permissions))
}

// GET /api/menu/{role_id}: o menu lateral do front
#[utoipa::path(
    get,
    path = "/api/menu/{role_id}",
    tag = "Roles",
    params(("role_id" = i32, Path, description = "ID do role")),
    responses(
        (status = 200, description = "Módulos e submódulos permitidos", body = Vec<MenuModule>),
        (status = 400, description = "role_id es obligatorio")
    ),
    security(("api_jwt" = []))
)]
pub async fn menu_for_role(
    State(app_state): State<AppState>,
    Path(role_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let role_id = parse_role_param(&role_id, "role_id es obligatorio")?;
    let menu = app_state.rbac_service.menu_for_role(role_id).await?;
    Ok(Json(menu))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_param_must_be_a_positive_integer() {
        assert_eq!(parse_role_param("4", "x").unwrap(), 4);
        assert!(matches!(parse_role_param("0", "x"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_role_param("abc", "x"), Err(AppError::BadRequest(_))));
    }
}
