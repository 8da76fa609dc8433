// src/middleware/auth.rs

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{common::error::AppError, config::AppState, models::auth::Claims};

// Rotas /api que nunca exigem token
const PUBLIC_API_PATHS: [&str; 2] = ["/api/login-google", "/api/health"];

fn requires_token(path: &str) -> bool {
    path.starts_with("/api/") && !PUBLIC_API_PATHS.contains(&path)
}

// O middleware em si: decodifica o Bearer (se houver) e guarda as claims
// nos "extensions" da requisição. Com AUTH_REQUIRED as rotas /api exigem token.
pub async fn auth_context(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request.headers().typed_get::<Authorization<Bearer>>();
    let required = app_state.config.auth_required && requires_token(request.uri().path());

    match bearer {
        Some(header) => match app_state.auth_service.validate_token(header.token()) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthenticatedUser(claims));
            }
            Err(e) if required => return Err(e),
            Err(_) => tracing::debug!("Token inválido ignorado em {}", request.uri().path()),
        },
        None if required => return Err(AppError::InvalidToken),
        None => {}
    }

    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

// `Option<AuthenticatedUser>`: rotas em que o token é opcional
impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_private_api_routes_need_a_token() {
        assert!(requires_token("/api/usuarios"));
        assert!(requires_token("/api/menu/2"));
        assert!(!requires_token("/api/login-google"));
        assert!(!requires_token("/api/health"));
        assert!(!requires_token("/login"));
        assert!(!requires_token("/uploads/pelicula_1.png"));
    }
}
