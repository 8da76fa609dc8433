use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Todos os erros da API terminam aqui e viram `{ "message": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Token inválido")]
    InvalidToken,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    // 500 com mensagem própria da operação (ex: "Error al guardar categorías.")
    #[error("{message}: {source}")]
    Internal {
        message: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    /// Troca a mensagem pública de um erro 500 pela mensagem da operação.
    /// Erros de negócio (4xx) passam intactos.
    pub fn context(self, message: &str) -> Self {
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            if let AppError::Internal { .. } = self {
                return self;
            }
            return AppError::Internal {
                message: message.to_string(),
                source: Box::new(self),
            };
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Rejeições dos extratores também saem como `{ "message": ... }` (400)
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Corpo JSON rejeitado: {}", rejection.body_text());
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Se esperaba un cuerpo JSON (Content-Type: application/json)."
            }
            JsonRejection::JsonDataError(_) => "Los datos enviados no tienen el formato esperado.",
            _ => "El cuerpo de la solicitud no es un JSON válido.",
        };
        AppError::bad_request(message)
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!("Formulário multipart rejeitado: {}", rejection.body_text());
        AppError::bad_request("Se esperaba un formulario multipart/form-data.")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            // Primeira mensagem de validação encontrada (o front mostra uma só)
            AppError::ValidationError(errors) => {
                let first = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(_, errs)| errs.iter())
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()));
                first.unwrap_or_else(|| "Uno o más campos son inválidos.".to_string())
            }
            AppError::BadRequest(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::Conflict(m)
            | AppError::NotFound(m) => m,
            AppError::InvalidToken => "Token de autenticación inválido o ausente.".to_string(),
            AppError::Internal { message, source } => {
                tracing::error!("Erro Interno do Servidor: {}: {}", message, source);
                message
            }
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Error interno del servidor".to_string()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_only_rewrites_internal_errors() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound).context("Error al listar");
        assert!(matches!(err, AppError::Internal { ref message, .. } if message == "Error al listar"));

        let err = AppError::conflict("El rol ya existe").context("Error al listar");
        assert!(matches!(err, AppError::Conflict(ref m) if m == "El rol ya existe"));
    }

    #[test]
    fn context_keeps_the_innermost_message() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut)
            .context("primera")
            .context("segunda");
        assert!(matches!(err, AppError::Internal { ref message, .. } if message == "primera"));
    }

    #[tokio::test]
    async fn renders_message_body_with_status() {
        let response = AppError::forbidden("Usuario inactivo").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Usuario inactivo");
    }

    #[tokio::test]
    async fn internal_errors_hide_driver_details() {
        let response = AppError::DatabaseError(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Error interno del servidor");
    }
}
