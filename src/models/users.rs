// src/models/users.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Linha da listagem de usuários (nomes de role e status já resolvidos).
// As chaves em maiúsculas são o contrato que o front já consome.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UserListEntry {
    pub id: i32,
    pub nombre: String,
    pub correo: String,
    pub usuario: String,
    pub estado: i32,
    pub role_id: i32,
    pub role_nombre: String,
    pub estado_nombre: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UserStatus {
    pub id: i32,
    pub nombre: String,
}

// Payload de criação de usuário (formulário do painel)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserPayload {
    #[validate(length(min = 1, max = 150, message = "El nombre es obligatorio."))]
    #[serde(default)]
    #[schema(example = "Ana Pérez")]
    pub nombre: String,

    #[validate(email(message = "El correo no es válido."))]
    #[serde(default)]
    #[schema(example = "ana@cinepeliz.com")]
    pub correo: String,

    #[validate(length(min = 1, max = 150, message = "El usuario es obligatorio."))]
    #[serde(default)]
    #[schema(example = "ana01")]
    pub usuario: String,

    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    #[serde(default)]
    pub contrasena: String,

    // Ids chegam como número ou texto (valor de <select>); convertidos no serviço
    #[serde(default)]
    #[schema(value_type = i32, example = 1)]
    pub estado: Option<Value>,

    #[serde(default)]
    #[schema(value_type = i32, example = 2)]
    pub rol: Option<Value>,

    #[serde(default)]
    #[schema(value_type = Option<i32>, example = 1)]
    pub id_admin: Option<Value>,
}

// Linha a inserir em `usuarios` (senha já com hash)
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub nombre: &'a str,
    pub correo: &'a str,
    pub usuario: &'a str,
    pub password_hash: &'a str,
    pub estado: i32,
    pub role_id: i32,
}

// Registro de auditoria (append-only)
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditRecord {
    pub id_admin: i32,
    pub id_usuario_editado: i32,
    pub campo_modificado: String,
    pub valor_anterior: Option<String>,
    pub valor_nuevo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
