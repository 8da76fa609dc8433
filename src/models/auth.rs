// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Credenciais de um usuário vindas do banco (só o login usa)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub usuario: String,
    pub password_hash: String,
    pub estado: i32,
    pub role_id: i32,
}

// Identidade mínima devolvida pelo login com Google
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserIdentity {
    pub id: i32,
    pub usuario: String,
    pub role_id: i32,
}

// Dados para login
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginPayload {
    #[schema(example = "ana01")]
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Inicio de sesión exitoso")]
    pub message: String,
    pub id: i32,
    pub role_id: i32,
    pub token: String,
}

// Dados que o front recebe do Google Identity e repassa
#[derive(Debug, Deserialize, ToSchema)]
pub struct GoogleLoginPayload {
    #[schema(example = "ana@gmail.com")]
    pub email: Option<String>,
    #[schema(example = "Ana Pérez")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoogleLoginResponse {
    pub id: i32,
    pub usuario: String,
    pub role_id: i32,
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub id: i32,
    pub usuario: String,
    pub role_id: i32,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
