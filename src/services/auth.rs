// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, GoogleLoginResponse, LoginResponse, UserIdentity},
    models::users::NewUser,
};

/// Custo do bcrypt usado em todas as senhas
pub const BCRYPT_COST: u32 = 10;

// Tokens do login com Google são de vida curta
const GOOGLE_TOKEN_TTL_MINUTES: i64 = 3;

// Valor simbólico: contas criadas pelo Google não têm senha local
const GOOGLE_PASSWORD_SENTINEL: &str = "GOOGLE_AUTH";

// O hashing é CPU-bound, então roda fora do executor async
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, BCRYPT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    session_ttl_minutes: i64,
    client_role_id: i32,
    active_status_id: i32,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        jwt_secret: String,
        session_ttl_minutes: i64,
        client_role_id: i32,
        active_status_id: i32,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            jwt_secret,
            session_ttl_minutes,
            client_role_id,
            active_status_id,
            pool,
        }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let clean_username = username.trim();

        let user = self
            .user_repo
            .find_credentials_by_username(clean_username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Usuario no encontrado".into()))?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado.
        // Hash ilegível (ex: contas do Google) conta como senha errada.
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone).unwrap_or(false)
        })
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?;

        if !is_password_valid {
            return Err(AppError::Unauthorized("Contraseña incorrecta".into()));
        }

        if user.estado != self.active_status_id {
            tracing::warn!("Login recusado para '{}': usuário inativo", user.usuario);
            return Err(AppError::forbidden("Usuario inactivo"));
        }

        // Best-effort: falhar aqui não derruba o login
        if let Err(e) = self.user_repo.touch_last_login(user.id).await {
            tracing::warn!("Não foi possível atualizar ultimo_login de {}: {}", user.id, e);
        }

        let identity = UserIdentity {
            id: user.id,
            usuario: user.usuario,
            role_id: user.role_id,
        };
        let token = self.create_token(&identity, self.session_ttl_minutes)?;

        tracing::info!("✅ Login de '{}' (role {})", identity.usuario, identity.role_id);

        Ok(LoginResponse {
            message: "Inicio de sesión exitoso".into(),
            id: identity.id,
            role_id: identity.role_id,
            token,
        })
    }

    pub async fn login_with_google(
        &self,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<GoogleLoginResponse, AppError> {
        let email = email.map(str::trim).filter(|s| !s.is_empty());
        let name = name.map(str::trim).filter(|s| !s.is_empty());
        let (Some(email), Some(name)) = (email, name) else {
            return Err(AppError::bad_request("Datos incompletos de Google"));
        };

        // --- INÍCIO DA TRANSAÇÃO ---
        // A busca e a eventual criação precisam ver o mesmo estado
        let mut tx = self.pool.begin().await?;

        let identity = match self.user_repo.find_identity_by_email(&mut *tx, email).await? {
            Some(existing) => existing,
            None => {
                let new_user = NewUser {
                    nombre: name,
                    correo: email,
                    usuario: email,
                    password_hash: GOOGLE_PASSWORD_SENTINEL,
                    estado: self.active_status_id,
                    role_id: self.client_role_id,
                };
                let created = self.user_repo.create_user(&mut *tx, &new_user).await?;
                tracing::info!("🆕 Usuário {} criado via Google", created.id);
                created
            }
        };

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        let token = self.create_token(&identity, GOOGLE_TOKEN_TTL_MINUTES)?;

        Ok(GoogleLoginResponse {
            id: identity.id,
            usuario: identity.usuario,
            role_id: identity.role_id,
            token,
        })
    }

    // Só decodifica e confere assinatura/expiração; não toca no banco
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
            .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, identity: &UserIdentity, ttl_minutes: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::minutes(ttl_minutes);

        let claims = Claims {
            id: identity.id,
            usuario: identity.usuario.clone(),
            role_id: identity.role_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        // Usa '?' para um tratamento de erro mais limpo
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
