// src/services/user_service.rs

use serde_json::Value;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        parse::{is_blank, loose_i32},
    },
    config::BootstrapAdmin,
    db::UserRepository,
    models::users::{CreateUserPayload, NewAuditRecord, NewUser, UserListEntry, UserStatus},
    services::auth::hash_password,
};

/// Campo gravado na auditoria quando um usuário é criado
pub const AUDIT_CREATION_FIELD: &str = "CREACIÓN";

pub const ADMIN_ROLE_NAME: &str = "administrador";

/// Texto legível que vai em `valor_nuevo` na criação.
pub fn creation_description(
    nombre: &str,
    usuario: &str,
    correo: &str,
    estado_nombre: &str,
    rol_nombre: &str,
) -> String {
    format!(
        "Nombre: {} | Usuario: {} | Correo: {} | Estado: {} | Rol: {}",
        nombre, usuario, correo, estado_nombre, rol_nombre
    )
}

/// Id positivo vindo como número ou texto.
fn required_id(raw: Option<&Value>, message: &str) -> Result<i32, AppError> {
    raw.and_then(loose_i32)
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request(message))
}

/// `id_admin` do corpo; em branco, cai para o usuário do token.
fn resolve_admin_id(raw: Option<&Value>, acting_user_id: Option<i32>) -> Result<i32, AppError> {
    if is_blank(raw) {
        return acting_user_id
            .ok_or_else(|| AppError::bad_request("El administrador que registra es obligatorio."));
    }
    required_id(raw, "El id_admin debe ser numérico.")
}

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list_users(&self) -> Result<Vec<UserListEntry>, AppError> {
        self.repo.list_users().await
    }

    pub async fn list_statuses(&self) -> Result<Vec<UserStatus>, AppError> {
        self.repo.list_statuses().await
    }

    /// Cria o usuário e o registro de auditoria na mesma transação.
    /// `acting_user_id` é o usuário do token, usado quando o corpo não traz `id_admin`.
    pub async fn create_user(
        &self,
        payload: CreateUserPayload,
        acting_user_id: Option<i32>,
    ) -> Result<i32, AppError> {
        payload.validate()?;

        let estado = required_id(payload.estado.as_ref(), "El estado es obligatorio.")?;
        let rol = required_id(payload.rol.as_ref(), "El rol es obligatorio.")?;
        let id_admin = resolve_admin_id(payload.id_admin.as_ref(), acting_user_id)?;

        let nombre = payload.nombre.trim();
        let correo = payload.correo.trim();
        let usuario = payload.usuario.trim();

        // 1. Hashing (fora da transação, não toca no banco)
        let hashed_password = hash_password(&payload.contrasena).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 2. Cria o usuário
        let created = self
            .repo
            .create_user(
                &mut *tx,
                &NewUser {
                    nombre,
                    correo,
                    usuario,
                    password_hash: &hashed_password,
                    estado,
                    role_id: rol,
                },
            )
            .await?;

        // 3. Nomes legíveis para a auditoria
        let estado_nombre = self
            .repo
            .status_name(&mut *tx, estado)
            .await?
            .unwrap_or_else(|| format!("ID {}", estado));
        let rol_nombre = self
            .repo
            .role_name(&mut *tx, rol)
            .await?
            .unwrap_or_else(|| format!("ID {}", rol));

        // 4. Auditoria
        let record = NewAuditRecord {
            id_admin,
            id_usuario_editado: created.id,
            campo_modificado: AUDIT_CREATION_FIELD.to_string(),
            valor_anterior: None,
            valor_nuevo: Some(creation_description(
                nombre,
                usuario,
                correo,
                &estado_nombre,
                &rol_nombre,
            )),
        };
        self.repo.insert_audit(&mut *tx, &record).await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("✅ Usuário '{}' criado pelo admin {}", usuario, id_admin);
        Ok(created.id)
    }

    /// Garante um administrador inicial a partir do ambiente.
    /// Não faz nada se o login já existir.
    pub async fn ensure_bootstrap_admin(
        &self,
        admin: &BootstrapAdmin,
        active_status_id: i32,
    ) -> Result<(), AppError> {
        if self.repo.exists_by_username(&admin.username).await? {
            tracing::info!("Administrador inicial '{}' já existe", admin.username);
            return Ok(());
        }

        let role_id = self
            .repo
            .role_id_by_name(ADMIN_ROLE_NAME)
            .await?
            .ok_or_else(|| anyhow::anyhow!("role '{}' não encontrada", ADMIN_ROLE_NAME))?;

        let hashed_password = hash_password(&admin.password).await?;

        let mut tx = self.pool.begin().await?;

        let created = self
            .repo
            .create_user(
                &mut *tx,
                &NewUser {
                    nombre: &admin.username,
                    correo: &admin.email,
                    usuario: &admin.username,
                    password_hash: &hashed_password,
                    estado: active_status_id,
                    role_id,
                },
            )
            .await?;

        // Sem outro admin para assinar, o próprio usuário fica como autor
        let record = NewAuditRecord {
            id_admin: created.id,
            id_usuario_editado: created.id,
            campo_modificado: AUDIT_CREATION_FIELD.to_string(),
            valor_anterior: None,
            valor_nuevo: Some(creation_description(
                &admin.username,
                &admin.username,
                &admin.email,
                "ACTIVO",
                ADMIN_ROLE_NAME,
            )),
        };
        self.repo.insert_audit(&mut *tx, &record).await?;

        tx.commit().await?;

        tracing::info!("🚀 Administrador inicial '{}' criado", admin.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lazy_state;
    use serde_json::json;

    fn payload() -> CreateUserPayload {
        CreateUserPayload {
            nombre: "Ana Pérez".into(),
            correo: "ana@cinepeliz.com".into(),
            usuario: "ana01".into(),
            contrasena: "secreto123".into(),
            estado: Some(json!(1)),
            rol: Some(json!("2")),
            id_admin: None,
        }
    }

    #[test]
    fn creation_description_lists_every_field() {
        assert_eq!(
            creation_description("Ana Pérez", "ana01", "ana@cinepeliz.com", "ACTIVO", "gerente"),
            "Nombre: Ana Pérez | Usuario: ana01 | Correo: ana@cinepeliz.com | Estado: ACTIVO | Rol: gerente"
        );
    }

    #[test]
    fn payload_validation_catches_bad_email_and_short_password() {
        let mut bad = payload();
        bad.correo = "no-es-correo".into();
        assert!(bad.validate().is_err());

        let mut short = payload();
        short.contrasena = "123".into();
        assert!(short.validate().is_err());

        assert!(payload().validate().is_ok());
    }

    #[test]
    fn ids_accept_numbers_or_numeric_text() {
        assert_eq!(required_id(Some(&json!(1)), "x").unwrap(), 1);
        assert_eq!(required_id(Some(&json!(" 2 ")), "x").unwrap(), 2);

        for bad in [json!("abc"), json!(0), json!(null), json!([1])] {
            let err = required_id(Some(&bad), "El rol es obligatorio.").unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m == "El rol es obligatorio."));
        }
        assert!(required_id(None, "x").is_err());
    }

    #[test]
    fn admin_id_falls_back_to_the_token_user() {
        assert_eq!(resolve_admin_id(Some(&json!("7")), Some(1)).unwrap(), 7);
        assert_eq!(resolve_admin_id(Some(&json!("")), Some(1)).unwrap(), 1);
        assert_eq!(resolve_admin_id(None, Some(3)).unwrap(), 3);
        assert!(matches!(
            resolve_admin_id(Some(&json!("x")), Some(1)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn create_user_rejects_a_missing_status() {
        let state = lazy_state(false);
        let mut bad = payload();
        bad.estado = Some(json!("abc"));
        let err = state.user_service.create_user(bad, Some(1)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "El estado es obligatorio."));
    }

    #[tokio::test]
    async fn create_user_requires_an_acting_admin() {
        let state = lazy_state(false);
        let err = state.user_service.create_user(payload(), None).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_user_validates_before_touching_the_database() {
        let state = lazy_state(false);
        let mut bad = payload();
        bad.nombre = String::new();
        let err = state.user_service.create_user(bad, Some(1)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
