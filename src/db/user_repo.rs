// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::auth::{UserCredentials, UserIdentity};
use crate::models::users::{NewAuditRecord, NewUser, UserListEntry, UserStatus};

// O repositório de usuários: tabelas 'usuarios', 'estados_usuario' e 'registro_auditoria'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca exata pelo login (o login não ignora caixa)
    pub async fn find_credentials_by_username(
        &self,
        usuario: &str,
    ) -> Result<Option<UserCredentials>, AppError> {
        let maybe_user = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, usuario, password_hash, estado, role_id
            FROM usuarios
            WHERE usuario = $1
            "#,
        )
            .bind(usuario)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn touch_last_login(&self, user_id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE usuarios SET ultimo_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_identity_by_email<'e, E>(
        &self,
        executor: E,
        correo: &str,
    ) -> Result<Option<UserIdentity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let identity = sqlx::query_as::<_, UserIdentity>(
            "SELECT id, usuario, role_id FROM usuarios WHERE correo = $1",
        )
            .bind(correo)
            .fetch_optional(executor)
            .await?;
        Ok(identity)
    }

    pub async fn exists_by_username(&self, usuario: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM usuarios WHERE usuario = $1)")
                .bind(usuario)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    // Usado ao cadastrar produtos: o par (usuário, role) precisa existir
    pub async fn exists_with_role(&self, user_id: i32, role_id: i32) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM usuarios WHERE id = $1 AND role_id = $2)",
        )
            .bind(user_id)
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    // Cria o usuário e devolve a identidade gerada.
    // Login e e-mail duplicados viram 409 com mensagem própria.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        new_user: &NewUser<'_>,
    ) -> Result<UserIdentity, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let identity = sqlx::query_as::<_, UserIdentity>(
            r#"
            INSERT INTO usuarios (nombre, correo, usuario, password_hash, estado, role_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, usuario, role_id
            "#,
        )
            .bind(new_user.nombre)
            .bind(new_user.correo)
            .bind(new_user.usuario)
            .bind(new_user.password_hash)
            .bind(new_user.estado)
            .bind(new_user.role_id)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return match db_err.constraint() {
                            Some("usuarios_correo_key") => {
                                AppError::conflict("El correo ya está registrado.")
                            }
                            _ => AppError::conflict("El usuario ya existe."),
                        };
                    }
                    if db_err.is_foreign_key_violation() {
                        return AppError::bad_request("Estado o rol inexistente.");
                    }
                }
                e.into()
            })?;

        Ok(identity)
    }

    // Mais recentes primeiro; o hash da senha nunca sai daqui
    pub async fn list_users(&self) -> Result<Vec<UserListEntry>, AppError> {
        let users = sqlx::query_as::<_, UserListEntry>(
            r#"
            SELECT
                u.id, u.nombre, u.correo, u.usuario, u.estado, u.role_id,
                r.nombre AS role_nombre,
                e.nombre AS estado_nombre
            FROM usuarios u
            JOIN roles r ON r.id = u.role_id
            JOIN estados_usuario e ON e.id = u.estado
            ORDER BY u.id DESC
            "#,
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn list_statuses(&self) -> Result<Vec<UserStatus>, AppError> {
        let statuses =
            sqlx::query_as::<_, UserStatus>("SELECT id, nombre FROM estados_usuario ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(statuses)
    }

    pub async fn status_name<'e, E>(&self, executor: E, id: i32) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = sqlx::query_scalar("SELECT nombre FROM estados_usuario WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(name)
    }

    pub async fn role_name<'e, E>(&self, executor: E, id: i32) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = sqlx::query_scalar("SELECT nombre FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(name)
    }

    pub async fn role_id_by_name(&self, nombre: &str) -> Result<Option<i32>, AppError> {
        let id = sqlx::query_scalar("SELECT id FROM roles WHERE LOWER(nombre) = LOWER($1)")
            .bind(nombre)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn insert_audit<'e, E>(&self, executor: E, record: &NewAuditRecord) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO registro_auditoria (
                id_admin, id_usuario_editado, campo_modificado, valor_anterior, valor_nuevo
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(record.id_admin)
            .bind(record.id_usuario_editado)
            .bind(&record.campo_modificado)
            .bind(record.valor_anterior.as_deref())
            .bind(record.valor_nuevo.as_deref())
            .execute(executor)
            .await?;
        Ok(())
    }
}
