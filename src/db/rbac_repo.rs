// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::db_utils::conflict_on_unique;
use crate::common::error::AppError;
use crate::models::rbac::{ModuleRow, PermissionCount, PermissionKey, Role};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

// Separa os pares em dois arrays paralelos para o UNNEST
fn split_keys(keys: &[PermissionKey]) -> (Vec<i32>, Vec<Option<i32>>) {
    keys.iter().map(|k| (k.modulo_id, k.submodulo_id)).unzip()
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Roles
    pub async fn list_roles_except(&self, excluded_role_id: i32) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, nombre FROM roles WHERE id <> $1 ORDER BY id",
        )
            .bind(excluded_role_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn find_role<'e, E>(&self, executor: E, role_id: i32) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT id, nombre FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn role_name_exists<'e, E>(&self, executor: E, nombre: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM roles WHERE LOWER(nombre) = LOWER($1))",
        )
            .bind(nombre)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    pub async fn create_role<'e, E>(&self, executor: E, nombre: &str) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (nombre) VALUES ($1) RETURNING id, nombre",
        )
            .bind(nombre)
            .fetch_one(executor)
            .await
            .map_err(|e| conflict_on_unique(e, "El rol ya existe"))?;
        Ok(role)
    }

    // 2. Permissões
    pub async fn active_permissions<'e, E>(
        &self,
        executor: E,
        role_id: i32,
    ) -> Result<Vec<PermissionKey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let keys = sqlx::query_as::<_, PermissionKey>(
            r#"
            SELECT modulo_id, submodulo_id
            FROM permisos
            WHERE roles_id = $1 AND active = 1
            ORDER BY modulo_id, submodulo_id NULLS FIRST
            "#,
        )
            .bind(role_id)
            .fetch_all(executor)
            .await?;
        Ok(keys)
    }

    // Remoção em massa; `IS NOT DISTINCT FROM` casa também as permissões de módulo (submódulo nulo)
    pub async fn delete_permissions<'e, E>(
        &self,
        executor: E,
        role_id: i32,
        keys: &[PermissionKey],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (modulos, submodulos) = split_keys(keys);
        let result = sqlx::query(
            r#"
            DELETE FROM permisos p
            USING UNNEST($2::int[], $3::int[]) AS d(modulo_id, submodulo_id)
            WHERE p.roles_id = $1
              AND p.modulo_id = d.modulo_id
              AND p.submodulo_id IS NOT DISTINCT FROM d.submodulo_id
            "#,
        )
            .bind(role_id)
            .bind(modulos)
            .bind(submodulos)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // Inserção em massa usando UNNEST; uma linha inativa existente é reativada
    pub async fn insert_permissions<'e, E>(
        &self,
        executor: E,
        role_id: i32,
        keys: &[PermissionKey],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (modulos, submodulos) = split_keys(keys);
        let result = sqlx::query(
            r#"
            INSERT INTO permisos (roles_id, modulo_id, submodulo_id, active)
            SELECT $1, n.modulo_id, n.submodulo_id, 1
            FROM UNNEST($2::int[], $3::int[]) AS n(modulo_id, submodulo_id)
            ON CONFLICT (roles_id, modulo_id, COALESCE(submodulo_id, 0))
            DO UPDATE SET active = 1
            "#,
        )
            .bind(role_id)
            .bind(modulos)
            .bind(submodulos)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn permission_counts(&self) -> Result<Vec<PermissionCount>, AppError> {
        let counts = sqlx::query_as::<_, PermissionCount>(
            r#"
            SELECT roles_id AS rol_id, COUNT(*) AS total
            FROM permisos
            WHERE active = 1
            GROUP BY roles_id
            ORDER BY roles_id
            "#,
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(counts)
    }

    // 3. Módulos e menu
    pub async fn modules_with_submodules(&self) -> Result<Vec<ModuleRow>, AppError> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT
                m.id    AS modulo_id,
                m.name  AS modulo_name,
                m.icon  AS modulo_icon,
                m.route AS modulo_route,
                s.id    AS submodulo_id,
                s.name  AS submodulo_name,
                s.icon  AS submodulo_icon,
                s.route AS submodulo_route
            FROM modulo m
            LEFT JOIN submodulo s ON s.modulo_id = m.id
            ORDER BY m.id, s.id
            "#,
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // Um módulo sem submódulos aparece se houver permissão para ele;
    // um módulo com submódulos só traz os submódulos permitidos.
    pub async fn menu_rows(&self, role_id: i32) -> Result<Vec<ModuleRow>, AppError> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT
                m.id    AS modulo_id,
                m.name  AS modulo_name,
                m.icon  AS modulo_icon,
                m.route AS modulo_route,
                s.id    AS submodulo_id,
                s.name  AS submodulo_name,
                s.icon  AS submodulo_icon,
                s.route AS submodulo_route
            FROM modulo m
            LEFT JOIN submodulo s ON s.modulo_id = m.id
            INNER JOIN permisos p
                ON p.modulo_id = m.id
               AND (p.submodulo_id = s.id OR s.id IS NULL)
            WHERE p.roles_id = $1 AND p.active = 1
            ORDER BY m.id, s.id
            "#,
        )
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
