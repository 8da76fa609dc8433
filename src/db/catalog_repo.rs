// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::db_utils::conflict_on_unique;
use crate::common::error::AppError;
use crate::models::catalog::{
    CatalogEntry, CatalogKind, CatalogSearchHit, Classification, DescribedKind, MovieCategory,
    NewCatalogEntry,
};

/// Regex do código: prefixo + sufixo numérico que cabe num BIGINT.
fn code_pattern(prefix: &str) -> String {
    format!("^{}([0-9]{{1,18}})$", prefix)
}

// Os nomes de tabela/coluna vêm de `CatalogKind`/`DescribedKind` (estáticos),
// nunca do cliente, por isso podem ir no `format!`.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- Catálogos com código (categoriaproducto / unidad_medida) ---

    pub async fn list(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, AppError> {
        let sql = format!(
            "SELECT id, codigo, nombre, fecha_creacion FROM {} ORDER BY codigo ASC",
            kind.table()
        );
        let entries = sqlx::query_as::<_, CatalogEntry>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    /// `pattern` já vem no formato de `like_pattern`
    pub async fn search(&self, kind: CatalogKind, pattern: &str) -> Result<Vec<CatalogSearchHit>, AppError> {
        let sql = format!(
            r#"
            SELECT id, codigo, nombre
            FROM {}
            WHERE LOWER(codigo) LIKE $1 ESCAPE '\'
               OR LOWER(nombre) LIKE $1 ESCAPE '\'
            ORDER BY codigo ASC
            "#,
            kind.table()
        );
        let hits = sqlx::query_as::<_, CatalogSearchHit>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(hits)
    }

    /// Nomes (em minúsculas) que já existem entre os informados
    pub async fn existing_names<'e, E>(
        &self,
        executor: E,
        kind: CatalogKind,
        lowercase_names: &[String],
    ) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT LOWER(nombre) FROM {} WHERE LOWER(nombre) = ANY($1) ORDER BY 1",
            kind.table()
        );
        let names = sqlx::query_scalar::<_, String>(&sql)
            .bind(lowercase_names)
            .fetch_all(executor)
            .await?;
        Ok(names)
    }

    // Serializa lotes concorrentes da mesma tabela até o commit
    pub async fn lock_for_batch<'e, E>(&self, executor: E, kind: CatalogKind) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE", kind.table());
        sqlx::query(&sql).execute(executor).await?;
        Ok(())
    }

    /// Maior sufixo numérico entre os códigos com o prefixo do catálogo (0 se não houver)
    pub async fn highest_code_number<'e, E>(&self, executor: E, kind: CatalogKind) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT COALESCE(MAX(SUBSTRING(codigo FROM $1)::BIGINT), 0) FROM {} WHERE codigo ~ $1",
            kind.table()
        );
        let pattern = code_pattern(kind.code_prefix());
        let highest: i64 = sqlx::query_scalar(&sql)
            .bind(pattern)
            .fetch_one(executor)
            .await?;
        Ok(highest)
    }

    pub async fn insert_entries<'e, E>(
        &self,
        executor: E,
        kind: CatalogKind,
        entries: &[NewCatalogEntry],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (codigos, nombres): (Vec<&str>, Vec<&str>) = entries
            .iter()
            .map(|e| (e.codigo.as_str(), e.nombre.as_str()))
            .unzip();

        let sql = format!(
            r#"
            INSERT INTO {} (codigo, nombre, fecha_creacion)
            SELECT n.codigo, n.nombre, NOW()
            FROM UNNEST($1::text[], $2::text[]) WITH ORDINALITY AS n(codigo, nombre, ord)
            ORDER BY n.ord
            "#,
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(codigos)
            .bind(nombres)
            .execute(executor)
            .await
            .map_err(|e| conflict_on_unique(e, "El nombre ya existe"))?;
        Ok(result.rows_affected())
    }

    pub async fn count_products_using(&self, kind: CatalogKind, codigo: &str) -> Result<i64, AppError> {
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM producto_nuevo
            WHERE {} = (SELECT id FROM {} WHERE codigo = $1)
            "#,
            kind.product_column(),
            kind.table()
        );
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(codigo)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn delete_by_code(&self, kind: CatalogKind, codigo: &str) -> Result<u64, AppError> {
        let sql = format!("DELETE FROM {} WHERE codigo = $1", kind.table());
        let result = sqlx::query(&sql)
            .bind(codigo)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // Um produto pode ter sido criado entre a verificação e o DELETE
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::bad_request(kind.in_use_message());
                    }
                }
                e.into()
            })?;
        Ok(result.rows_affected())
    }

    // --- Catálogos de filmes (categorias / clasificacion) ---

    pub async fn list_movie_categories(&self) -> Result<Vec<MovieCategory>, AppError> {
        let categories = sqlx::query_as::<_, MovieCategory>(
            r#"
            SELECT id_categoria AS id, nombre, sinopsis
            FROM categorias
            ORDER BY id_categoria DESC
            "#,
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn list_classifications(&self) -> Result<Vec<Classification>, AppError> {
        let classifications = sqlx::query_as::<_, Classification>(
            r#"
            SELECT id_clasificacion AS id, nombre, descripcion
            FROM clasificacion
            ORDER BY id_clasificacion DESC
            "#,
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(classifications)
    }

    pub async fn described_name_exists(&self, kind: DescribedKind, nombre: &str) -> Result<bool, AppError> {
        let rules = kind.rules();
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE LOWER(nombre) = LOWER($1))",
            rules.table
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(nombre)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    // Comparação exata (diferencia maiúsculas)
    pub async fn described_text_exists(&self, kind: DescribedKind, text: &str) -> Result<bool, AppError> {
        let rules = kind.rules();
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
            rules.table, rules.text_column
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(text)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn insert_described(&self, kind: DescribedKind, nombre: &str, text: &str) -> Result<i32, AppError> {
        let rules = kind.rules();
        let sql = format!(
            "INSERT INTO {} (nombre, {}) VALUES ($1, $2) RETURNING {}",
            rules.table, rules.text_column, rules.id_column
        );
        let id: i32 = sqlx::query_scalar(&sql)
            .bind(nombre)
            .bind(text)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, rules.duplicate_name))?;
        Ok(id)
    }
}
