// src/db/inventory_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::common::error::AppError;
use crate::models::inventory::{
    NewProduct, ProductChange, ProductDetail, ProductListItem, ProductSearchHit, ProductStats,
    ProductStatusLabel,
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

// Mesmo formato para a listagem e a busca; `$1` nulo = sem filtro
const PRODUCT_LIST_SQL: &str = r#"
    SELECT
        p.id,
        p.codigo_barras,
        p.nombre,
        c.nombre AS categoria,
        u.nombre AS unidad,
        p.cantidad,
        TO_CHAR(p.fecha_vencimiento, 'DD/MM/YYYY') AS fecha_vencimiento,
        p.precio_costo,
        p.precio_venta,
        COALESCE(
            ARRAY_AGG(pe.estado::TEXT ORDER BY pe.estado) FILTER (WHERE pe.estado IS NOT NULL),
            ARRAY[]::TEXT[]
        ) AS estados
    FROM producto_nuevo p
    JOIN categoriaproducto c ON c.id = p.categoria_id
    JOIN unidad_medida u ON u.id = p.unidad_medida_id
    LEFT JOIN producto_estado pe ON pe.producto_id = p.id
    WHERE ($1::TEXT IS NULL OR LOWER(p.nombre) LIKE $1 ESCAPE '\')
    GROUP BY p.id, c.nombre, u.nombre
    ORDER BY p.nombre ASC
"#;

/// Monta o `UPDATE` só com as colunas enviadas.
fn build_update(product_id: i32, changes: &[ProductChange]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE producto_nuevo SET ");
    let mut separated = builder.separated(", ");

    for change in changes {
        separated.push(change.column());
        separated.push_unseparated(" = ");
        match change {
            ProductChange::Codigo(v) | ProductChange::Nombre(v) => {
                separated.push_bind_unseparated(v.clone());
            }
            ProductChange::CategoriaId(v) | ProductChange::UnidadId(v) | ProductChange::Cantidad(v) => {
                separated.push_bind_unseparated(*v);
            }
            ProductChange::FechaVencimiento(v) => {
                separated.push_bind_unseparated(*v);
            }
            ProductChange::PrecioCosto(v) | ProductChange::PrecioVenta(v) => {
                separated.push_bind_unseparated(*v);
            }
        }
    }

    builder.push(" WHERE id = ");
    builder.push_bind(product_id);
    builder
}

fn duplicate_product(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("producto_nuevo_codigo_barras_key") => {
                    AppError::conflict("Ya existe otro producto con ese código de barras.")
                }
                _ => AppError::conflict("Ya existe otro producto con ese nombre."),
            };
        }
        if db_err.is_foreign_key_violation() {
            return AppError::bad_request("La categoría o unidad de medida no existe.");
        }
    }
    e.into()
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- Leitura ---

    pub async fn list_products(&self, name_pattern: Option<&str>) -> Result<Vec<ProductListItem>, AppError> {
        let products = sqlx::query_as::<_, ProductListItem>(PRODUCT_LIST_SQL)
            .bind(name_pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn search_by_name(&self, pattern: &str) -> Result<Vec<ProductSearchHit>, AppError> {
        let hits = sqlx::query_as::<_, ProductSearchHit>(
            r#"
            SELECT id, codigo_barras, nombre
            FROM producto_nuevo
            WHERE LOWER(nombre) LIKE $1 ESCAPE '\'
            ORDER BY nombre ASC
            "#,
        )
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(hits)
    }

    pub async fn find_detail(&self, product_id: i32) -> Result<Option<ProductDetail>, AppError> {
        let detail = sqlx::query_as::<_, ProductDetail>(
            r#"
            SELECT
                p.id,
                p.codigo_barras AS codigo,
                p.nombre,
                p.categoria_id,
                c.nombre AS categoria_nombre,
                p.unidad_medida_id,
                u.nombre AS unidad_nombre,
                p.cantidad,
                TO_CHAR(p.fecha_vencimiento, 'YYYY-MM-DD') AS fechavencimiento,
                p.precio_costo AS preciocosto,
                p.precio_venta AS precioventa,
                COALESCE(STRING_AGG(pe.estado, ',' ORDER BY pe.estado), 'INACTIVO') AS estado
            FROM producto_nuevo p
            JOIN categoriaproducto c ON c.id = p.categoria_id
            JOIN unidad_medida u ON u.id = p.unidad_medida_id
            LEFT JOIN producto_estado pe ON pe.producto_id = p.id
            WHERE p.id = $1
            GROUP BY p.id, c.nombre, u.nombre
            "#,
        )
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(detail)
    }

    pub async fn status_labels(&self) -> Result<Vec<ProductStatusLabel>, AppError> {
        let labels = sqlx::query_as::<_, ProductStatusLabel>(
            "SELECT DISTINCT estado AS nombre FROM producto_estado ORDER BY estado",
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(labels)
    }

    // Subconsultas separadas: o JOIN com producto_estado duplicaria as somas
    pub async fn stats(&self) -> Result<ProductStats, AppError> {
        let stats = sqlx::query_as::<_, ProductStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM producto_nuevo) AS total_productos,
                (SELECT COALESCE(SUM(cantidad), 0)::BIGINT FROM producto_nuevo) AS stock_total,
                (SELECT COUNT(DISTINCT producto_id) FROM producto_estado WHERE estado = 'STOCK_BAJO')
                    AS productos_stock_bajo,
                (SELECT COALESCE(SUM(cantidad * precio_costo), 0)::NUMERIC FROM producto_nuevo)
                    AS costo_total
            "#,
        )
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }

    // --- Unicidade ---

    pub async fn barcode_or_name_taken(&self, codigo_barras: &str, nombre: &str) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM producto_nuevo
                WHERE codigo_barras = $1 OR UPPER(nombre) = UPPER($2)
            )
            "#,
        )
            .bind(codigo_barras)
            .bind(nombre)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    pub async fn name_taken_by_other(&self, product_id: i32, nombre: &str) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM producto_nuevo WHERE UPPER(nombre) = UPPER($1) AND id <> $2)",
        )
            .bind(nombre)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    pub async fn barcode_taken_by_other(&self, product_id: i32, codigo_barras: &str) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM producto_nuevo WHERE codigo_barras = $1 AND id <> $2)",
        )
            .bind(codigo_barras)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    // --- Escrita ---

    pub async fn insert_product(&self, product: &NewProduct, imagen_url: Option<&str>) -> Result<i32, AppError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO producto_nuevo (
                codigo_barras, nombre, categoria_id, unidad_medida_id, cantidad,
                fecha_vencimiento, precio_costo, precio_venta, usuario_id, rol_id, imagen_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
            .bind(&product.codigo_barras)
            .bind(&product.nombre)
            .bind(product.categoria_id)
            .bind(product.unidad_medida_id)
            .bind(product.cantidad)
            .bind(product.fecha_vencimiento)
            .bind(product.precio_costo)
            .bind(product.precio_venta)
            .bind(product.usuario_id)
            .bind(product.rol_id)
            .bind(imagen_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match duplicate_product(e) {
                AppError::Conflict(_) => {
                    AppError::conflict("El producto ya existe (código o nombre duplicado).")
                }
                other => other,
            })?;
        Ok(id)
    }

    pub async fn apply_changes(&self, product_id: i32, changes: &[ProductChange]) -> Result<u64, AppError> {
        let mut builder = build_update(product_id, changes);
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(duplicate_product)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn update_only_touches_sent_columns() {
        let changes = vec![
            ProductChange::Nombre("Canchita".into()),
            ProductChange::Cantidad(40),
        ];
        let builder = build_update(7, &changes);
        assert_eq!(
            builder.sql(),
            "UPDATE producto_nuevo SET nombre = $1, cantidad = $2 WHERE id = $3"
        );
    }

    #[test]
    fn update_maps_client_fields_to_columns() {
        let changes = vec![
            ProductChange::Codigo("775".into()),
            ProductChange::UnidadId(2),
            ProductChange::FechaVencimiento(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()),
            ProductChange::PrecioVenta(Decimal::new(1250, 2)),
        ];
        let builder = build_update(1, &changes);
        assert_eq!(
            builder.sql(),
            "UPDATE producto_nuevo SET codigo_barras = $1, unidad_medida_id = $2, \
             fecha_vencimiento = $3, precio_venta = $4 WHERE id = $5"
        );
    }
}
