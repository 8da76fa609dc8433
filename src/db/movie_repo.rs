// src/db/movie_repo.rs

use sqlx::PgPool;

use crate::common::error::AppError;
use crate::models::movies::{MovieReference, NewMovie, ReferenceOption};

#[derive(Clone)]
pub struct MovieRepository {
    pool: PgPool,
}

impl MovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_options(&self, reference: MovieReference) -> Result<Vec<ReferenceOption>, AppError> {
        let sql = format!(
            "SELECT {} AS id, nombre FROM {} ORDER BY nombre",
            reference.id_column(),
            reference.table()
        );
        let options = sqlx::query_as::<_, ReferenceOption>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(options)
    }

    pub async fn reference_exists(&self, reference: MovieReference, id: i32) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
            reference.table(),
            reference.id_column()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    // Mesmo título (sem diferenciar caixa) com as mesmas cinco referências
    pub async fn duplicate_exists(&self, movie: &NewMovie) -> Result<bool, AppError> {
        let refs = &movie.references;
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM pelicula
                WHERE UPPER(titulo) = UPPER($1)
                  AND id_idioma = $2
                  AND id_clasificacion = $3
                  AND id_formato = $4
                  AND id_categoria = $5
                  AND id_sala = $6
            )
            "#,
        )
            .bind(&movie.titulo)
            .bind(refs.id_idioma)
            .bind(refs.id_clasificacion)
            .bind(refs.id_formato)
            .bind(refs.id_categoria)
            .bind(refs.id_sala)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    // O id vem da coluna SERIAL
    pub async fn insert_movie(&self, movie: &NewMovie, imagen_url: &str) -> Result<i32, AppError> {
        let refs = &movie.references;
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO pelicula (
                titulo, duracion_minutos, fecha, horario, precio,
                id_idioma, id_clasificacion, id_formato, id_categoria, id_sala, imagen_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id_pelicula
            "#,
        )
            .bind(&movie.titulo)
            .bind(movie.duracion_minutos)
            .bind(movie.fecha)
            .bind(&movie.horario)
            .bind(movie.precio)
            .bind(refs.id_idioma)
            .bind(refs.id_clasificacion)
            .bind(refs.id_formato)
            .bind(refs.id_categoria)
            .bind(refs.id_sala)
            .bind(imagen_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::bad_request(
                            "Alguna referencia (idioma, clasificación, formato, categoría o sala) no existe",
                        );
                    }
                }
                e.into()
            })?;
        Ok(id)
    }
}
