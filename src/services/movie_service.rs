// src/services/movie_service.rs

use std::sync::Arc;

use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::common::error::AppError;
use crate::common::parse::{parse_iso_date, FormFields};
use crate::common::sanitize::sanitize_opt;
use crate::db::MovieRepository;
use crate::models::movies::{
    CreateMovieResponse, MovieReference, MovieReferences, NewMovie, SelectData,
};
use crate::services::inventory_service::INVALID_IMAGE_MESSAGE;
use crate::storage::{unique_file_name, ImageStorage, ImageUpload};

const MAX_DURATION_MINUTES: i32 = 600;

/// Separa `YYYY-MM-DDTHH:MM[:SS]` em data e hora (`HH:MM`).
fn split_date_time(raw: &str) -> (Option<String>, Option<String>) {
    let (date, time) = match raw.trim().split_once('T') {
        Some((d, t)) => (d, t),
        None => (raw.trim(), ""),
    };
    let time: String = time.chars().take(5).collect();
    (
        Some(date.to_string()).filter(|d| !d.is_empty()),
        Some(time).filter(|t| !t.is_empty()),
    )
}

/// `HH:MM` (segundos, se vierem, são descartados)
fn normalize_time(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok()
        .map(|t| t.format("%H:%M").to_string())
}

/// Valida o formulário do filme na mesma ordem em que o front mostra os erros.
pub fn parse_movie_form(fields: &FormFields) -> Result<NewMovie, AppError> {
    let titulo = sanitize_opt(fields.first(&["titulo"]))
        .ok_or_else(|| AppError::bad_request("El título es obligatorio"))?;

    let duracion_minutos = fields
        .first_i32(&["duracionMin", "duracion", "duracion_minutos"])
        .filter(|d| (1..=MAX_DURATION_MINUTES).contains(d))
        .ok_or_else(|| AppError::bad_request("Duración inválida (1-600)"))?;

    let mut fecha = fields.first(&["fecha"]).map(str::to_string);
    let mut horario = fields.first(&["horario"]).map(str::to_string);
    if fecha.is_none() && horario.is_none() {
        if let Some(combined) = fields.first(&["fechaHora"]) {
            (fecha, horario) = split_date_time(combined);
        }
    }

    let fecha = fecha.ok_or_else(|| AppError::bad_request("La fecha es obligatoria"))?;
    let fecha = parse_iso_date(&fecha)
        .ok_or_else(|| AppError::bad_request("La fecha debe tener el formato YYYY-MM-DD"))?;

    let horario = horario.ok_or_else(|| AppError::bad_request("El horario es obligatorio"))?;
    let horario = normalize_time(&horario)
        .ok_or_else(|| AppError::bad_request("El horario debe tener el formato HH:MM"))?;

    let precio = fields
        .first_decimal(&["precio"])
        .filter(|p| *p >= Decimal::ZERO)
        .ok_or_else(|| AppError::bad_request("Precio inválido"))?;

    // Zero ou ausente contam como "falta"
    let ids: Vec<(MovieReference, Option<i32>)> = MovieReference::ALL
        .iter()
        .map(|r| (*r, fields.first_i32(&r.form_aliases()).filter(|id| *id != 0)))
        .collect();
    let missing: Vec<&str> = ids
        .iter()
        .filter(|(_, id)| id.is_none())
        .map(|(r, _)| r.label())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::bad_request(format!("Faltan campos: {}", missing.join(", "))));
    }

    let id = |r: MovieReference| {
        ids.iter()
            .find(|(candidate, _)| *candidate == r)
            .and_then(|(_, id)| *id)
            .unwrap_or_default()
    };

    Ok(NewMovie {
        titulo,
        duracion_minutos,
        fecha,
        horario,
        precio,
        references: MovieReferences {
            id_idioma: id(MovieReference::Idioma),
            id_clasificacion: id(MovieReference::Clasificacion),
            id_formato: id(MovieReference::Formato),
            id_categoria: id(MovieReference::Categoria),
            id_sala: id(MovieReference::Sala),
        },
    })
}

#[derive(Clone)]
pub struct MovieService {
    repo: MovieRepository,
    storage: Arc<dyn ImageStorage>,
}

impl MovieService {
    pub fn new(repo: MovieRepository, storage: Arc<dyn ImageStorage>) -> Self {
        Self { repo, storage }
    }

    /// As cinco listas dos `<select>`, buscadas em paralelo.
    pub async fn select_data(&self) -> Result<SelectData, AppError> {
        let (idiomas, clasificaciones, formatos, categorias, salas) = tokio::try_join!(
            self.repo.list_options(MovieReference::Idioma),
            self.repo.list_options(MovieReference::Clasificacion),
            self.repo.list_options(MovieReference::Formato),
            self.repo.list_options(MovieReference::Categoria),
            self.repo.list_options(MovieReference::Sala),
        )?;

        Ok(SelectData {
            idiomas,
            clasificaciones,
            formatos,
            salas,
            categorias,
        })
    }

    pub async fn create_movie(
        &self,
        fields: &FormFields,
        image: Option<ImageUpload>,
    ) -> Result<CreateMovieResponse, AppError> {
        // 1. Imagem obrigatória e de tipo aceito
        let image = image.ok_or_else(|| AppError::bad_request("Debe subir una imagen de la película"))?;
        let extension = image
            .allowed_extension()
            .ok_or_else(|| AppError::bad_request(INVALID_IMAGE_MESSAGE))?;

        // 2. Campos
        let movie = parse_movie_form(fields)?;

        // 3. Referências existem? (uma mensagem por vez)
        for reference in MovieReference::ALL {
            let id = movie.references.get(reference);
            if !self.repo.reference_exists(reference, id).await? {
                return Err(AppError::bad_request(reference.missing_message()));
            }
        }

        // 4. Mesma configuração já cadastrada
        if self.repo.duplicate_exists(&movie).await? {
            return Err(AppError::conflict("La película ya existe con esa configuración"));
        }

        // 5. Grava a imagem e insere; se o insert falhar a imagem sai junto
        let stored = self
            .storage
            .save(&unique_file_name("pelicula", extension), image.data)
            .await?;

        match self.repo.insert_movie(&movie, &stored.url).await {
            Ok(id) => {
                tracing::info!("🎬 Filme '{}' registrado (id {})", movie.titulo, id);
                Ok(CreateMovieResponse {
                    message: "Película registrada correctamente".into(),
                    id,
                    imagen_url: stored.url,
                })
            }
            Err(e) => {
                if let Err(remove_err) = self.storage.remove(&stored).await {
                    tracing::warn!("Imagem órfã {}: {}", stored.file_name, remove_err);
                }
                Err(e)
            }
        }
    }
}
