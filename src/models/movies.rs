// src/models/movies.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Opção de um `<select>` do formulário de filmes.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ReferenceOption {
    pub id: i32,
    pub nombre: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectData {
    pub idiomas: Vec<ReferenceOption>,
    pub clasificaciones: Vec<ReferenceOption>,
    pub formatos: Vec<ReferenceOption>,
    pub salas: Vec<ReferenceOption>,
    pub categorias: Vec<ReferenceOption>,
}

/// As cinco tabelas de referência de um filme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieReference {
    Idioma,
    Clasificacion,
    Formato,
    Categoria,
    Sala,
}

impl MovieReference {
    pub const ALL: [MovieReference; 5] = [
        MovieReference::Idioma,
        MovieReference::Clasificacion,
        MovieReference::Formato,
        MovieReference::Categoria,
        MovieReference::Sala,
    ];

    pub fn table(self) -> &'static str {
        match self {
            MovieReference::Idioma => "idiomas",
            MovieReference::Clasificacion => "clasificacion",
            MovieReference::Formato => "formato",
            MovieReference::Categoria => "categorias",
            MovieReference::Sala => "salas",
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            MovieReference::Idioma => "id_idioma",
            MovieReference::Clasificacion => "id_clasificacion",
            MovieReference::Formato => "id_formato",
            MovieReference::Categoria => "id_categoria",
            MovieReference::Sala => "id_sala",
        }
    }

    /// Nome usado em "Faltan campos: ..."
    pub fn label(self) -> &'static str {
        match self {
            MovieReference::Idioma => "idioma",
            MovieReference::Clasificacion => "clasificación",
            MovieReference::Formato => "formato",
            MovieReference::Categoria => "categoría",
            MovieReference::Sala => "sala",
        }
    }

    pub fn missing_message(self) -> &'static str {
        match self {
            MovieReference::Idioma => "El idioma no existe",
            MovieReference::Clasificacion => "La clasificación no existe",
            MovieReference::Formato => "El formato no existe",
            MovieReference::Categoria => "La categoría no existe",
            MovieReference::Sala => "La sala no existe",
        }
    }

    /// Nomes aceitos no formulário, em ordem de preferência
    pub fn form_aliases(self) -> [&'static str; 3] {
        match self {
            MovieReference::Idioma => ["id_idioma", "idIdioma", "idioma"],
            MovieReference::Clasificacion => ["id_clasificacion", "idClasificacion", "clasificacion"],
            MovieReference::Formato => ["id_formato", "idFormato", "formato"],
            MovieReference::Categoria => ["id_categoria", "idCategoria", "categoria"],
            MovieReference::Sala => ["id_sala", "idSala", "sala"],
        }
    }
}

/// Ids das cinco referências, na ordem de `MovieReference::ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieReferences {
    pub id_idioma: i32,
    pub id_clasificacion: i32,
    pub id_formato: i32,
    pub id_categoria: i32,
    pub id_sala: i32,
}

impl MovieReferences {
    pub fn get(&self, reference: MovieReference) -> i32 {
        match reference {
            MovieReference::Idioma => self.id_idioma,
            MovieReference::Clasificacion => self.id_clasificacion,
            MovieReference::Formato => self.id_formato,
            MovieReference::Categoria => self.id_categoria,
            MovieReference::Sala => self.id_sala,
        }
    }
}

/// Filme já validado, sem a imagem.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub titulo: String,
    pub duracion_minutos: i32,
    pub fecha: NaiveDate,
    /// `HH:MM`
    pub horario: String,
    pub precio: Decimal,
    pub references: MovieReferences,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateMovieResponse {
    pub message: String,
    #[serde(rename = "ID")]
    pub id: i32,
    pub imagen_url: String,
}
