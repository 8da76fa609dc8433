// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Tabelas de catálogo com código gerado (`CAT001`, `UM001`...).
/// As duas compartilham a mesma forma; muda só o nome da tabela,
/// o prefixo do código e a coluna que as referencia em `producto_nuevo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    ProductCategory,
    UnitOfMeasure,
}

impl CatalogKind {
    pub fn table(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => "categoriaproducto",
            CatalogKind::UnitOfMeasure => "unidad_medida",
        }
    }

    pub fn code_prefix(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => "CAT",
            CatalogKind::UnitOfMeasure => "UM",
        }
    }

    /// Coluna de `producto_nuevo` que aponta para esta tabela
    pub fn product_column(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => "categoria_id",
            CatalogKind::UnitOfMeasure => "unidad_medida_id",
        }
    }

    /// Chave do array no corpo do lote e na resposta
    pub fn batch_key(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => "categorias",
            CatalogKind::UnitOfMeasure => "unidades",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => "Categoría",
            CatalogKind::UnitOfMeasure => "Unidad de medida",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => "categorías",
            CatalogKind::UnitOfMeasure => "unidades de medida",
        }
    }

    pub fn empty_batch_message(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => "Debe enviar al menos una categoría.",
            CatalogKind::UnitOfMeasure => "Debe enviar al menos una unidad de medida.",
        }
    }

    pub fn nameless_batch_message(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => "Todas las categorías deben tener un nombre válido.",
            CatalogKind::UnitOfMeasure => "Todas las unidades deben tener un nombre válido.",
        }
    }

    pub fn in_use_message(self) -> &'static str {
        match self {
            CatalogKind::ProductCategory => {
                "No se puede eliminar esta categoría porque está asociada a productos existentes."
            }
            CatalogKind::UnitOfMeasure => {
                "No se puede eliminar esta unidad de medida porque está asociada a productos existentes."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CatalogEntry {
    pub id: i32,
    pub codigo: String,
    pub nombre: String,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CatalogSearchHit {
    pub id: i32,
    pub codigo: String,
    pub nombre: String,
}

/// Linha gerada por um lote (código já calculado).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NewCatalogEntry {
    #[schema(example = "CAT001")]
    pub codigo: String,
    #[schema(example = "Bebidas")]
    pub nombre: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogBatchItem {
    /// Ignorado: o código é sempre gerado pelo servidor
    #[serde(default)]
    pub codigo: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
}

// O lote chega em `categorias` ou `unidades`, conforme a rota.
// Fica como Value: um valor que não é lista vira lote vazio (400), não 422.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogBatchPayload {
    #[serde(default)]
    #[schema(value_type = Option<Vec<CatalogBatchItem>>)]
    pub categorias: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<CatalogBatchItem>>)]
    pub unidades: Option<Value>,
}

impl CatalogBatchPayload {
    pub fn into_items(self, kind: CatalogKind) -> Option<Vec<CatalogBatchItem>> {
        let raw = match kind {
            CatalogKind::ProductCategory => self.categorias,
            CatalogKind::UnitOfMeasure => self.unidades,
        };
        let Some(Value::Array(items)) = raw else {
            return None;
        };

        // Item sem `nombre` de texto fica sem nome e é descartado adiante
        let items = items
            .iter()
            .map(|item| CatalogBatchItem {
                codigo: item.get("codigo").and_then(Value::as_str).map(str::to_string),
                nombre: item.get("nombre").and_then(Value::as_str).map(str::to_string),
            })
            .collect();
        Some(items)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogSearchQuery {
    pub q: Option<String>,
}

// =============================================================================
//  CATÁLOGO DE FILMES (categorias / clasificacion)
// =============================================================================

/// Tabelas de referência de filmes que carregam um texto longo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribedKind {
    MovieCategory,
    Classification,
}

pub struct DescribedRules {
    pub table: &'static str,
    pub id_column: &'static str,
    pub text_column: &'static str,
    pub name_max: usize,
    pub text_max: usize,
    pub missing_message: &'static str,
    pub name_too_long: &'static str,
    pub text_too_long: &'static str,
    pub duplicate_name: &'static str,
    pub duplicate_text: &'static str,
    pub created_message: &'static str,
}

/// Limite comum dos textos longos (sinopsis/descripcion)
pub const LONG_TEXT_MAX: usize = 500;

impl DescribedKind {
    pub fn rules(self) -> DescribedRules {
        match self {
            DescribedKind::MovieCategory => DescribedRules {
                table: "categorias",
                id_column: "id_categoria",
                text_column: "sinopsis",
                name_max: 80,
                text_max: LONG_TEXT_MAX,
                missing_message: "Nombre y sinopsis son obligatorios",
                name_too_long: "El nombre no debe superar 80 caracteres",
                text_too_long: "La sinopsis no debe superar 500 caracteres",
                duplicate_name: "La categoría ya existe",
                duplicate_text: "La sinopsis ya está registrada",
                created_message: "Categoría registrada correctamente",
            },
            DescribedKind::Classification => DescribedRules {
                table: "clasificacion",
                id_column: "id_clasificacion",
                text_column: "descripcion",
                name_max: 50,
                text_max: LONG_TEXT_MAX,
                missing_message: "Nombre y descripción son obligatorios",
                name_too_long: "El nombre no debe superar 50 caracteres",
                text_too_long: "La descripción no debe superar 500 caracteres",
                duplicate_name: "La clasificación ya existe",
                duplicate_text: "La descripción ya está registrada",
                created_message: "Clasificación registrada correctamente",
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MovieCategory {
    pub id: i32,
    pub nombre: String,
    pub sinopsis: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Classification {
    pub id: i32,
    pub nombre: String,
    pub descripcion: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMovieCategoryPayload {
    #[schema(example = "Terror")]
    pub nombre: Option<String>,
    pub sinopsis: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateClassificationPayload {
    #[schema(example = "B15")]
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
}
