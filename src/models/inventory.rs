// src/models/inventory.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

// --- 1. Listagem de produtos (com estados derivados) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ProductListItem {
    pub id: i32,
    pub codigo_barras: String,
    pub nombre: String,
    pub categoria: String,
    pub unidad: String,
    pub cantidad: i32,
    /// `DD/MM/YYYY`
    #[schema(example = "31/12/2025")]
    pub fecha_vencimiento: Option<String>,
    #[schema(value_type = f64)]
    pub precio_costo: Decimal,
    #[schema(value_type = f64)]
    pub precio_venta: Decimal,
    #[schema(example = json!(["STOCK_BAJO"]))]
    pub estados: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductNameQuery {
    pub nombre: Option<String>,
}

// --- 2. Busca leve (tela de atualização) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ProductSearchHit {
    pub id: i32,
    pub codigo_barras: String,
    pub nombre: String,
}

// --- 3. Detalhe para edição ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ProductDetail {
    pub id: i32,
    pub codigo: String,
    pub nombre: String,
    pub categoria_id: i32,
    pub categoria_nombre: String,
    pub unidad_medida_id: i32,
    pub unidad_nombre: String,
    pub cantidad: i32,
    /// `YYYY-MM-DD`
    pub fechavencimiento: Option<String>,
    #[schema(value_type = f64)]
    pub preciocosto: Decimal,
    #[schema(value_type = f64)]
    pub precioventa: Decimal,
    /// Estados derivados separados por vírgula, ou `INACTIVO` se não houver
    pub estado: String,
}

// --- 4. Criação ---
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub codigo_barras: String,
    pub nombre: String,
    pub categoria_id: i32,
    pub unidad_medida_id: i32,
    pub cantidad: i32,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub precio_costo: Decimal,
    pub precio_venta: Decimal,
    pub usuario_id: i32,
    pub rol_id: i32,
}

// --- 5. Atualização parcial ---
// Só estes campos são aceitos; qualquer outro é ignorado pelo serde.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductPayload {
    #[schema(value_type = Option<String>)]
    pub codigo: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub nombre: Option<Value>,
    #[schema(value_type = Option<i32>)]
    pub categoria_id: Option<Value>,
    #[schema(value_type = Option<i32>)]
    pub unidad_id: Option<Value>,
    #[schema(value_type = Option<i32>)]
    pub cantidad: Option<Value>,
    #[serde(rename = "fechaVencimiento")]
    #[schema(value_type = Option<String>, example = "2025-12-31")]
    pub fecha_vencimiento: Option<Value>,
    #[serde(rename = "precioCosto")]
    #[schema(value_type = Option<f64>)]
    pub precio_costo: Option<Value>,
    #[serde(rename = "precioVenta")]
    #[schema(value_type = Option<f64>)]
    pub precio_venta: Option<Value>,
}

/// Um campo já validado e convertido, pronto para virar `coluna = valor`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductChange {
    Codigo(String),
    Nombre(String),
    CategoriaId(i32),
    UnidadId(i32),
    Cantidad(i32),
    FechaVencimiento(NaiveDate),
    PrecioCosto(Decimal),
    PrecioVenta(Decimal),
}

impl ProductChange {
    pub fn column(&self) -> &'static str {
        match self {
            ProductChange::Codigo(_) => "codigo_barras",
            ProductChange::Nombre(_) => "nombre",
            ProductChange::CategoriaId(_) => "categoria_id",
            ProductChange::UnidadId(_) => "unidad_medida_id",
            ProductChange::Cantidad(_) => "cantidad",
            ProductChange::FechaVencimiento(_) => "fecha_vencimiento",
            ProductChange::PrecioCosto(_) => "precio_costo",
            ProductChange::PrecioVenta(_) => "precio_venta",
        }
    }

    /// Nome do campo como o cliente enviou (vai em `campos_actualizados`)
    pub fn field_name(&self) -> &'static str {
        match self {
            ProductChange::Codigo(_) => "codigo",
            ProductChange::Nombre(_) => "nombre",
            ProductChange::CategoriaId(_) => "categoria_id",
            ProductChange::UnidadId(_) => "unidad_id",
            ProductChange::Cantidad(_) => "cantidad",
            ProductChange::FechaVencimiento(_) => "fechaVencimiento",
            ProductChange::PrecioCosto(_) => "precioCosto",
            ProductChange::PrecioVenta(_) => "precioVenta",
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateProductResponse {
    pub message: String,
    pub campos_actualizados: Vec<String>,
}

// --- 6. Estados e indicadores ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ProductStatusLabel {
    pub nombre: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ProductStats {
    pub total_productos: i64,
    pub stock_total: i64,
    pub productos_stock_bajo: i64,
    #[schema(value_type = f64)]
    pub costo_total: Decimal,
}
