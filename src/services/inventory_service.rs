// src/services/inventory_service.rs

use std::sync::Arc;

use serde_json::Value;

use crate::common::db_utils::like_pattern;
use crate::common::error::AppError;
use crate::common::parse::{
    is_blank, loose_decimal, loose_i32, loose_string, parse_flexible_date, parse_iso_date, FormFields,
};
use crate::common::sanitize::{sanitize_opt, sanitize_text};
use crate::db::{InventoryRepository, UserRepository};
use crate::models::inventory::{
    NewProduct, ProductChange, ProductDetail, ProductListItem, ProductSearchHit, ProductStats,
    ProductStatusLabel, UpdateProductPayload, UpdateProductResponse,
};
use crate::storage::{unique_file_name, ImageStorage, ImageUpload, StoredImage};

pub const INVALID_IMAGE_MESSAGE: &str = "Solo se permiten imágenes JPG, PNG o WEBP";

// ---
// Conversões puras
// ---

fn invalid_number(field: &str) -> AppError {
    AppError::bad_request(format!("El campo {} debe ser numérico.", field))
}

/// Lê o formulário de "novo produto". Quantidade ausente vale 0.
pub fn parse_new_product(fields: &FormFields) -> Result<NewProduct, AppError> {
    const REQUIRED: [&str; 8] = [
        "codigo_barras",
        "nombre",
        "categoria_id",
        "unidad_medida_id",
        "precio_venta",
        "precio_costo",
        "usuario_id",
        "rol_id",
    ];

    let codigo_barras = sanitize_opt(fields.first(&["codigo_barras"]));
    let nombre = sanitize_opt(fields.first(&["nombre"]));
    let all_present = REQUIRED.iter().all(|name| fields.first(&[*name]).is_some());

    let (Some(codigo_barras), Some(nombre), true) = (codigo_barras, nombre, all_present) else {
        return Err(AppError::bad_request("Faltan campos obligatorios."));
    };

    let int = |name: &str| fields.first_i32(&[name]).ok_or_else(|| invalid_number(name));
    let dec = |name: &str| fields.first_decimal(&[name]).ok_or_else(|| invalid_number(name));

    let cantidad = match fields.first(&["cantidad"]) {
        Some(_) => int("cantidad")?,
        None => 0,
    };

    let fecha_vencimiento = match fields.first(&["fecha_vencimiento"]) {
        Some(raw) => Some(
            parse_flexible_date(raw)
                .ok_or_else(|| AppError::bad_request("Fecha de vencimiento inválida."))?,
        ),
        None => None,
    };

    Ok(NewProduct {
        codigo_barras,
        nombre,
        categoria_id: int("categoria_id")?,
        unidad_medida_id: int("unidad_medida_id")?,
        cantidad,
        fecha_vencimiento,
        precio_costo: dec("precio_costo")?,
        precio_venta: dec("precio_venta")?,
        usuario_id: int("usuario_id")?,
        rol_id: int("rol_id")?,
    })
}

// Campo de texto: vazio é "não enviado"; não-texto é erro
fn text_change(raw: Option<&Value>, field: &str) -> Result<Option<String>, AppError> {
    if is_blank(raw) {
        return Ok(None);
    }
    let text = raw
        .and_then(loose_string)
        .ok_or_else(|| AppError::bad_request(format!("El campo {} debe ser texto.", field)))?;
    Ok(sanitize_opt(Some(text.as_str())))
}

fn int_change(raw: Option<&Value>, field: &str) -> Result<Option<i32>, AppError> {
    if is_blank(raw) {
        return Ok(None);
    }
    raw.and_then(loose_i32).map(Some).ok_or_else(|| invalid_number(field))
}

fn decimal_change(raw: Option<&Value>, field: &str) -> Result<Option<rust_decimal::Decimal>, AppError> {
    if is_blank(raw) {
        return Ok(None);
    }
    raw.and_then(loose_decimal).map(Some).ok_or_else(|| invalid_number(field))
}

/// Converte o corpo do PUT numa lista de alterações; exige ao menos uma.
pub fn collect_changes(payload: &UpdateProductPayload) -> Result<Vec<ProductChange>, AppError> {
    let mut changes = Vec::new();

    if let Some(v) = text_change(payload.codigo.as_ref(), "codigo")? {
        changes.push(ProductChange::Codigo(v));
    }
    if let Some(v) = text_change(payload.nombre.as_ref(), "nombre")? {
        changes.push(ProductChange::Nombre(v));
    }
    if let Some(v) = int_change(payload.categoria_id.as_ref(), "categoria_id")? {
        changes.push(ProductChange::CategoriaId(v));
    }
    if let Some(v) = int_change(payload.unidad_id.as_ref(), "unidad_id")? {
        changes.push(ProductChange::UnidadId(v));
    }
    if let Some(v) = int_change(payload.cantidad.as_ref(), "cantidad")? {
        changes.push(ProductChange::Cantidad(v));
    }
    if let Some(raw) = text_change(payload.fecha_vencimiento.as_ref(), "fechaVencimiento")? {
        let date = parse_iso_date(&raw).ok_or_else(|| {
            AppError::bad_request("La fecha de vencimiento debe tener el formato YYYY-MM-DD.")
        })?;
        changes.push(ProductChange::FechaVencimiento(date));
    }
    if let Some(v) = decimal_change(payload.precio_costo.as_ref(), "precioCosto")? {
        changes.push(ProductChange::PrecioCosto(v));
    }
    if let Some(v) = decimal_change(payload.precio_venta.as_ref(), "precioVenta")? {
        changes.push(ProductChange::PrecioVenta(v));
    }

    if changes.is_empty() {
        return Err(AppError::bad_request("No se enviaron campos para actualizar."));
    }
    Ok(changes)
}

/// Id de rota: inteiro positivo
pub fn parse_product_id(raw: &str) -> Result<i32, AppError> {
    sanitize_text(raw)
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("El ID es obligatorio y debe ser numérico."))
}

fn required_name(raw: Option<&str>) -> Result<String, AppError> {
    sanitize_opt(raw).ok_or_else(|| AppError::bad_request("El nombre de búsqueda es obligatorio."))
}

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
    user_repo: UserRepository,
    storage: Arc<dyn ImageStorage>,
}

impl InventoryService {
    pub fn new(repo: InventoryRepository, user_repo: UserRepository, storage: Arc<dyn ImageStorage>) -> Self {
        Self { repo, user_repo, storage }
    }

    pub async fn list_products(&self) -> Result<Vec<ProductListItem>, AppError> {
        self.repo.list_products(None).await
    }

    pub async fn search_products(&self, nombre: Option<&str>) -> Result<Vec<ProductListItem>, AppError> {
        let nombre = required_name(nombre)?;
        self.repo.list_products(Some(&like_pattern(&nombre))).await
    }

    pub async fn search_product_hits(&self, nombre: Option<&str>) -> Result<Vec<ProductSearchHit>, AppError> {
        let nombre = required_name(nombre)?;
        self.repo.search_by_name(&like_pattern(&nombre)).await
    }

    pub async fn product_detail(&self, product_id: i32) -> Result<ProductDetail, AppError> {
        self.repo
            .find_detail(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Producto no encontrado."))
    }

    pub async fn status_labels(&self) -> Result<Vec<ProductStatusLabel>, AppError> {
        self.repo.status_labels().await
    }

    pub async fn stats(&self) -> Result<ProductStats, AppError> {
        self.repo.stats().await
    }

    pub async fn create_product(
        &self,
        fields: &FormFields,
        image: Option<ImageUpload>,
    ) -> Result<i32, AppError> {
        let product = parse_new_product(fields)?;

        let extension = match &image {
            Some(upload) => Some(
                upload
                    .allowed_extension()
                    .ok_or_else(|| AppError::bad_request(INVALID_IMAGE_MESSAGE))?,
            ),
            None => None,
        };

        if !self.user_repo.exists_with_role(product.usuario_id, product.rol_id).await? {
            return Err(AppError::forbidden("Usuario o rol inválido."));
        }

        if self.repo.barcode_or_name_taken(&product.codigo_barras, &product.nombre).await? {
            return Err(AppError::conflict("El producto ya existe (código o nombre duplicado)."));
        }

        let stored: Option<StoredImage> = match (image, extension) {
            (Some(upload), Some(ext)) => {
                let file_name = unique_file_name("producto", ext);
                Some(self.storage.save(&file_name, upload.data).await?)
            }
            _ => None,
        };

        let inserted = self
            .repo
            .insert_product(&product, stored.as_ref().map(|s| s.url.as_str()))
            .await;

        match inserted {
            Ok(id) => {
                tracing::info!("✅ Produto '{}' criado (id {})", product.nombre, id);
                Ok(id)
            }
            Err(e) => {
                if let Some(image) = &stored {
                    if let Err(remove_err) = self.storage.remove(image).await {
                        tracing::warn!("Imagem órfã {}: {}", image.file_name, remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    pub async fn update_product(
        &self,
        product_id: i32,
        payload: &UpdateProductPayload,
    ) -> Result<UpdateProductResponse, AppError> {
        let changes = collect_changes(payload)?;

        // Unicidade contra os *outros* produtos, antes de escrever
        for change in &changes {
            match change {
                ProductChange::Nombre(nombre) => {
                    if self.repo.name_taken_by_other(product_id, nombre).await? {
                        return Err(AppError::conflict("Ya existe otro producto con ese nombre."));
                    }
                }
                ProductChange::Codigo(codigo) => {
                    if self.repo.barcode_taken_by_other(product_id, codigo).await? {
                        return Err(AppError::conflict(
                            "Ya existe otro producto con ese código de barras.",
                        ));
                    }
                }
                _ => {}
            }
        }

        if self.repo.apply_changes(product_id, &changes).await? == 0 {
            return Err(AppError::not_found("Producto no encontrado o sin cambios."));
        }

        let campos: Vec<String> = changes.iter().map(|c| c.field_name().to_string()).collect();
        tracing::info!("✏️ Produto {} atualizado: {:?}", product_id, campos);

        Ok(UpdateProductResponse {
            message: "Producto actualizado correctamente".into(),
            campos_actualizados: campos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::{lazy_state, seed_product, state_with_pool};
    use axum::body::Bytes;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::PgPool;

    fn payload(body: Value) -> UpdateProductPayload {
        serde_json::from_value(body).unwrap()
    }

    fn product_form() -> FormFields {
        [
            ("codigo_barras", "7750001"),
            ("nombre", " Canchita grande "),
            ("categoria_id", "1"),
            ("unidad_medida_id", "2"),
            ("precio_venta", "12.50"),
            ("precio_costo", "6"),
            ("usuario_id", "1"),
            ("rol_id", "1"),
            ("fecha_vencimiento", "31/12/2025"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = collect_changes(&payload(json!({}))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "No se enviaron campos para actualizar."));

        // Vazios e nulos não contam; campos fora da lista são ignorados
        let err = collect_changes(&payload(json!({"nombre": "", "cantidad": null, "estado": "VENCIDO"})))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn update_coerces_numbers_and_sanitizes_text() {
        let changes = collect_changes(&payload(json!({
            "nombre": "  <b>Canchita</b> ",
            "cantidad": "25",
            "precioVenta": 9.9,
            "fechaVencimiento": "2026-01-15"
        })))
        .unwrap();

        assert_eq!(
            changes,
            vec![
                ProductChange::Nombre("Canchita".into()),
                ProductChange::Cantidad(25),
                ProductChange::FechaVencimiento(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
                ProductChange::PrecioVenta(Decimal::new(99, 1)),
            ]
        );
    }

    #[test]
    fn update_rejects_garbage_numbers_and_dates() {
        let err = collect_changes(&payload(json!({"cantidad": "muchos"}))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("cantidad")));

        let err = collect_changes(&payload(json!({"fechaVencimiento": "15/01/2026"}))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("YYYY-MM-DD")));
    }

    #[test]
    fn new_product_form_is_parsed() {
        let product = parse_new_product(&product_form()).unwrap();
        assert_eq!(product.nombre, "Canchita grande");
        assert_eq!(product.cantidad, 0);
        assert_eq!(product.precio_venta, Decimal::new(1250, 2));
        assert_eq!(product.fecha_vencimiento, NaiveDate::from_ymd_opt(2025, 12, 31));
    }

    #[test]
    fn new_product_requires_every_mandatory_field() {
        let mut form = product_form();
        form.insert("rol_id", "");
        let err = parse_new_product(&form).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Faltan campos obligatorios."));
    }

    #[test]
    fn product_id_must_be_positive() {
        assert_eq!(parse_product_id(" 12 ").unwrap(), 12);
        assert!(parse_product_id("0").is_err());
        assert!(parse_product_id("abc").is_err());
    }

    #[tokio::test]
    async fn product_search_requires_a_name() {
        let state = lazy_state(false);
        let err = state.inventory_service.search_products(Some("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = state.inventory_service.search_product_hits(None).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn new_product_with_a_non_image_file_is_rejected() {
        let state = lazy_state(false);
        let upload = ImageUpload {
            original_name: "lista.pdf".into(),
            content_type: "application/pdf".into(),
            data: Bytes::from_static(b"%PDF"),
        };
        let err = state
            .inventory_service
            .create_product(&product_form(), Some(upload))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == INVALID_IMAGE_MESSAGE));
    }

    // --- Com banco ---

    #[sqlx::test]
    async fn name_of_another_product_is_a_conflict_and_nothing_changes(pool: PgPool) {
        seed_product(&pool, "775", "Canchita").await;
        let gaseosa = seed_product(&pool, "776", "Gaseosa").await;
        let service = state_with_pool(pool, false).inventory_service;

        let err = service
            .update_product(gaseosa, &payload(json!({ "nombre": "CANCHITA", "cantidad": 3 })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Ya existe otro producto con ese nombre."));

        let err = service
            .update_product(gaseosa, &payload(json!({ "codigo": "775" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let detail = service.product_detail(gaseosa).await.unwrap();
        assert_eq!(detail.nombre, "Gaseosa");
        assert_eq!(detail.codigo, "776");
        assert_eq!(detail.cantidad, 50);
    }

    #[sqlx::test]
    async fn partial_update_touches_only_sent_fields(pool: PgPool) {
        let id = seed_product(&pool, "775", "Canchita").await;
        let service = state_with_pool(pool, false).inventory_service;

        // O próprio nome não conta como duplicado
        let response = service
            .update_product(id, &payload(json!({ "nombre": "Canchita", "cantidad": "4" })))
            .await
            .unwrap();
        assert_eq!(response.campos_actualizados, vec!["nombre", "cantidad"]);

        let detail = service.product_detail(id).await.unwrap();
        assert_eq!(detail.cantidad, 4);
        assert_eq!(detail.codigo, "775");
        assert!(detail.estado.contains("STOCK_BAJO"));
    }

    #[sqlx::test]
    async fn missing_product_is_not_found(pool: PgPool) {
        let service = state_with_pool(pool, false).inventory_service;
        let err = service
            .update_product(404, &payload(json!({ "cantidad": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(service.product_detail(404).await, Err(AppError::NotFound(_))));
    }
}
