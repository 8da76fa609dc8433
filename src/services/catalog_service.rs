// src/services/catalog_service.rs

use std::collections::BTreeSet;

use sqlx::PgPool;

use crate::common::db_utils::like_pattern;
use crate::common::error::AppError;
use crate::common::sanitize::{sanitize_opt, sanitize_text};
use crate::db::CatalogRepository;
use crate::models::catalog::{
    CatalogBatchItem, CatalogEntry, CatalogKind, CatalogSearchHit, Classification, DescribedKind,
    MovieCategory, NewCatalogEntry,
};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;

/// Códigos consecutivos a partir do maior sufixo existente.
/// Largura mínima de 3 dígitos (`CAT999` -> `CAT1000`).
pub fn next_codes(prefix: &str, highest: i64, count: usize) -> Vec<String> {
    (1..=count as i64)
        .map(|offset| format!("{}{:03}", prefix, highest + offset))
        .collect()
}

/// Limpa e valida os nomes de um lote antes de ir ao banco.
pub fn prepare_batch_names(
    kind: CatalogKind,
    items: Option<Vec<CatalogBatchItem>>,
) -> Result<Vec<String>, AppError> {
    let items = match items {
        Some(items) if !items.is_empty() => items,
        _ => return Err(AppError::bad_request(kind.empty_batch_message())),
    };

    // Sem nome (ou só marcação) = descartado
    let names: Vec<String> = items
        .into_iter()
        .filter_map(|item| sanitize_opt(item.nombre.as_deref()))
        .collect();

    if names.is_empty() {
        return Err(AppError::bad_request(kind.nameless_batch_message()));
    }

    let out_of_range: Vec<&str> = names
        .iter()
        .filter(|n| {
            let len = n.chars().count();
            !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len)
        })
        .map(String::as_str)
        .collect();
    if !out_of_range.is_empty() {
        return Err(AppError::bad_request(format!(
            "El nombre debe tener entre {} y {} caracteres: {}",
            NAME_MIN_CHARS,
            NAME_MAX_CHARS,
            out_of_range.join(", ")
        )));
    }

    let mut seen = BTreeSet::new();
    let mut repeated = BTreeSet::new();
    for name in &names {
        let lower = name.to_lowercase();
        if !seen.insert(lower.clone()) {
            repeated.insert(lower);
        }
    }
    if !repeated.is_empty() {
        return Err(AppError::bad_request(format!(
            "Nombres repetidos en el lote: {}",
            repeated.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }

    Ok(names)
}

/// Valida nome + texto longo de categorias/classificações de filmes.
pub fn prepare_described(
    kind: DescribedKind,
    nombre: Option<&str>,
    text: Option<&str>,
) -> Result<(String, String), AppError> {
    let rules = kind.rules();
    let (Some(nombre), Some(text)) = (sanitize_opt(nombre), sanitize_opt(text)) else {
        return Err(AppError::bad_request(rules.missing_message));
    };
    if nombre.chars().count() > rules.name_max {
        return Err(AppError::bad_request(rules.name_too_long));
    }
    if text.chars().count() > rules.text_max {
        return Err(AppError::bad_request(rules.text_too_long));
    }
    Ok((nombre, text))
}

#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
    pool: PgPool,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, AppError> {
        self.repo.list(kind).await
    }

    // Busca vazia devolve lista vazia, não a tabela inteira
    pub async fn search(&self, kind: CatalogKind, query: Option<&str>) -> Result<Vec<CatalogSearchHit>, AppError> {
        match sanitize_opt(query) {
            Some(q) => self.repo.search(kind, &like_pattern(&q)).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn create_batch(
        &self,
        kind: CatalogKind,
        items: Option<Vec<CatalogBatchItem>>,
    ) -> Result<Vec<NewCatalogEntry>, AppError> {
        let names = prepare_batch_names(kind, items)?;

        // 1. Inicia Transação (rollback automático no drop)
        let mut tx = self.pool.begin().await?;
        self.repo.lock_for_batch(&mut *tx, kind).await?;

        // 2. Duplicados contra o que já existe (todos numa mensagem)
        let lowercase: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let duplicated = self.repo.existing_names(&mut *tx, kind, &lowercase).await?;
        if !duplicated.is_empty() {
            tracing::warn!("Lote de {} recusado: nomes duplicados {:?}", kind.plural(), duplicated);
            return Err(AppError::bad_request(format!(
                "El nombre ya existe: {}",
                duplicated.join(", ")
            )));
        }

        // 3. Códigos
        let highest = self.repo.highest_code_number(&mut *tx, kind).await?;
        let entries: Vec<NewCatalogEntry> = next_codes(kind.code_prefix(), highest, names.len())
            .into_iter()
            .zip(names)
            .map(|(codigo, nombre)| NewCatalogEntry { codigo, nombre })
            .collect();

        // 4. Insere tudo e commita junto
        self.repo.insert_entries(&mut *tx, kind, &entries).await?;
        tx.commit().await?;

        tracing::info!("✅ {} {} agregadas", entries.len(), kind.plural());
        Ok(entries)
    }

    /// Exclui pelo código; recusa se algum produto ainda usa a linha.
    pub async fn delete(&self, kind: CatalogKind, raw_code: &str) -> Result<String, AppError> {
        let codigo = sanitize_text(raw_code);
        if codigo.is_empty() {
            return Err(AppError::bad_request("Código no válido."));
        }

        if self.repo.count_products_using(kind, &codigo).await? > 0 {
            tracing::warn!("{} {} em uso por produtos, exclusão recusada", kind.singular(), codigo);
            return Err(AppError::bad_request(kind.in_use_message()));
        }

        if self.repo.delete_by_code(kind, &codigo).await? == 0 {
            return Err(AppError::not_found(format!("{} no encontrada.", kind.singular())));
        }

        tracing::info!("🗑️ {} {} excluída", kind.singular(), codigo);
        Ok(format!("{} {} eliminada correctamente.", kind.singular(), codigo))
    }

    // --- Catálogos de filmes ---

    pub async fn list_movie_categories(&self) -> Result<Vec<MovieCategory>, AppError> {
        self.repo.list_movie_categories().await
    }

    pub async fn list_classifications(&self) -> Result<Vec<Classification>, AppError> {
        self.repo.list_classifications().await
    }

    pub async fn create_described(
        &self,
        kind: DescribedKind,
        nombre: Option<&str>,
        text: Option<&str>,
    ) -> Result<i32, AppError> {
        let rules = kind.rules();
        let (nombre, text) = prepare_described(kind, nombre, text)?;

        if self.repo.described_name_exists(kind, &nombre).await? {
            return Err(AppError::conflict(rules.duplicate_name));
        }
        if self.repo.described_text_exists(kind, &text).await? {
            return Err(AppError::conflict(rules.duplicate_text));
        }

        let id = self.repo.insert_described(kind, &nombre, &text).await?;
        tracing::info!("✅ {} '{}' registrada (id {})", rules.table, nombre, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::{seed_catalog_row, seed_product_with, seed_user, state_with_pool};
    use crate::models::catalog::LONG_TEXT_MAX;

    fn items(names: &[&str]) -> Option<Vec<CatalogBatchItem>> {
        Some(
            names
                .iter()
                .map(|n| CatalogBatchItem {
                    codigo: Some("IGNORADO".into()),
                    nombre: Some(n.to_string()),
                })
                .collect(),
        )
    }

    #[test]
    fn first_code_of_an_empty_table() {
        assert_eq!(next_codes("CAT", 0, 1), vec!["CAT001"]);
    }

    #[test]
    fn codes_continue_from_the_highest_suffix() {
        assert_eq!(next_codes("CAT", 7, 3), vec!["CAT008", "CAT009", "CAT010"]);
        assert_eq!(next_codes("UM", 11, 1), vec!["UM012"]);
    }

    #[test]
    fn codes_stay_monotonic_past_three_digits() {
        assert_eq!(next_codes("CAT", 999, 2), vec!["CAT1000", "CAT1001"]);
    }

    #[test]
    fn batch_names_are_sanitized_and_blanks_dropped() {
        let names = prepare_batch_names(
            CatalogKind::ProductCategory,
            items(&["  Bebidas ", "", "<script>x</script>", "Snacks<b></b>"]),
        )
        .unwrap();
        assert_eq!(names, vec!["Bebidas", "Snacks"]);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = prepare_batch_names(CatalogKind::UnitOfMeasure, Some(vec![])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Debe enviar al menos una unidad de medida."));

        let err = prepare_batch_names(CatalogKind::ProductCategory, None).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn batch_without_any_valid_name_is_rejected() {
        let err = prepare_batch_names(CatalogKind::ProductCategory, items(&["  ", "<i></i>"])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.starts_with("Todas las categorías")));
    }

    #[test]
    fn batch_names_must_fit_the_length_range() {
        let long = "x".repeat(51);
        let err = prepare_batch_names(CatalogKind::ProductCategory, items(&["A", &long])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("entre 2 y 50")));
    }

    #[test]
    fn repeated_names_inside_a_batch_are_rejected() {
        let err = prepare_batch_names(CatalogKind::ProductCategory, items(&["Bebidas", "BEBIDAS"])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.ends_with("bebidas")));
    }

    #[test]
    fn described_entries_enforce_required_fields_and_caps() {
        let err = prepare_described(DescribedKind::MovieCategory, Some("Terror"), None).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Nombre y sinopsis son obligatorios"));

        let long_name = "n".repeat(51);
        let err = prepare_described(DescribedKind::Classification, Some(&long_name), Some("ok")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("50")));

        // 80 cabe numa categoria de filme
        let name_80 = "n".repeat(80);
        assert!(prepare_described(DescribedKind::MovieCategory, Some(&name_80), Some("ok")).is_ok());

        let long_text = "t".repeat(LONG_TEXT_MAX + 1);
        let err = prepare_described(DescribedKind::MovieCategory, Some("Terror"), Some(&long_text)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("500")));
    }

    // --- Com banco ---

    fn codes(entries: &[NewCatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.codigo.as_str()).collect()
    }

    #[sqlx::test]
    async fn first_batch_on_an_empty_table_starts_at_001(pool: PgPool) {
        let service = state_with_pool(pool, false).catalog_service;
        let created = service
            .create_batch(CatalogKind::ProductCategory, items(&["Bebidas"]))
            .await
            .unwrap();
        assert_eq!(codes(&created), vec!["CAT001"]);
        assert_eq!(created[0].nombre, "Bebidas");
    }

    #[sqlx::test]
    async fn batches_continue_after_the_highest_code(pool: PgPool) {
        seed_catalog_row(&pool, "categoriaproducto", "CAT007", "Bebidas").await;
        let service = state_with_pool(pool, false).catalog_service;

        let first = service
            .create_batch(CatalogKind::ProductCategory, items(&["Snacks", "Dulces"]))
            .await
            .unwrap();
        assert_eq!(codes(&first), vec!["CAT008", "CAT009"]);

        let second = service
            .create_batch(CatalogKind::ProductCategory, items(&["Helados"]))
            .await
            .unwrap();
        assert_eq!(codes(&second), vec!["CAT010"]);
    }

    #[sqlx::test]
    async fn existing_names_reject_the_whole_batch(pool: PgPool) {
        seed_catalog_row(&pool, "unidad_medida", "UM001", "Litro").await;
        let service = state_with_pool(pool, false).catalog_service;

        let err = service
            .create_batch(CatalogKind::UnitOfMeasure, items(&["Kilo", "LITRO"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("litro")));

        let stored = service.list(CatalogKind::UnitOfMeasure).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[sqlx::test]
    async fn unit_in_use_is_not_deleted(pool: PgPool) {
        let usuario_id = seed_user(&pool, "ana01", "x", 1, 1).await;
        let categoria_id = seed_catalog_row(&pool, "categoriaproducto", "CAT001", "Bebidas").await;
        let unidad_id = seed_catalog_row(&pool, "unidad_medida", "UM001", "Litro").await;
        seed_product_with(&pool, "775", "Gaseosa", categoria_id, unidad_id, usuario_id).await;
        let service = state_with_pool(pool, false).catalog_service;

        let err = service.delete(CatalogKind::UnitOfMeasure, "UM001").await.unwrap_err();
        assert!(
            matches!(err, AppError::BadRequest(ref m) if m == CatalogKind::UnitOfMeasure.in_use_message())
        );

        let stored = service.list(CatalogKind::UnitOfMeasure).await.unwrap();
        assert_eq!(stored.iter().map(|e| e.codigo.as_str()).collect::<Vec<_>>(), vec!["UM001"]);
    }

    #[sqlx::test]
    async fn unused_entries_are_deleted_by_code(pool: PgPool) {
        seed_catalog_row(&pool, "categoriaproducto", "CAT003", "Snacks").await;
        let service = state_with_pool(pool, false).catalog_service;

        let message = service.delete(CatalogKind::ProductCategory, " CAT003 ").await.unwrap();
        assert_eq!(message, "Categoría CAT003 eliminada correctamente.");

        let err = service.delete(CatalogKind::ProductCategory, "CAT003").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
