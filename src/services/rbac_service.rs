// src/services/rbac_service.rs

use std::collections::BTreeSet;

use serde_json::Value;
use sqlx::PgPool;

use crate::common::error::AppError;
use crate::common::parse::loose_i32;
use crate::db::RbacRepository;
use crate::models::rbac::{
    AssignPermissionsPayload, AssignPermissionsResponse, MenuModule, MenuSubmodule, ModuleNode,
    ModuleRow, PermissionCount, PermissionDiff, PermissionKey, Role, SubmoduleNode,
};
use crate::services::user_service::ADMIN_ROLE_NAME;

// ---
// Regras puras (sem banco)
// ---

/// Diferença entre o conjunto gravado e o desejado.
/// Duplicatas são ignoradas e a saída sai ordenada.
pub fn reconcile(current: &[PermissionKey], desired: &[PermissionKey]) -> PermissionDiff {
    let current: BTreeSet<PermissionKey> = current.iter().copied().collect();
    let desired: BTreeSet<PermissionKey> = desired.iter().copied().collect();

    PermissionDiff {
        to_add: desired.difference(&current).copied().collect(),
        to_remove: current.difference(&desired).copied().collect(),
    }
}

pub fn is_admin_role(role_name: &str) -> bool {
    role_name.trim().eq_ignore_ascii_case(ADMIN_ROLE_NAME)
}

/// O administrador só ganha permissões por aqui, nunca perde.
pub fn guard_admin_removals(role_name: &str, diff: &PermissionDiff) -> Result<(), AppError> {
    if is_admin_role(role_name) && !diff.to_remove.is_empty() {
        return Err(AppError::forbidden(
            "No se pueden eliminar submódulos del rol administrador.",
        ));
    }
    Ok(())
}

/// Id de role positivo, vindo como número ou texto.
pub fn parse_role_id(raw: Option<&Value>) -> Option<i32> {
    raw.and_then(loose_i32).filter(|id| *id > 0)
}

/// Converte `permisos[]` em pares; itens inválidos são descartados em silêncio.
/// `submodulo_id` ausente ou nulo = permissão no nível do módulo.
pub fn parse_desired_permissions(raw: Option<&Value>) -> Vec<PermissionKey> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let modulo_id = item.get("modulo_id").and_then(loose_i32)?;
            let submodulo_id = match item.get("submodulo_id") {
                None | Some(Value::Null) => None,
                Some(v) => Some(loose_i32(v)?),
            };
            Some(PermissionKey::new(modulo_id, submodulo_id))
        })
        .collect()
}

// Agrupa as linhas achatadas por módulo, mantendo a ordem da query
fn group_rows<M, S>(
    rows: Vec<ModuleRow>,
    make_module: impl Fn(&ModuleRow) -> M,
    make_submodule: impl Fn(&ModuleRow, i32, String) -> S,
    submodules_of: impl Fn(&mut M) -> &mut Vec<S>,
) -> Vec<M> {
    let mut modules: Vec<(i32, M)> = Vec::new();

    for row in rows {
        let needs_new = modules.last().map(|(id, _)| *id != row.modulo_id).unwrap_or(true);
        if needs_new {
            modules.push((row.modulo_id, make_module(&row)));
        }
        if let (Some(sub_id), Some(sub_name)) = (row.submodulo_id, row.submodulo_name.clone()) {
            let submodule = make_submodule(&row, sub_id, sub_name);
            if let Some((_, module)) = modules.last_mut() {
                submodules_of(module).push(submodule);
            }
        }
    }

    modules.into_iter().map(|(_, m)| m).collect()
}

pub fn build_module_tree(rows: Vec<ModuleRow>) -> Vec<ModuleNode> {
    group_rows(
        rows,
        |row| ModuleNode {
            id: row.modulo_id,
            nombre: row.modulo_name.clone(),
            icono: row.modulo_icon.clone(),
            ruta: row.modulo_route.clone(),
            submodulos: Vec::new(),
        },
        |row, id, nombre| SubmoduleNode {
            id,
            nombre,
            icono: row.submodulo_icon.clone(),
            ruta: row.submodulo_route.clone(),
        },
        |module| &mut module.submodulos,
    )
}

pub fn build_menu(rows: Vec<ModuleRow>) -> Vec<MenuModule> {
    group_rows(
        rows,
        |row| MenuModule {
            id: row.modulo_id,
            name: row.modulo_name.clone(),
            icon: row.modulo_icon.clone(),
            route: row.modulo_route.clone(),
            submodulos: Vec::new(),
        },
        |row, id, name| MenuSubmodule {
            id,
            name,
            icon: row.submodulo_icon.clone(),
            route: row.submodulo_route.clone(),
        },
        |module| &mut module.submodulos,
    )
}

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    client_role_id: i32,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, client_role_id: i32, pool: PgPool) -> Self {
        Self { repo, client_role_id, pool }
    }

    // O role de cliente não aparece na tela de administração
    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles_except(self.client_role_id).await
    }

    pub async fn create_role(&self, raw_name: Option<&Value>) -> Result<Role, AppError> {
        let nombre = match raw_name {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
            _ => return Err(AppError::bad_request("Nombre de rol inválido")),
        };

        if self.repo.role_name_exists(&self.pool, nombre).await? {
            return Err(AppError::conflict("El rol ya existe"));
        }

        let role = self.repo.create_role(&self.pool, nombre).await?;
        tracing::info!("✅ Role '{}' criado (id {})", role.nombre, role.id);
        Ok(role)
    }

    pub async fn assign_permissions(
        &self,
        payload: AssignPermissionsPayload,
    ) -> Result<AssignPermissionsResponse, AppError> {
        let role_id = parse_role_id(payload.rol_id.as_ref())
            .ok_or_else(|| AppError::bad_request("ID de rol inválido."))?;
        let desired = parse_desired_permissions(payload.permisos.as_ref());

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Role + permissões atuais
        let role = self
            .repo
            .find_role(&mut *tx, role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Rol no encontrado."))?;
        let current = self.repo.active_permissions(&mut *tx, role_id).await?;

        // 3. Diferença + proteção do administrador (antes de qualquer escrita)
        let diff = reconcile(&current, &desired);
        if let Err(e) = guard_admin_removals(&role.nombre, &diff) {
            tracing::warn!(
                "Tentativa de remover {} permissões do role '{}' recusada",
                diff.to_remove.len(),
                role.nombre
            );
            return Err(e);
        }

        // 4. Aplica
        if !diff.to_remove.is_empty() {
            self.repo.delete_permissions(&mut *tx, role_id, &diff.to_remove).await?;
        }
        if !diff.to_add.is_empty() {
            self.repo.insert_permissions(&mut *tx, role_id, &diff.to_add).await?;
        }

        // 5. Commit
        tx.commit().await?;

        tracing::info!(
            "✅ Permissões do role {} atualizadas (+{} / -{})",
            role_id,
            diff.to_add.len(),
            diff.to_remove.len()
        );

        Ok(AssignPermissionsResponse {
            message: "Permisos actualizados correctamente.".into(),
            agregados: diff.to_add.len(),
            eliminados: diff.to_remove.len(),
        })
    }

    pub async fn module_tree(&self) -> Result<Vec<ModuleNode>, AppError> {
        let rows = self.repo.modules_with_submodules().await?;
        Ok(build_module_tree(rows))
    }

    pub async fn permission_counts(&self) -> Result<Vec<PermissionCount>, AppError> {
        self.repo.permission_counts().await
    }

    pub async fn permissions_for_role(&self, role_id: i32) -> Result<Vec<PermissionKey>, AppError> {
        self.repo.active_permissions(&self.pool, role_id).await
    }

    pub async fn menu_for_role(&self, role_id: i32) -> Result<Vec<MenuModule>, AppError> {
        let rows = self.repo.menu_rows(role_id).await?;
        Ok(build_menu(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::state_with_pool;
    use serde_json::json;

    fn key(m: i32, s: Option<i32>) -> PermissionKey {
        PermissionKey::new(m, s)
    }

    fn row(modulo: i32, sub: Option<i32>) -> ModuleRow {
        ModuleRow {
            modulo_id: modulo,
            modulo_name: format!("Modulo {}", modulo),
            modulo_icon: Some("icon".into()),
            modulo_route: Some(format!("/m{}", modulo)),
            submodulo_id: sub,
            submodulo_name: sub.map(|s| format!("Sub {}", s)),
            submodulo_icon: sub.map(|_| "sub-icon".to_string()),
            submodulo_route: sub.map(|s| format!("/m{}/s{}", modulo, s)),
        }
    }

    #[test]
    fn reconcile_splits_additions_and_removals() {
        let current = [key(2, Some(1)), key(2, Some(2)), key(1, None)];
        let desired = [key(2, Some(2)), key(3, Some(3)), key(1, None)];

        let diff = reconcile(&current, &desired);
        assert_eq!(diff.to_add, vec![key(3, Some(3))]);
        assert_eq!(diff.to_remove, vec![key(2, Some(1))]);
    }

    #[test]
    fn reconcile_is_idempotent_once_applied() {
        let desired = [key(2, Some(1)), key(4, Some(6)), key(2, Some(1))];
        let first = reconcile(&[], &desired);
        assert_eq!(first.to_add.len(), 2);

        // Depois de aplicar, o gravado passa a ser exatamente o desejado
        let second = reconcile(&first.to_add, &desired);
        assert!(second.is_empty());
    }

    #[test]
    fn module_level_grant_differs_from_submodule_grant() {
        let diff = reconcile(&[key(1, None)], &[key(1, Some(1))]);
        assert_eq!(diff.to_add, vec![key(1, Some(1))]);
        assert_eq!(diff.to_remove, vec![key(1, None)]);
    }

    #[test]
    fn administrator_cannot_lose_permissions() {
        let shrink = reconcile(&[key(2, Some(1)), key(2, Some(2))], &[key(2, Some(1))]);
        let err = guard_admin_removals(" Administrador ", &shrink).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let grow = reconcile(&[key(2, Some(1))], &[key(2, Some(1)), key(3, Some(3))]);
        assert!(guard_admin_removals("administrador", &grow).is_ok());
    }

    #[test]
    fn other_roles_may_lose_permissions() {
        let shrink = reconcile(&[key(2, Some(1))], &[]);
        assert!(guard_admin_removals("cajero", &shrink).is_ok());
    }

    #[test]
    fn role_id_must_be_a_positive_integer() {
        assert_eq!(parse_role_id(Some(&json!(2))), Some(2));
        assert_eq!(parse_role_id(Some(&json!("5"))), Some(5));
        assert_eq!(parse_role_id(Some(&json!(0))), None);
        assert_eq!(parse_role_id(Some(&json!("abc"))), None);
        assert_eq!(parse_role_id(None), None);
    }

    #[test]
    fn invalid_pairs_are_dropped_silently() {
        let raw = json!([
            { "modulo_id": 2, "submodulo_id": 1 },
            { "modulo_id": "3", "submodulo_id": "4" },
            { "modulo_id": 1 },
            { "modulo_id": 1, "submodulo_id": null },
            { "modulo_id": "x", "submodulo_id": 1 },
            { "modulo_id": 2, "submodulo_id": "nope" },
            "lixo"
        ]);
        assert_eq!(
            parse_desired_permissions(Some(&raw)),
            vec![key(2, Some(1)), key(3, Some(4)), key(1, None), key(1, None)]
        );
        assert!(parse_desired_permissions(Some(&json!({"modulo_id": 1}))).is_empty());
    }

    #[test]
    fn module_tree_groups_submodules_in_order() {
        let rows = vec![row(1, None), row(2, Some(1)), row(2, Some(2)), row(3, Some(3))];
        let tree = build_module_tree(rows);

        assert_eq!(tree.len(), 3);
        assert!(tree[0].submodulos.is_empty());
        assert_eq!(tree[1].submodulos.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(tree[2].submodulos[0].ruta.as_deref(), Some("/m3/s3"));

        let json = serde_json::to_value(&tree[1]).unwrap();
        assert_eq!(json["NOMBRE"], "Modulo 2");
        assert_eq!(json["SUBMODULOS"][0]["ID"], 1);
    }

    #[test]
    fn menu_uses_lowercase_keys() {
        let menu = build_menu(vec![row(4, Some(6)), row(4, Some(7))]);
        assert_eq!(menu.len(), 1);

        let json = serde_json::to_value(&menu).unwrap();
        assert_eq!(json[0]["name"], "Modulo 4");
        assert_eq!(json[0]["submodulos"][1]["route"], "/m4/s7");
    }

    // --- Com banco (migração traz o administrador com 10 permissões) ---

    fn assign(rol_id: Value, permisos: Value) -> AssignPermissionsPayload {
        AssignPermissionsPayload { rol_id: Some(rol_id), permisos: Some(permisos) }
    }

    #[sqlx::test]
    async fn administrator_cannot_lose_permissions_db(pool: PgPool) {
        let service = state_with_pool(pool, false).rbac_service;
        let before = service.permissions_for_role(1).await.unwrap();
        assert_eq!(before.len(), 10);

        let err = service
            .assign_permissions(assign(json!(1), json!([{ "modulo_id": 1, "submodulo_id": null }])))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        assert_eq!(service.permissions_for_role(1).await.unwrap(), before);
    }

    #[sqlx::test]
    async fn same_permission_set_twice_changes_nothing(pool: PgPool) {
        let service = state_with_pool(pool, false).rbac_service;
        let desired = json!([
            { "modulo_id": 1, "submodulo_id": null },
            { "modulo_id": "4", "submodulo_id": "6" }
        ]);

        let first = service.assign_permissions(assign(json!("2"), desired.clone())).await.unwrap();
        assert_eq!((first.agregados, first.eliminados), (2, 0));

        let second = service.assign_permissions(assign(json!(2), desired)).await.unwrap();
        assert_eq!((second.agregados, second.eliminados), (0, 0));

        assert_eq!(
            service.permissions_for_role(2).await.unwrap(),
            vec![key(1, None), key(4, Some(6))]
        );
    }

    #[sqlx::test]
    async fn module_level_grants_are_removed_and_inactive_rows_reused(pool: PgPool) {
        let service = state_with_pool(pool.clone(), false).rbac_service;
        let both = json!([
            { "modulo_id": 1 },
            { "modulo_id": 4, "submodulo_id": 6 }
        ]);
        service.assign_permissions(assign(json!(2), both.clone())).await.unwrap();

        // Remove o par com submódulo nulo
        let shrink = service
            .assign_permissions(assign(json!(2), json!([{ "modulo_id": 4, "submodulo_id": 6 }])))
            .await
            .unwrap();
        assert_eq!((shrink.agregados, shrink.eliminados), (0, 1));
        assert_eq!(service.permissions_for_role(2).await.unwrap(), vec![key(4, Some(6))]);

        // Linha desativada volta a ficar ativa, sem duplicar
        sqlx::query("UPDATE permisos SET active = 0 WHERE roles_id = 2")
            .execute(&pool)
            .await
            .unwrap();
        let again = service.assign_permissions(assign(json!(2), both)).await.unwrap();
        assert_eq!((again.agregados, again.eliminados), (2, 0));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permisos WHERE roles_id = 2")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[sqlx::test]
    async fn unknown_role_is_not_found(pool: PgPool) {
        let service = state_with_pool(pool, false).rbac_service;
        let err = service.assign_permissions(assign(json!(999), json!([]))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test]
    async fn menu_only_lists_granted_entries(pool: PgPool) {
        let service = state_with_pool(pool, false).rbac_service;
        service
            .assign_permissions(assign(
                json!(2),
                json!([
                    { "modulo_id": 1, "submodulo_id": null },
                    { "modulo_id": 4, "submodulo_id": 6 },
                    { "modulo_id": 4, "submodulo_id": 8 }
                ]),
            ))
            .await
            .unwrap();

        let menu = service.menu_for_role(2).await.unwrap();
        let ids: Vec<(i32, Vec<i32>)> = menu
            .iter()
            .map(|m| (m.id, m.submodulos.iter().map(|s| s.id).collect()))
            .collect();
        assert_eq!(ids, vec![(1, vec![]), (4, vec![6, 8])]);
        assert_eq!(menu[1].submodulos[0].name, "Productos");

        assert!(service.menu_for_role(3).await.unwrap().is_empty());
    }
}
