// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Role {
    pub id: i32,
    pub nombre: String,
}

// `nombre` fica como Value para distinguir "não é texto" de "texto vazio"
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRolePayload {
    #[schema(value_type = String, example = "supervisor")]
    pub nombre: Option<Value>,
}

// Payload de atribuição: o front manda ids como número ou texto
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignPermissionsPayload {
    #[serde(rename = "rolId")]
    #[schema(value_type = i32, example = 2)]
    pub rol_id: Option<Value>,
    #[schema(value_type = Vec<PermissionItem>)]
    pub permisos: Option<Value>,
}

/// Item de `permisos[]` (só para a documentação; o parsing é tolerante).
#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionItem {
    pub modulo_id: i32,
    pub submodulo_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignPermissionsResponse {
    pub message: String,
    pub agregados: usize,
    pub eliminados: usize,
}

/// Par (módulo, submódulo). Sem submódulo = permissão no nível do módulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PermissionKey {
    pub modulo_id: i32,
    pub submodulo_id: Option<i32>,
}

impl PermissionKey {
    pub fn new(modulo_id: i32, submodulo_id: Option<i32>) -> Self {
        Self { modulo_id, submodulo_id }
    }
}

/// Resultado da reconciliação entre o que está gravado e o que foi pedido.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PermissionDiff {
    pub to_add: Vec<PermissionKey>,
    pub to_remove: Vec<PermissionKey>,
}

impl PermissionDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PermissionCount {
    pub rol_id: i32,
    pub total: i64,
}

// Linha "achatada" do LEFT JOIN modulo x submodulo
#[derive(Debug, Clone, FromRow)]
pub struct ModuleRow {
    pub modulo_id: i32,
    pub modulo_name: String,
    pub modulo_icon: Option<String>,
    pub modulo_route: Option<String>,
    pub submodulo_id: Option<i32>,
    pub submodulo_name: Option<String>,
    pub submodulo_icon: Option<String>,
    pub submodulo_route: Option<String>,
}

// --- Árvore completa (tela de atribuição) ---
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ModuleNode {
    pub id: i32,
    pub nombre: String,
    pub icono: Option<String>,
    pub ruta: Option<String>,
    pub submodulos: Vec<SubmoduleNode>,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SubmoduleNode {
    pub id: i32,
    pub nombre: String,
    pub icono: Option<String>,
    pub ruta: Option<String>,
}

// --- Menu de navegação de um role ---
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct MenuModule {
    pub id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub route: Option<String>,
    pub submodulos: Vec<MenuSubmodule>,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct MenuSubmodule {
    pub id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub route: Option<String>,
}
