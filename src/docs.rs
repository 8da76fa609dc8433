// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::login_google,

        // --- Usuarios ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::list_statuses,

        // --- Roles / permisos / menu ---
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::assign_permissions,
        handlers::rbac::list_modules,
        handlers::rbac::permission_counts,
        handlers::rbac::permissions_for_role,
        handlers::rbac::menu_for_role,

        // --- Catálogos de produto ---
        handlers::catalog::list_product_categories,
        handlers::catalog::search_product_categories,
        handlers::catalog::create_product_categories,
        handlers::catalog::delete_product_category,
        handlers::catalog::list_units,
        handlers::catalog::search_units,
        handlers::catalog::create_units,
        handlers::catalog::delete_unit,

        // --- Películas ---
        handlers::catalog::list_movie_categories,
        handlers::catalog::create_movie_category,
        handlers::catalog::list_classifications,
        handlers::catalog::create_classification,
        handlers::movies::select_data,
        handlers::movies::create_movie,

        // --- Productos ---
        handlers::inventory::list_products,
        handlers::inventory::search_products,
        handlers::inventory::create_product,
        handlers::inventory::list_status_labels,
        handlers::inventory::product_stats,
        handlers::inventory::search_products_for_update,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginPayload,
            models::auth::LoginResponse,
            models::auth::GoogleLoginPayload,
            models::auth::GoogleLoginResponse,

            // --- Usuarios ---
            models::users::UserListEntry,
            models::users::UserStatus,
            models::users::CreateUserPayload,
            models::users::MessageResponse,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::CreateRolePayload,
            models::rbac::AssignPermissionsPayload,
            models::rbac::PermissionItem,
            models::rbac::AssignPermissionsResponse,
            models::rbac::PermissionKey,
            models::rbac::PermissionCount,
            models::rbac::ModuleNode,
            models::rbac::SubmoduleNode,
            models::rbac::MenuModule,
            models::rbac::MenuSubmodule,

            // --- Catálogos ---
            models::catalog::CatalogEntry,
            models::catalog::CatalogSearchHit,
            models::catalog::NewCatalogEntry,
            models::catalog::CatalogBatchItem,
            models::catalog::CatalogBatchPayload,
            models::catalog::MovieCategory,
            models::catalog::Classification,
            models::catalog::CreateMovieCategoryPayload,
            models::catalog::CreateClassificationPayload,

            // --- Películas ---
            models::movies::ReferenceOption,
            models::movies::SelectData,
            models::movies::CreateMovieResponse,

            // --- Productos ---
            models::inventory::ProductListItem,
            models::inventory::ProductSearchHit,
            models::inventory::ProductDetail,
            models::inventory::UpdateProductPayload,
            models::inventory::UpdateProductResponse,
            models::inventory::ProductStatusLabel,
            models::inventory::ProductStats,
        )
    ),
    tags(
        (name = "Auth", description = "Login por usuário/senha e Google"),
        (name = "Usuarios", description = "Usuários do painel e seus status"),
        (name = "Roles", description = "Roles, permissões e menu lateral"),
        (name = "Catálogos", description = "Categorias de produto e unidades de medida"),
        (name = "Películas", description = "Cadastro de filmes e seus catálogos"),
        (name = "Productos", description = "Inventário da bomboniere")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
