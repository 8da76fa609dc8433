//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
mod storage;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::handlers::forms::UPLOAD_BODY_LIMIT;
use crate::middleware::auth::auth_context;

const ROOT_MESSAGE: &str = "API CinePeliz funcionando correctamente 🎬";

/// Monta todas as rotas sobre o estado já pronto.
pub fn build_router(app_state: AppState) -> Router {
    let upload_dir = app_state.config.upload_dir.clone();

    // Rotas de usuários, roles e menu
    let admin_routes = Router::new()
        .route("/login-google", post(handlers::auth::login_google))
        .route(
            "/usuarios",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/estados", get(handlers::users::list_statuses))
        .route(
            "/roles",
            get(handlers::rbac::list_roles).post(handlers::rbac::create_role),
        )
        .route("/permisos", post(handlers::rbac::assign_permissions))
        .route("/asignacion-modulos", get(handlers::rbac::list_modules))
        .route("/permisos-por-rol", get(handlers::rbac::permission_counts))
        .route("/permisos-por-rol/{rolId}", get(handlers::rbac::permissions_for_role))
        .route("/menu/{role_id}", get(handlers::rbac::menu_for_role));

    // Catálogos de produto (mesma forma nas duas tabelas)
    let catalog_routes = Router::new()
        .route("/categoria-productos", get(handlers::catalog::list_product_categories))
        .route(
            "/categoria-productos/buscar",
            get(handlers::catalog::search_product_categories),
        )
        .route(
            "/categoria-productos/lote",
            post(handlers::catalog::create_product_categories),
        )
        .route(
            "/categoria-productos/{codigo}",
            delete(handlers::catalog::delete_product_category),
        )
        .route("/unidadmedida", get(handlers::catalog::list_units))
        .route("/unidadmedida/buscar", get(handlers::catalog::search_units))
        .route("/unidadmedida/lote", post(handlers::catalog::create_units))
        .route("/unidadmedida/{codigo}", delete(handlers::catalog::delete_unit));

    let movie_routes = Router::new()
        .route(
            "/categorias",
            get(handlers::catalog::list_movie_categories).post(handlers::catalog::create_movie_category),
        )
        .route(
            "/clasificaciones",
            get(handlers::catalog::list_classifications).post(handlers::catalog::create_classification),
        )
        .route("/peliculas/select-data", get(handlers::movies::select_data))
        .route(
            "/peliculas",
            post(handlers::movies::create_movie).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );

    let product_routes = Router::new()
        .route("/productos", get(handlers::inventory::list_products))
        .route("/productos/buscar", get(handlers::inventory::search_products))
        .route(
            "/productos/nuevo-producto",
            post(handlers::inventory::create_product).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/producto-estados", get(handlers::inventory::list_status_labels))
        .route("/calculo-productos", get(handlers::inventory::product_stats))
        .route(
            "/actualizar-producto/buscar",
            get(handlers::inventory::search_products_for_update),
        )
        .route(
            "/actualizar-producto/{id}",
            get(handlers::inventory::get_product).put(handlers::inventory::update_product),
        );

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(admin_routes)
        .merge(catalog_routes)
        .merge(movie_routes)
        .merge(product_routes);

    // Combina tudo no router principal
    Router::new()
        .route("/", get(|| async { ROOT_MESSAGE }))
        .route("/login", post(handlers::auth::login))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_context))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG manda; padrão info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let port = config.port;
    let bootstrap_admin = config.bootstrap_admin.clone();
    let active_status_id = config.active_status_id;

    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some(admin) = bootstrap_admin {
        app_state
            .user_service
            .ensure_bootstrap_admin(&admin, active_status_id)
            .await?;
    }

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::{lazy_state, seed_user, state_with_pool, TEST_SECRET};
    use crate::models::auth::Claims;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn token(secret: &str) -> String {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            id: 1,
            usuario: "admin".into(),
            role_id: 1,
            exp: now + 600,
            iat: now,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(auth_required: bool, request: Request<Body>) -> (StatusCode, String) {
        send_to(lazy_state(auth_required), request).await
    }

    async fn send_to(state: AppState, request: Request<Body>) -> (StatusCode, String) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn message(body: &str) -> String {
        let value: Value = serde_json::from_str(body).unwrap();
        value["message"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn root_and_health_answer_without_database() {
        let (status, body) = send(false, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, ROOT_MESSAGE);

        let (status, body) = send(true, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token_when_enabled() {
        let (status, _) = send(true, get("/api/usuarios")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/api/roles")
            .header(header::AUTHORIZATION, format!("Bearer {}", token("outro-segredo")))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(true, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_the_handler() {
        let request = Request::builder()
            .uri("/api/menu/abc")
            .header(header::AUTHORIZATION, format!("Bearer {}", token(TEST_SECRET)))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(true, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "role_id es obligatorio");
    }

    #[tokio::test]
    async fn google_login_is_public_and_validates_input() {
        let (status, body) =
            send(true, json_request(Method::POST, "/api/login-google", json!({ "email": "a@b.com" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Datos incompletos de Google");
    }

    #[tokio::test]
    async fn empty_catalog_batch_is_rejected() {
        let (status, body) = send(
            false,
            json_request(Method::POST, "/api/categoria-productos/lote", json!({ "categorias": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Debe enviar al menos una categoría.");
    }

    #[tokio::test]
    async fn blank_catalog_code_cannot_be_deleted() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/api/unidadmedida/%20")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(false, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Código no válido.");
    }

    #[tokio::test]
    async fn role_name_must_be_text() {
        let (status, body) =
            send(false, json_request(Method::POST, "/api/roles", json!({ "nombre": 5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Nombre de rol inválido");
    }

    #[tokio::test]
    async fn permission_assignment_requires_a_role_id() {
        let (status, body) = send(
            false,
            json_request(Method::POST, "/api/permisos", json!({ "rolId": "x", "permisos": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "ID de rol inválido.");
    }

    #[tokio::test]
    async fn product_update_rejects_bad_ids_and_empty_bodies() {
        let (status, body) =
            send(false, json_request(Method::PUT, "/api/actualizar-producto/abc", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "El ID es obligatorio y debe ser numérico.");

        let (status, body) = send(
            false,
            json_request(Method::PUT, "/api/actualizar-producto/5", json!({ "nombre": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "No se enviaron campos para actualizar.");
    }

    #[tokio::test]
    async fn product_search_needs_a_name() {
        let (status, body) = send(false, get("/api/productos/buscar")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "El nombre de búsqueda es obligatorio.");
    }

    #[tokio::test]
    async fn catalog_search_without_query_is_empty() {
        let (status, body) = send(false, get("/api/categoria-productos/buscar?q=")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn movie_without_image_is_rejected() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"titulo\"\r\n\r\nDune\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/peliculas")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(false, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Debe subir una imagen de la película");
    }

    #[tokio::test]
    async fn new_product_form_requires_every_field() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"nombre\"\r\n\r\nCanchita\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/productos/nuevo-producto")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(false, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Faltan campos obligatorios.");
    }

    fn new_user_body(estado: Value) -> Value {
        json!({
            "nombre": "Ana Pérez",
            "correo": "ana@cinepeliz.com",
            "usuario": "ana01",
            "contrasena": "secreto123",
            "estado": estado,
            "rol": "2",
            "id_admin": "1"
        })
    }

    #[tokio::test]
    async fn user_status_must_be_numeric() {
        let (status, body) =
            send(false, json_request(Method::POST, "/api/usuarios", new_user_body(json!("abc")))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "El estado es obligatorio.");
    }

    #[sqlx::test]
    async fn user_form_ids_may_arrive_as_text(pool: sqlx::PgPool) {
        let admin_id = seed_user(&pool, "admin", "x", 1, 1).await;
        assert_eq!(admin_id, 1);

        let state = state_with_pool(pool.clone(), false);
        let (status, body) =
            send_to(state, json_request(Method::POST, "/api/usuarios", new_user_body(json!("1")))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(message(&body), "Usuario creado exitosamente");

        let (role_id, audits): (i32, i64) = sqlx::query_as(
            r#"
            SELECT u.role_id, (SELECT COUNT(*) FROM registro_auditoria a WHERE a.id_usuario_editado = u.id)
            FROM usuarios u WHERE u.usuario = 'ana01'
            "#,
        )
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((role_id, audits), (2, 1));
    }

    #[tokio::test]
    async fn batch_that_is_not_a_list_counts_as_empty() {
        let (status, body) = send(
            false,
            json_request(Method::POST, "/api/categoria-productos/lote", json!({ "categorias": "Bebidas" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Debe enviar al menos una categoría.");
    }

    #[tokio::test]
    async fn malformed_bodies_answer_with_a_json_message() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/roles")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let (status, body) = send(false, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "El cuerpo de la solicitud no es un JSON válido.");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .body(Body::from(r#"{"usuario":"ana01"}"#))
            .unwrap();
        let (status, body) = send(false, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message(&body).contains("application/json"));

        let (status, body) = send(
            false,
            json_request(Method::POST, "/api/clasificaciones", json!({ "nombre": ["A"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Los datos enviados no tienen el formato esperado.");
    }

    #[tokio::test]
    async fn upload_routes_require_multipart() {
        let (status, body) =
            send(false, json_request(Method::POST, "/api/peliculas", json!({ "titulo": "Dune" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Se esperaba un formulario multipart/form-data.");
    }
}
