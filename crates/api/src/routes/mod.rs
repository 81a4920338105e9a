//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Users
//! POST   /api/users/register            - Create account and log in (rate limited)
//! POST   /api/users/login               - Log in (rate limited)
//! POST   /api/users/logout              - Log out
//! POST   /api/users/password/reset-code - Issue a reset code (rate limited)
//! POST   /api/users/password/reset      - Reset password with a code (rate limited)
//! GET    /api/users                     - List users (admin)
//! GET    /api/users/me                  - Own profile
//! PUT    /api/users/me                  - Update own phone or icon
//! DELETE /api/users/me                  - Delete own account
//! GET    /api/users/{id}                - View user
//! PUT    /api/users/{id}                - Update user
//! DELETE /api/users/{id}                - Delete user
//!
//! # Comercios
//! GET    /api/comercios                 - List all
//! POST   /api/comercios                 - Register a comercio
//! GET    /api/comercios/search?nombre=  - Search by name
//! GET    /api/comercios/categoria?categoria= - By principal category (public)
//! GET    /api/comercios/mine            - Own comercio (emprendedor)
//! PUT    /api/comercios/mine            - Update own comercio
//! DELETE /api/comercios/mine            - Delete own comercio
//! GET    /api/comercios/{id}            - By id (admin)
//! PUT    /api/comercios/{id}            - Update (admin)
//! DELETE /api/comercios/{id}            - Delete (admin)
//!
//! # Productos
//! GET    /api/productos                 - List all
//! POST   /api/productos                 - Create
//! GET    /api/productos/search?nombre=  - Search by name
//! GET    /api/productos/comercio/{id}   - Products of a comercio
//! GET    /api/productos/comercio/{id}/ratings - Ratings grouped by product
//! GET    /api/productos/{id}            - By id (admin)
//! PUT    /api/productos/{id}            - Update
//! DELETE /api/productos/{id}            - Delete
//! POST   /api/productos/{id}/ratings    - Rate
//! DELETE /api/productos/{id}/ratings    - Remove own rating
//!
//! # Favoritos
//! GET    /api/favoritos?kind=           - Own favorites
//! POST   /api/favoritos/toggle          - Add or remove a favorite
//!
//! # Categorias (public)
//! GET    /api/categorias                - Full taxonomy
//! GET    /api/categorias/{principal}    - One principal category
//! ```

pub mod categorias;
pub mod comercios;
pub mod favoritos;
pub mod productos;
pub mod users;
pub mod validate;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::config::ApiConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the user routes router.
///
/// `trust_proxy_headers` is passed to the auth rate limiter.
pub fn user_routes(trust_proxy_headers: bool) -> Router<AppState> {
    // Unauthenticated account endpoints share one rate limiter
    let public = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/password/reset-code", post(users::request_reset_code))
        .route("/password/reset", post(users::reset_password))
        .layer(auth_rate_limiter(trust_proxy_headers));

    Router::new()
        .merge(public)
        .route("/", get(users::list))
        .route("/logout", post(users::logout))
        .route(
            "/me",
            get(users::me).put(users::update_me).delete(users::delete_me),
        )
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
}

/// Create the comercio routes router.
pub fn comercio_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(comercios::list).post(comercios::create))
        .route("/search", get(comercios::search))
        .route("/categoria", get(comercios::by_category))
        .route(
            "/mine",
            get(comercios::mine)
                .put(comercios::update_mine)
                .delete(comercios::delete_mine),
        )
        .route(
            "/{id}",
            get(comercios::show)
                .put(comercios::update)
                .delete(comercios::delete),
        )
}

/// Create the product routes router.
pub fn producto_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(productos::list).post(productos::create))
        .route("/search", get(productos::search))
        .route("/comercio/{id}", get(productos::by_comercio))
        .route("/comercio/{id}/ratings", get(productos::comercio_ratings))
        .route(
            "/{id}",
            get(productos::show)
                .put(productos::update)
                .delete(productos::delete),
        )
        .route(
            "/{id}/ratings",
            post(productos::rate).delete(productos::unrate),
        )
}

/// Create the favorite routes router.
pub fn favorito_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favoritos::list))
        .route("/toggle", post(favoritos::toggle))
}

/// Create the category routes router.
pub fn categoria_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categorias::list))
        .route("/{principal}", get(categorias::show))
}

/// Create all routes for the API, including health checks.
pub fn routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/users", user_routes(config.trust_proxy_headers))
        .nest("/api/comercios", comercio_routes())
        .nest("/api/productos", producto_routes())
        .nest("/api/favoritos", favorito_routes())
        .nest("/api/categorias", categoria_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
