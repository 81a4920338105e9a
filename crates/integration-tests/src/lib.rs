//! Integration tests for the Reubica API.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations to a running PostgreSQL
//! cargo run -p reubica-cli -- migrate
//!
//! # Start the API, then run the ignored tests
//! REUBICA_TRUST_PROXY_HEADERS=true cargo run -p reubica-api &
//! cargo test -p reubica-integration-tests -- --ignored
//! ```
//!
//! `REUBICA_BASE_URL` points the tests at another server
//! (default: `http://localhost:3000`). The repository tests connect
//! directly to `REUBICA_DATABASE_URL` (or `DATABASE_URL`).
//!
//! Every test creates its own accounts with unique emails, so the suite
//! can run against a shared database.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use reubica_api::db::UserRepository;
use reubica_api::models::{NewUser, User};
use reubica_api::services::auth::hash_new_password;
use reubica_core::{Email, Phone, UserRole};

/// Password that satisfies the password policy.
pub const PASSWORD: &str = "Reubica#2024";

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("REUBICA_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Full URL for an API path such as `/api/users/me`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url().trim_end_matches('/'))
}

/// A client that keeps the session cookie between requests.
///
/// Each client claims its own forwarded address so the auth rate limiter
/// does not throttle the suite as a whole. The server only honours it with
/// `REUBICA_TRUST_PROXY_HEADERS=true`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    let [a, b, c, ..] = *Uuid::new_v4().as_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).expect("valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A short random suffix for unique names and emails.
#[must_use]
pub fn unique() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

/// Registration body for a new account with the given role.
#[must_use]
pub fn registration(role: &str) -> Value {
    json!({
        "first_name": "Prueba",
        "last_name": "Integración",
        "email": format!("it-{}@reubica.test", unique()),
        "password": PASSWORD,
        "confirm_password": PASSWORD,
        "phone": "8888-0000",
        "role": role,
    })
}

/// Register a fresh account and return a logged-in client with the created
/// user.
///
/// # Panics
///
/// Panics if the server is unreachable or registration fails.
pub async fn signed_up(role: &str) -> (Client, Value) {
    let client = client();
    let resp = client
        .post(url("/api/users/register"))
        .json(&registration(role))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = resp.json().await.expect("Failed to read user");
    (client, user)
}

/// Comercio registration body with a unique name.
#[must_use]
pub fn comercio_body() -> Value {
    json!({
        "name": format!("Soda {}", unique()),
        "description": "Casados y gallo pinto",
        "principal_categories": ["comida"],
        "secondary_categories": ["cafeteria"],
        "address": "San José, Barrio Escalante",
        "phone": "2222-3333",
        "opening_hours": {"lunes": "7:00-18:00"},
        "latitude": 9.9333,
        "longitude": -84.0833,
    })
}

/// Register an emprendedor that owns a comercio.
///
/// # Panics
///
/// Panics if any request fails.
pub async fn emprendedor_with_comercio() -> (Client, Value) {
    let (client, _) = signed_up("emprendedor").await;
    let resp = client
        .post(url("/api/comercios"))
        .json(&comercio_body())
        .send()
        .await
        .expect("Failed to create comercio");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comercio = resp.json().await.expect("Failed to read comercio");
    (client, comercio)
}

/// Create a product in the caller's comercio.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn create_product(client: &Client, name: &str) -> Value {
    let resp = client
        .post(url("/api/productos"))
        .json(&json!({
            "name": name,
            "description": "Hecho en casa",
            "price": "2500.00",
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to read product")
}

/// Connect to the test database.
///
/// # Panics
///
/// Panics if no database URL is configured or the connection fails.
pub async fn pool() -> PgPool {
    let url = std::env::var("REUBICA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("REUBICA_DATABASE_URL or DATABASE_URL must be set");
    reubica_api::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database")
}

/// Insert an account with [`PASSWORD`] directly through the repository.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn insert_user(pool: &PgPool, role: UserRole) -> User {
    let new_user = NewUser {
        first_name: "Prueba".to_string(),
        last_name: "Repositorio".to_string(),
        email: Email::parse(&format!("repo-{}@reubica.test", unique())).expect("valid email"),
        phone: Phone::parse("8888-0000").expect("valid phone"),
        role,
        icon_url: None,
    };
    let password_hash = hash_new_password(PASSWORD).expect("password hashes");
    UserRepository::new(pool)
        .create(&new_user, &password_hash)
        .await
        .expect("Failed to insert user")
}
