//! Repository tests that talk to `PostgreSQL` directly.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - `REUBICA_DATABASE_URL` (or `DATABASE_URL`) pointing at it
//!
//! Run with: cargo test -p reubica-integration-tests -- --ignored

use secrecy::SecretString;
use serde_json::json;
use sqlx::PgPool;

use reubica_api::db::reset_tokens::MAX_FAILED_ATTEMPTS;
use reubica_api::db::{ComercioRepository, RepositoryError, ResetTokenRepository, UserRepository};
use reubica_api::models::{NewComercio, User, UserChanges};
use reubica_api::services::auth::{AuthError, AuthService};
use reubica_core::{CategorySelection, Email, UserId, UserRole};
use reubica_integration_tests::{PASSWORD, insert_user, pool, unique};

const NEW_PASSWORD: &str = "Nueva#Clave2025";

fn pepper() -> SecretString {
    SecretString::from("Zq7$Lm2!Vx9@Rt4#Kp8&Wn3*Hd6^Bf1%")
}

fn email() -> String {
    format!("reset-{}@reubica.test", unique())
}

fn new_comercio(owner: UserId) -> NewComercio {
    NewComercio {
        owner_id: owner,
        name: format!("Soda {}", unique()),
        description: None,
        categories: CategorySelection::validate(&["comida"], &["cafeteria"]).unwrap(),
        logo_url: None,
        opening_hours: Some(json!({"lunes": "7:00-18:00"})),
        address: "Heredia centro".to_string(),
        phone: None,
        social_links: None,
        latitude: 9.998,
        longitude: -84.117,
    }
}

async fn add_comercio(pool: &PgPool, owner: &User) {
    ComercioRepository::new(pool)
        .create_for_owner(&owner.actor(), &new_comercio(owner.id))
        .await
        .unwrap();
}

fn role_change(role: UserRole) -> UserChanges {
    UserChanges {
        role: Some(role),
        ..UserChanges::default()
    }
}

async fn code_state(pool: &PgPool, email: &str) -> (i32, bool) {
    sqlx::query_as(
        r"
        SELECT failed_attempts, used FROM reubica.password_reset_token
        WHERE email = $1 ORDER BY created_at DESC LIMIT 1
        ",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

// =============================================================================
// Role changes
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_admin_with_two_comercios_cannot_be_demoted() {
    let pool = pool().await;
    let admin = insert_user(&pool, UserRole::Admin).await;
    add_comercio(&pool, &admin).await;
    add_comercio(&pool, &admin).await;

    let users = UserRepository::new(&pool);
    let result = users
        .update(admin.id, &role_change(UserRole::Emprendedor))
        .await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    let reloaded = users.get_by_id(admin.id).await.unwrap().unwrap();
    assert_eq!(reloaded.role, UserRole::Admin);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_owner_cannot_become_cliente() {
    let pool = pool().await;
    let owner = insert_user(&pool, UserRole::Emprendedor).await;
    add_comercio(&pool, &owner).await;

    let users = UserRepository::new(&pool);
    let result = users.update(owner.id, &role_change(UserRole::Cliente)).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    let promoted = users
        .update(owner.id, &role_change(UserRole::Admin))
        .await
        .unwrap();
    assert_eq!(promoted.role, UserRole::Admin);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_emprendedor_without_comercio_can_become_cliente() {
    let pool = pool().await;
    let user = insert_user(&pool, UserRole::Emprendedor).await;

    let updated = UserRepository::new(&pool)
        .update(user.id, &role_change(UserRole::Cliente))
        .await
        .unwrap();
    assert_eq!(updated.role, UserRole::Cliente);
}

// =============================================================================
// Password reset codes
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_reset_with_code_changes_password_once() {
    let pool = pool().await;
    let pepper = pepper();
    let auth = AuthService::new(&pool, &pepper);
    let user = insert_user(&pool, UserRole::Cliente).await;
    let email: &Email = &user.email;

    let code = auth.issue_reset_code(email).await.unwrap().unwrap();
    auth.reset_password(email, code.as_str(), NEW_PASSWORD, NEW_PASSWORD)
        .await
        .unwrap();

    let reused = auth
        .reset_password(email, code.as_str(), NEW_PASSWORD, NEW_PASSWORD)
        .await;
    assert!(matches!(reused, Err(AuthError::InvalidResetCode)));

    let logged_in = auth.login(email.as_str(), NEW_PASSWORD).await.unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(matches!(
        auth.login(email.as_str(), PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_reset_code_for_unknown_account_is_not_issued() {
    let pool = pool().await;
    let pepper = pepper();
    let email = Email::parse(&email()).unwrap();

    let issued = AuthService::new(&pool, &pepper)
        .issue_reset_code(&email)
        .await
        .unwrap();
    assert!(issued.is_none());
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_new_code_supersedes_older_one() {
    let pool = pool().await;
    let tokens = ResetTokenRepository::new(&pool);
    let email = email();

    tokens.issue(&email, "first").await.unwrap();
    tokens.issue(&email, "second").await.unwrap();

    let old = tokens.consume_and_set_password(&email, "first", "x").await;
    assert!(matches!(old, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_expired_code_is_refused() {
    let pool = pool().await;
    let user = insert_user(&pool, UserRole::Cliente).await;
    let email = user.email.as_str();
    let tokens = ResetTokenRepository::new(&pool);

    tokens.issue(email, "code").await.unwrap();
    sqlx::query(
        r"
        UPDATE reubica.password_reset_token
        SET expires_at = now() - INTERVAL '1 minute'
        WHERE email = $1
        ",
    )
    .bind(email)
    .execute(&pool)
    .await
    .unwrap();

    let result = tokens.consume_and_set_password(email, "code", "x").await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_code_survives_a_few_wrong_guesses() {
    let pool = pool().await;
    let user = insert_user(&pool, UserRole::Cliente).await;
    let email = user.email.as_str();
    let tokens = ResetTokenRepository::new(&pool);

    tokens.issue(email, "right").await.unwrap();
    for _ in 1..MAX_FAILED_ATTEMPTS {
        let guess = tokens.consume_and_set_password(email, "wrong", "x").await;
        assert!(matches!(guess, Err(RepositoryError::NotFound)));
    }
    assert_eq!(code_state(&pool, email).await, (MAX_FAILED_ATTEMPTS - 1, false));

    tokens
        .consume_and_set_password(email, "right", "new-hash")
        .await
        .unwrap();
    assert!(code_state(&pool, email).await.1);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_code_is_burnt_after_too_many_wrong_guesses() {
    let pool = pool().await;
    let user = insert_user(&pool, UserRole::Cliente).await;
    let email = user.email.as_str();
    let tokens = ResetTokenRepository::new(&pool);

    tokens.issue(email, "right").await.unwrap();
    for _ in 0..MAX_FAILED_ATTEMPTS {
        let _ = tokens.consume_and_set_password(email, "wrong", "x").await;
    }
    assert_eq!(code_state(&pool, email).await, (MAX_FAILED_ATTEMPTS, true));

    let result = tokens.consume_and_set_password(email, "right", "x").await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_code_stays_live_when_password_change_fails() {
    let pool = pool().await;
    let tokens = ResetTokenRepository::new(&pool);
    // No account behind this email, so the password update finds nothing
    let email = email();

    tokens.issue(&email, "code").await.unwrap();
    let result = tokens.consume_and_set_password(&email, "code", "x").await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));

    assert_eq!(code_state(&pool, &email).await, (0, false));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_purge_removes_old_spent_codes() {
    let pool = pool().await;
    let tokens = ResetTokenRepository::new(&pool);
    let spent = email();
    let live = email();

    tokens.issue(&spent, "old").await.unwrap();
    sqlx::query(
        r"
        UPDATE reubica.password_reset_token
        SET used = TRUE, created_at = now() - INTERVAL '2 days'
        WHERE email = $1
        ",
    )
    .bind(&spent)
    .execute(&pool)
    .await
    .unwrap();
    tokens.issue(&live, "fresh").await.unwrap();

    tokens.purge_stale().await.unwrap();

    let remaining: Vec<String> = sqlx::query_scalar(
        "SELECT email FROM reubica.password_reset_token WHERE email = ANY($1)",
    )
    .bind(vec![spent.clone(), live.clone()])
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(remaining, vec![live]);
}
