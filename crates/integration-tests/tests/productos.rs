//! Integration tests for products, ratings and favorites.
//!
//! Run with: cargo test -p reubica-integration-tests -- --ignored

use reqwest::StatusCode;
use reubica_integration_tests::{create_product, emprendedor_with_comercio, signed_up, url};
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_product_lifecycle() {
    let (owner, comercio) = emprendedor_with_comercio().await;
    let product = create_product(&owner, "Café chorreado").await;
    assert_eq!(product["comercio_id"], comercio["id"]);
    assert_eq!(product["price"], "2500.00");

    // Same name in the same comercio
    let resp = owner
        .post(url("/api/productos"))
        .json(&json!({"name": "Café chorreado", "description": "Otra vez", "price": 100}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let id = product["id"].as_str().unwrap();
    let resp = owner
        .put(url(&format!("/api/productos/{id}")))
        .json(&json!({"price": "1800.5", "image_url": "https://cdn.reubica.test/cafe.png"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["price"], "1800.50");

    let cid = comercio["id"].as_str().unwrap();
    let listed: Vec<Value> = owner
        .get(url(&format!("/api/productos/comercio/{cid}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let resp = owner
        .delete(url(&format!("/api/productos/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_product_rules_by_role() {
    let (owner, _) = emprendedor_with_comercio().await;
    let product = create_product(&owner, "Empanadas").await;
    let id = product["id"].as_str().unwrap();

    // A cliente cannot create products
    let (cliente, _) = signed_up("cliente").await;
    let resp = cliente
        .post(url("/api/productos"))
        .json(&json!({"name": "X", "description": "Y", "price": "1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // An emprendedor without a comercio gets a 400
    let (lonely, _) = signed_up("emprendedor").await;
    let resp = lonely
        .post(url("/api/productos"))
        .json(&json!({"name": "X", "description": "Y", "price": "1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Another emprendedor cannot touch this product
    let (rival, _) = emprendedor_with_comercio().await;
    let resp = rival
        .delete(url(&format!("/api/productos/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Price must be positive
    let resp = owner
        .put(url(&format!("/api/productos/{id}")))
        .json(&json!({"price": "-3"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_ratings() {
    let (owner, comercio) = emprendedor_with_comercio().await;
    let product = create_product(&owner, "Tamales").await;
    let id = product["id"].as_str().unwrap();
    let cid = comercio["id"].as_str().unwrap();

    let (rater, _) = signed_up("cliente").await;
    let rating_url = url(&format!("/api/productos/{id}/ratings"));

    let resp = rater
        .post(&rating_url)
        .json(&json!({"score": 6, "comment": "demasiado"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = rater
        .post(&rating_url)
        .json(&json!({"score": 4.5, "comment": "Muy ricos"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = rater
        .post(&rating_url)
        .json(&json!({"score": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let grouped: Vec<Value> = rater
        .get(url(&format!("/api/productos/comercio/{cid}/ratings")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[0]["ratings"].as_array().unwrap().len(), 1);

    let resp = rater.delete(&rating_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = rater.delete(&rating_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_ratings_of_empty_comercio_is_not_found() {
    let (owner, comercio) = emprendedor_with_comercio().await;
    let cid = comercio["id"].as_str().unwrap();

    let resp = owner
        .get(url(&format!("/api/productos/comercio/{cid}/ratings")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_favorite_toggle() {
    let (owner, comercio) = emprendedor_with_comercio().await;
    let product = create_product(&owner, "Cajetas").await;
    let (fan, _) = signed_up("cliente").await;
    let toggle = url("/api/favoritos/toggle");
    let body = json!({"kind": "producto", "product_id": product["id"]});

    let resp = fan.post(&toggle).json(&body).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let state: Value = resp.json().await.unwrap();
    assert_eq!(state["favorited"], true);

    let resp = fan
        .post(&toggle)
        .json(&json!({"kind": "comercio", "comercio_id": comercio["id"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let products: Vec<Value> = fan
        .get(url("/api/favoritos?kind=producto"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["product"]["id"], product["id"]);

    let resp = fan.post(&toggle).json(&body).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let state: Value = resp.json().await.unwrap();
    assert_eq!(state["favorited"], false);

    let all: Vec<Value> = fan
        .get(url("/api/favoritos"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["kind"], "comercio");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_favorite_validation() {
    let (fan, _) = signed_up("cliente").await;
    let toggle = url("/api/favoritos/toggle");

    let resp = fan
        .post(&toggle)
        .json(&json!({"kind": "producto"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = fan
        .post(&toggle)
        .json(&json!({"kind": "producto", "product_id": "00000000-0000-4000-8000-000000000000"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
