//! Admin session: login, bearer verification and product mutations.

use std::sync::atomic::Ordering;

use reqwest::StatusCode;
use serde_json::{Value, json};

use contraentrega_integration_tests::{
    ADMIN_PASSWORD, ADMIN_USERNAME, GOOD_CHALLENGE, IMAGE_BASE_URL, TestContext, now, product,
    test_signer,
};

fn product_body(id: &str, price: i64) -> Value {
    json!({"id": id, "name": "Test", "price": price, "stock": 4, "image": "t.jpg"})
}

#[tokio::test]
async fn test_login_returns_token_accepted_by_me() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let resp = ctx.get_authed("/admin/me", &token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let claims: Value = resp.json().await.unwrap();
    assert_eq!(claims["sub"], "admin");
    let exp = claims["exp"].as_i64().unwrap();
    assert!(exp > now() && exp <= now() + 3600);
}

#[tokio::test]
async fn test_login_wrong_password_is_401() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .login_with(ADMIN_USERNAME, "wrong", GOOD_CHALLENGE)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert!(body["token"].is_null());
}

#[tokio::test]
async fn test_login_wrong_username_is_401() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .login_with("someone", ADMIN_PASSWORD, GOOD_CHALLENGE)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failed_challenge_is_401() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .login_with(ADMIN_USERNAME, ADMIN_PASSWORD, "bot")
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.challenge.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_login_empty_challenge_skips_verifier() {
    let ctx = TestContext::new().await;

    let resp = ctx.login_with(ADMIN_USERNAME, ADMIN_PASSWORD, "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.challenge.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_login_malformed_body_is_400() {
    let ctx = TestContext::new().await;

    let resp = ctx.post_json("/admin/login", &json!({"username": "x"})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let ctx = TestContext::new().await;

    assert_eq!(ctx.get("/admin/me").await.status(), StatusCode::UNAUTHORIZED);
    let resp = ctx.post_json("/admin/add", &product_body("test1", 1000)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_token_is_401() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let mut tampered = token.into_bytes();
    let i = tampered.len() - 10;
    tampered[i] = if tampered[i] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let resp = ctx.get_authed("/admin/me", &tampered).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let ctx = TestContext::new().await;
    let token = test_signer().issue("admin", now() - 2 * 3600).unwrap();

    let resp = ctx.get_authed("/admin/me", &token).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_then_read() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let resp = ctx
        .post_authed("/admin/add", &token, &product_body("@test1", 1000))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Producto @test1 agregado");

    let resp = ctx.get("/api/products/test1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["price"], 1000);
    assert_eq!(body["imageUrl"], format!("{IMAGE_BASE_URL}t.jpg"));
}

#[tokio::test]
async fn test_add_duplicate_is_409() {
    let ctx = TestContext::with_products(vec![product("test1", "Test", 1000, 1)]).await;
    let token = ctx.login().await;

    let resp = ctx
        .post_authed("/admin/add", &token, &product_body("test1", 1000))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_add_invalid_product_is_400() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let resp = ctx
        .post_authed("/admin/add", &token, &product_body("test1", -5))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .post_authed(
            "/admin/add",
            &token,
            &json!({"id": "test1", "name": " ", "price": 1, "stock": 1, "image": "t.jpg"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_invalidates_cached_reads() {
    let ctx = TestContext::with_products(vec![product("test1", "Test", 1000, 4)]).await;
    let token = ctx.login().await;

    let before: Value = ctx.get("/api/products/test1").await.json().await.unwrap();
    assert_eq!(before["price"], 1000);
    let list: Vec<Value> = ctx.get("/api/products").await.json().await.unwrap();
    assert_eq!(list[0]["price"], 1000);

    let resp = ctx
        .post_authed("/admin/update", &token, &product_body("test1", 1500))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let after: Value = ctx.get("/api/products/test1").await.json().await.unwrap();
    assert_eq!(after["price"], 1500);
    let list: Vec<Value> = ctx.get("/api/products").await.json().await.unwrap();
    assert_eq!(list[0]["price"], 1500);
}

#[tokio::test]
async fn test_update_unknown_product_is_404() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let resp = ctx
        .post_authed("/admin/update", &token, &product_body("ghost", 1000))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_product() {
    let ctx = TestContext::with_products(vec![
        product("test1", "Test", 1000, 4),
        product("test2", "Otro", 2000, 4),
    ])
    .await;
    let token = ctx.login().await;
    ctx.get("/api/products/test1").await;
    ctx.get("/api/products").await;

    let resp = ctx
        .post_authed("/admin/delete", &token, &json!({"id": "test1"}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Producto @test1 eliminado");

    assert_eq!(
        ctx.get("/api/products/test1").await.status(),
        StatusCode::NOT_FOUND
    );
    let list: Vec<Value> = ctx.get("/api/products").await.json().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "@test2");

    let resp = ctx
        .post_authed("/admin/delete", &token, &json!({"id": "test1"}))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
