//! Catalog API: read-through cache and invalidation seen over HTTP.

use reqwest::StatusCode;
use serde_json::{Value, json};

use contraentrega_integration_tests::{IMAGE_BASE_URL, TestContext, product};
use contraentrega_storefront::catalog::{KvStore, ProductStore};

#[tokio::test]
async fn test_list_empty_catalog_is_404() {
    let ctx = TestContext::new().await;

    let resp = ctx.get("/api/products").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_list_serves_absolute_image_urls() {
    let ctx = TestContext::with_products(vec![
        product("cafe", "Café", 32_000, 12),
        product("pan", "Pan", 2_500, 0),
    ])
    .await;

    let resp = ctx.get("/api/products").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<Value> = resp.json().await.unwrap();

    assert_eq!(body.len(), 2);
    let cafe = body.iter().find(|p| p["id"] == "@cafe").unwrap();
    assert_eq!(cafe["price"], 32_000);
    assert_eq!(cafe["stock"], 12);
    assert_eq!(cafe["image"], "cafe.jpg");
    assert_eq!(cafe["imageUrl"], format!("{IMAGE_BASE_URL}cafe.jpg"));
}

#[tokio::test]
async fn test_show_accepts_id_with_or_without_sigil() {
    let ctx = TestContext::with_products(vec![product("cafe", "Café", 32_000, 12)]).await;

    for path in ["/api/products/cafe", "/api/products/@cafe"] {
        let resp = ctx.get(path).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["id"], "@cafe");
    }
}

#[tokio::test]
async fn test_show_unknown_product_is_404() {
    let ctx = TestContext::with_products(vec![product("cafe", "Café", 32_000, 12)]).await;

    let resp = ctx.get("/api/products/te").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_show_bare_sigil_is_404() {
    let ctx = TestContext::with_products(vec![product("cafe", "Café", 32_000, 12)]).await;

    let resp = ctx.get("/api/products/@").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_first_read_populates_cache() {
    let ctx = TestContext::with_products(vec![product("cafe", "Café", 32_000, 12)]).await;
    assert!(ctx.cache.get("products").await.unwrap().is_none());

    ctx.get("/api/products").await;

    let cached = ctx.cache.get("products").await.unwrap().unwrap();
    assert!(cached.contains("@cafe"));
}

#[tokio::test]
async fn test_cached_catalog_survives_store_outage() {
    let ctx = TestContext::with_products(vec![product("cafe", "Café", 32_000, 12)]).await;
    assert_eq!(ctx.get("/api/products").await.status(), StatusCode::OK);
    assert_eq!(ctx.get("/api/products/cafe").await.status(), StatusCode::OK);

    ctx.store.set_offline(true);

    assert_eq!(ctx.get("/api/products").await.status(), StatusCode::OK);
    assert_eq!(ctx.get("/api/products/cafe").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_uncached_read_during_outage_is_500() {
    let ctx = TestContext::with_products(vec![product("cafe", "Café", 32_000, 12)]).await;
    ctx.store.set_offline(true);

    assert_eq!(
        ctx.get("/api/products").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_out_of_band_write_stays_hidden_until_next_mutation() {
    let ctx = TestContext::with_products(vec![product("cafe", "Café", 32_000, 12)]).await;
    let token = ctx.login().await;
    ctx.get("/api/products").await;

    // A write that bypasses the catalog leaves the cache stale.
    ctx.store
        .insert(&product("pan", "Pan", 2_500, 3))
        .await
        .unwrap();
    let body: Vec<Value> = ctx.get("/api/products").await.json().await.unwrap();
    assert_eq!(body.len(), 1);

    // Any admin mutation drops the aggregate entry.
    let resp = ctx
        .post_authed(
            "/admin/update",
            &token,
            &json!({"id": "cafe", "name": "Café", "price": 30000, "stock": 12, "image": "cafe.jpg"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Vec<Value> = ctx.get("/api/products").await.json().await.unwrap();
    assert_eq!(body.len(), 2);
}

#[tokio::test]
async fn test_flush_drops_cached_entries() {
    let ctx = TestContext::with_products(vec![product("cafe", "Café", 32_000, 12)]).await;
    let token = ctx.login().await;
    ctx.get("/api/products").await;
    ctx.store
        .insert(&product("pan", "Pan", 2_500, 3))
        .await
        .unwrap();

    let resp = ctx.post_authed("/admin/cache/flush", &token, &json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Caché vaciada");

    let body: Vec<Value> = ctx.get("/api/products").await.json().await.unwrap();
    assert_eq!(body.len(), 2);
}
