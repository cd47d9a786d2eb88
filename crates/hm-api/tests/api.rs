use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use hm_api::rate_limit::RateLimiter;
use hm_api::{router, AppState, SiteSettings};
use hm_auth_simple::SimpleAuthProvider;
use hm_core::models::{Product, TaxonomyEntry, TaxonomyKind};
use hm_core::traits::{AuthProvider, CatalogRepo, Mailer, MockMailer};
use hm_db_sqlite::SqliteCatalogRepo;
use hm_mail_log::LogMailer;
use hm_storage_local::LocalMediaStore;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN: &str = "owner@haymarketwoodshop.com";

struct TestApp {
    router: Router,
    repo: Arc<SqliteCatalogRepo>,
    auth: Arc<SimpleAuthProvider>,
    mailer: Arc<LogMailer>,
    _uploads: TempDir,
}

async fn app_with_mailer(mailer: Option<Arc<dyn Mailer>>) -> TestApp {
    let repo = Arc::new(SqliteCatalogRepo::new("sqlite::memory:").await.unwrap());
    repo.add_admin_email(ADMIN).await.unwrap();

    let uploads = tempfile::tempdir().unwrap();
    let media = Arc::new(LocalMediaStore::new(uploads.path().to_path_buf(), "/uploads"));
    let auth = Arc::new(SimpleAuthProvider::new(
        SecretString::from("test-secret-for-integration-tests".to_string()),
        chrono::Duration::minutes(15),
        chrono::Duration::hours(168),
    ));
    let log_mailer = Arc::new(LogMailer::new());

    let state = AppState {
        repo: repo.clone(),
        media,
        auth: auth.clone(),
        mailer: mailer.unwrap_or_else(|| log_mailer.clone() as Arc<dyn Mailer>),
        site: Arc::new(SiteSettings {
            site_url: "https://haymarketwoodshop.com".into(),
            contact_to: "hello@haymarketwoodshop.com".into(),
            contact_from: "website@haymarketwoodshop.com".into(),
        }),
        contact_limiter: Arc::new(RateLimiter::new(3, Duration::from_secs(60))),
    };

    TestApp {
        router: router(state),
        repo,
        auth,
        mailer: log_mailer,
        _uploads: uploads,
    }
}

async fn app() -> TestApp {
    app_with_mailer(None).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let (status, _, body) = send(router, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn as_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn entry(name: &str, active: bool) -> TaxonomyEntry {
    TaxonomyEntry {
        id: Uuid::now_v7(),
        name: name.into(),
        sort_order: 0,
        is_active: active,
        created_at: Utc::now(),
    }
}

fn product(name: &str, wood: &TaxonomyEntry, in_stock: bool) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::now_v7(),
        name: name.into(),
        description: Some("Hand-rubbed oil finish".into()),
        materials: None,
        dimensions: Some("18 x 12 in".into()),
        weight: None,
        care_instructions: None,
        price_cents: 8500,
        buy_url: Some("https://shop.example.com/buy/1".into()),
        size_label: Some("Medium".into()),
        wood_type_id: Some(wood.id),
        item_type_id: None,
        image_urls: vec!["ab/cd/board.jpg".into()],
        image_url: None,
        is_in_stock: in_stock,
        sort_order: 0,
        created_at: now,
        updated_at: now,
    }
}

async fn seed(app: &TestApp) -> (Product, Product) {
    let walnut = entry("Walnut", true);
    let cherry = entry("Cherry", true);
    app.repo.create_taxonomy(TaxonomyKind::Wood, walnut.clone()).await.unwrap();
    app.repo.create_taxonomy(TaxonomyKind::Wood, cherry.clone()).await.unwrap();

    let board = product("Walnut Cutting Board", &walnut, true);
    let box_ = product("Cherry Keepsake Box", &cherry, false);
    app.repo.create_product(board.clone()).await.unwrap();
    app.repo.create_product(box_.clone()).await.unwrap();
    (board, box_)
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = app().await;
    let (status, headers, body) = send(&app.router, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["status"], "ok");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::REFERRER_POLICY], "strict-origin-when-cross-origin");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_home_redirects_to_gallery() {
    let app = app().await;
    let (status, headers, _) = send(&app.router, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/gallery");
}

#[tokio::test]
async fn test_api_products_applies_query_filters() {
    let app = app().await;
    seed(&app).await;

    let (status, body) = get(&app.router, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
    let products = as_json(&body);
    assert_eq!(products.as_array().unwrap().len(), 1);
    assert_eq!(products[0]["name"], "Walnut Cutting Board");
    assert_eq!(products[0]["woodType"], "Walnut");
    assert_eq!(products[0]["images"][0], "/uploads/ab/cd/board.jpg");

    let (_, body) = get(&app.router, "/api/products?inStock=0").await;
    assert_eq!(as_json(&body).as_array().unwrap().len(), 2);

    let (_, body) = get(&app.router, "/api/products?inStock=0&wood=cherry").await;
    let products = as_json(&body);
    assert_eq!(products.as_array().unwrap().len(), 1);
    assert_eq!(products[0]["name"], "Cherry Keepsake Box");

    let (_, body) = get(&app.router, "/api/products?size=large").await;
    assert!(as_json(&body).as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_gallery_page_renders() {
    let app = app().await;
    seed(&app).await;

    let (status, body) = get(&app.router, "/gallery?inStock=0").await;
    let html = String::from_utf8(body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Walnut Cutting Board"));
    assert!(html.contains("Cherry Keepsake Box"));
    assert!(html.contains("Sold Out"));
    assert!(html.contains("2 items"));
    assert!(html.contains("Clear filters"));
}

#[tokio::test]
async fn test_product_page_and_not_found() {
    let app = app().await;
    let (board, _) = seed(&app).await;

    let (status, body) = get(&app.router, &format!("/products/{}", board.id)).await;
    let html = String::from_utf8(body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("$85.00"));
    assert!(html.contains("18 x 12 in"));

    let (status, _) = get(&app.router, &format!("/products/{}", Uuid::now_v7())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app.router, "/products/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app.router, "/no/such/page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_taxonomy_lists_active_only() {
    let app = app().await;
    app.repo.create_taxonomy(TaxonomyKind::Wood, entry("Oak", true)).await.unwrap();
    app.repo.create_taxonomy(TaxonomyKind::Wood, entry("Elm", false)).await.unwrap();

    let (status, body) = get(&app.router, "/api/taxonomy/wood").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = as_json(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Oak"]);

    let (status, _) = get(&app.router, "/api/taxonomy/metal").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn contact(name: &str, message: &str) -> Value {
    json!({
        "name": name,
        "email": "buyer@example.com",
        "phone": "",
        "message": message,
    })
}

#[tokio::test]
async fn test_contact_relays_message() {
    let app = app().await;
    let request = json_request("POST", "/api/contact", contact("Jane Buyer", "Do you build custom tables?"), None);
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["success"], true);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "hello@haymarketwoodshop.com");
    assert_eq!(sent[0].reply_to.as_deref(), Some("buyer@example.com"));
    assert!(sent[0].body.contains("Phone: Not provided"));
}

#[tokio::test]
async fn test_contact_validation_and_honeypot() {
    let app = app().await;

    let (status, _, body) = send(&app.router, json_request("POST", "/api/contact", contact("J", "short"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_json(&body)["error"].as_str().unwrap().contains("Name must be between"));

    let mut spam = contact("Spam Bot", "Buy cheap watches now!!!");
    spam["honeypot"] = json!("http://spam.example");
    let request = Request::post("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "10.9.9.9")
        .body(Body::from(spam.to_string()))
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.mailer.sent().is_empty());

    // validation runs before the honeypot check
    let mut invalid_spam = contact("J", "short");
    invalid_spam["honeypot"] = json!("http://spam.example");
    let request = Request::post("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "10.9.9.10")
        .body(Body::from(invalid_spam.to_string()))
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_contact_rate_limited_per_client() {
    let app = app().await;
    let request = || {
        Request::post("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(contact("Jane Buyer", "Is the walnut board available?").to_string()))
            .unwrap()
    };

    for _ in 0..3 {
        let (status, _, _) = send(&app.router, request()).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _, _) = send(&app.router, request()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_contact_relay_failure_is_generic_500() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .returning(|_| Err(anyhow::anyhow!("smtp connection refused")));
    let app = app_with_mailer(Some(Arc::new(mailer))).await;

    let request = json_request("POST", "/api/contact", contact("Jane Buyer", "Do you ship to Maryland?"), None);
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(as_json(&body)["error"], "internal server error");
}

#[tokio::test]
async fn test_magic_link_login_flow() {
    let app = app().await;

    let (status, _, _) = send(&app.router, json_request("POST", "/admin/login", json!({ "email": "stranger@example.com" }), None)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(app.mailer.sent().is_empty());

    let (status, _, _) = send(&app.router, json_request("POST", "/admin/login", json!({ "email": "Owner@HaymarketWoodshop.com" }), None)).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ADMIN);
    let link = sent[0]
        .body
        .lines()
        .find(|line| line.starts_with("https://haymarketwoodshop.com/admin/verify?token="))
        .unwrap();
    let path = link.trim_start_matches("https://haymarketwoodshop.com");

    let (status, body) = get(&app.router, path).await;
    assert_eq!(status, StatusCode::OK);
    let session = as_json(&body)["token"].as_str().unwrap().to_string();

    let (status, _, _) = send(
        &app.router,
        Request::get("/admin/api/products")
            .header(header::AUTHORIZATION, format!("Bearer {session}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app.router, "/admin/verify?token=forged").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_api_requires_session() {
    let app = app().await;

    let (status, _) = get(&app.router, "/admin/api/products").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let login_token = app.auth.issue_login_token(ADMIN);
    let request = Request::get("/admin/api/products")
        .header(header::AUTHORIZATION, format!("Bearer {login_token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let outsider = app.auth.issue_session_token("someone@example.com");
    let request = Request::get("/admin/api/products")
        .header(header::AUTHORIZATION, format!("Bearer {outsider}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_product_crud() {
    let app = app().await;
    let token = app.auth.issue_session_token(ADMIN);

    let draft = json!({
        "name": "Maple Side Table",
        "price": "$249.99",
        "size_label": "Large",
        "description": "  ",
    });
    let (status, _, body) = send(&app.router, json_request("POST", "/admin/api/products", draft, Some(&token))).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = as_json(&body);
    assert_eq!(created["price_cents"], 24999);
    assert_eq!(created["description"], Value::Null);
    let id = created["id"].as_str().unwrap().to_string();

    let update = json!({ "name": "Maple End Table", "price_cents": 19900, "is_in_stock": false });
    let (status, _, body) = send(
        &app.router,
        json_request("PUT", &format!("/admin/api/products/{id}"), update, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = as_json(&body);
    assert_eq!(updated["name"], "Maple End Table");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (_, body) = get(&app.router, "/api/products").await;
    assert!(as_json(&body).as_array().unwrap().is_empty());

    let (status, _, _) = send(
        &app.router,
        json_request("PUT", &format!("/admin/api/products/{}", Uuid::now_v7()), json!({ "name": "Ghost" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app.router, json_request("POST", "/admin/api/products", json!({ "name": " " }), Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete = |uri: String| {
        Request::delete(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };
    let (status, _, _) = send(&app.router, delete(format!("/admin/api/products/{id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = send(&app.router, delete(format!("/admin/api/products/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_taxonomy_crud_keeps_products() {
    let app = app().await;
    let token = app.auth.issue_session_token(ADMIN);

    let (status, _, body) = send(
        &app.router,
        json_request("POST", "/admin/api/taxonomy/wood", json!({ "name": "Ash", "sort_order": 2 }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let ash: TaxonomyEntry = serde_json::from_slice(&body).unwrap();

    let (status, _, _) = send(
        &app.router,
        json_request("POST", "/admin/api/taxonomy/wood", json!({ "name": "Oak, Red" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    app.repo.create_product(product("Ash Bowl", &ash, true)).await.unwrap();

    let (status, _, body) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/admin/api/taxonomy/wood/{}", ash.id),
            json!({ "name": "White Ash", "is_active": false }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let renamed: TaxonomyEntry = serde_json::from_slice(&body).unwrap();
    assert_eq!(renamed.name, "White Ash");
    assert!(!renamed.is_active);
    assert_eq!(renamed.created_at, ash.created_at);

    // inactive entries still name existing products
    let (_, body) = get(&app.router, "/api/products").await;
    assert_eq!(as_json(&body)[0]["woodType"], "White Ash");

    let request = Request::delete(format!("/admin/api/taxonomy/wood/{}", ash.id))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = get(&app.router, "/api/products").await;
    let products = as_json(&body);
    assert_eq!(products.as_array().unwrap().len(), 1);
    assert_eq!(products[0]["woodType"], "");
}

fn multipart_upload(token: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "haymarket-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"photo\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/admin/api/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_image_upload() {
    let app = app().await;
    let token = app.auth.issue_session_token(ADMIN);

    let (status, _, body) = send(&app.router, multipart_upload(&token, "image/png", b"\x89PNG fake bytes")).await;
    assert_eq!(status, StatusCode::CREATED);
    let uploaded = as_json(&body);
    let reference = uploaded["reference"].as_str().unwrap();
    assert!(reference.ends_with(".png"));
    assert_eq!(uploaded["url"], format!("/uploads/{reference}"));

    let (status, _, _) = send(&app.router, multipart_upload(&token, "application/pdf", b"%PDF-1.7")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
