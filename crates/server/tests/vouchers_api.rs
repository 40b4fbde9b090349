use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use configs::CorsConfig;
use server::{routes, startup::build_cors, state::ServerState};
use service::auth::TokenAuth;
use service::voucher::repository::{mock::MockVoucherRepository, VoucherRepository};
use service::voucher::{service::VoucherConfig, VoucherService};

const TOKEN: &str = "test-token";
const BOUNDARY: &str = "XVOUCHERBOUNDARY";

fn build_app_with(cfg: VoucherConfig, cors: CorsConfig, request_timeout: Duration) -> (Arc<MockVoucherRepository>, Router) {
    let mock = Arc::new(MockVoucherRepository::default());
    let repo: Arc<dyn VoucherRepository> = mock.clone();
    let vouchers = VoucherService::new(repo, cfg);
    let state = ServerState::new(vouchers, TokenAuth::new(TOKEN));
    (mock, routes::build_router(state, build_cors(&cors), request_timeout))
}

fn build_app() -> (Arc<MockVoucherRepository>, Router) {
    build_app_with(VoucherConfig::default(), CorsConfig::default(), Duration::from_secs(15))
}

fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    authed(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn multipart_request(field: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"vouchers.csv\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = field,
        c = content
    );
    authed("POST", "/vouchers/upload-csv")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, code: &str, percent: i32, expiry: &str) -> Response {
    send(
        app,
        json_request("POST", "/vouchers", json!({"voucher_code": code, "discount_percent": percent, "expiry_date": expiry})),
    )
    .await
}

#[tokio::test]
async fn health_is_public() {
    let (_repo, app) = build_app();
    let resp = send(&app, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn login_echoes_configured_token() {
    let (_repo, app) = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"email": "a@example.com", "password": "whatever"})).unwrap()))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["token"], TOKEN);

    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"email": "a@example.com"})).unwrap()))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn voucher_routes_require_bearer_token() {
    let (repo, app) = build_app();

    let resp = send(&app, Request::builder().uri("/vouchers").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "missing authorization header");

    let req = Request::builder()
        .uri("/vouchers")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "invalid token");

    let req = Request::builder()
        .uri("/vouchers")
        .header(header::AUTHORIZATION, TOKEN)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/vouchers")
        .header(header::AUTHORIZATION, format!("bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::OK);

    assert_eq!(repo.calls(), 1);
}

#[tokio::test]
async fn create_get_update_delete_flow() {
    let (_repo, app) = build_app();

    let resp = create(&app, "WELCOME", 15, "2030-01-31").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["voucher_code"], "WELCOME");
    assert_eq!(created["expiry_date"], "2030-01-31");
    assert!(created["created_at"].as_str().unwrap().ends_with('Z'));

    let resp = send(&app, authed("GET", &format!("/vouchers/{}", id)).body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["discount_percent"], 15);

    let resp = send(
        &app,
        json_request(
            "PUT",
            &format!("/vouchers/{}", id),
            json!({"voucher_code": "WELCOME", "discount_percent": 25, "expiry_date": "2030-02-28"}),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["discount_percent"], 25);

    let resp = send(&app, authed("DELETE", &format!("/vouchers/{}", id)).body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, authed("GET", &format!("/vouchers/{}", id)).body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "voucher not found");
}

#[tokio::test]
async fn create_maps_errors_to_statuses() {
    let (repo, app) = build_app();
    assert_eq!(create(&app, "SALE", 10, "2030-01-01").await.status(), StatusCode::CREATED);

    let resp = create(&app, "sale", 20, "2030-01-01").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await["error"], "voucher_code already exists");

    assert_eq!(create(&app, "ZERO", 0, "2030-01-01").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(create(&app, "MAX", 101, "2030-01-01").await.status(), StatusCode::BAD_REQUEST);
    let resp = create(&app, "DATE", 10, "01-01-2030").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "expiry_date must be in YYYY-MM-DD format");

    let resp = send(&app, json_request("POST", "/vouchers", json!({"voucher_code": "NOPE"}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid request payload");

    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn bad_ids_are_rejected_before_store_access() {
    let (repo, app) = build_app();
    for uri in ["/vouchers/abc", "/vouchers/0", "/vouchers/-7"] {
        let resp = send(&app, authed("GET", uri).body(Body::empty()).unwrap()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body_json(resp).await["error"], "invalid voucher id");
        let resp = send(&app, authed("DELETE", uri).body(Body::empty()).unwrap()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
    assert_eq!(repo.calls(), 0);

    let resp = send(&app, authed("DELETE", "/vouchers/999").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_paginates_and_sorts() {
    let (_repo, app) = build_app();
    for (code, percent) in [("A1", 40), ("B2", 10), ("C3", 30), ("D4", 20), ("E5", 50)] {
        assert_eq!(create(&app, code, percent, "2030-01-01").await.status(), StatusCode::CREATED);
    }

    let resp = send(
        &app,
        authed("GET", "/vouchers?sort=discount_percent&order=DESC&limit=2&page=2").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let codes: Vec<&str> = body["data"].as_array().unwrap().iter().map(|v| v["voucher_code"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["C3", "D4"]);
    assert_eq!(body["pagination"], json!({"page": 2, "limit": 2, "total": 5, "total_pages": 3}));

    let resp = send(&app, authed("GET", "/vouchers?q=e5&limit=abc&page=zero").body(Body::empty()).unwrap()).await;
    let body = body_json(resp).await;
    assert_eq!(body["pagination"], json!({"page": 1, "limit": 10, "total": 1, "total_pages": 1}));
}

#[tokio::test]
async fn export_sets_csv_headers() {
    let (_repo, app) = build_app();
    create(&app, "ONE", 10, "2030-01-01").await;
    create(&app, "TWO", 20, "2031-01-01").await;

    let resp = send(&app, authed("GET", "/vouchers/export").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(resp.headers()[header::CONTENT_DISPOSITION], "attachment; filename=vouchers.csv");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        "voucher_code,discount_percent,expiry_date\nONE,10,2030-01-01\nTWO,20,2031-01-01\n"
    );
}

#[tokio::test]
async fn upload_csv_reports_partial_failures() {
    let (repo, app) = build_app();
    let csv = "voucher_code,discount_percent,expiry_date\nV1,10,2025-01-01\nv1,20,2025-02-01\nV2,0,2025-01-01";
    let resp = send(&app, multipart_request("file", csv)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["total_rows"], 3);
    assert_eq!(body["success_count"], 1);
    assert_eq!(body["failure_count"], 2);
    assert_eq!(
        body["failures"],
        json!([
            {"row": 2, "reason": "duplicate voucher_code in file"},
            {"row": 3, "reason": "discount_percent must be integer between 1 and 100"}
        ])
    );
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn upload_csv_rejects_bad_requests() {
    let (_repo, app) = build_app();

    let resp = send(&app, multipart_request("attachment", "voucher_code,discount_percent,expiry_date")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "file is required");

    let resp = send(&app, multipart_request("file", "code,pct,date\nA,1,2030-01-01")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid CSV header");

    let resp = send(&app, json_request("POST", "/vouchers/upload-csv", json!({}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_csv_over_size_limit_is_rejected() {
    let (repo, app) = build_app_with(
        VoucherConfig { csv_max_bytes: 64, ..Default::default() },
        CorsConfig::default(),
        Duration::from_secs(15),
    );
    let rows = "X,10,2030-01-01\n".repeat(8);
    let csv = format!("voucher_code,discount_percent,expiry_date\n{}", rows);
    let resp = send(&app, multipart_request("file", &csv)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "file size exceeds limit");

    // Past the route body limit as well
    let huge = format!("voucher_code,discount_percent,expiry_date\n{}", "Y".repeat(128 * 1024));
    let resp = send(&app, multipart_request("file", &huge)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "file size exceeds limit");
    assert!(repo.is_empty());
}

#[tokio::test]
async fn slow_requests_time_out_with_408() {
    let (repo, app) = build_app_with(VoucherConfig::default(), CorsConfig::default(), Duration::from_millis(50));
    repo.set_delay(Duration::from_millis(500));
    let resp = send(&app, authed("GET", "/vouchers").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);

    let resp = send(&app, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

fn from_origin(origin: &str) -> Request<Body> {
    Request::builder().uri("/health").header(header::ORIGIN, origin).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn cors_wildcard_allows_any_origin() {
    let (_repo, app) = build_app();
    let resp = send(&app, from_origin("http://anywhere.test")).await;
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());

    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/vouchers")
        .header(header::ORIGIN, "http://anywhere.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, preflight).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_MAX_AGE], "43200");
    let methods = resp.headers()[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap().to_string();
    assert!(methods.contains("DELETE"), "{}", methods);
}

#[tokio::test]
async fn cors_explicit_list_echoes_known_origins_only() {
    let cors = CorsConfig { allowed_origins: vec!["http://localhost:3000".into(), "https://app.example.com".into()] };
    let (_repo, app) = build_app_with(VoucherConfig::default(), cors, Duration::from_secs(15));

    let resp = send(&app, from_origin("https://app.example.com")).await;
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS], "content-disposition");

    let resp = send(&app, from_origin("http://evil.test")).await;
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
