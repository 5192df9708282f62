//! Router-level tests: auth gates, status codes and bodies.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use smartpos_core::{Customer, Product, User};
use smartpos_db::{Database, DbConfig};
use smartpos_server::auth::{Claims, CREATE_SALE, SALES_MODULE, VIEW_SALES};
use smartpos_server::config::ServerConfig;
use smartpos_server::{router, AppState};

const SECRET: &str = "test-secret";
const AUTH_USER: &str = "auth-cashier";

struct TestApp {
    app: Router,
    db: Database,
    business_id: String,
    product_id: String,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let business_id = Uuid::new_v4().to_string();
        db.users().insert_business(&business_id, "Tienda").await.unwrap();
        db.users()
            .insert(&User {
                id: Uuid::new_v4().to_string(),
                business_id: business_id.clone(),
                auth_user_id: AUTH_USER.to_string(),
                name: "Cajero".to_string(),
                email: None,
                is_active: true,
            })
            .await
            .unwrap();

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.clone(),
            sku: Some("A-0001".to_string()),
            name: "Arroz 1kg".to_string(),
            cost_cents: 700,
            price_cents: 1000,
            stock: 10,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

        let mut config = ServerConfig::default();
        config.auth.jwt_secret = SECRET.to_string();
        config.identity.max_attempts = 2;
        config.identity.initial_interval_ms = 1;

        TestApp {
            app: router(AppState::new(db.clone(), config)),
            db,
            business_id,
            product_id: product.id,
        }
    }

    fn token(&self, sub: &str, permisos: &[&str]) -> String {
        self.token_for_business(sub, &self.business_id, permisos)
    }

    fn token_for_business(&self, sub: &str, business_id: &str, permisos: &[&str]) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            negocio_id: business_id.to_string(),
            permisos: permisos.iter().map(|p| p.to_string()).collect(),
            modulos: vec![SALES_MODULE.to_string()],
            exp: Utc::now().timestamp() + 3600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    async fn customer(&self, limit_cents: i64) -> String {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id.clone(),
            name: "Cliente".to_string(),
            phone: None,
            national_id: None,
            email: None,
            address: None,
            credit_limit_cents: limit_cents,
            credit_days: None,
            debt_balance_cents: 0,
            points: 0,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.db.customers().insert(&customer).await.unwrap();
        customer.id
    }

    fn sale_body(&self, quantity: i64) -> Value {
        json!({
            "items": [{ "productoId": self.product_id, "cantidad": quantity }],
        })
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

fn post(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn test_create_sale_without_token_is_401() {
    let app = TestApp::new().await;

    let (status, body) = app.send(post("/ventas", None, &app.sale_body(1))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_sale_with_bad_signature_is_401() {
    let app = TestApp::new().await;
    let forged = encode(
        &Header::default(),
        &Claims {
            sub: AUTH_USER.to_string(),
            negocio_id: app.business_id.clone(),
            permisos: vec![CREATE_SALE.to_string()],
            modulos: vec![SALES_MODULE.to_string()],
            exp: Utc::now().timestamp() + 3600,
        },
        &EncodingKey::from_secret(b"not-the-secret"),
    )
    .unwrap();

    let (status, _) = app
        .send(post("/ventas", Some(&forged), &app.sale_body(1)))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_sale_without_permission_is_403() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[VIEW_SALES]);

    let (status, body) = app
        .send(post("/ventas", Some(&token), &app.sale_body(1)))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(app.db.sales().count(&app.business_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_sale_returns_201_with_sale() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[CREATE_SALE]);

    let (status, body) = app
        .send(post("/ventas", Some(&token), &app.sale_body(3)))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_cents"], 3000);
    assert_eq!(body["amount_paid_cents"], 3000);
    assert_eq!(body["payment_state"], "PAGADO");
    assert_eq!(body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(body["cashier"]["name"], "Cajero");

    let product = app
        .db
        .products()
        .get_by_id(&app.business_id, &app.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 7);
}

#[tokio::test]
async fn test_unknown_subject_is_not_provisioned() {
    let app = TestApp::new().await;
    let token = app.token("someone-else", &[CREATE_SALE]);

    let (status, body) = app
        .send(post("/ventas", Some(&token), &app.sale_body(1)))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "USER_NOT_PROVISIONED");
}

#[tokio::test]
async fn test_token_for_other_business_is_403() {
    let app = TestApp::new().await;
    let token = app.token_for_business(AUTH_USER, "other-business", &[CREATE_SALE]);

    let (status, _) = app
        .send(post("/ventas", Some(&token), &app.sale_body(1)))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[CREATE_SALE]);
    let body = json!({ "items": [{ "productoId": "missing", "cantidad": 1 }] });

    let (status, body) = app.send(post("/ventas", Some(&token), &body)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn test_insufficient_credit_is_400() {
    let app = TestApp::new().await;
    let customer_id = app.customer(500).await;
    let token = app.token(AUTH_USER, &[CREATE_SALE]);
    let body = json!({
        "clienteId": customer_id,
        "items": [{ "productoId": app.product_id, "cantidad": 1 }],
        "estadoPago": "FIADO",
    });

    let (status, body) = app.send(post("/ventas", Some(&token), &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_CREDIT");
}

#[tokio::test]
async fn test_get_and_list_sales() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[CREATE_SALE, VIEW_SALES]);

    let (_, created) = app
        .send(post("/ventas", Some(&token), &app.sale_body(1)))
        .await;
    let sale_id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(get(&format!("/ventas/{}", sale_id), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], sale_id.as_str());
    assert_eq!(body["total_cents"], 1000);

    let (status, body) = app.send(get("/ventas", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app.send(get("/ventas/nope", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SALE_NOT_FOUND");
}

#[tokio::test]
async fn test_reading_sales_needs_view_permission() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[CREATE_SALE]);

    let (status, _) = app.send(get("/ventas", Some(&token))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_credit_check_endpoint() {
    let app = TestApp::new().await;
    let customer_id = app.customer(10_000).await;
    let token = app.token(AUTH_USER, &[VIEW_SALES]);

    let (status, body) = app
        .send(get(
            &format!("/clientes/{}/credito?monto=2500", customer_id),
            Some(&token),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);
    assert_eq!(body["available"], 10_000);

    let (status, _) = app
        .send(get("/clientes/missing/credito?monto=1", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_quantity_is_structured_400() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[CREATE_SALE]);
    let body = json!({ "items": [{ "productoId": app.product_id, "cantidad": "2" }] });

    let (status, body) = app.send(post("/ventas", Some(&token), &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("body"));
    assert_eq!(app.db.sales().count(&app.business_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_body_without_permission_is_403() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[VIEW_SALES]);
    let body = json!({ "items": "nope" });

    let (status, body) = app.send(post("/ventas", Some(&token), &body)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_bulk_quantity_is_accepted() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[CREATE_SALE]);

    let (status, body) = app
        .send(post("/ventas", Some(&token), &app.sale_body(1000)))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_cents"], 1_000_000);

    // Oversell is allowed by the default stock policy
    let product = app
        .db
        .products()
        .get_by_id(&app.business_id, &app.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, -990);
}

#[tokio::test]
async fn test_overflowing_quantity_is_400() {
    let app = TestApp::new().await;
    let token = app.token(AUTH_USER, &[CREATE_SALE]);

    let (status, body) = app
        .send(post("/ventas", Some(&token), &app.sale_body(i64::MAX)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_credit_query_is_400() {
    let app = TestApp::new().await;
    let customer_id = app.customer(10_000).await;
    let token = app.token(AUTH_USER, &[VIEW_SALES]);

    let (status, body) = app
        .send(get(
            &format!("/clientes/{}/credito?monto=abc", customer_id),
            Some(&token),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
