//! Sale endpoints.
//!
//! | Method | Path                        | Gate                          |
//! |--------|-----------------------------|-------------------------------|
//! | POST   | `/ventas`                   | module `ventas`, `CREAR_VENTA` |
//! | GET    | `/ventas`                   | module `ventas`, `VER_VENTAS`  |
//! | GET    | `/ventas/{id}`              | module `ventas`, `VER_VENTAS`  |
//! | GET    | `/clientes/{id}/credito`    | module `ventas`, `VER_VENTAS`  |
//! | GET    | `/health`                   | none                          |
//!
//! Money on the wire is integer cents.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use smartpos_core::{
    CartItem, CreditCheck, Money, NewCustomer, PaymentMethod, PaymentState, Sale, SaleDetail,
    SaleRequest,
};

use crate::auth::{AuthContext, CREATE_SALE, SALES_MODULE, VIEW_SALES};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleBody {
    #[serde(default)]
    pub cliente_id: Option<String>,

    #[serde(default)]
    pub items: Vec<SaleItemBody>,

    /// Defaults to `EFECTIVO`.
    #[serde(default)]
    pub metodo_pago: Option<String>,

    /// Defaults to `PAGADO`.
    #[serde(default)]
    pub estado_pago: PaymentState,

    #[serde(default)]
    pub monto_pagado: i64,

    #[serde(default)]
    pub registrar_cliente: bool,

    #[serde(default)]
    pub datos_cliente: Option<CustomerBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemBody {
    pub producto_id: String,
    pub cantidad: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    #[serde(default)]
    pub nombre: String,
    pub telefono: Option<String>,
    pub cedula: Option<String>,
    pub correo: Option<String>,
    pub direccion: Option<String>,
    pub credito_maximo: Option<i64>,
    pub dias_credito: Option<i64>,
}

impl From<CustomerBody> for NewCustomer {
    fn from(body: CustomerBody) -> Self {
        NewCustomer {
            name: body.nombre,
            phone: body.telefono,
            national_id: body.cedula,
            email: body.correo,
            address: body.direccion,
            credit_limit_cents: body.credito_maximo,
            credit_days: body.dias_credito,
        }
    }
}

impl CreateSaleBody {
    /// Binds the body to the caller. Business and cashier always come from
    /// the token, never from the body.
    pub fn into_request(self, auth: &AuthContext) -> SaleRequest {
        // Registration needs both the flag and the data
        let new_customer = self
            .datos_cliente
            .filter(|_| self.registrar_cliente)
            .map(NewCustomer::from);

        let customer_id = self
            .cliente_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        SaleRequest {
            business_id: auth.business_id.clone(),
            user_id: auth.user_id.clone(),
            customer_id,
            items: self
                .items
                .into_iter()
                .map(|item| CartItem {
                    product_id: item.producto_id,
                    quantity: item.cantidad,
                })
                .collect(),
            payment_method: self
                .metodo_pago
                .map(PaymentMethod::new)
                .unwrap_or_default(),
            payment_state: self.estado_pago,
            amount_paid_cents: self.monto_pagado,
            new_customer,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreditQuery {
    /// Amount to check, in cents.
    #[serde(default)]
    pub monto: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /ventas
///
/// The sale runs on its own task: a client that hangs up mid-request
/// cannot cancel the transaction halfway.
///
/// The body is decoded after the permission gates, so a caller without
/// access gets 403 whatever they send.
pub async fn create_sale(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<CreateSaleBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    auth.require_module(SALES_MODULE)?;
    auth.require_permission(CREATE_SALE)?;

    let Json(body) = body?;
    let request = body.into_request(&auth);
    let sales = state.sales.clone();

    let detail = tokio::spawn(async move { sales.create_sale(request).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    info!(
        sale_id = %detail.sale.id,
        user_id = %auth.user_id,
        total = %detail.sale.total(),
        "Sale created"
    );

    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /ventas
pub async fn list_sales(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Sale>>> {
    auth.require_module(SALES_MODULE)?;
    auth.require_permission(VIEW_SALES)?;

    let sales = state.sales.list_sales(&auth.business_id).await?;
    Ok(Json(sales))
}

/// GET /ventas/{id}
pub async fn get_sale(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    auth.require_module(SALES_MODULE)?;
    auth.require_permission(VIEW_SALES)?;

    let detail = state.sales.get_sale(&auth.business_id, &id).await?;
    Ok(Json(detail))
}

/// GET /clientes/{id}/credito?monto=N
pub async fn check_credit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(customer_id): Path<String>,
    query: Result<Query<CreditQuery>, QueryRejection>,
) -> ApiResult<Json<CreditCheck>> {
    auth.require_module(SALES_MODULE)?;
    auth.require_permission(VIEW_SALES)?;

    let Query(query) = query?;

    let check = state
        .sales
        .check_credit(&auth.business_id, &customer_id, Money::from_cents(query.monto))
        .await?;
    Ok(Json(check))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "up" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cashier() -> AuthContext {
        AuthContext {
            user_id: "user-1".into(),
            business_id: "biz-1".into(),
            permissions: vec![CREATE_SALE.into()],
            modules: vec![SALES_MODULE.into()],
        }
    }

    #[test]
    fn test_body_defaults() {
        let body: CreateSaleBody = serde_json::from_str(
            r#"{ "items": [{ "productoId": "p-1", "cantidad": 2 }] }"#,
        )
        .unwrap();

        let request = body.into_request(&cashier());
        assert_eq!(request.business_id, "biz-1");
        assert_eq!(request.user_id, "user-1");
        assert_eq!(request.payment_method.as_str(), "EFECTIVO");
        assert_eq!(request.payment_state, PaymentState::Paid);
        assert_eq!(request.amount_paid_cents, 0);
        assert!(request.new_customer.is_none());
        assert_eq!(request.items[0].product_id, "p-1");
        assert_eq!(request.items[0].quantity, 2);
    }

    #[test]
    fn test_body_with_inline_customer() {
        let body: CreateSaleBody = serde_json::from_str(
            r#"{
                "items": [{ "productoId": "p-1", "cantidad": 1 }],
                "estadoPago": "FIADO",
                "metodoPago": "tarjeta",
                "registrarCliente": true,
                "datosCliente": { "nombre": "Ana", "cedula": "0102", "creditoMaximo": 10000, "diasCredito": 15 }
            }"#,
        )
        .unwrap();

        let request = body.into_request(&cashier());
        assert_eq!(request.payment_state, PaymentState::Credit);
        assert_eq!(request.payment_method.tag(), "TARJETA");

        let customer = request.new_customer.unwrap();
        assert_eq!(customer.name, "Ana");
        assert_eq!(customer.national_id.as_deref(), Some("0102"));
        assert_eq!(customer.credit_limit_cents, Some(10_000));
        assert_eq!(customer.credit_days, Some(15));
    }

    #[test]
    fn test_customer_data_ignored_without_flag() {
        let body: CreateSaleBody = serde_json::from_str(
            r#"{ "clienteId": " c-1 ", "datosCliente": { "nombre": "Ana" } }"#,
        )
        .unwrap();

        let request = body.into_request(&cashier());
        assert!(request.new_customer.is_none());
        assert_eq!(request.customer_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_register_flag_without_data_registers_nobody() {
        let body: CreateSaleBody =
            serde_json::from_str(r#"{ "registrarCliente": true, "clienteId": "c-1" }"#).unwrap();

        let request = body.into_request(&cashier());
        assert!(request.new_customer.is_none());
        assert_eq!(request.customer_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_unknown_payment_state_is_rejected() {
        let result = serde_json::from_str::<CreateSaleBody>(r#"{ "estadoPago": "GRATIS" }"#);
        assert!(result.is_err());
    }
}
