//! Bearer token authentication and route gates.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer <jwt>
//!      │
//!      ▼
//! extract_bearer ── missing ──► 401 UNAUTHORIZED
//!      │
//!      ▼
//! decode (HS256, exp) ── bad ──► 401 UNAUTHORIZED
//!      │
//!      ▼
//! local user by `sub` (polled with backoff) ── never appears ──► 401 USER_NOT_PROVISIONED
//!      │
//!      ▼
//! active? same business as token? ── no ──► 403 FORBIDDEN
//!      │
//!      ▼
//! AuthContext in request extensions ──► handler checks module + permission
//! ```

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::retry::await_condition;
use crate::AppState;

/// Module flag that unlocks every sale route.
pub const SALES_MODULE: &str = "ventas";

/// Permission to ring up a sale.
pub const CREATE_SALE: &str = "CREAR_VENTA";

/// Permission to read sales and run credit checks.
pub const VIEW_SALES: &str = "VER_VENTAS";

/// JWT claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity provider user id.
    pub sub: String,

    /// Business the token was issued for.
    pub negocio_id: String,

    #[serde(default)]
    pub permisos: Vec<String>,

    #[serde(default)]
    pub modulos: Vec<String>,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Who is calling, resolved to local ids.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub business_id: String,
    pub permissions: Vec<String>,
    pub modules: Vec<String>,
}

impl AuthContext {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m == module)
    }

    pub fn require_module(&self, module: &str) -> ApiResult<()> {
        if self.has_module(module) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Module '{}' is not enabled", module)))
        }
    }

    pub fn require_permission(&self, permission: &str) -> ApiResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Missing permission '{}'",
                permission
            )))
        }
    }
}

/// Validate and decode a token.
pub fn decode_token(token: &str, secret: &str) -> ApiResult<Claims> {
    if secret.is_empty() {
        return Err(ApiError::Unauthorized("Authentication is not configured".into()));
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Resolves the caller and stores an [`AuthContext`] on the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))?;
    let claims = decode_token(token, &state.config.auth.jwt_secret)?;

    let users = state.db.users();
    let identity = &state.config.identity;
    let user = await_condition(
        || users.find_by_auth_id(&claims.sub),
        identity.max_attempts,
        identity.initial_interval(),
    )
    .await?
    .ok_or_else(|| {
        warn!(sub = %claims.sub, "No local user for token subject");
        ApiError::UserNotProvisioned
    })?;

    if !user.is_active {
        return Err(ApiError::Forbidden("User is inactive".into()));
    }

    if user.business_id != claims.negocio_id {
        warn!(
            user_id = %user.id,
            token_business = %claims.negocio_id,
            "Token business does not match user"
        );
        return Err(ApiError::Forbidden("Token business does not match user".into()));
    }

    debug!(user_id = %user.id, business_id = %user.business_id, "Request authenticated");

    req.extensions_mut().insert(AuthContext {
        user_id: user.id,
        business_id: user.business_id,
        permissions: claims.permisos,
        modules: claims.modulos,
    });

    Ok(next.run(req).await)
}
