/// Owner authentication for the management API
///
/// Owners register once and receive a bearer token. Only its SHA-256 digest is
/// stored; the middleware hashes the presented token and resolves the owner.

use crate::{
    api::{
        response::{json_body, ApiResponse},
        AppState,
    },
    error::ApiError,
    project::Owner,
};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{Json, Response},
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const TOKEN_PREFIX: &str = "cbo_";

#[derive(Debug, Deserialize)]
pub struct RegisterOwnerRequest {
    pub email: String,
}

/// Registration result; the token is shown only here
#[derive(Debug, Serialize)]
pub struct RegisteredOwner {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// POST /api/owners
pub async fn register_owner(
    State(state): State<AppState>,
    body: Result<Json<RegisterOwnerRequest>, JsonRejection>,
) -> Result<ApiResponse<RegisteredOwner>, ApiError> {
    let request = json_body(body)?;
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }

    let token = generate_token();
    let owner = state
        .projects
        .create_owner(&email, &hash_token(&token))
        .await
        .map_err(|e| ApiError::conflict_or_internal(e, "Email already registered"))?;

    tracing::info!("👤 Registered owner {} ({})", owner.id, owner.email);

    Ok(ApiResponse::created(RegisteredOwner {
        id: owner.id,
        email: owner.email,
        token,
    }))
}

/// Resolve the bearer token and expose the owner as a request extension
pub async fn require_owner(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token_hash = bearer_token(request.headers())
        .map(hash_token)
        .ok_or_else(|| ApiError::unauthorized("Bearer token required"))?;

    let owner: Owner = state
        .projects
        .find_owner_by_token_hash(&token_hash)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid bearer token"))?;

    request.extensions_mut().insert(owner);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", TOKEN_PREFIX, hex::encode(bytes))
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
