use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - Create a principal
pub async fn register(Json(payload): Json<RegisterRequest>) -> ApiResult<User> {
    let mut field_errors = HashMap::new();
    if !payload.email.contains('@') {
        field_errors.insert("email".to_string(), "Invalid email address".to_string());
    }
    if payload.password.len() < 8 {
        field_errors.insert(
            "password".to_string(),
            "Password must be at least 8 characters".to_string(),
        );
    }
    if payload.display_name.trim().is_empty() {
        field_errors.insert("display_name".to_string(), "This field is required".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Invalid registration", Some(field_errors)));
    }

    let salt = Uuid::new_v4().simple().to_string();
    let hash = hash_password(&payload.password, &salt);

    let pool = DatabaseManager::pool()?;
    let created = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, password_salt, display_name) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(payload.email.trim())
    .bind(&hash)
    .bind(&salt)
    .bind(payload.display_name.trim())
    .fetch_one(&pool)
    .await;

    match created {
        Ok(user) => Ok(ApiResponse::created(user)),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(ApiError::conflict("email already registered"))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /auth/login - Exchange credentials for a JWT
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_optional(&pool)
        .await?;

    let user = match user {
        Some(u) if verify_password(&payload.password, &u.password_salt, &u.password_hash) => u,
        // Same answer for unknown email and wrong password.
        _ => return Err(ApiError::unauthorized("invalid credentials")),
    };

    let claims = Claims::new(user.id, user.email.clone());
    let token = generate_jwt(&claims).map_err(|e| {
        tracing::error!("JWT generation failed: {}", e);
        ApiError::internal_server_error("could not issue token")
    })?;

    let expires_in = config::config().security.jwt_expiry_hours * 3600;
    Ok(ApiResponse::success(json!({
        "token": token,
        "expires_in": expires_in,
        "user": { "id": user.id, "email": user.email, "display_name": user.display_name }
    })))
}
