use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Role;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(range(min = 1, message = "restaurantId must be positive"))]
    #[schema(example = 1)]
    pub restaurant_id: i64,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "owner@bistro.example")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIs...")]
    pub token: String,
    pub role: Role,
    #[schema(example = 900)]
    pub expires_in: i64,
    #[schema(example = 42)]
    pub current_session_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIs...")]
    pub access_token: String,
    pub role: Role,
    #[schema(example = 900)]
    pub expires_in: i64,
    #[schema(example = 43)]
    pub current_session_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    #[schema(example = true)]
    pub valid: bool,
    pub role: Role,
    #[schema(example = "owner@bistro.example")]
    pub email: String,
    #[schema(example = 1)]
    pub restaurant_id: i64,
}
