use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use storefront_shared::Review;

use crate::error::AppError;
use crate::middleware::UserClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub product_id: i64,
    pub rating: i32,
    #[serde(default)]
    pub content: String,
}

impl ReviewRequest {
    fn into_review(self, claims: &UserClaims) -> Review {
        Review {
            user_id: claims.sub,
            user_name: claims.name.clone(),
            product_id: self.product_id,
            rating: self.rating,
            content: self.content,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reviews", post(add_review).put(update_review))
        .route("/v1/reviews/{product_id}", delete(delete_review))
        .route("/v1/products/{id}/reviews", get(product_reviews))
        .route("/v1/users/{name}/reviews", get(user_reviews))
}

/// POST /v1/reviews
async fn add_review(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(req): Json<ReviewRequest>,
) -> Result<StatusCode, AppError> {
    state.reviews.add_review(req.into_review(&claims)).await?;
    Ok(StatusCode::CREATED)
}

/// PUT /v1/reviews
async fn update_review(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(req): Json<ReviewRequest>,
) -> Result<StatusCode, AppError> {
    state.reviews.update_review(req.into_review(&claims)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/reviews/{product_id}
async fn delete_review(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(product_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.reviews.delete_review(claims.sub, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.reviews.get_reviews_by_product_id(product_id).await?))
}

async fn user_reviews(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.reviews.get_reviews_by_user(&name).await?))
}
