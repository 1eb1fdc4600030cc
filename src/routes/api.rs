use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::collections::listings::Listings;
use crate::collections::requests::ServiceRequests;
use crate::collections::users::{NewUser, Users};
use crate::db::models::{
    ImageAttachment, Listing, RequestStatus, RequestType, ServiceCategory, ServiceRequest,
};
use crate::error::AppResult;
use crate::state::AppState;

// The original backend's surface, verbatim: no auth token is issued or
// checked on any of these, and the create endpoints store what the client
// sent plus server-stamped id/createdAt.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/requests", get(list_requests).post(create_request))
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let user = Users::new(state.store.clone())
        .register(NewUser {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> AppResult<Json<AccountResponse>> {
    let user = Users::new(state.store.clone())
        .authenticate(&body.email, &body.password)
        .await?;

    Ok(Json(AccountResponse {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<Listing>>> {
    Ok(Json(Listings::new(state.store.clone()).list().await?))
}

/// What a client sends when publishing a listing: everything but the
/// server-stamped fields. Author fields arrive denormalized, as the
/// original frontend sends them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: ServiceCategory,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub images: Vec<ImageAttachment>,
    #[serde(default)]
    pub delivery_time: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: String,
}

async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<ListingPayload>,
) -> AppResult<(StatusCode, Json<Listing>)> {
    let listing = Listing {
        id: uuid::Uuid::now_v7().to_string(),
        title: body.title,
        description: body.description,
        category: body.category,
        price: body.price,
        images: body.images,
        delivery_time: body.delivery_time,
        requirements: body.requirements,
        author_id: body.author_id,
        author_name: body.author_name,
        author_avatar: body.author_avatar,
        views: 0,
        likes: 0,
        created_at: Utc::now(),
    };

    let stored = Listings::new(state.store.clone()).insert(listing).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn list_requests(State(state): State<AppState>) -> AppResult<Json<Vec<ServiceRequest>>> {
    Ok(Json(ServiceRequests::new(state.store.clone()).list().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RequestType,
    pub budget: Option<f64>,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub reference_images: Vec<ImageAttachment>,
    #[serde(default)]
    pub what_is_needed: String,
    #[serde(default)]
    pub requester_id: String,
    #[serde(default)]
    pub requester_name: String,
    #[serde(default)]
    pub requester_avatar: String,
    #[serde(default)]
    pub status: RequestStatus,
}

async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<RequestPayload>,
) -> AppResult<(StatusCode, Json<ServiceRequest>)> {
    let request = ServiceRequest {
        id: uuid::Uuid::now_v7().to_string(),
        title: body.title,
        description: body.description,
        kind: body.kind,
        budget: body.budget,
        skills: body.skills,
        deadline: body.deadline,
        reference_images: body.reference_images,
        what_is_needed: body.what_is_needed,
        requester_id: body.requester_id,
        requester_name: body.requester_name,
        requester_avatar: body.requester_avatar,
        created_at: Utc::now(),
        status: body.status,
    };

    let stored = ServiceRequests::new(state.store.clone()).insert(request).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
