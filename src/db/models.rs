use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Record shapes match the original browser-storage JSON byte for byte
// (camelCase keys, RFC 3339 timestamps), so existing exports stay readable.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub portfolio: Vec<PortfolioItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub project_url: String,
    pub created_at: DateTime<Utc>,
}

/// An uploaded image, stored inline as a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    pub name: String,
    pub data_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Construcao,
    Plugin,
    Configuracao,
    Design,
    Outros,
}

/// A published service listing. Author fields are a snapshot taken at
/// creation time and are never resynchronized with the Users collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<ImageAttachment>,
    #[serde(default)]
    pub delivery_time: String,
    #[serde(default)]
    pub requirements: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Remunerado,
    Voluntario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Aberto,
    EmProgresso,
    Concluido,
    Cancelado,
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Aberto
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RequestType,
    /// Required and positive for remunerado requests, null otherwise.
    pub budget: Option<f64>,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub reference_images: Vec<ImageAttachment>,
    #[serde(default)]
    pub what_is_needed: String,
    pub requester_id: String,
    pub requester_name: String,
    #[serde(default)]
    pub requester_avatar: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: RequestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub images: Vec<ImageAttachment>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: String,
    /// User ids, toggled membership.
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub favorites: Vec<String>,
    /// Append-only.
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
