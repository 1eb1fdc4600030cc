use chrono::Utc;

use crate::auth;
use crate::db::models::{CommunityPost, ImageAttachment, User};
use crate::db::slots::{self, DynSlotStore, COMMUNITY_SLOT};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct NewCommunityPost {
    pub title: String,
    pub content: String,
    pub images: Vec<ImageAttachment>,
    /// Comma-separated, as typed into the original form.
    pub tags: String,
}

/// The community feed.
#[derive(Clone)]
pub struct CommunityPosts {
    store: DynSlotStore,
}

impl CommunityPosts {
    pub fn new(store: DynSlotStore) -> Self {
        Self { store }
    }

    /// All posts, newest first.
    pub async fn list(&self) -> AppResult<Vec<CommunityPost>> {
        let mut posts = slots::load_records::<CommunityPost>(self.store.as_ref(), COMMUNITY_SLOT)
            .await?
            .records;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<CommunityPost>> {
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }

    /// Case-insensitive search over title, content, author name and tags.
    pub async fn search(&self, term: &str) -> AppResult<Vec<CommunityPost>> {
        let term = term.to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| {
                p.title.to_lowercase().contains(&term)
                    || p.content.to_lowercase().contains(&term)
                    || p.author_name.to_lowercase().contains(&term)
                    || p.tags.iter().any(|t| t.to_lowercase().contains(&term))
            })
            .collect())
    }

    pub async fn create(&self, author: &User, input: NewCommunityPost) -> AppResult<CommunityPost> {
        if input.title.trim().is_empty() || input.content.trim().is_empty() {
            return Err(AppError::Validation("Title and content are required".into()));
        }

        let post = CommunityPost {
            id: uuid::Uuid::now_v7().to_string(),
            title: input.title,
            content: input.content,
            images: input.images,
            tags: split_tags(&input.tags),
            author_id: author.id.clone(),
            author_name: author.username.clone(),
            author_avatar: author.avatar.clone(),
            likes: Vec::new(),
            favorites: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        };

        slots::update_records(
            self.store.as_ref(),
            COMMUNITY_SLOT,
            |posts: &mut Vec<CommunityPost>| -> AppResult<()> {
                posts.push(post.clone());
                Ok(())
            },
        )
        .await?;

        Ok(post)
    }

    /// Remove one post. Author only.
    pub async fn delete(&self, user: &User, id: &str) -> AppResult<()> {
        let id = id.to_string();
        let user = user.clone();
        slots::update_records(
            self.store.as_ref(),
            COMMUNITY_SLOT,
            move |posts: &mut Vec<CommunityPost>| {
                let post = posts.iter().find(|p| p.id == id).ok_or(AppError::NotFound)?;
                auth::ensure_owner(&user, &post.author_id)?;
                posts.retain(|p| p.id != id);
                Ok(())
            },
        )
        .await
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
