use chrono::Utc;

use crate::db::models::{Comment, CommunityPost, Listing, User};
use crate::db::slots::{self, DynSlotStore, COMMUNITY_SLOT, LISTINGS_SLOT};
use crate::error::{AppError, AppResult};

/// Which membership list on a community post a toggle targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Favorite,
}

/// Like/favorite toggles, comments and counters.
#[derive(Clone)]
pub struct Interactions {
    store: DynSlotStore,
}

impl Interactions {
    pub fn new(store: DynSlotStore) -> Self {
        Self { store }
    }

    /// Toggle the user's membership in a community post's like or favorite
    /// list. Returns whether the user is a member after the toggle.
    pub async fn toggle_reaction(
        &self,
        user: &User,
        post_id: &str,
        reaction: Reaction,
    ) -> AppResult<bool> {
        let user_id = user.id.clone();
        let post_id = post_id.to_string();
        slots::update_records(
            self.store.as_ref(),
            COMMUNITY_SLOT,
            move |posts: &mut Vec<CommunityPost>| {
                let post = posts
                    .iter_mut()
                    .find(|p| p.id == post_id)
                    .ok_or(AppError::NotFound)?;
                let members = match reaction {
                    Reaction::Like => &mut post.likes,
                    Reaction::Favorite => &mut post.favorites,
                };
                if let Some(pos) = members.iter().position(|id| *id == user_id) {
                    members.remove(pos);
                    Ok(false)
                } else {
                    members.push(user_id.clone());
                    Ok(true)
                }
            },
        )
        .await
    }

    /// Append a comment to a community post. Blank text is rejected and
    /// nothing is written.
    pub async fn add_comment(&self, user: &User, post_id: &str, text: &str) -> AppResult<Comment> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("Comment text cannot be empty".into()));
        }

        let comment = Comment {
            id: uuid::Uuid::now_v7().to_string(),
            author_id: user.id.clone(),
            author_name: user.username.clone(),
            author_avatar: user.avatar.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };

        let post_id = post_id.to_string();
        slots::update_records(
            self.store.as_ref(),
            COMMUNITY_SLOT,
            |posts: &mut Vec<CommunityPost>| -> AppResult<()> {
                let post = posts
                    .iter_mut()
                    .find(|p| p.id == post_id)
                    .ok_or(AppError::NotFound)?;
                post.comments.push(comment.clone());
                Ok(())
            },
        )
        .await?;

        Ok(comment)
    }

    /// Bump a listing's view counter. Anonymous - the original counts
    /// views without a session. Returns the new count.
    pub async fn record_view(&self, listing_id: &str) -> AppResult<u64> {
        self.bump_listing_counter(listing_id, |l| {
            l.views += 1;
            l.views
        })
        .await
    }

    /// Bump a listing's like counter. Listing likes are a bare counter
    /// (unlike community posts): the identity is required but not
    /// recorded, so every call adds one.
    pub async fn like_listing(&self, _user: &User, listing_id: &str) -> AppResult<u64> {
        self.bump_listing_counter(listing_id, |l| {
            l.likes += 1;
            l.likes
        })
        .await
    }

    async fn bump_listing_counter<F>(&self, listing_id: &str, mut bump: F) -> AppResult<u64>
    where
        F: FnMut(&mut Listing) -> u64,
    {
        let listing_id = listing_id.to_string();
        slots::update_records(
            self.store.as_ref(),
            LISTINGS_SLOT,
            move |listings: &mut Vec<Listing>| {
                let listing = listings
                    .iter_mut()
                    .find(|l| l.id == listing_id)
                    .ok_or(AppError::NotFound)?;
                Ok(bump(listing))
            },
        )
        .await
    }
}
