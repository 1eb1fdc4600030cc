use chrono::Utc;

use crate::collections::users::{ProfileChanges, Users};
use crate::db::models::{PortfolioItem, User};
use crate::db::slots::{self, DynSlotStore, SESSION_SLOT};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct NewPortfolioItem {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub project_url: String,
}

/// The single authenticated user, persisted under its own slot.
///
/// There is no token and no expiry: whatever record sits in the slot is
/// trusted absolutely, exactly like the original. The Users collection is
/// authoritative; this object caches one of its records, and every edit
/// writes through so the two cannot diverge.
pub struct SessionManager {
    store: DynSlotStore,
    current: Option<User>,
}

impl SessionManager {
    /// Load the persisted session on startup.
    pub async fn init(store: DynSlotStore) -> AppResult<Self> {
        let current = slots::load_record(store.as_ref(), SESSION_SLOT).await?;
        Ok(Self { store, current })
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    /// Persist the full user record (password included - source behavior)
    /// and make it the active identity.
    pub async fn login(&mut self, user: User) -> AppResult<()> {
        slots::save_record(self.store.as_ref(), SESSION_SLOT, &user).await?;
        self.current = Some(user);
        Ok(())
    }

    /// Clear the active identity and remove the slot.
    pub async fn logout(&mut self) -> AppResult<()> {
        self.store.clear(SESSION_SLOT).await?;
        self.current = None;
        Ok(())
    }

    /// Merge a partial profile edit into the active user, writing through
    /// to the Users collection first so it stays authoritative.
    pub async fn update_user(&mut self, users: &Users, changes: ProfileChanges) -> AppResult<User> {
        let current = self.current.as_ref().ok_or(AppError::Unauthorized)?;

        let updated = users.apply_changes(&current.id, &changes).await?;
        slots::save_record(self.store.as_ref(), SESSION_SLOT, &updated).await?;
        self.current = Some(updated.clone());
        Ok(updated)
    }

    /// Add an item to the active user's portfolio.
    pub async fn add_portfolio_item(
        &mut self,
        users: &Users,
        item: NewPortfolioItem,
    ) -> AppResult<PortfolioItem> {
        let current = self.current.as_ref().ok_or(AppError::Unauthorized)?;

        if item.title.trim().is_empty() || item.description.trim().is_empty() {
            return Err(AppError::Validation("Title and description are required".into()));
        }

        let new_item = PortfolioItem {
            id: uuid::Uuid::now_v7().to_string(),
            title: item.title,
            description: item.description,
            image_url: item.image_url,
            project_url: item.project_url,
            created_at: Utc::now(),
        };

        let mut portfolio = current.portfolio.clone();
        portfolio.push(new_item.clone());
        self.update_user(
            users,
            ProfileChanges {
                portfolio: Some(portfolio),
                ..Default::default()
            },
        )
        .await?;

        Ok(new_item)
    }

    /// Remove an item from the active user's portfolio.
    pub async fn remove_portfolio_item(&mut self, users: &Users, item_id: &str) -> AppResult<()> {
        let current = self.current.as_ref().ok_or(AppError::Unauthorized)?;

        let portfolio: Vec<PortfolioItem> = current
            .portfolio
            .iter()
            .filter(|i| i.id != item_id)
            .cloned()
            .collect();
        self.update_user(
            users,
            ProfileChanges {
                portfolio: Some(portfolio),
                ..Default::default()
            },
        )
        .await?;

        Ok(())
    }
}
