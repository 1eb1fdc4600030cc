use chrono::Utc;

use crate::auth;
use crate::db::models::{ImageAttachment, Listing, ServiceCategory, User};
use crate::db::slots::{self, DynSlotStore, LISTINGS_SLOT};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub price: f64,
    pub images: Vec<ImageAttachment>,
    pub delivery_time: String,
    pub requirements: String,
}

/// Published service listings, stored under one slot.
#[derive(Clone)]
pub struct Listings {
    store: DynSlotStore,
}

impl Listings {
    pub fn new(store: DynSlotStore) -> Self {
        Self { store }
    }

    /// All listings in stored order.
    pub async fn list(&self) -> AppResult<Vec<Listing>> {
        Ok(slots::load_records(self.store.as_ref(), LISTINGS_SLOT)
            .await?
            .records)
    }

    /// The author's own listings (the dashboard view).
    pub async fn list_by_author(&self, author_id: &str) -> AppResult<Vec<Listing>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|l| l.author_id == author_id)
            .collect())
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<Listing>> {
        Ok(self.list().await?.into_iter().find(|l| l.id == id))
    }

    /// Publish a listing. The author fields are snapshotted from the
    /// current user record and never updated afterwards.
    pub async fn create(&self, author: &User, input: NewListing) -> AppResult<Listing> {
        if input.title.trim().is_empty() || input.description.trim().is_empty() {
            return Err(AppError::Validation("Title and description are required".into()));
        }
        if !input.price.is_finite() || input.price < 0.0 {
            return Err(AppError::Validation("Price must be a non-negative number".into()));
        }

        let listing = Listing {
            id: uuid::Uuid::now_v7().to_string(),
            title: input.title,
            description: input.description,
            category: input.category,
            price: input.price,
            images: input.images,
            delivery_time: input.delivery_time,
            requirements: input.requirements,
            author_id: author.id.clone(),
            author_name: author.username.clone(),
            author_avatar: author.avatar.clone(),
            views: 0,
            likes: 0,
            created_at: Utc::now(),
        };

        self.insert(listing).await
    }

    /// Append a fully-formed record. The REST surface uses this directly:
    /// the original backend stores whatever the client sent.
    pub async fn insert(&self, listing: Listing) -> AppResult<Listing> {
        slots::update_records(
            self.store.as_ref(),
            LISTINGS_SLOT,
            |listings: &mut Vec<Listing>| -> AppResult<()> {
                listings.push(listing.clone());
                Ok(())
            },
        )
        .await?;
        Ok(listing)
    }

    /// Remove one listing. Owner only.
    pub async fn delete(&self, user: &User, id: &str) -> AppResult<()> {
        let id = id.to_string();
        let user = user.clone();
        slots::update_records(
            self.store.as_ref(),
            LISTINGS_SLOT,
            move |listings: &mut Vec<Listing>| {
                let listing = listings
                    .iter()
                    .find(|l| l.id == id)
                    .ok_or(AppError::NotFound)?;
                auth::ensure_owner(&user, &listing.author_id)?;
                listings.retain(|l| l.id != id);
                Ok(())
            },
        )
        .await
    }
}
