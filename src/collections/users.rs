use chrono::Utc;

use crate::db::models::{PortfolioItem, User};
use crate::db::slots::{self, DynSlotStore, USERS_SLOT};
use crate::error::{AppError, AppResult};

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial profile edit. `None` fields are left untouched; `portfolio`
/// replaces the whole list when present.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub portfolio: Option<Vec<PortfolioItem>>,
}

#[derive(Clone)]
pub struct Users {
    store: DynSlotStore,
}

impl Users {
    pub fn new(store: DynSlotStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        Ok(slots::load_records(self.store.as_ref(), USERS_SLOT)
            .await?
            .records)
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.list().await?.into_iter().find(|u| u.id == id))
    }

    /// Register a new account. Email uniqueness is a linear scan over the
    /// collection, checked only here.
    pub async fn register(&self, input: NewUser) -> AppResult<User> {
        if input.username.trim().is_empty()
            || input.email.trim().is_empty()
            || input.password.is_empty()
        {
            return Err(AppError::Validation("Missing fields".into()));
        }

        let user = User {
            id: uuid::Uuid::now_v7().to_string(),
            avatar: default_avatar(&input.username),
            username: input.username,
            email: input.email,
            password: input.password,
            bio: String::new(),
            portfolio: Vec::new(),
            created_at: Utc::now(),
        };

        slots::update_records(self.store.as_ref(), USERS_SLOT, |users: &mut Vec<User>| {
            if users.iter().any(|u| u.email == user.email) {
                return Err(AppError::DuplicateEmail);
            }
            users.push(user.clone());
            Ok(())
        })
        .await?;

        Ok(user)
    }

    /// Look a user up by credentials. The original stores passwords in
    /// plaintext and matches them verbatim; hardening is out of scope.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        self.list()
            .await?
            .into_iter()
            .find(|u| u.email == email && u.password == password)
            .ok_or(AppError::InvalidCredentials)
    }

    /// Merge a partial profile edit into the stored record.
    pub async fn apply_changes(&self, user_id: &str, changes: &ProfileChanges) -> AppResult<User> {
        let id = user_id.to_string();
        let changes = changes.clone();
        slots::update_records(self.store.as_ref(), USERS_SLOT, |users: &mut Vec<User>| {
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(AppError::NotFound)?;
            merge(user, &changes);
            Ok(user.clone())
        })
        .await
    }
}

fn merge(user: &mut User, changes: &ProfileChanges) {
    if let Some(ref username) = changes.username {
        user.username = username.clone();
    }
    if let Some(ref email) = changes.email {
        user.email = email.clone();
    }
    if let Some(ref bio) = changes.bio {
        user.bio = bio.clone();
    }
    if let Some(ref avatar) = changes.avatar {
        user.avatar = avatar.clone();
    }
    if let Some(ref portfolio) = changes.portfolio {
        user.portfolio = portfolio.clone();
    }
}

/// The original's generated avatar URL, seeded by username.
fn default_avatar(username: &str) -> String {
    format!(
        "https://api.dicebear.com/7.x/avataaars/svg?seed={}&backgroundColor=8a2be2,4b0082,9370db",
        username
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::slots::SqliteSlotStore;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;
    use std::sync::Arc;

    fn test_users() -> Users {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        db::run_migrations(&pool).unwrap();
        Users::new(Arc::new(SqliteSlotStore::new(pool)))
    }

    fn steve() -> NewUser {
        NewUser {
            username: "Steve".into(),
            email: "steve@x.com".into(),
            password: "creeper".into(),
        }
    }

    #[tokio::test]
    async fn register_then_list_contains_exactly_one_matching_record() {
        let users = test_users();
        let created = users.register(steve()).await.unwrap();

        let all = users.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], created);
        assert_eq!(all[0].username, "Steve");
        assert!(all[0].avatar.contains("seed=Steve"));
        assert!(all[0].portfolio.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_leaves_collection_unchanged() {
        let users = test_users();
        users.register(steve()).await.unwrap();

        let err = users
            .register(NewUser {
                username: "OtherSteve".into(),
                ..steve()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_rejects_blank_fields() {
        let users = test_users();
        let err = users
            .register(NewUser {
                username: "  ".into(),
                ..steve()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(users.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn authenticate_matches_email_and_password() {
        let users = test_users();
        let created = users.register(steve()).await.unwrap();

        let found = users.authenticate("steve@x.com", "creeper").await.unwrap();
        assert_eq!(found.id, created.id);

        let err = users.authenticate("steve@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        let err = users.authenticate("alex@x.com", "creeper").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn apply_changes_merges_partial_fields() {
        let users = test_users();
        let created = users.register(steve()).await.unwrap();

        let updated = users
            .apply_changes(
                &created.id,
                &ProfileChanges {
                    bio: Some("Builder of castles".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.bio, "Builder of castles");
        assert_eq!(updated.username, "Steve");
        assert_eq!(updated.email, "steve@x.com");

        let stored = users.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn apply_changes_to_unknown_user_is_not_found() {
        let users = test_users();
        let err = users
            .apply_changes("nope", &ProfileChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
