use std::sync::Arc;

use craftmarket::auth;
use craftmarket::auth::session::SessionManager;
use craftmarket::collections::community::{CommunityPosts, NewCommunityPost};
use craftmarket::collections::listings::{Listings, NewListing};
use craftmarket::collections::users::{NewUser, Users};
use craftmarket::db;
use craftmarket::db::models::ServiceCategory;
use craftmarket::db::slots::{DynSlotStore, SqliteSlotStore};
use craftmarket::error::AppError;
use craftmarket::interactions::{Interactions, Reaction};
use tempfile::TempDir;

fn test_store() -> (DynSlotStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    (Arc::new(SqliteSlotStore::new(pool)), temp_dir)
}

/// The full marketplace flow: register, log in, publish a listing, interact
/// with the community feed from a second account.
#[tokio::test]
async fn marketplace_end_to_end_flow() {
    let (store, _temp) = test_store();

    let users = Users::new(store.clone());
    let listings = Listings::new(store.clone());
    let community = CommunityPosts::new(store.clone());
    let interactions = Interactions::new(store.clone());

    // Register Steve; login makes him the active session.
    let steve = users
        .register(NewUser {
            username: "Steve".into(),
            email: "steve@x.com".into(),
            password: "creeper".into(),
        })
        .await
        .unwrap();

    let mut session = SessionManager::init(store.clone()).await.unwrap();
    session.login(steve.clone()).await.unwrap();
    assert_eq!(session.current().unwrap().username, "Steve");

    // Publish a listing priced 10.5.
    let author = auth::require_user(&session).unwrap().clone();
    let listing = listings
        .create(
            &author,
            NewListing {
                title: "Custom plugin".into(),
                description: "I will write your plugin".into(),
                category: ServiceCategory::Plugin,
                price: 10.5,
                images: vec![],
                delivery_time: "3 days".into(),
                requirements: String::new(),
            },
        )
        .await
        .unwrap();

    let all = listings.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].price, 10.5);

    // Steve posts to the community feed.
    let post = community
        .create(
            &author,
            NewCommunityPost {
                title: "New plugin service".into(),
                content: "Check out my listing".into(),
                images: vec![],
                tags: "plugin, service".into(),
            },
        )
        .await
        .unwrap();

    // A second account likes the post; toggling twice restores the count.
    let alex = users
        .register(NewUser {
            username: "Alex".into(),
            email: "alex@x.com".into(),
            password: "ender".into(),
        })
        .await
        .unwrap();

    assert!(interactions
        .toggle_reaction(&alex, &post.id, Reaction::Like)
        .await
        .unwrap());
    let liked = community.find(&post.id).await.unwrap().unwrap();
    assert_eq!(liked.likes.len(), 1);

    assert!(!interactions
        .toggle_reaction(&alex, &post.id, Reaction::Like)
        .await
        .unwrap());
    let unliked = community.find(&post.id).await.unwrap().unwrap();
    assert_eq!(unliked.likes.len(), 0);

    // Repeated views accumulate one by one.
    let initial_views = listing.views;
    for _ in 0..3 {
        interactions.record_view(&listing.id).await.unwrap();
    }
    let viewed = listings.find(&listing.id).await.unwrap().unwrap();
    assert_eq!(viewed.views, initial_views + 3);

    // Alex cannot delete Steve's listing; Steve can.
    let err = listings.delete(&alex, &listing.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    listings.delete(&author, &listing.id).await.unwrap();
    assert!(listings.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn unauthenticated_sessions_are_blocked_before_any_write() {
    let (store, _temp) = test_store();

    let session = SessionManager::init(store.clone()).await.unwrap();
    assert!(matches!(
        auth::require_user(&session),
        Err(AppError::Unauthorized)
    ));

    // Nothing was created anywhere.
    assert!(Listings::new(store.clone()).list().await.unwrap().is_empty());
    assert!(CommunityPosts::new(store).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn session_survives_restart_from_the_same_store() {
    let (store, _temp) = test_store();
    let users = Users::new(store.clone());

    let steve = users
        .register(NewUser {
            username: "Steve".into(),
            email: "steve@x.com".into(),
            password: "creeper".into(),
        })
        .await
        .unwrap();

    {
        let mut session = SessionManager::init(store.clone()).await.unwrap();
        session.login(steve.clone()).await.unwrap();
    }

    // A new manager over the same store restores the identity.
    let restored = SessionManager::init(store).await.unwrap();
    assert_eq!(restored.current().map(|u| u.id.as_str()), Some(steve.id.as_str()));
}

#[tokio::test]
async fn comment_flow_preserves_order_and_rejects_blanks() {
    let (store, _temp) = test_store();
    let users = Users::new(store.clone());
    let community = CommunityPosts::new(store.clone());
    let interactions = Interactions::new(store.clone());

    let steve = users
        .register(NewUser {
            username: "Steve".into(),
            email: "steve@x.com".into(),
            password: "creeper".into(),
        })
        .await
        .unwrap();

    let post = community
        .create(
            &steve,
            NewCommunityPost {
                title: "My base tour".into(),
                content: "Video inside".into(),
                images: vec![],
                tags: String::new(),
            },
        )
        .await
        .unwrap();

    interactions
        .add_comment(&steve, &post.id, "First!")
        .await
        .unwrap();

    let err = interactions
        .add_comment(&steve, &post.id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    interactions
        .add_comment(&steve, &post.id, "Also, nice redstone")
        .await
        .unwrap();

    let stored = community.find(&post.id).await.unwrap().unwrap();
    assert_eq!(stored.comments.len(), 2);
    assert_eq!(stored.comments[0].text, "First!");
    assert_eq!(stored.comments[1].text, "Also, nice redstone");
}
