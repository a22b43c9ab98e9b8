//! Runs against a real Postgres when `DATABASE_URL` points at one; skipped otherwise.

use crewboard::{
    config::Config,
    database::{
        PgStore, PostRepository, connect_pool,
        models::{AuthorSnapshot, LikeChange, NewPost, PostBody, PostKind},
    },
};
use futures_util::future::join_all;
use uuid::Uuid;

async fn pg_store() -> Option<PgStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    if !url.starts_with("postgres") {
        return None;
    }
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some(url.clone()),
        "JWT_SECRET" => Some("pg-test-secret".into()),
        _ => None,
    })
    .unwrap();
    let pool = connect_pool(&config).await.unwrap();
    Some(PgStore::new(pool))
}

async fn generic_post(store: &PgStore) -> Uuid {
    store
        .insert_post(NewPost {
            owner_account_id: Uuid::new_v4(),
            author: AuthorSnapshot {
                name: "Owner".into(),
                username: "owner".into(),
                avatar: None,
            },
            body: PostBody::Generic { text: "race".into() },
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn pg_concurrent_likes_from_one_account_apply_once() {
    let Some(store) = pg_store().await else {
        eprintln!("DATABASE_URL not set to Postgres, skipping");
        return;
    };
    let post_id = generic_post(&store).await;
    let liker = Uuid::new_v4();

    let changes = join_all((0..16).map(|_| store.add_like(post_id, liker))).await;
    let applied = changes
        .iter()
        .filter(|c| matches!(c, Ok(LikeChange::Applied(_))))
        .count();
    let unchanged = changes
        .iter()
        .filter(|c| matches!(c, Ok(LikeChange::Unchanged)))
        .count();
    assert_eq!(applied, 1);
    assert_eq!(unchanged, changes.len() - 1);

    let post = store.find_post(PostKind::Generic, post_id).await.unwrap().unwrap();
    assert_eq!(post.likes.len(), 1);

    let removals = join_all((0..8).map(|_| store.remove_like(post_id, liker))).await;
    let removed = removals
        .iter()
        .filter(|c| matches!(c, Ok(LikeChange::Applied(_))))
        .count();
    assert_eq!(removed, 1);

    store.delete_post(PostKind::Generic, post_id).await.unwrap();
}

#[tokio::test]
async fn pg_likes_only_apply_to_generic_posts() {
    let Some(store) = pg_store().await else {
        eprintln!("DATABASE_URL not set to Postgres, skipping");
        return;
    };
    let post = store
        .insert_post(NewPost {
            owner_account_id: Uuid::new_v4(),
            author: AuthorSnapshot {
                name: "Admin".into(),
                username: "admin".into(),
                avatar: None,
            },
            body: PostBody::Inventory { item: "flour".into() },
        })
        .await
        .unwrap();

    assert_eq!(
        store.add_like(post.id, Uuid::new_v4()).await.unwrap(),
        LikeChange::PostMissing
    );
    store.delete_post(PostKind::Inventory, post.id).await.unwrap();
}
