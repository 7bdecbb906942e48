//! Database integration tests
//!
//! These tests verify the TursoClient and like ledger using in-memory SQLite,
//! plus a couple of file-backed cases.

use chrono::{TimeZone, Utc};
use gravity::db::{DatabaseProvider, TursoClient};
use gravity::types::{AppError, PageRequest, SimulationSort, UpdateSimulationRequest};
use std::sync::Arc;

/// Test helper to create a TursoClient with in-memory database
async fn create_test_client() -> TursoClient {
    TursoClient::new_memory()
        .await
        .expect("Failed to create in-memory database")
}

async fn create_user(client: &TursoClient, email: &str) -> i64 {
    client
        .create_user("tester", email, Some("$argon2id$fake"), Utc::now())
        .await
        .expect("Failed to create user")
        .id
}

fn first_page() -> PageRequest {
    PageRequest::new(None, None).expect("default page")
}

// ============= Users =============

#[tokio::test]
async fn test_create_memory_client() {
    let client = create_test_client().await;
    assert!(client.connection().await.is_ok());
}

#[tokio::test]
async fn test_create_and_fetch_user() {
    let client = create_test_client().await;
    let signup = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let user = client
        .create_user("alice", "alice@example.com", Some("hash"), signup)
        .await
        .expect("create user");

    let by_email = client
        .get_user_by_email("alice@example.com")
        .await
        .expect("query")
        .expect("user exists");
    assert_eq!(by_email.id, user.id);
    assert_eq!(by_email.username, "alice");
    assert_eq!(by_email.password_hash.as_deref(), Some("hash"));

    let by_id = client.get_user(user.id).await.expect("query").expect("user exists");
    assert_eq!(by_id.email, "alice@example.com");

    let view = by_id.to_view().expect("view");
    assert_eq!(view.created_at, signup);
}

#[tokio::test]
async fn test_get_missing_user() {
    let client = create_test_client().await;

    assert!(client.get_user(42).await.expect("query").is_none());
    assert!(client
        .get_user_by_email("nobody@example.com")
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn test_create_duplicate_user_fails() {
    let client = create_test_client().await;
    create_user(&client, "dup@example.com").await;

    let result = client
        .create_user("other", "dup@example.com", Some("hash"), Utc::now())
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_user_without_password_hash() {
    let client = create_test_client().await;

    let user = client
        .create_user("imported", "imported@example.com", None, Utc::now())
        .await
        .expect("create user");

    let stored = client.get_user(user.id).await.expect("query").expect("exists");
    assert!(stored.password_hash.is_none());
}

// ============= Articles =============

#[tokio::test]
async fn test_article_crud() {
    let client = create_test_client().await;
    let author = create_user(&client, "author@example.com").await;

    let id = client
        .create_article(Some(author), "Orbits", "Kepler's laws", false)
        .await
        .expect("create article");

    let article = client.get_article(id).await.expect("query").expect("exists");
    assert_eq!(article.title, "Orbits");
    assert_eq!(article.author_id, Some(author));
    assert!(!article.is_public);

    let updated = client
        .update_article(id, "Orbits revisited", "Ellipses", Some(true))
        .await
        .expect("update");
    assert_eq!(updated.title, "Orbits revisited");
    assert_eq!(updated.content, "Ellipses");
    assert!(updated.is_public);
    assert_eq!(updated.author_id, Some(author));

    // Visibility is left alone when not given
    let kept = client
        .update_article(id, "Orbits", "Ellipses", None)
        .await
        .expect("update");
    assert!(kept.is_public);

    assert!(client.delete_article(id).await.expect("delete"));
    assert!(client.get_article(id).await.expect("query").is_none());
    assert!(!client.delete_article(id).await.expect("delete again"));
}

#[tokio::test]
async fn test_update_missing_article() {
    let client = create_test_client().await;

    let result = client.update_article(999, "t", "c", None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_list_public_articles_newest_first() {
    let client = create_test_client().await;
    let author = create_user(&client, "author@example.com").await;

    let first = client
        .create_article(Some(author), "First", "a", true)
        .await
        .expect("create");
    client
        .create_article(Some(author), "Hidden", "b", false)
        .await
        .expect("create");
    let third = client
        .create_article(Some(author), "Third", "c", true)
        .await
        .expect("create");

    let articles = client
        .list_public_articles(first_page(), None)
        .await
        .expect("list");

    let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![third, first]);
}

#[tokio::test]
async fn test_list_public_articles_search() {
    let client = create_test_client().await;

    client
        .create_article(None, "Gravity Wells", "slingshots", true)
        .await
        .expect("create");
    client
        .create_article(None, "Pendulums", "simple harmonic GRAVITY", true)
        .await
        .expect("create");
    client
        .create_article(None, "Fluids", "viscosity", true)
        .await
        .expect("create");
    client
        .create_article(None, "Secret gravity", "private", false)
        .await
        .expect("create");

    let hits = client
        .list_public_articles(first_page(), Some("gravity"))
        .await
        .expect("search");
    let mut titles: Vec<String> = hits.into_iter().map(|a| a.title).collect();
    titles.sort();
    assert_eq!(titles, vec!["Gravity Wells", "Pendulums"]);

    // Wildcards in the query are literal
    let none = client
        .list_public_articles(first_page(), Some("%"))
        .await
        .expect("search");
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_list_public_articles_paging() {
    let client = create_test_client().await;

    for i in 0..5 {
        client
            .create_article(None, &format!("Article {}", i), "body", true)
            .await
            .expect("create");
    }

    let page1 = client
        .list_public_articles(PageRequest::new(Some(1), Some(2)).unwrap(), None)
        .await
        .expect("page 1");
    let page3 = client
        .list_public_articles(PageRequest::new(Some(3), Some(2)).unwrap(), None)
        .await
        .expect("page 3");
    let page4 = client
        .list_public_articles(PageRequest::new(Some(4), Some(2)).unwrap(), None)
        .await
        .expect("page 4");

    assert_eq!(page1.len(), 2);
    assert_eq!(page3.len(), 1);
    assert!(page4.is_empty());
}

// ============= Simulations =============

#[tokio::test]
async fn test_simulation_crud() {
    let client = create_test_client().await;
    let owner = create_user(&client, "owner@example.com").await;

    let id = client
        .create_simulation(Some(owner), "Two bodies", 3, 7, false)
        .await
        .expect("create simulation");

    let sim = client.get_simulation(id).await.expect("query").expect("exists");
    assert_eq!(sim.title, "Two bodies");
    assert_eq!((sim.data, sim.data2), (3, 7));
    assert_eq!(sim.owner_id, Some(owner));
    assert_eq!(sim.likes, 0);
    assert!(!sim.is_public);

    let changes = UpdateSimulationRequest {
        is_public: Some(true),
        data2: Some(8),
        ..Default::default()
    };
    let updated = client.update_simulation(id, &changes).await.expect("update");
    assert!(updated.is_public);
    assert_eq!(updated.title, "Two bodies");
    assert_eq!((updated.data, updated.data2), (3, 8));

    assert!(client.delete_simulation(id).await.expect("delete"));
    assert!(client.get_simulation(id).await.expect("query").is_none());
}

#[tokio::test]
async fn test_update_missing_simulation() {
    let client = create_test_client().await;

    let result = client
        .update_simulation(404, &UpdateSimulationRequest::default())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_list_public_simulations_sorted_by_likes() {
    let client = create_test_client().await;
    let alice = create_user(&client, "alice@example.com").await;
    let bob = create_user(&client, "bob@example.com").await;

    let quiet = client
        .create_simulation(Some(alice), "Quiet", 1, 1, true)
        .await
        .expect("create");
    let popular = client
        .create_simulation(Some(alice), "Popular", 2, 2, true)
        .await
        .expect("create");
    let hidden = client
        .create_simulation(Some(alice), "Hidden", 3, 3, false)
        .await
        .expect("create");
    let newest = client
        .create_simulation(Some(bob), "Newest", 4, 4, true)
        .await
        .expect("create");

    client.likes().toggle_on(alice, popular).await.expect("like");
    client.likes().toggle_on(bob, popular).await.expect("like");
    client.likes().toggle_on(bob, quiet).await.expect("like");
    client.likes().toggle_on(bob, hidden).await.expect("like");

    let by_likes = client
        .list_public_simulations(first_page(), SimulationSort::Likes)
        .await
        .expect("list");
    let ranked: Vec<(i64, i64)> = by_likes.iter().map(|s| (s.id, s.likes)).collect();
    assert_eq!(ranked, vec![(popular, 2), (quiet, 1), (newest, 0)]);

    let latest = client
        .list_public_simulations(first_page(), SimulationSort::Latest)
        .await
        .expect("list");
    let ids: Vec<i64> = latest.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![newest, popular, quiet]);
}

// ============= Like ledger =============

#[tokio::test]
async fn test_like_then_duplicate_like_conflicts() {
    let client = create_test_client().await;
    let user = create_user(&client, "fan@example.com").await;
    let sim = client
        .create_simulation(None, "Orbit", 1, 2, true)
        .await
        .expect("create");

    let liked = client.likes().toggle_on(user, sim).await.expect("like");
    assert_eq!(liked.simulation_id, sim);
    assert_eq!(liked.likes, 1);

    let again = client.likes().toggle_on(user, sim).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    assert_eq!(client.likes().count(sim).await.expect("count"), 1);
    assert!(client.likes().is_liked(user, sim).await.expect("query"));
}

#[tokio::test]
async fn test_unlike_decrements_and_second_unlike_not_found() {
    let client = create_test_client().await;
    let a = create_user(&client, "a@example.com").await;
    let b = create_user(&client, "b@example.com").await;
    let sim = client
        .create_simulation(None, "Orbit", 1, 2, true)
        .await
        .expect("create");

    client.likes().toggle_on(a, sim).await.expect("like a");
    let after_b = client.likes().toggle_on(b, sim).await.expect("like b");
    assert_eq!(after_b.likes, 2);

    let removed = client.likes().toggle_off(b, sim).await.expect("unlike");
    assert_eq!(removed.likes, 1);

    let again = client.likes().toggle_off(b, sim).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
    assert_eq!(client.likes().count(sim).await.expect("count"), 1);
    assert!(!client.likes().is_liked(b, sim).await.expect("query"));
}

#[tokio::test]
async fn test_like_missing_simulation() {
    let client = create_test_client().await;
    let user = create_user(&client, "fan@example.com").await;

    let result = client.likes().toggle_on(user, 12345).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_unlike_without_like() {
    let client = create_test_client().await;
    let user = create_user(&client, "fan@example.com").await;
    let sim = client
        .create_simulation(None, "Orbit", 1, 2, true)
        .await
        .expect("create");

    let result = client.likes().toggle_off(user, sim).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

/// Fire `attempts` concurrent likes from one user and check exactly one lands.
async fn assert_single_like_wins(client: Arc<TursoClient>, attempts: usize) {
    let user = create_user(&client, "racer@example.com").await;
    let sim = client
        .create_simulation(None, "Race", 1, 1, true)
        .await
        .expect("create");

    let mut handles = Vec::with_capacity(attempts);
    for _ in 0..attempts {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client.likes().toggle_on(user, sim).await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(count) => {
                assert_eq!(count.likes, 1);
                successes += 1;
            }
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, attempts - 1);
    assert_eq!(client.likes().count(sim).await.expect("count"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_single_winner() {
    assert_single_like_wins(Arc::new(create_test_client().await), 16).await;
}

/// A file database opens a connection per call, so racing likes can get
/// past the existence pre-check and meet at the uniqueness constraint.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_single_winner_file_backed() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("race.db");
    let client = TursoClient::new_local(path.to_str().expect("utf-8 path"))
        .await
        .expect("open database");

    assert_single_like_wins(Arc::new(client), 32).await;
}

// ============= Cascades =============

#[tokio::test]
async fn test_deleting_simulation_removes_its_likes() {
    let client = create_test_client().await;
    let user = create_user(&client, "fan@example.com").await;
    let sim = client
        .create_simulation(Some(user), "Short lived", 1, 1, true)
        .await
        .expect("create");

    client.likes().toggle_on(user, sim).await.expect("like");
    assert!(client.delete_simulation(sim).await.expect("delete"));

    assert_eq!(client.likes().count(sim).await.expect("count"), 0);
    assert!(!client.likes().is_liked(user, sim).await.expect("query"));
}

#[tokio::test]
async fn test_deleting_user_cascades() {
    let client = create_test_client().await;
    let owner = create_user(&client, "owner@example.com").await;
    let fan = create_user(&client, "fan@example.com").await;

    let article = client
        .create_article(Some(owner), "Mine", "body", true)
        .await
        .expect("create article");
    let owned_sim = client
        .create_simulation(Some(owner), "Mine", 1, 1, true)
        .await
        .expect("create simulation");
    let other_sim = client
        .create_simulation(Some(fan), "Theirs", 1, 1, true)
        .await
        .expect("create simulation");
    client.likes().toggle_on(owner, other_sim).await.expect("like");

    assert!(client.delete_user(owner).await.expect("delete user"));

    assert!(client.get_article(article).await.expect("query").is_none());
    assert!(client.get_simulation(owned_sim).await.expect("query").is_none());
    assert_eq!(client.likes().count(other_sim).await.expect("count"), 0);
    assert!(client.get_simulation(other_sim).await.expect("query").is_some());
}

// ============= File-backed storage =============

#[tokio::test]
async fn test_local_file_persists_across_clients() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("gravity.db");
    let path = path.to_str().expect("utf-8 path");

    let user_id = {
        let client = TursoClient::new_local(path).await.expect("open database");
        let user = create_user(&client, "persist@example.com").await;
        let sim = client
            .create_simulation(Some(user), "Saved", 5, 6, true)
            .await
            .expect("create");
        client.likes().toggle_on(user, sim).await.expect("like");
        user
    };

    let reopened = TursoClient::new_local(path).await.expect("reopen database");
    let user = reopened
        .get_user_by_email("persist@example.com")
        .await
        .expect("query")
        .expect("user persisted");
    assert_eq!(user.id, user_id);

    let sims = reopened
        .list_public_simulations(first_page(), SimulationSort::Latest)
        .await
        .expect("list");
    assert_eq!(sims.len(), 1);
    assert_eq!(sims[0].likes, 1);
}

#[tokio::test]
async fn test_sqlite_provider_creates_parent_directory() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("data").join("gravity.db");

    let provider = DatabaseProvider::SQLite {
        path: path.to_string_lossy().into_owned(),
    };
    let client = provider.create_client().await.expect("create client");
    create_user(&client, "nested@example.com").await;

    assert!(path.exists());
}
