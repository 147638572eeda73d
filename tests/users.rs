mod support;

use std::sync::Arc;

use blogo::application::pagination::PageRequest;
use blogo::application::repos::{RepoError, UsersRepo};
use blogo::application::users::{RegisterUserCommand, UserError};
use blogo::domain::entities::ProfileUpdate;

use support::{BrokenSigner, Harness};

fn command(username: &str, email: &str, display_name: &str) -> RegisterUserCommand {
    RegisterUserCommand {
        username: username.to_string(),
        email: email.to_string(),
        display_name: display_name.to_string(),
    }
}

#[tokio::test]
async fn register_returns_user_and_verifiable_token() {
    let harness = Harness::cached();

    let registration = harness
        .users
        .register(command("alice", "alice@example.com", "Alice Wonder"))
        .await
        .expect("register");

    assert!(registration.user.id > 0);
    assert_eq!(registration.user.bio, "");
    let token = registration.token.expect("token issued");
    let claims = harness.tokens.verify(&token).expect("verify");
    assert_eq!(claims.user_id, registration.user.id);
    assert_eq!(claims.username, "alice");
}

#[tokio::test]
async fn register_reports_first_missing_field() {
    let harness = Harness::uncached();

    let err = harness
        .users
        .register(command("", "", ""))
        .await
        .expect_err("empty user");
    assert!(matches!(err, UserError::InvalidInput { field: "username" }));

    let err = harness
        .users
        .register(command("alice", "  ", "Alice"))
        .await
        .expect_err("blank email");
    assert!(matches!(err, UserError::InvalidInput { field: "email" }));

    let err = harness
        .users
        .register(command("alice", "alice@example.com", ""))
        .await
        .expect_err("no display name");
    assert!(matches!(
        err,
        UserError::InvalidInput {
            field: "display_name"
        }
    ));
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let harness = Harness::uncached();
    harness.register("alice").await;

    let err = harness
        .users
        .register(command("alice", "other@example.com", "Alice Again"))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, UserError::Conflict { .. }));
}

#[tokio::test]
async fn get_by_id_reads_through_the_cache() {
    let harness = Harness::cached();
    let alice = harness.register("alice").await;

    // register already populated the cache
    let fetched = harness.users.get_by_id(alice.id).await.expect("get");
    assert_eq!(fetched, alice);
    assert_eq!(harness.store.user_reads(), 0);

    let err = harness.users.get_by_id(999).await.expect_err("missing");
    assert!(matches!(err, UserError::NotFound { id: 999, .. }));
}

#[tokio::test]
async fn uncached_reads_always_hit_the_store() {
    let harness = Harness::uncached();
    let alice = harness.register("alice").await;

    harness.users.get_by_id(alice.id).await.expect("first");
    harness.users.get_by_id(alice.id).await.expect("second");
    assert_eq!(harness.store.user_reads(), 2);
}

#[tokio::test]
async fn stats_failure_still_returns_the_user() {
    let harness = Harness::uncached();
    let alice = harness.register("alice").await;
    let bob = harness.register("bob").await;
    harness.users.follow(bob.id, alice.id).await.expect("follow");

    let profile = harness.users.get_with_stats(alice.id).await.expect("profile");
    let stats = profile.stats.expect("stats");
    assert_eq!(stats.followers_count, 1);
    assert_eq!(stats.following_count, 0);
    assert_eq!(stats.blogs_count, 0);

    harness.store.set_stats_offline(true);
    let profile = harness.users.get_with_stats(alice.id).await.expect("profile");
    assert_eq!(profile.user.id, alice.id);
    assert_eq!(profile.stats, Err(RepoError::Timeout));
}

#[tokio::test]
async fn profile_update_invalidates_cached_snapshot() {
    let harness = Harness::cached();
    let alice = harness.register("alice").await;
    harness.users.get_by_id(alice.id).await.expect("warm");

    let updated = harness
        .users
        .update_profile(
            alice.id,
            ProfileUpdate {
                display_name: "Alice W.".into(),
                bio: "writes about rust".into(),
                profile_image: "https://img.example.com/a.png".into(),
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.display_name, "Alice W.");

    let fetched = harness.users.get_by_id(alice.id).await.expect("get");
    assert_eq!(fetched.bio, "writes about rust");
    assert_eq!(fetched.username, "alice");
}

#[tokio::test]
async fn profile_update_validates_display_name() {
    let harness = Harness::uncached();
    let alice = harness.register("alice").await;

    let err = harness
        .users
        .update_profile(alice.id, ProfileUpdate::default())
        .await
        .expect_err("empty display name");
    assert!(matches!(
        err,
        UserError::InvalidInput {
            field: "display_name"
        }
    ));

    let err = harness
        .users
        .update_profile(
            404,
            ProfileUpdate {
                display_name: "Ghost".into(),
                ..Default::default()
            },
        )
        .await
        .expect_err("unknown user");
    assert!(matches!(err, UserError::NotFound { id: 404, .. }));
}

#[tokio::test]
async fn follow_edges_are_idempotent_and_directional() {
    let harness = Harness::uncached();
    let alice = harness.register("alice").await;
    let bob = harness.register("bob").await;

    harness.users.follow(alice.id, bob.id).await.expect("follow");
    harness.users.follow(alice.id, bob.id).await.expect("follow again");

    assert!(harness.users.is_following(alice.id, bob.id).await.expect("query"));
    assert!(!harness.users.is_following(bob.id, alice.id).await.expect("query"));

    let followers = harness
        .users
        .followers(bob.id, PageRequest::default())
        .await
        .expect("followers");
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].id, alice.id);

    harness.users.unfollow(alice.id, bob.id).await.expect("unfollow");
    harness.users.unfollow(alice.id, bob.id).await.expect("unfollow again");
    assert!(!harness.users.is_following(alice.id, bob.id).await.expect("query"));
}

#[tokio::test]
async fn self_follow_is_rejected_before_the_store() {
    let harness = Harness::uncached();
    let alice = harness.register("alice").await;
    harness.store.set_offline(true);

    let err = harness
        .users
        .follow(alice.id, alice.id)
        .await
        .expect_err("self follow");
    assert!(matches!(err, UserError::SelfFollowNotAllowed));
}

#[tokio::test]
async fn following_is_newest_first_and_paginated() {
    let harness = Harness::uncached();
    let alice = harness.register("alice").await;
    let bob = harness.register("bob").await;
    let charlie = harness.register("charlie").await;

    harness.users.follow(alice.id, bob.id).await.expect("follow bob");
    harness
        .users
        .follow(alice.id, charlie.id)
        .await
        .expect("follow charlie");

    let following = harness
        .users
        .following(alice.id, PageRequest::default())
        .await
        .expect("following");
    let ids: Vec<i64> = following.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![charlie.id, bob.id]);

    let second_page = harness
        .users
        .following(alice.id, PageRequest::new(1, 1))
        .await
        .expect("page");
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].id, bob.id);
}

#[tokio::test]
async fn store_outage_on_mutation_is_reported() {
    let harness = Harness::uncached();
    let alice = harness.register("alice").await;
    let bob = harness.register("bob").await;
    harness.store.set_offline(true);

    let err = harness
        .users
        .follow(alice.id, bob.id)
        .await
        .expect_err("offline");
    assert!(matches!(err, UserError::Repo(RepoError::Persistence(_))));
}

#[tokio::test]
async fn signing_failure_still_creates_the_account() {
    let harness = Harness::with_issuer(support::memory_cache(), Arc::new(BrokenSigner));

    let registration = harness
        .users
        .register(command("alice", "alice@example.com", "Alice Wonder"))
        .await
        .expect("registration succeeds without a token");
    assert!(registration.token.is_none());

    let stored = harness
        .users
        .get_by_id(registration.user.id)
        .await
        .expect("user persisted");
    assert_eq!(stored, registration.user);
    assert!(
        harness
            .store
            .find_user_by_username("alice")
            .await
            .expect("lookup")
            .is_some()
    );
}
