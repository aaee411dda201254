//! Two-hop feed tests.
//!
//! Graph used below:
//!
//! ```text
//! reader -- direct -- second -- third
//!    \
//!     `-- other_direct (also friends with second)
//! stranger (no edges)
//! ```

mod common;

use axum::http::StatusCode;
use common::app;
use std::collections::HashSet;

#[tokio::test]
async fn feed_covers_two_hops_only() {
    let app = app().await;
    let reader = app.create_user("feed_reader").await;
    let direct = app.create_user("feed_direct").await;
    let other_direct = app.create_user("feed_other_direct").await;
    let second = app.create_user("feed_second").await;
    let third = app.create_user("feed_third").await;
    let stranger = app.create_user("feed_stranger").await;

    app.make_friends(reader.id, direct.id).await;
    app.make_friends(other_direct.id, reader.id).await;
    app.make_friends(direct.id, second.id).await;
    app.make_friends(second.id, other_direct.id).await;
    app.make_friends(second.id, third.id).await;

    let own = app.insert_post(reader.id, "mine").await;
    let from_direct = app.insert_post(direct.id, "direct").await;
    let from_second = app.insert_post(second.id, "second").await;
    let _from_third = app.insert_post(third.id, "third").await;
    let _from_stranger = app.insert_post(stranger.id, "stranger").await;
    let deleted = app.insert_post(direct.id, "deleted").await;
    app.delete(
        &format!("/v1/posts/delete/{}", deleted),
        Some(&direct.access_token),
    )
    .await;

    let resp = app.get("/v1/posts/feed", Some(&reader.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();

    let ids: HashSet<String> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["id"].as_str().unwrap().to_string())
        .collect();
    let expected: HashSet<String> = [own, from_direct, from_second]
        .iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(ids, expected);

    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["network"]["direct_friends"], 2);
    // `second` is reachable through both direct friends but counted once.
    assert_eq!(body["network"]["second_degree"], 1);
}

#[tokio::test]
async fn feed_for_loner_shows_own_posts() {
    let app = app().await;
    let loner = app.create_user("feed_loner").await;
    let post_id = app.insert_post(loner.id, "anyone there?").await;

    let resp = app.get("/v1/posts/feed", Some(&loner.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["id"], post_id.to_string());
    assert_eq!(body["network"]["direct_friends"], 0);
    assert_eq!(body["network"]["second_degree"], 0);
}

#[tokio::test]
async fn feed_is_newest_first_and_paged() {
    let app = app().await;
    let reader = app.create_user("feed_pager").await;
    let friend = app.create_user("feed_pager_friend").await;
    app.make_friends(reader.id, friend.id).await;

    for i in 0..3 {
        app.insert_post(friend.id, &format!("friend {}", i)).await;
    }

    let resp = app
        .get("/v1/posts/feed?limit=2", Some(&reader.access_token))
        .await;
    let body = resp.json();
    assert_eq!(body["posts"][0]["text"], "friend 2");
    assert_eq!(body["posts"][1]["text"], "friend 1");
    assert_eq!(body["pagination"]["has_more"], true);

    let resp = app
        .get("/v1/posts/feed?page=2&limit=2", Some(&reader.access_token))
        .await;
    let body = resp.json();
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["text"], "friend 0");
    assert_eq!(body["pagination"]["has_more"], false);
}

#[tokio::test]
async fn pending_and_rejected_requests_stay_out_of_the_feed() {
    let app = app().await;
    let reader = app.create_user("feed_gate_reader").await;
    let friend = app.create_user("feed_gate_friend").await;
    let asked = app.create_user("feed_gate_asked").await;
    let refused = app.create_user("feed_gate_refused").await;
    let friend_asked = app.create_user("feed_gate_friend_asked").await;

    app.make_friends(reader.id, friend.id).await;
    app.insert_friend_request(reader.id, asked.id, "pending").await;
    app.insert_friend_request(reader.id, refused.id, "rejected").await;
    app.insert_friend_request(friend.id, friend_asked.id, "pending").await;

    let from_friend = app.insert_post(friend.id, "friend").await;
    app.insert_post(asked.id, "asked").await;
    app.insert_post(refused.id, "refused").await;
    app.insert_post(friend_asked.id, "friend asked").await;

    let resp = app.get("/v1/posts/feed", Some(&reader.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();

    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], from_friend.to_string());
    assert_eq!(body["network"]["direct_friends"], 1);
    assert_eq!(body["network"]["second_degree"], 0);
}
