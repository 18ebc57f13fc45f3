mod common;

use http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

async fn create_article(app: &TestApp, token: &str, title: &str) -> i64 {
    let response = app
        .post("/articles")
        .bearer(token)
        .json(&json!({ "title": title, "content": "Body" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()["id"].as_i64().unwrap()
}

async fn notifications(app: &TestApp, token: &str) -> Vec<Value> {
    app.get("/notifications")
        .bearer(token)
        .send()
        .await
        .json()
        .as_array()
        .unwrap()
        .clone()
}

#[tokio::test]
async fn favorites_require_authentication() {
    let app = TestApp::spawn().await;
    let response = app.post("/favorites/1").send().await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn favoriting_a_missing_article_is_a_404() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_and_login("ana", "ana@example.com").await;
    let response = app.post("/favorites/9999").bearer(&token).send().await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorite_toggle_round_trip_with_notification() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let (fan, fan_id) = app.register_and_login("bob", "bob@example.com").await;
    let article_id = create_article(&app, &owner, "Popular").await;

    let response = app
        .post(&format!("/favorites/{article_id}"))
        .bearer(&fan)
        .send()
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["message"], json!("favorite added"));

    let favorites = app.get("/favorites").bearer(&fan).send().await.json();
    assert_eq!(favorites[0]["title"], json!("Popular"));
    assert_eq!(favorites[0]["is_favorite"], json!(true));

    let feed = notifications(&app, &owner).await;
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["type"], json!("favorite"));
    assert_eq!(feed[0]["actor_id"], json!(fan_id));
    assert_eq!(feed[0]["article_id"], json!(article_id));

    // Second toggle removes both the favorite and the notification.
    let response = app
        .post(&format!("/favorites/{article_id}"))
        .bearer(&fan)
        .send()
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], json!("favorite removed"));

    let favorites = app.get("/favorites").bearer(&fan).send().await.json();
    assert!(favorites.as_array().unwrap().is_empty());
    assert!(notifications(&app, &owner).await.is_empty());
}

#[tokio::test]
async fn favoriting_your_own_article_creates_no_notification() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let article_id = create_article(&app, &owner, "Self love").await;

    let response = app
        .post(&format!("/favorites/{article_id}"))
        .bearer(&owner)
        .send()
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert!(notifications(&app, &owner).await.is_empty());
}

#[tokio::test]
async fn repeated_favorites_leave_a_single_notification() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let (fan, _) = app.register_and_login("bob", "bob@example.com").await;
    let article_id = create_article(&app, &owner, "Popular").await;

    for _ in 0..3 {
        app.post(&format!("/favorites/{article_id}")).bearer(&fan).send().await;
    }
    // on, off, on again: exactly one live notification.
    assert_eq!(notifications(&app, &owner).await.len(), 1);
}

#[tokio::test]
async fn unknown_reaction_type_is_rejected_before_lookup() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_and_login("ana", "ana@example.com").await;

    // Even a missing article reports the bad type first.
    let response = app
        .post("/article/9999/reactions")
        .bearer(&token)
        .json(&json!({ "type": "angry" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reacting_requires_authentication() {
    let app = TestApp::spawn().await;
    let response = app
        .post("/article/1/reactions")
        .json(&json!({ "type": "like" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn article_reaction_cycles_through_create_switch_remove() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let (reader, _) = app.register_and_login("bob", "bob@example.com").await;
    let article_id = create_article(&app, &owner, "Reactive").await;
    let path = format!("/article/{article_id}/reactions");

    // Create.
    let body = app
        .post(&path)
        .bearer(&reader)
        .json(&json!({ "type": "like" }))
        .send()
        .await
        .json();
    assert_eq!(body["counts"], json!({ "like": 1, "laugh": 0, "heart": 0 }));
    assert_eq!(body["user_reaction"], json!("like"));

    // Switch.
    let body = app
        .post(&path)
        .bearer(&reader)
        .json(&json!({ "type": "laugh" }))
        .send()
        .await
        .json();
    assert_eq!(body["counts"], json!({ "like": 0, "laugh": 1, "heart": 0 }));
    assert_eq!(body["user_reaction"], json!("laugh"));

    // The switch updated the one notification in place.
    let feed = notifications(&app, &owner).await;
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["type"], json!("reaction_article"));
    assert_eq!(feed[0]["reaction_type"], json!("laugh"));

    // Remove.
    let body = app
        .post(&path)
        .bearer(&reader)
        .json(&json!({ "type": "laugh" }))
        .send()
        .await
        .json();
    assert_eq!(body["counts"], json!({ "like": 0, "laugh": 0, "heart": 0 }));
    assert_eq!(body["user_reaction"], json!(null));
    assert!(notifications(&app, &owner).await.is_empty());
}

#[tokio::test]
async fn counts_aggregate_across_users() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let (bob, _) = app.register_and_login("bob", "bob@example.com").await;
    let (carol, _) = app.register_and_login("carol", "carol@example.com").await;
    let article_id = create_article(&app, &owner, "Crowd").await;
    let path = format!("/article/{article_id}/reactions");

    app.post(&path).bearer(&bob).json(&json!({ "type": "like" })).send().await;
    app.post(&path).bearer(&carol).json(&json!({ "type": "heart" })).send().await;

    // Anonymous view: counts only, no user reaction.
    let body = app.get(&path).send().await.json();
    assert_eq!(body["counts"], json!({ "like": 1, "laugh": 0, "heart": 1 }));
    assert_eq!(body["user_reaction"], json!(null));

    // Bob sees his own reaction alongside the shared counts.
    let body = app.get(&path).bearer(&bob).send().await.json();
    assert_eq!(body["user_reaction"], json!("like"));
}

#[tokio::test]
async fn comment_reactions_notify_the_comment_author() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let (commenter, _) = app.register_and_login("bob", "bob@example.com").await;
    let article_id = create_article(&app, &owner, "Thread").await;

    let comment_id = app
        .post(&format!("/article/{article_id}/comments"))
        .bearer(&commenter)
        .json(&json!({ "text": "interesting" }))
        .send()
        .await
        .json()["id"]
        .as_i64()
        .unwrap();
    let path = format!("/article/{article_id}/comments/{comment_id}/reactions");

    let body = app
        .post(&path)
        .bearer(&owner)
        .json(&json!({ "type": "heart" }))
        .send()
        .await
        .json();
    assert_eq!(body["counts"]["heart"], json!(1));

    let feed = notifications(&app, &commenter).await;
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["type"], json!("reaction_comment"));
    assert_eq!(feed[0]["comment_id"], json!(comment_id));
    // The article id rides along for display context.
    assert_eq!(feed[0]["article_id"], json!(article_id));

    // Un-react: the notification goes with it.
    app.post(&path)
        .bearer(&owner)
        .json(&json!({ "type": "heart" }))
        .send()
        .await;
    assert!(notifications(&app, &commenter).await.is_empty());
}

#[tokio::test]
async fn comment_reactions_under_the_wrong_article_are_a_404() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let article_id = create_article(&app, &owner, "Thread").await;
    let other_article = create_article(&app, &owner, "Another").await;

    let comment_id = app
        .post(&format!("/article/{article_id}/comments"))
        .bearer(&owner)
        .json(&json!({ "text": "here" }))
        .send()
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    let response = app
        .post(&format!("/article/{other_article}/comments/{comment_id}/reactions"))
        .bearer(&owner)
        .json(&json!({ "type": "like" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reacting_to_your_own_comment_creates_no_notification() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let article_id = create_article(&app, &owner, "Solo thread").await;

    let comment_id = app
        .post(&format!("/article/{article_id}/comments"))
        .bearer(&owner)
        .json(&json!({ "text": "note to self" }))
        .send()
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    app.post(&format!("/article/{article_id}/comments/{comment_id}/reactions"))
        .bearer(&owner)
        .json(&json!({ "type": "like" }))
        .send()
        .await;
    assert!(notifications(&app, &owner).await.is_empty());
}
