mod common;

use http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

async fn create_article(app: &TestApp, token: &str, title: &str, tag: Option<&str>) -> i64 {
    let response = app
        .post("/articles")
        .bearer(token)
        .json(&json!({
            "title": title,
            "content": format!("Content of {title}"),
            "tag": tag,
        }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "create failed");
    response.json()["id"].as_i64().expect("missing id")
}

fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("expected an array")
        .iter()
        .map(|a| a["title"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn creating_an_article_requires_authentication() {
    let app = TestApp::spawn().await;
    let response = app
        .post("/articles")
        .json(&json!({ "title": "t", "content": "c" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_article_carries_author_and_formatted_date() {
    let app = TestApp::spawn().await;
    let (token, user_id) = app.register_and_login("ana", "ana@example.com").await;

    let id = create_article(&app, &token, "First post", Some("Nutrition")).await;
    let response = app.get(&format!("/article/{id}")).send().await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["author"], json!("ana"));
    assert_eq!(body["user_id"], json!(user_id));
    assert_eq!(body["is_favorite"], json!(false));
    // dd-mm-yyyy
    let created = body["created_at"].as_str().unwrap();
    assert_eq!(created.len(), 10);
    assert_eq!(&created[2..3], "-");
    assert_eq!(&created[5..6], "-");
}

#[tokio::test]
async fn fetching_a_missing_article_is_a_404() {
    let app = TestApp::spawn().await;
    let response = app.get("/article/9999").send().await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_ignores_accents_both_ways() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_and_login("ana", "ana@example.com").await;
    create_article(&app, &token, "Café con leche", None).await;
    create_article(&app, &token, "Green tea", None).await;

    let body = app.get("/articles?q=cafe").send().await.json();
    assert_eq!(titles(&body), vec!["Café con leche"]);

    let body = app.get("/articles?q=caf%C3%A9").send().await.json();
    assert_eq!(titles(&body), vec!["Café con leche"]);

    let body = app.get("/articles?q=xyz").send().await.json();
    assert!(titles(&body).is_empty());
}

#[tokio::test]
async fn tag_slug_filter_matches_exactly() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_and_login("ana", "ana@example.com").await;
    create_article(&app, &token, "Foot care", Some("Pie Diabético")).await;
    create_article(&app, &token, "Other", Some("General")).await;

    let body = app.get("/articles?tag_slug=pie-diabetico").send().await.json();
    assert_eq!(titles(&body), vec!["Foot care"]);

    // Slug comparison is exact, not a prefix match.
    let body = app.get("/articles?tag_slug=pie-diabet").send().await.json();
    assert!(titles(&body).is_empty());
}

#[tokio::test]
async fn tag_filter_is_accent_insensitive() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_and_login("ana", "ana@example.com").await;
    create_article(&app, &token, "Foot care", Some("Pie Diabético")).await;

    let body = app.get("/articles?tag=pie%20diabetico").send().await.json();
    assert_eq!(titles(&body), vec!["Foot care"]);
}

#[tokio::test]
async fn filters_combine_with_and_semantics() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_and_login("ana", "ana@example.com").await;
    create_article(&app, &token, "Café recipes", Some("Nutrition")).await;
    create_article(&app, &token, "Café history", Some("Culture")).await;

    let body = app
        .get("/articles?q=cafe&tag_slug=nutrition")
        .send()
        .await
        .json();
    assert_eq!(titles(&body), vec!["Café recipes"]);
}

#[tokio::test]
async fn only_the_owner_can_update_or_delete() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let (intruder, _) = app.register_and_login("bob", "bob@example.com").await;
    let id = create_article(&app, &owner, "Mine", None).await;

    let response = app
        .put(&format!("/articles/{id}"))
        .bearer(&intruder)
        .json(&json!({ "title": "Stolen" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .delete(&format!("/articles/{id}"))
        .bearer(&intruder)
        .send()
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Missing article beats ownership: unknown id is a 404 for anyone.
    let response = app
        .put("/articles/9999")
        .bearer(&intruder)
        .json(&json!({ "title": "x" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_merges_unset_fields() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_and_login("ana", "ana@example.com").await;
    let id = create_article(&app, &token, "Original", Some("Nutrition")).await;

    let response = app
        .put(&format!("/articles/{id}"))
        .bearer(&token)
        .json(&json!({ "title": "Renamed" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["title"], json!("Renamed"));
    assert_eq!(body["content"], json!("Content of Original"));
    assert_eq!(body["tag"], json!("Nutrition"));
}

#[tokio::test]
async fn delete_removes_the_article_and_its_dependents() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_and_login("ana", "ana@example.com").await;
    let (reader, _) = app.register_and_login("bob", "bob@example.com").await;
    let id = create_article(&app, &owner, "Short lived", None).await;

    // Attach a comment and a favorite so the cascade has something to do.
    app.post(&format!("/article/{id}/comments"))
        .bearer(&reader)
        .json(&json!({ "text": "nice" }))
        .send()
        .await;
    app.post(&format!("/favorites/{id}")).bearer(&reader).send().await;

    let response = app.delete(&format!("/articles/{id}")).bearer(&owner).send().await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["message"],
        json!("article 'Short lived' deleted")
    );

    assert_eq!(
        app.get(&format!("/article/{id}")).send().await.status,
        StatusCode::NOT_FOUND
    );
    let favorites = app.get("/favorites").bearer(&reader).send().await.json();
    assert!(favorites.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn newlines_are_normalized_on_create() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_and_login("ana", "ana@example.com").await;

    let response = app
        .post("/articles")
        .bearer(&token)
        .json(&json!({ "title": "CRLF", "content": "line one\r\nline two" }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["content"], json!("line one\nline two"));
}

#[tokio::test]
async fn author_listing_returns_only_their_articles() {
    let app = TestApp::spawn().await;
    let (ana, ana_id) = app.register_and_login("ana", "ana@example.com").await;
    let (bob, _) = app.register_and_login("bob", "bob@example.com").await;
    create_article(&app, &ana, "By Ana", None).await;
    create_article(&app, &bob, "By Bob", None).await;

    let body = app.get(&format!("/user/{ana_id}/articles")).send().await.json();
    assert_eq!(titles(&body), vec!["By Ana"]);
}
