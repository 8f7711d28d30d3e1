//! HTTP tests for entry reads, writes, and moderation.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use common::{
    body_json, build_test_app, build_test_app_with, get, login, send, test_config, ADMIN,
    APPROVAL_EDITOR, BLACKLISTED, EDITOR, VISITOR,
};

async fn create(app: &axum::Router, cookie: &str, body: serde_json::Value) -> serde_json::Value {
    let response = send(app, Method::POST, "/api/v1/entries", Some(cookie), Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Create + read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn editor_creates_and_anyone_reads(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let editor = login(&state, EDITOR).await;

    let created = create(
        &app,
        &editor,
        json!({ "title": "Cats and dogs", "content": "<p>Cats are great</p>" }),
    )
    .await;
    assert_eq!(created["created"], true);
    assert_eq!(created["slug"], "Cats_and_dogs");

    let response = get(&app, "/api/v1/entries/Cats_and_dogs").await;
    assert_eq!(response.status(), StatusCode::OK);
    let entry = body_json(response).await["data"].clone();
    assert_eq!(entry["id"], created["id"]);
    assert_eq!(entry["nohtml_content"], "Cats are great");
    assert_eq!(entry["unlisted"], false);
    assert_eq!(entry["can_edit"], false);

    let response = send(
        &app,
        Method::GET,
        "/api/v1/entries/Cats_and_dogs",
        Some(&editor),
        None,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["can_edit"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_requires_an_editor(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let body = json!({ "title": "Nope", "content": "" });

    let response = send(&app, Method::POST, "/api/v1/entries", None, Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    for user in [VISITOR, BLACKLISTED] {
        let cookie = login(&state, user).await;
        let response =
            send(&app, Method::POST, "/api/v1/entries", Some(&cookie), Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "user {user}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_session_is_anonymous(pool: PgPool) {
    let (app, _) = build_test_app(pool);
    let response = send(
        &app,
        Method::POST,
        "/api/v1/entries",
        Some("sid=not-a-real-token"),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn approval_editors_create_unlisted_admins_choose(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let approval = login(&state, APPROVAL_EDITOR).await;
    let admin = login(&state, ADMIN).await;

    let pending = create(
        &app,
        &approval,
        json!({ "title": "Pending", "content": "", "unlisted": false }),
    )
    .await;
    let entry = state.store.get_by_id(pending["id"].as_str().unwrap()).await.unwrap().unwrap();
    assert!(entry.unlisted);

    let hidden = create(
        &app,
        &admin,
        json!({ "title": "Hidden", "content": "", "unlisted": true }),
    )
    .await;
    let entry = state.store.get_by_id(hidden["id"].as_str().unwrap()).await.unwrap().unwrap();
    assert!(entry.unlisted);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn disabled_new_entries_only_admins_create(pool: PgPool) {
    let config = dex_api::config::ServerConfig {
        new_entries_disabled: true,
        ..test_config()
    };
    let (app, state) = build_test_app_with(pool, config);
    let editor = login(&state, EDITOR).await;
    let admin = login(&state, ADMIN).await;
    let body = json!({ "title": "Fresh", "content": "" });

    let response =
        send(&app, Method::POST, "/api/v1/entries", Some(&editor), Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    create(&app, &admin, body).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_title_is_rejected(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let editor = login(&state, EDITOR).await;

    let response = send(
        &app,
        Method::POST,
        "/api/v1/entries",
        Some(&editor),
        Some(json!({ "title": "   ", "content": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn owner_edits_own_entry_and_keeps_flags(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let admin = login(&state, ADMIN).await;
    let visitor = login(&state, VISITOR).await;

    let created = create(&app, &admin, json!({ "title": "Visitor page", "content": "v1" })).await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/entries/{id}");

    // Not the owner yet.
    let body = json!({ "title": "", "content": "v2", "unlisted": true });
    let response = send(&app, Method::PUT, &uri, Some(&visitor), Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    state.store.set_owner(VISITOR, &id).await.unwrap();
    let response = send(&app, Method::PUT, &uri, Some(&visitor), Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let entry = state.store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(entry.title, "Visitor page");
    assert_eq!(entry.content, "v2");
    assert!(!entry.unlisted, "only admins change the unlisted flag");
    assert_eq!(entry.history().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn edit_without_content_keeps_content(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let admin = login(&state, ADMIN).await;

    let created = create(&app, &admin, json!({ "title": "Keep", "content": "<p>kept</p>" })).await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/entries/{id}");

    let response = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({ "unlisted": true }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({ "title": "Kept" }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let entry = state.store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(entry.title, "Kept");
    assert_eq!(entry.content, "<p>kept</p>");
    assert!(entry.unlisted);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn edit_sets_and_clears_image(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let editor = login(&state, EDITOR).await;

    let created = create(&app, &editor, json!({ "title": "Pic", "content": "" })).await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/entries/{id}");

    let body = json!({ "content": "", "image": { "action": "set", "src": "https://i.test/a.png" } });
    send(&app, Method::PUT, &uri, Some(&editor), Some(body)).await;
    let entry = state.store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(entry.image_field().unwrap().src(), "https://i.test/a.png");

    // No image field keeps it.
    send(&app, Method::PUT, &uri, Some(&editor), Some(json!({ "content": "x" }))).await;
    let entry = state.store.get_by_id(&id).await.unwrap().unwrap();
    assert!(entry.image_field().is_some());

    let body = json!({ "content": "x", "image": { "action": "clear" } });
    send(&app, Method::PUT, &uri, Some(&editor), Some(body)).await;
    let entry = state.store.get_by_id(&id).await.unwrap().unwrap();
    assert!(entry.image_field().is_none());
}

// ---------------------------------------------------------------------------
// History + revert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn history_is_newest_first_and_revert_replays(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let editor = login(&state, EDITOR).await;

    let created = create(&app, &editor, json!({ "title": "Rev", "content": "one" })).await;
    let id = created["id"].as_str().unwrap().to_string();
    send(
        &app,
        Method::PUT,
        &format!("/api/v1/entries/{id}"),
        Some(&editor),
        Some(json!({ "content": "two" })),
    )
    .await;

    let history = body_json(get(&app, &format!("/api/v1/entries/{id}/history")).await).await;
    let items = history["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["edit_number"], 1);
    assert_eq!(items[0]["content"], "two");
    assert_eq!(items[1]["edit_number"], 0);

    let revert_uri = format!("/api/v1/entries/{id}/revert");
    let response = send(
        &app,
        Method::POST,
        &revert_uri,
        Some(&editor),
        Some(json!({ "edit_number": 0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let entry = state.store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(entry.content, "one");
    assert_eq!(entry.history().len(), 3);

    let response = send(
        &app,
        Method::POST,
        &revert_uri,
        Some(&editor),
        Some(json!({ "edit_number": 9 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admins_delete_only_unlisted_entries(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let admin = login(&state, ADMIN).await;
    let editor = login(&state, EDITOR).await;

    let listed = create(&app, &admin, json!({ "title": "Keep me", "content": "" })).await;
    let hidden = create(
        &app,
        &admin,
        json!({ "title": "Drop me", "content": "", "unlisted": true }),
    )
    .await;
    let listed_uri = format!("/api/v1/entries/{}", listed["id"].as_str().unwrap());
    let hidden_uri = format!("/api/v1/entries/{}", hidden["id"].as_str().unwrap());

    let response = send(&app, Method::DELETE, &hidden_uri, Some(&editor), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, Method::DELETE, &listed_uri, Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, Method::DELETE, &hidden_uri, Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state
        .store
        .get_by_id(hidden["id"].as_str().unwrap())
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Search, list, random
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn unlisted_search_needs_admin(pool: PgPool) {
    let (app, state) = build_test_app(pool);
    let editor = login(&state, EDITOR).await;
    let admin = login(&state, ADMIN).await;
    create(
        &app,
        &admin,
        json!({ "title": "Secret parrot", "content": "", "unlisted": true }),
    )
    .await;

    let uri = "/api/v1/entries/search?q=parrot&unlisted=true";
    let response = send(&app, Method::GET, uri, Some(&editor), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, Method::GET, uri, Some(&admin), None).await;
    let found = body_json(response).await;
    assert_eq!(found["data"].as_array().unwrap().len(), 1);

    let listed = body_json(get(&app, "/api/v1/entries/search?q=parrot").await).await;
    assert!(listed["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_and_random(pool: PgPool) {
    let (app, state) = build_test_app(pool);

    let response = get(&app, "/api/v1/entries/random").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let editor = login(&state, EDITOR).await;
    create(&app, &editor, json!({ "title": "Alpha", "content": "" })).await;
    create(&app, &editor, json!({ "title": "Beta", "content": "" })).await;

    let listed = body_json(get(&app, "/api/v1/entries?sort=title").await).await;
    let titles: Vec<&str> = listed["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Beta", "Alpha"]);

    let response = get(&app, "/api/v1/entries/random").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_entry_is_404(pool: PgPool) {
    let (app, _) = build_test_app(pool);
    let response = get(&app, "/api/v1/entries/Nothing_here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}
