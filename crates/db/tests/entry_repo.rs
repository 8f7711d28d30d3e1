//! Integration tests for the entry, session, preference, and config
//! repositories against a real database.

use chrono::Utc;
use sqlx::PgPool;
use dex_core::entry::{EntrySort, HistoryItem, ImageDescriptor, ImageField};
use dex_db::models::config::CONFIG_FEATURED;
use dex_db::models::entry::EntryWrite;
use dex_db::repositories::{ConfigRepo, EntryRepo, SessionRepo, UserPreferenceRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(id: &str, title: &str, text: &str) -> EntryWrite {
    let now = Utc::now();
    EntryWrite {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("<p>{text}</p>"),
        nohtml_content: text.to_string(),
        replace_image: false,
        image: None,
        unlisted: false,
        edited_at: now,
        history_item: HistoryItem {
            author: 1,
            title: title.to_string(),
            content: format!("<p>{text}</p>"),
            image: None,
            unlisted: false,
            time: now,
        },
    }
}

// ---------------------------------------------------------------------------
// Upsert + history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upsert_creates_then_appends_history(pool: PgPool) {
    let first = EntryRepo::upsert_edit(&pool, &write("e1", "Cats", "Cats are great"))
        .await
        .unwrap();
    assert!(first.created);
    assert_eq!(first.entry.history().len(), 1);

    let second = EntryRepo::upsert_edit(&pool, &write("e1", "Cats", "Cats are the best"))
        .await
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.entry.content, "<p>Cats are the best</p>");

    let history = second.entry.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "<p>Cats are great</p>");
    assert_eq!(history[1].content, "<p>Cats are the best</p>");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upsert_only_replaces_image_when_asked(pool: PgPool) {
    let mut input = write("e1", "Cats", "meow");
    input.replace_image = true;
    input.image = Some(ImageField::Source("https://x/cat.png".into()));
    EntryRepo::upsert_edit(&pool, &input).await.unwrap();

    let kept = EntryRepo::upsert_edit(&pool, &write("e1", "Cats", "purr"))
        .await
        .unwrap();
    assert_eq!(kept.entry.image_field().map(|i| i.src()), Some("https://x/cat.png"));

    let mut clear = write("e1", "Cats", "hiss");
    clear.replace_image = true;
    let cleared = EntryRepo::upsert_edit(&pool, &clear).await.unwrap();
    assert!(cleared.entry.image.is_none());
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_ranks_title_hits_first(pool: PgPool) {
    EntryRepo::upsert_edit(&pool, &write("a", "Dogs", "a dog once met a parrot"))
        .await
        .unwrap();
    EntryRepo::upsert_edit(&pool, &write("b", "Parrot", "a colourful bird"))
        .await
        .unwrap();

    let results = EntryRepo::search(&pool, "parrot", false, 10, 0).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_filters_by_unlisted_flag(pool: PgPool) {
    let mut hidden = write("h", "Secret parrot", "hidden");
    hidden.unlisted = true;
    EntryRepo::upsert_edit(&pool, &hidden).await.unwrap();
    EntryRepo::upsert_edit(&pool, &write("v", "Visible parrot", "shown"))
        .await
        .unwrap();

    let listed = EntryRepo::search(&pool, "parrot", false, 10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "v");

    let unlisted = EntryRepo::search(&pool, "parrot", true, 10, 0).await.unwrap();
    assert_eq!(unlisted.len(), 1);
    assert_eq!(unlisted[0].id, "h");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn exact_title_is_case_sensitive_and_listed_only(pool: PgPool) {
    EntryRepo::upsert_edit(&pool, &write("a", "Cats", "x")).await.unwrap();
    let mut hidden = write("b", "Dogs", "y");
    hidden.unlisted = true;
    EntryRepo::upsert_edit(&pool, &hidden).await.unwrap();

    assert_eq!(EntryRepo::find_listed_by_title(&pool, "Cats", 10).await.unwrap().len(), 1);
    assert!(EntryRepo::find_listed_by_title(&pool, "cats", 10).await.unwrap().is_empty());
    assert!(EntryRepo::find_listed_by_title(&pool, "Dogs", 10).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_count_and_sample_skip_unlisted(pool: PgPool) {
    assert!(EntryRepo::sample_listed(&pool).await.unwrap().is_none());

    EntryRepo::upsert_edit(&pool, &write("a", "Alpha", "x")).await.unwrap();
    EntryRepo::upsert_edit(&pool, &write("b", "Beta", "y")).await.unwrap();
    let mut hidden = write("c", "Gamma", "z");
    hidden.unlisted = true;
    EntryRepo::upsert_edit(&pool, &hidden).await.unwrap();

    assert_eq!(EntryRepo::count_listed(&pool).await.unwrap(), 2);
    let sampled = EntryRepo::sample_listed(&pool).await.unwrap().unwrap();
    assert_ne!(sampled.id, "c");

    let by_title = EntryRepo::list_listed(&pool, EntrySort::Title, 10, 0).await.unwrap();
    let titles: Vec<&str> = by_title.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Beta", "Alpha"]);
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn one_entry_per_owner(pool: PgPool) {
    EntryRepo::upsert_edit(&pool, &write("a", "Alpha", "x")).await.unwrap();
    EntryRepo::upsert_edit(&pool, &write("b", "Beta", "y")).await.unwrap();

    assert!(EntryRepo::set_owner(&pool, "a", 42).await.unwrap());
    let err = EntryRepo::set_owner(&pool, "b", 42).await.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_entries_owner_id"));

    assert_eq!(EntryRepo::clear_owner(&pool, 42).await.unwrap(), 1);
    assert!(EntryRepo::set_owner(&pool, "b", 42).await.unwrap());
    let owned = EntryRepo::find_by_owner(&pool, 42).await.unwrap().unwrap();
    assert_eq!(owned.id, "b");
}

// ---------------------------------------------------------------------------
// Normalized write-back and delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_normalized_leaves_none_columns(pool: PgPool) {
    let mut input = write("a", "Alpha", "x");
    input.replace_image = true;
    input.image = Some(ImageField::Source("https://x/a.png".into()));
    EntryRepo::upsert_edit(&pool, &input).await.unwrap();

    let resolved = ImageField::Resolved(ImageDescriptor {
        src: "https://x/a.png".into(),
        thumbnail_b64: Some("AAAA".into()),
        thumbnail_content_type: Some("image/png".into()),
    });
    assert!(EntryRepo::update_normalized(&pool, "a", Some(&resolved), None).await.unwrap());

    let entry = EntryRepo::find_by_id(&pool, "a").await.unwrap().unwrap();
    assert_eq!(entry.image_field(), Some(&resolved));
    assert_eq!(entry.nohtml_content.as_deref(), Some("x"));

    assert!(!EntryRepo::update_normalized(&pool, "missing", None, Some("y")).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_row(pool: PgPool) {
    EntryRepo::upsert_edit(&pool, &write("a", "Alpha", "x")).await.unwrap();
    assert!(EntryRepo::delete(&pool, "a").await.unwrap());
    assert!(!EntryRepo::delete(&pool, "a").await.unwrap());
    assert!(EntryRepo::find_by_id(&pool, "a").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Sessions, preferences, config
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn session_round_trip(pool: PgPool) {
    SessionRepo::create(&pool, "hash", 7).await.unwrap();
    let found = SessionRepo::find_by_token_hash(&pool, "hash").await.unwrap().unwrap();
    assert_eq!(found.user_id, 7);
    assert!(SessionRepo::find_by_token_hash(&pool, "other").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn personal_entry_upserts(pool: PgPool) {
    assert!(UserPreferenceRepo::find(&pool, 9).await.unwrap().is_none());
    UserPreferenceRepo::set_personal_entry(&pool, 9, Some("a")).await.unwrap();
    let pref = UserPreferenceRepo::set_personal_entry(&pool, 9, Some("b")).await.unwrap();
    assert_eq!(pref.personal_entry.as_deref(), Some("b"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn featured_config_set_and_clear(pool: PgPool) {
    assert!(ConfigRepo::get(&pool, CONFIG_FEATURED).await.unwrap().is_none());
    ConfigRepo::set(&pool, CONFIG_FEATURED, "a").await.unwrap();
    ConfigRepo::set(&pool, CONFIG_FEATURED, "b").await.unwrap();
    assert_eq!(ConfigRepo::get(&pool, CONFIG_FEATURED).await.unwrap().unwrap().value, "b");
    assert!(ConfigRepo::delete(&pool, CONFIG_FEATURED).await.unwrap());
    assert!(ConfigRepo::get(&pool, CONFIG_FEATURED).await.unwrap().is_none());
}
