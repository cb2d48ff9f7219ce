use std::sync::Arc;

use mentioned_media::db::sqlite_url_for;
use mentioned_media::prelude::*;
use tempfile::TempDir;

async fn open(dir: &TempDir) -> MentionedMedia {
    let url = sqlite_url_for(&dir.path().join("media.db"));
    let settings = Settings { database_url: Some(url), ..Settings::default() };
    MentionedMedia::connect(settings, true).await.expect("connect")
}

fn raw_post(id: &str, n: i64, raw: &str) -> Post {
    Post { id: id.into(), post_number: n, raw: Some(raw.into()), cooked: None }
}

#[tokio::test]
async fn sqlite_round_trip_of_posts_and_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let media = open(&dir).await;
    let db = media.database().unwrap().clone();

    assert!(media.mentioned_media("t1").await.unwrap().is_empty());

    db.save_post("t1", &raw_post("p2", 2, "https://www.goodreads.com/book/show/44767458-dune")).await.unwrap();
    db.save_post("t1", &raw_post("p1", 1, "[The Shawshank Redemption](https://www.imdb.com/title/tt0111161/)")).await.unwrap();
    assert_eq!(db.next_post_number("t1").await.unwrap(), 3);

    let thread = db.load_thread("t1").await.unwrap().unwrap();
    let ids: Vec<_> = thread.posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);

    assert_eq!(media.extract_for_post("p2").await.unwrap(), Some(2));
    let entries = media.mentioned_media("t1").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].kind.as_str(), entries[0].title.as_str()), ("book", "Dune"));
    assert_eq!((entries[1].kind.as_str(), entries[1].title.as_str()), ("movie", "The Shawshank Redemption"));

    let view = media.thread_view("t1").await.unwrap().unwrap();
    assert_eq!(view.posts.len(), 2);
    assert_eq!(view.mentioned_media, entries);
}

#[tokio::test]
async fn reopening_keeps_data_and_migrations_are_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    {
        let media = open(&dir).await;
        let db = media.database().unwrap();
        db.save_post("t1", &raw_post("p1", 1, "https://www.igdb.com/games/hades")).await.unwrap();
        media.extract_thread("t1").await.unwrap();
    }
    let media = open(&dir).await;
    let entries = media.mentioned_media("t1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Hades");
}

#[tokio::test]
async fn edits_and_deletes_refresh_the_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let media = open(&dir).await;
    let db = media.database().unwrap().clone();

    db.save_post("t1", &raw_post("p1", 1, "https://www.igdb.com/games/hades")).await.unwrap();
    media.extract_for_post("p1").await.unwrap();
    assert_eq!(media.mentioned_media("t1").await.unwrap().len(), 1);

    db.save_post("t1", &raw_post("p1", 1, "changed my mind, no games")).await.unwrap();
    assert_eq!(media.extract_for_post("p1").await.unwrap(), Some(0));
    assert!(media.mentioned_media("t1").await.unwrap().is_empty());

    assert_eq!(db.delete_post("p1").await.unwrap(), 1);
    assert_eq!(media.extract_for_post("p1").await.unwrap(), None);
}

#[tokio::test]
async fn job_queue_updates_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let media = Arc::new(open(&dir).await);
    let db = media.database().unwrap().clone();
    db.save_post("t1", &raw_post("p1", 1, "https://en.wikipedia.org/wiki/Dune_(2021_film)")).await.unwrap();

    let (queue, worker) = spawn_worker(media.clone());
    assert!(queue.notify(PostEvent::Created { post_id: "p1".into() }));
    drop(queue);
    worker.await.unwrap();

    let entries = media.mentioned_media("t1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Dune");
    assert_eq!(entries[0].icon, "movie");
}

#[tokio::test]
async fn settings_file_drives_harvest_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mentioned-media.toml");
    std::fs::write(&path, "enabled = true\nharvest = \"rendered\"\n").unwrap();
    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(settings.harvest, HarvestMode::Rendered);

    let store = Arc::new(MemoryStore::new());
    store.upsert_post("t1", raw_post("p1", 1, "https://www.igdb.com/games/hades"));
    let media = MentionedMedia::with_backends(store.clone(), store.clone(), settings);
    assert_eq!(media.extract_for_post("p1").await.unwrap(), Some(0));
}

#[tokio::test]
async fn posts_with_only_raw_or_only_cooked_text_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let media = open(&dir).await;
    let db = media.database().unwrap().clone();
    assert_eq!(db.next_post_number("t1").await.unwrap(), 1);

    let cooked_only = Post {
        id: "p2".into(),
        post_number: 2,
        raw: None,
        cooked: Some(r#"<p><a href="https://www.igdb.com/games/celeste">Celeste</a></p>"#.into()),
    };
    db.save_post("t1", &raw_post("p1", 1, "https://www.igdb.com/games/hades")).await.unwrap();
    db.save_post("t1", &cooked_only).await.unwrap();

    let thread = db.load_thread("t1").await.unwrap().unwrap();
    assert_eq!(thread.posts[0].cooked, None);
    assert_eq!(thread.posts[1], cooked_only);

    assert_eq!(media.extract_thread("t1").await.unwrap().map(|c| c.len()), Some(2));
    let titles: Vec<_> = media.mentioned_media("t1").await.unwrap().into_iter().map(|e| e.title).collect();
    assert_eq!(titles, vec!["Celeste", "Hades"]);
}
