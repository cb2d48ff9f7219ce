use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadInsert {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInsert {
    pub id: String,
    pub thread_id: String,
    pub post_number: i64,
    pub raw: String,    // authored markdown, '' when absent
    pub cooked: String, // rendered HTML, '' when absent
}

/// (id, post_number, raw, cooked); absent text reads as ''.
pub type PostRow = (String, i64, String, String);

pub async fn upsert_thread(pool: &AnyPool, t: &ThreadInsert) -> Result<()> {
    sqlx::query(
        "INSERT INTO threads(id) VALUES(?)\n         ON CONFLICT(id) DO UPDATE SET updated_at=CURRENT_TIMESTAMP",
    )
    .bind(&t.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn thread_exists(pool: &AnyPool, thread_id: &str) -> Result<bool> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads WHERE id = ?")
        .bind(thread_id)
        .fetch_one(pool)
        .await?;
    Ok(n > 0)
}

pub async fn upsert_post(pool: &AnyPool, p: &PostInsert) -> Result<()> {
    sqlx::query(
        "INSERT INTO posts(id, thread_id, post_number, raw, cooked) VALUES(?, ?, ?, ?, ?)\n         ON CONFLICT(id) DO UPDATE SET\n           raw=excluded.raw, cooked=excluded.cooked, updated_at=CURRENT_TIMESTAMP",
    )
    .bind(&p.id)
    .bind(&p.thread_id)
    .bind(p.post_number)
    .bind(&p.raw)
    .bind(&p.cooked)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_post(pool: &AnyPool, post_id: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM posts WHERE id = ?").bind(post_id).execute(pool).await?;
    Ok(res.rows_affected())
}

pub async fn find_thread_id_for_post(pool: &AnyPool, post_id: &str) -> Result<Option<String>> {
    let row: Option<String> = sqlx::query_scalar("SELECT thread_id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_posts_for_thread(pool: &AnyPool, thread_id: &str) -> Result<Vec<PostRow>> {
    let rows: Vec<PostRow> = sqlx::query_as(
        "SELECT id, post_number, COALESCE(raw, ''), COALESCE(cooked, '') FROM posts WHERE thread_id = ? ORDER BY post_number ASC, id ASC",
    )
    .bind(thread_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn next_post_number(pool: &AnyPool, thread_id: &str) -> Result<i64> {
    let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(post_number), 0) FROM posts WHERE thread_id = ?")
        .bind(thread_id)
        .fetch_one(pool)
        .await?;
    Ok(max + 1)
}

pub async fn put_thread_media(pool: &AnyPool, thread_id: &str, payload: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO thread_media(thread_id, payload) VALUES(?, ?)\n         ON CONFLICT(thread_id) DO UPDATE SET payload=excluded.payload, updated_at=CURRENT_TIMESTAMP",
    )
    .bind(thread_id)
    .bind(payload)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_thread_media(pool: &AnyPool, thread_id: &str) -> Result<Option<String>> {
    let row: Option<String> = sqlx::query_scalar("SELECT payload FROM thread_media WHERE thread_id = ?")
        .bind(thread_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
