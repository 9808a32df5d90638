use crate::models::{Activity, ActivitySummary, Reply, Slot, SlotCount, User, Vote};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

const SCHEMA: [&str; 8] = [
    r#"
CREATE TABLE IF NOT EXISTS users (
  handle TEXT PRIMARY KEY,
  display_name TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS activities (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_handle TEXT NOT NULL REFERENCES users (handle),
  title TEXT NOT NULL,
  begintime TEXT NOT NULL,
  endtime TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS likes (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  tweet_id INTEGER NOT NULL REFERENCES activities (id),
  user_handle TEXT NOT NULL,
  UNIQUE (tweet_id, user_handle)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS "time" (
  tweet_id INTEGER NOT NULL REFERENCES activities (id),
  user_handle TEXT NOT NULL,
  day TEXT NOT NULL,
  hour INTEGER NOT NULL,
  PRIMARY KEY (tweet_id, user_handle, day, hour)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS replies (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  tweet_id INTEGER NOT NULL REFERENCES activities (id),
  user_handle TEXT NOT NULL REFERENCES users (handle),
  content TEXT NOT NULL,
  created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%S', 'now'))
)
"#,
    "CREATE INDEX IF NOT EXISTS likes_tweet_id ON likes (tweet_id)",
    "CREATE INDEX IF NOT EXISTS replies_tweet_id ON replies (tweet_id)",
    r#"CREATE INDEX IF NOT EXISTS time_tweet_id_day_hour ON "time" (tweet_id, day, hour)"#,
];

pub async fn connect(path: &Path) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    init_schema(&pool).await?;
    info!("database ready at {}", path.display());
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// users

const SQL_UPSERT_USER: &str = r#"
INSERT INTO users (handle, display_name)
VALUES (?, ?)
ON CONFLICT (handle) DO UPDATE SET display_name = excluded.display_name
"#;

pub async fn upsert_user(pool: &SqlitePool, handle: &str, display_name: &str) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_USER)
        .bind(handle)
        .bind(display_name)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_FIND_USER: &str = "SELECT handle, display_name FROM users WHERE handle = ?";

pub async fn find_user(pool: &SqlitePool, handle: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(SQL_FIND_USER)
        .bind(handle)
        .fetch_optional(pool)
        .await
}

// activities

const SQL_INSERT_ACTIVITY: &str = r#"
INSERT INTO activities (user_handle, title, begintime, endtime)
VALUES (?, ?, ?, ?)
"#;

pub async fn insert_activity(
    pool: &SqlitePool,
    handle: &str,
    title: &str,
    begintime: &str,
    endtime: &str,
) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_ACTIVITY)
        .bind(handle)
        .bind(title)
        .bind(begintime)
        .bind(endtime)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

const SQL_FIND_ACTIVITY: &str = r#"
SELECT
  a.id,
  u.display_name AS username,
  a.user_handle AS handle,
  a.title,
  a.begintime,
  a.endtime
FROM activities a
INNER JOIN users u ON u.handle = a.user_handle
WHERE a.id = ?
"#;

pub async fn find_activity(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Activity>> {
    sqlx::query_as::<_, Activity>(SQL_FIND_ACTIVITY)
        .bind(id)
        .fetch_optional(pool)
        .await
}

const SQL_LIST_ACTIVITIES: &str = r#"
SELECT
  a.id,
  u.display_name AS username,
  a.user_handle AS handle,
  a.title,
  a.begintime,
  a.endtime,
  (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = a.id) AS members
FROM activities a
INNER JOIN users u ON u.handle = a.user_handle
ORDER BY a.id DESC
"#;

const SQL_SEARCH_ACTIVITIES: &str = r#"
SELECT
  a.id,
  u.display_name AS username,
  a.user_handle AS handle,
  a.title,
  a.begintime,
  a.endtime,
  (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = a.id) AS members
FROM activities a
INNER JOIN users u ON u.handle = a.user_handle
WHERE a.title LIKE ? ESCAPE '\'
ORDER BY a.id DESC
"#;

/// Newest first. A keyword keeps only titles containing it.
pub async fn list_activities(
    pool: &SqlitePool,
    keyword: Option<&str>,
) -> sqlx::Result<Vec<ActivitySummary>> {
    match keyword {
        Some(keyword) => {
            sqlx::query_as::<_, ActivitySummary>(SQL_SEARCH_ACTIVITIES)
                .bind(contains_pattern(keyword))
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as::<_, ActivitySummary>(SQL_LIST_ACTIVITIES)
                .fetch_all(pool)
                .await
        }
    }
}

// LIKE wildcards in user input match literally
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

// membership

const SQL_INSERT_LIKE: &str = r#"
INSERT INTO likes (tweet_id, user_handle)
VALUES (?, ?)
ON CONFLICT (tweet_id, user_handle) DO NOTHING
"#;

pub async fn insert_like(pool: &SqlitePool, activity_id: i64, handle: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_LIKE)
        .bind(activity_id)
        .bind(handle)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_LIKE: &str = "DELETE FROM likes WHERE tweet_id = ? AND user_handle = ?";

/// Drops the membership together with every vote the participant cast for
/// the activity, so a later re-join starts from an empty selection.
pub async fn delete_like(pool: &SqlitePool, activity_id: i64, handle: &str) -> sqlx::Result<u64> {
    let mut tx = pool.begin().await?;
    let res = sqlx::query(SQL_DELETE_LIKE)
        .bind(activity_id)
        .bind(handle)
        .execute(&mut *tx)
        .await?;
    sqlx::query(SQL_DELETE_PARTICIPANT_VOTES)
        .bind(activity_id)
        .bind(handle)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(res.rows_affected())
}

const SQL_COUNT_MEMBERS: &str = "SELECT COUNT(*) FROM likes WHERE tweet_id = ?";

pub async fn count_members(pool: &SqlitePool, activity_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar(SQL_COUNT_MEMBERS)
        .bind(activity_id)
        .fetch_one(pool)
        .await
}

const SQL_IS_MEMBER: &str = "SELECT COUNT(*) FROM likes WHERE tweet_id = ? AND user_handle = ?";

pub async fn is_member(pool: &SqlitePool, activity_id: i64, handle: &str) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(SQL_IS_MEMBER)
        .bind(activity_id)
        .bind(handle)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

// votes

const SQL_INSERT_VOTE: &str = r#"
INSERT INTO "time" (tweet_id, user_handle, day, hour)
VALUES (?, ?, ?, ?)
ON CONFLICT (tweet_id, user_handle, day, hour) DO NOTHING
"#;

/// Returns 1 when the vote was stored, 0 when it already existed.
pub async fn insert_vote(pool: &SqlitePool, vote: &Vote) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_VOTE)
        .bind(vote.activity_id)
        .bind(&vote.user_handle)
        .bind(&vote.day)
        .bind(vote.hour)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_VOTE: &str = r#"
DELETE FROM "time"
WHERE tweet_id = ? AND user_handle = ? AND day = ? AND hour = ?
"#;

pub async fn delete_vote(pool: &SqlitePool, vote: &Vote) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_VOTE)
        .bind(vote.activity_id)
        .bind(&vote.user_handle)
        .bind(&vote.day)
        .bind(vote.hour)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_PARTICIPANT_VOTES: &str =
    r#"DELETE FROM "time" WHERE tweet_id = ? AND user_handle = ?"#;

pub async fn delete_participant_votes(
    pool: &SqlitePool,
    activity_id: i64,
    handle: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_PARTICIPANT_VOTES)
        .bind(activity_id)
        .bind(handle)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_COUNT_VOTES: &str = r#"
SELECT day, hour, COUNT(*) AS count
FROM "time"
WHERE tweet_id = ?
GROUP BY day, hour
ORDER BY day, hour
"#;

/// Per-slot vote counts for an activity. Slots nobody voted for are absent.
pub async fn count_votes(pool: &SqlitePool, activity_id: i64) -> sqlx::Result<Vec<SlotCount>> {
    sqlx::query_as::<_, SlotCount>(SQL_COUNT_VOTES)
        .bind(activity_id)
        .fetch_all(pool)
        .await
}

const SQL_LIST_PARTICIPANT_VOTES: &str = r#"
SELECT day, hour
FROM "time"
WHERE tweet_id = ? AND user_handle = ?
ORDER BY day, hour
"#;

pub async fn list_participant_votes(
    pool: &SqlitePool,
    activity_id: i64,
    handle: &str,
) -> sqlx::Result<Vec<Slot>> {
    sqlx::query_as::<_, Slot>(SQL_LIST_PARTICIPANT_VOTES)
        .bind(activity_id)
        .bind(handle)
        .fetch_all(pool)
        .await
}

// replies

const SQL_INSERT_REPLY: &str = r#"
INSERT INTO replies (tweet_id, user_handle, content)
VALUES (?, ?, ?)
"#;

pub async fn insert_reply(
    pool: &SqlitePool,
    activity_id: i64,
    handle: &str,
    content: &str,
) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_REPLY)
        .bind(activity_id)
        .bind(handle)
        .bind(content)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

const SQL_FIND_REPLY: &str = r#"
SELECT
  r.id,
  u.display_name AS username,
  r.user_handle AS handle,
  r.content,
  r.created_at
FROM replies r
INNER JOIN users u ON u.handle = r.user_handle
WHERE r.id = ?
"#;

pub async fn find_reply(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Reply>> {
    sqlx::query_as::<_, Reply>(SQL_FIND_REPLY)
        .bind(id)
        .fetch_optional(pool)
        .await
}

const SQL_LIST_REPLIES: &str = r#"
SELECT
  r.id,
  u.display_name AS username,
  r.user_handle AS handle,
  r.content,
  r.created_at
FROM replies r
INNER JOIN users u ON u.handle = r.user_handle
WHERE r.tweet_id = ?
ORDER BY r.created_at DESC, r.id DESC
"#;

/// Newest first; replies posted within the same second keep insertion order.
pub async fn list_replies(pool: &SqlitePool, activity_id: i64) -> sqlx::Result<Vec<Reply>> {
    sqlx::query_as::<_, Reply>(SQL_LIST_REPLIES)
        .bind(activity_id)
        .fetch_all(pool)
        .await
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    init_schema(&pool).await.expect("create schema");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (SqlitePool, i64) {
        let pool = memory_pool().await;
        upsert_user(&pool, "host", "Host").await.unwrap();
        let id = insert_activity(
            &pool,
            "host",
            "board games",
            "2024-01-01 09:00:00",
            "2024-01-03 17:00:00",
        )
        .await
        .unwrap();
        (pool, id)
    }

    fn vote(activity_id: i64, handle: &str, day: &str, hour: u32) -> Vote {
        Vote {
            activity_id,
            user_handle: handle.to_string(),
            day: day.to_string(),
            hour,
        }
    }

    #[tokio::test]
    async fn activity_reads_back_with_owner_name() {
        let (pool, id) = seeded().await;
        let activity = find_activity(&pool, id).await.unwrap().expect("activity");
        assert_eq!(activity.username, "Host");
        assert_eq!(activity.handle, "host");
        assert_eq!(activity.begintime, "2024-01-01 09:00:00");
        assert!(find_activity(&pool, id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_votes_collapse_to_one_row() {
        let (pool, id) = seeded().await;
        let v = vote(id, "alice", "2024-01-02", 10);
        assert_eq!(insert_vote(&pool, &v).await.unwrap(), 1);
        assert_eq!(insert_vote(&pool, &v).await.unwrap(), 0);
        assert_eq!(list_participant_votes(&pool, id, "alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn aggregation_counts_distinct_participants() {
        let (pool, id) = seeded().await;
        for handle in ["alice", "bob", "carol"] {
            insert_vote(&pool, &vote(id, handle, "2024-01-02", 10)).await.unwrap();
        }
        insert_vote(&pool, &vote(id, "alice", "2024-01-02", 11)).await.unwrap();

        let counts = count_votes(&pool, id).await.unwrap();
        assert_eq!(
            counts,
            vec![
                SlotCount {
                    day: "2024-01-02".to_string(),
                    hour: 10,
                    count: 3
                },
                SlotCount {
                    day: "2024-01-02".to_string(),
                    hour: 11,
                    count: 1
                },
            ]
        );
        assert_eq!(counts.iter().map(|c| c.count).sum::<i64>(), 4);
    }

    #[tokio::test]
    async fn leaving_drops_membership_and_votes() {
        let (pool, id) = seeded().await;
        assert_eq!(insert_like(&pool, id, "alice").await.unwrap(), 1);
        assert_eq!(insert_like(&pool, id, "alice").await.unwrap(), 0);
        insert_like(&pool, id, "bob").await.unwrap();
        insert_vote(&pool, &vote(id, "alice", "2024-01-02", 10)).await.unwrap();
        insert_vote(&pool, &vote(id, "bob", "2024-01-02", 10)).await.unwrap();
        assert_eq!(count_members(&pool, id).await.unwrap(), 2);

        assert_eq!(delete_like(&pool, id, "alice").await.unwrap(), 1);
        assert!(!is_member(&pool, id, "alice").await.unwrap());
        assert!(list_participant_votes(&pool, id, "alice").await.unwrap().is_empty());
        assert_eq!(list_participant_votes(&pool, id, "bob").await.unwrap().len(), 1);
        assert_eq!(count_members(&pool, id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listing_includes_member_counts() {
        let (pool, id) = seeded().await;
        insert_like(&pool, id, "host").await.unwrap();
        let listed = list_activities(&pool, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].members, 1);
        assert_eq!(listed[0].title, "board games");
    }

    #[tokio::test]
    async fn keyword_filters_titles_literally() {
        let (pool, _) = seeded().await;
        for title in ["Hiking trip", "100% fun", "movie_night"] {
            insert_activity(&pool, "host", title, "2024-01-01 09:00:00", "2024-01-01 10:00:00")
                .await
                .unwrap();
        }

        let titles = |listed: Vec<ActivitySummary>| -> Vec<String> {
            listed.into_iter().map(|a| a.title).collect()
        };
        let hits = titles(list_activities(&pool, Some("hik")).await.unwrap());
        assert_eq!(hits, vec!["Hiking trip"]);
        let hits = titles(list_activities(&pool, Some("%")).await.unwrap());
        assert_eq!(hits, vec!["100% fun"]);
        let hits = titles(list_activities(&pool, Some("_")).await.unwrap());
        assert_eq!(hits, vec!["movie_night"]);
        assert!(list_activities(&pool, Some("karaoke")).await.unwrap().is_empty());
        assert_eq!(list_activities(&pool, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn replies_list_newest_first_with_author_name() {
        let (pool, id) = seeded().await;
        upsert_user(&pool, "alice", "Alice").await.unwrap();
        let first = insert_reply(&pool, id, "alice", "count me in").await.unwrap();
        let second = insert_reply(&pool, id, "host", "bring snacks").await.unwrap();

        let replies = list_replies(&pool, id).await.unwrap();
        assert_eq!(
            replies.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![second, first]
        );
        assert_eq!(replies[0].username, "Host");
        assert_eq!(replies[1].username, "Alice");
        assert_eq!(replies[1].content, "count me in");
        assert_eq!(replies[1].created_at.len(), "2024-01-01 00:00:00".len());

        let found = find_reply(&pool, first).await.unwrap().expect("reply");
        assert_eq!(found.handle, "alice");
        assert!(list_replies(&pool, id + 1).await.unwrap().is_empty());
    }
}
