// SQLite Graph Store - pooled sqlx implementation of the graph store
// Nodes and edges live in plain tables; every write is one transaction that
// opens with its write statement so SQLite takes the write lock up front.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::Row;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{store_error, AppError, AppResult};
use crate::infrastructure::graph_store::GraphStore;
use crate::models::{
    canonical_pair, Friendship, FriendshipMerge, LikeOutcome, NewPost, NewUser, Post, PostLikes,
    User,
};

const FRIENDSHIP_COLUMNS: &str =
    "user_low, user_high, requested_by, accepted, created_at, accepted_at";
const POST_COLUMNS: &str = "id, owner, content, like_count, image_url, created_at";

/// SQLite implementation of the graph store
pub struct SqliteGraphStore {
    pool: SqlitePool,
}

impl SqliteGraphStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `config.url` and apply the schema.
    ///
    /// In-memory databases live and die with their connection, so they get a
    /// single connection that is never recycled.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let in_memory = config.url.contains(":memory:") || config.url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::Configuration(format!("Invalid DATABASE_URL {}: {}", config.url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool_options =
            SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

        let pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            let filename = options.clone().get_filename();
            if let Some(parent) = filename.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::Configuration(format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
            pool_options
                .max_connections(config.max_connections.max(1))
                .min_connections(config.min_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| store_error("Failed to connect to SQLite", e))?;

        let store = Self::new(pool);
        store.initialize().await?;
        info!("SQLite graph store ready at {}", config.url);
        Ok(store)
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn initialize(&self) -> AppResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL REFERENCES users(username),
                content TEXT NOT NULL,
                like_count INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
                image_url TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_posts_owner ON posts(owner)",
            r#"
            CREATE TABLE IF NOT EXISTS post_comments (
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (post_id, position)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS friendships (
                user_low TEXT NOT NULL REFERENCES users(username),
                user_high TEXT NOT NULL REFERENCES users(username),
                requested_by TEXT NOT NULL,
                accepted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                accepted_at TEXT,
                PRIMARY KEY (user_low, user_high),
                CHECK (user_low < user_high)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_friendships_high ON friendships(user_high)",
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                username TEXT NOT NULL REFERENCES users(username),
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                liked_at TEXT NOT NULL,
                PRIMARY KEY (username, post_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| store_error("Failed to apply schema", e))?;
        }

        debug!("Graph schema applied");
        Ok(())
    }

    /// Health check to verify database connectivity
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Database health check failed", e))?;
        Ok(())
    }

    /// Idle and total connections in the pool
    pub fn pool_stats(&self) -> (u32, u32) {
        (self.pool.num_idle() as u32, self.pool.size())
    }

    async fn user_exists(conn: &mut SqliteConnection, username: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| store_error("Failed to look up user", e))?;
        Ok(row.is_some())
    }

    async fn require_user(conn: &mut SqliteConnection, username: &str) -> AppResult<()> {
        if Self::user_exists(conn, username).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("User {} not found", username)))
        }
    }

    async fn require_post(conn: &mut SqliteConnection, post_id: &str) -> AppResult<()> {
        let row = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| store_error("Failed to look up post", e))?;
        match row {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Post {} not found", post_id))),
        }
    }

    async fn load_friendship(
        conn: &mut SqliteConnection,
        a: &str,
        b: &str,
    ) -> AppResult<Option<Friendship>> {
        let (low, high) = canonical_pair(a, b);
        let row = sqlx::query(&format!(
            "SELECT {} FROM friendships WHERE user_low = ? AND user_high = ?",
            FRIENDSHIP_COLUMNS
        ))
        .bind(low)
        .bind(high)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| store_error("Failed to load friendship", e))?;

        row.as_ref().map(decode_friendship).transpose()
    }

    async fn load_post(conn: &mut SqliteConnection, post_id: &str) -> AppResult<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(post_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| store_error(&format!("Failed to get post {}", post_id), e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let comments = sqlx::query(
            "SELECT body FROM post_comments WHERE post_id = ? ORDER BY position",
        )
        .bind(post_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| store_error("Failed to get comments", e))?
        .iter()
        .map(|row| row.try_get::<String, _>("body"))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| store_error("Failed to decode comment", e))?;

        decode_post(&row, comments).map(Some)
    }

    async fn load_post_likes(
        conn: &mut SqliteConnection,
        post_id: &str,
    ) -> AppResult<Option<PostLikes>> {
        let row = sqlx::query("SELECT like_count FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| store_error("Failed to read like count", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let like_count = decode_count(&row, "like_count")?;

        let likers = sqlx::query(
            "SELECT username FROM likes WHERE post_id = ? ORDER BY liked_at, rowid",
        )
        .bind(post_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| store_error("Failed to read likers", e))?
        .iter()
        .map(|row| row.try_get::<String, _>("username"))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| store_error("Failed to decode liker", e))?;

        Ok(Some(PostLikes { like_count, likers }))
    }
}

fn decode_user(row: &SqliteRow) -> AppResult<User> {
    let decode = || -> Result<User, sqlx::Error> {
        Ok(User {
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        })
    };
    decode().map_err(|e| store_error("Failed to decode user", e))
}

fn decode_friendship(row: &SqliteRow) -> AppResult<Friendship> {
    let decode = || -> Result<Friendship, sqlx::Error> {
        Ok(Friendship {
            user_low: row.try_get("user_low")?,
            user_high: row.try_get("user_high")?,
            requested_by: row.try_get("requested_by")?,
            accepted: row.try_get("accepted")?,
            created_at: row.try_get("created_at")?,
            accepted_at: row.try_get::<Option<DateTime<Utc>>, _>("accepted_at")?,
        })
    };
    let friendship = decode().map_err(|e| store_error("Failed to decode friendship", e))?;

    if friendship.requested_by != friendship.user_low
        && friendship.requested_by != friendship.user_high
    {
        return Err(AppError::InvariantViolation(format!(
            "Friendship {}-{} was requested by outsider {}",
            friendship.user_low, friendship.user_high, friendship.requested_by
        )));
    }
    Ok(friendship)
}

fn decode_post(row: &SqliteRow, comments: Vec<String>) -> AppResult<Post> {
    let decode = || -> Result<(String, String, String, Option<String>, DateTime<Utc>), sqlx::Error> {
        Ok((
            row.try_get("id")?,
            row.try_get("owner")?,
            row.try_get("content")?,
            row.try_get("image_url")?,
            row.try_get("created_at")?,
        ))
    };
    let (id, owner, content, image_url, created_at) =
        decode().map_err(|e| store_error("Failed to decode post", e))?;

    Ok(Post {
        id,
        owner,
        content,
        like_count: decode_count(row, "like_count")?,
        comments,
        image_url,
        created_at,
    })
}

/// Counters are stored as SQLite integers; a negative value is corrupt data.
fn decode_count(row: &SqliteRow, column: &str) -> AppResult<u64> {
    let raw: i64 = row
        .try_get(column)
        .map_err(|e| store_error("Failed to decode counter", e))?;
    u64::try_from(raw).map_err(|_| {
        AppError::InvariantViolation(format!("Counter {} is negative: {}", column, raw))
    })
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (username, password_hash, email, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match store_error("Failed to create user", e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Username {} is already taken", user.username))
            }
            other => other,
        })?;

        Ok(User {
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            created_at: now,
        })
    }

    async fn find_user(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT username, password_hash, email, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to get user", e))?;

        row.as_ref().map(decode_user).transpose()
    }

    async fn merge_friendship(&self, sender: &str, recipient: &str) -> AppResult<FriendshipMerge> {
        if sender == recipient {
            return Err(AppError::BadRequest(format!(
                "{} cannot befriend themselves",
                sender
            )));
        }
        let (low, high) = canonical_pair(sender, recipient);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO friendships (user_low, user_high, requested_by, accepted, created_at)
            SELECT ?, ?, ?, 0, ?
            WHERE EXISTS (SELECT 1 FROM users WHERE username = ?)
              AND EXISTS (SELECT 1 FROM users WHERE username = ?)
            ON CONFLICT (user_low, user_high) DO NOTHING
            "#,
        )
        .bind(low)
        .bind(high)
        .bind(sender)
        .bind(Utc::now())
        .bind(sender)
        .bind(recipient)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to merge friendship", e))?;

        let created = result.rows_affected() == 1;
        let friendship = match Self::load_friendship(&mut tx, sender, recipient).await? {
            Some(friendship) => friendship,
            None => {
                // Nothing inserted and nothing there: one side does not exist
                Self::require_user(&mut tx, sender).await?;
                Self::require_user(&mut tx, recipient).await?;
                return Err(AppError::InvariantViolation(format!(
                    "Friendship {}-{} neither created nor found",
                    low, high
                )));
            }
        };

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to commit friendship", e))?;

        Ok(if created {
            FriendshipMerge::Created(friendship)
        } else {
            FriendshipMerge::Existing(friendship)
        })
    }

    async fn accept_friendship(&self, a: &str, b: &str) -> AppResult<Friendship> {
        let (low, high) = canonical_pair(a, b);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE friendships
            SET accepted = 1, accepted_at = COALESCE(accepted_at, ?)
            WHERE user_low = ? AND user_high = ?
            "#,
        )
        .bind(Utc::now())
        .bind(low)
        .bind(high)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to accept friendship", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No friend request between {} and {}",
                a, b
            )));
        }

        let friendship = Self::load_friendship(&mut tx, a, b).await?.ok_or_else(|| {
            AppError::InvariantViolation(format!("Accepted friendship {}-{} vanished", low, high))
        })?;

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to commit friendship", e))?;
        Ok(friendship)
    }

    async fn delete_friendship(&self, a: &str, b: &str) -> AppResult<bool> {
        let (low, high) = canonical_pair(a, b);
        let result = sqlx::query("DELETE FROM friendships WHERE user_low = ? AND user_high = ?")
            .bind(low)
            .bind(high)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to delete friendship", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_friendship(&self, a: &str, b: &str) -> AppResult<Option<Friendship>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", e))?;
        Self::load_friendship(&mut conn, a, b).await
    }

    async fn friendships_of(&self, username: &str) -> AppResult<Vec<Friendship>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        Self::require_user(&mut tx, username).await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM friendships WHERE user_low = ? OR user_high = ? \
             ORDER BY created_at, user_low, user_high",
            FRIENDSHIP_COLUMNS
        ))
        .bind(username)
        .bind(username)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to list friendships", e))?;

        let friendships = rows
            .iter()
            .map(decode_friendship)
            .collect::<AppResult<Vec<_>>>()?;

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to finish read", e))?;
        Ok(friendships)
    }

    async fn create_post(&self, owner: &str, post: NewPost) -> AppResult<Post> {
        let id = post.id.ok_or_else(|| {
            AppError::BadRequest("Post id must be assigned before storing".to_string())
        })?;
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (id, owner, content, like_count, image_url, created_at)
            SELECT ?, ?, ?, 0, ?, ?
            WHERE EXISTS (SELECT 1 FROM users WHERE username = ?)
            "#,
        )
        .bind(&id)
        .bind(owner)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(now)
        .bind(owner)
        .execute(&mut *tx)
        .await
        .map_err(|e| match store_error("Failed to create post", e) {
            AppError::Conflict(_) => AppError::Conflict(format!("Post {} already exists", id)),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", owner)));
        }

        for (position, body) in post.comments.iter().enumerate() {
            sqlx::query("INSERT INTO post_comments (post_id, position, body) VALUES (?, ?, ?)")
                .bind(&id)
                .bind(position as i64)
                .bind(body)
                .execute(&mut *tx)
                .await
                .map_err(|e| store_error("Failed to store comment", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to commit post", e))?;

        Ok(Post {
            id,
            owner: owner.to_string(),
            content: post.content,
            like_count: 0,
            comments: post.comments,
            image_url: post.image_url,
            created_at: now,
        })
    }

    async fn posts_by(&self, owner: &str) -> AppResult<Vec<Post>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        Self::require_user(&mut tx, owner).await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE owner = ? ORDER BY rowid",
            POST_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| store_error(&format!("Failed to get posts of {}", owner), e))?;

        let comment_rows = sqlx::query(
            r#"
            SELECT c.post_id, c.body
            FROM post_comments c
            JOIN posts p ON p.id = c.post_id
            WHERE p.owner = ?
            ORDER BY c.post_id, c.position
            "#,
        )
        .bind(owner)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to get comments", e))?;

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to finish read", e))?;

        let mut comments: HashMap<String, Vec<String>> = HashMap::new();
        for row in &comment_rows {
            let post_id: String = row
                .try_get("post_id")
                .map_err(|e| store_error("Failed to decode comment", e))?;
            let body: String = row
                .try_get("body")
                .map_err(|e| store_error("Failed to decode comment", e))?;
            comments.entry(post_id).or_default().push(body);
        }

        rows.iter()
            .map(|row| {
                let id: String = row
                    .try_get("id")
                    .map_err(|e| store_error("Failed to decode post", e))?;
                decode_post(row, comments.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn find_post(&self, post_id: &str) -> AppResult<Option<Post>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;
        let post = Self::load_post(&mut tx, post_id).await?;
        tx.commit()
            .await
            .map_err(|e| store_error("Failed to finish read", e))?;
        Ok(post)
    }

    async fn delete_post(&self, owner: &str, post_id: &str) -> AppResult<bool> {
        // LIKED edges and comments go with the post through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = ? AND owner = ?")
            .bind(post_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error(&format!("Failed to delete post {}", post_id), e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_comment(&self, post_id: &str, body: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_comments (post_id, position, body)
            SELECT p.id,
                   (SELECT COALESCE(MAX(position) + 1, 0) FROM post_comments WHERE post_id = p.id),
                   ?
            FROM posts p
            WHERE p.id = ?
            "#,
        )
        .bind(body)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to append comment", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }
        Ok(())
    }

    async fn merge_like(&self, liker: &str, post_id: &str) -> AppResult<LikeOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO likes (username, post_id, liked_at)
            SELECT ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM posts WHERE id = ?)
              AND EXISTS (SELECT 1 FROM users WHERE username = ?)
            ON CONFLICT (username, post_id) DO NOTHING
            "#,
        )
        .bind(liker)
        .bind(post_id)
        .bind(Utc::now())
        .bind(post_id)
        .bind(liker)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to merge like", e))?;

        let created = result.rows_affected() == 1;
        if created {
            sqlx::query("UPDATE posts SET like_count = like_count + 1 WHERE id = ?")
                .bind(post_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| store_error("Failed to increment like count", e))?;
        } else {
            Self::require_post(&mut tx, post_id).await?;
            Self::require_user(&mut tx, liker).await?;
        }

        let likes = Self::load_post_likes(&mut tx, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        if !likes.is_consistent() {
            // Dropping the transaction rolls the like back
            return Err(AppError::InvariantViolation(format!(
                "Post {} like_count {} does not match {} LIKED edges",
                post_id,
                likes.like_count,
                likes.likers.len()
            )));
        }

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to commit like", e))?;

        Ok(LikeOutcome {
            created,
            like_count: likes.like_count,
        })
    }

    async fn post_likes(&self, post_id: &str) -> AppResult<PostLikes> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;
        let likes = Self::load_post_likes(&mut tx, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
        tx.commit()
            .await
            .map_err(|e| store_error("Failed to finish read", e))?;
        Ok(likes)
    }
}
