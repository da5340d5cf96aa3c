use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            userid          TEXT NOT NULL UNIQUE,
            username        TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            bio             TEXT,
            icon_url        TEXT,
            password        TEXT NOT NULL,
            need_description_about_lock INTEGER NOT NULL DEFAULT 1,
            deleted_at      TEXT,
            created_at      TEXT NOT NULL
        );

        -- One row per signed-in client; the access token is stored hashed
        -- and rewritten on every authenticated request.
        CREATE TABLE IF NOT EXISTS tokens (
            user_id     TEXT NOT NULL REFERENCES users(id),
            client      TEXT NOT NULL,
            token_hash  TEXT NOT NULL,
            expiry      INTEGER NOT NULL,
            PRIMARY KEY (user_id, client)
        );

        CREATE TABLE IF NOT EXISTS password_resets (
            user_id     TEXT NOT NULL REFERENCES users(id),
            token_hash  TEXT NOT NULL,
            expiry      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS posts (
            id              TEXT PRIMARY KEY,
            author_id       TEXT NOT NULL REFERENCES users(id),
            content         TEXT,
            image_url       TEXT,
            is_locked       INTEGER NOT NULL DEFAULT 0,
            replied_post_id TEXT REFERENCES posts(id) ON DELETE CASCADE,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_author
            ON posts(author_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_posts_parent
            ON posts(replied_post_id);

        CREATE TABLE IF NOT EXISTS likes (
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            UNIQUE(post_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_post
            ON likes(post_id);

        CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL REFERENCES users(id),
            followed_id TEXT NOT NULL REFERENCES users(id),
            UNIQUE(follower_id, followed_id)
        );

        CREATE INDEX IF NOT EXISTS idx_follows_follower
            ON follows(follower_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
