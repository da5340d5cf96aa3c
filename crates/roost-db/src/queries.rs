use crate::Database;
use crate::models::{PostRow, TokenRow, UserRow, UserSummaryRow};
use anyhow::Result;
use rusqlite::Connection;

/// Shared SELECT for post rows: author joined on, like fields computed
/// against the viewer (`?1`) in a single statement.
const POST_SELECT: &str = "SELECT p.id, p.author_id, u.userid, u.username, u.icon_url,
        p.content, p.image_url, p.is_locked, p.replied_post_id, p.created_at,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
        EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1)
     FROM posts p
     JOIN users u ON u.id = p.author_id";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        userid: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, userid, username, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, userid, username, email, password_hash, created_at),
            )?;
            Ok(())
        })
    }

    /// Live (non-deleted) user by email. The `uid` header carries the email.
    pub fn user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1 AND deleted_at IS NULL", email))
    }

    pub fn user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1 AND deleted_at IS NULL", id))
    }

    pub fn user_by_userid(&self, userid: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "userid = ?1 AND deleted_at IS NULL", userid))
    }

    /// Soft-deleted rows keep their email reserved, so this looks at every row.
    pub fn email_taken(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    pub fn userid_taken(&self, userid: &str, exclude_user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE userid = ?1 AND id != ?2)",
                (userid, exclude_user_id),
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    pub fn update_username(&self, user_id: &str, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET username = ?1 WHERE id = ?2", (username, user_id))?;
            Ok(())
        })
    }

    pub fn update_bio(&self, user_id: &str, bio: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET bio = ?1 WHERE id = ?2", (bio, user_id))?;
            Ok(())
        })
    }

    pub fn update_email(&self, user_id: &str, email: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET email = ?1 WHERE id = ?2", (email, user_id))?;
            Ok(())
        })
    }

    pub fn update_userid(&self, user_id: &str, userid: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET userid = ?1 WHERE id = ?2", (userid, user_id))?;
            Ok(())
        })
    }

    pub fn update_icon_url(&self, user_id: &str, icon_url: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET icon_url = ?1 WHERE id = ?2", (icon_url, user_id))?;
            Ok(())
        })
    }

    pub fn set_password(&self, user_id: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET password = ?1 WHERE id = ?2", (password_hash, user_id))?;
            Ok(())
        })
    }

    pub fn disable_lock_description(&self, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET need_description_about_lock = 0 WHERE id = ?1",
                [user_id],
            )?;
            Ok(())
        })
    }

    /// Soft delete: the row stays (email remains reserved) but the user can
    /// no longer authenticate. All of their sessions die with them.
    pub fn soft_delete_user(&self, user_id: &str, deleted_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET deleted_at = ?1 WHERE id = ?2",
                (deleted_at, user_id),
            )?;
            conn.execute("DELETE FROM tokens WHERE user_id = ?1", [user_id])?;
            Ok(())
        })
    }

    // -- Tokens --

    pub fn insert_token(&self, user_id: &str, client: &str, token_hash: &str, expiry: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tokens (user_id, client, token_hash, expiry)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, client, token_hash, expiry],
            )?;
            Ok(())
        })
    }

    pub fn token(&self, user_id: &str, client: &str) -> Result<Option<TokenRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, client, token_hash, expiry FROM tokens
                     WHERE user_id = ?1 AND client = ?2",
                    (user_id, client),
                    |row| {
                        Ok(TokenRow {
                            user_id: row.get(0)?,
                            client: row.get(1)?,
                            token_hash: row.get(2)?,
                            expiry: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn rotate_token(&self, user_id: &str, client: &str, token_hash: &str, expiry: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tokens SET token_hash = ?1, expiry = ?2 WHERE user_id = ?3 AND client = ?4",
                rusqlite::params![token_hash, expiry, user_id, client],
            )?;
            Ok(())
        })
    }

    pub fn delete_token(&self, user_id: &str, client: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM tokens WHERE user_id = ?1 AND client = ?2",
                (user_id, client),
            )?;
            Ok(())
        })
    }

    /// Expired rows are swept on every insert so the table stays bounded.
    pub fn insert_password_reset(&self, user_id: &str, token_hash: &str, expiry: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM password_resets WHERE expiry < unixepoch()", [])?;
            conn.execute(
                "INSERT INTO password_resets (user_id, token_hash, expiry) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, token_hash, expiry],
            )?;
            Ok(())
        })
    }

    // -- Posts --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_post(
        &self,
        id: &str,
        author_id: &str,
        content: Option<&str>,
        image_url: Option<&str>,
        is_locked: bool,
        replied_post_id: Option<&str>,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, content, image_url, is_locked, replied_post_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, author_id, content, image_url, is_locked, replied_post_id, created_at],
            )?;
            Ok(())
        })
    }

    pub fn post(&self, id: &str, viewer_id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("{POST_SELECT} WHERE p.id = ?2");
            let row = conn
                .query_row(&sql, (viewer_id, id), map_post_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Flip the lock flag, returning the new state.
    pub fn toggle_lock(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute("UPDATE posts SET is_locked = 1 - is_locked WHERE id = ?1", [id])?;
            let locked = conn.query_row("SELECT is_locked FROM posts WHERE id = ?1", [id], |row| {
                row.get(0)
            })?;
            Ok(locked)
        })
    }

    /// Posts authored by the viewer or anyone the viewer follows, newest first.
    pub fn timeline(&self, viewer_id: &str, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{POST_SELECT}
                 WHERE p.author_id = ?1
                    OR EXISTS(SELECT 1 FROM follows f
                              WHERE f.follower_id = ?1 AND f.followed_id = p.author_id)
                 ORDER BY p.created_at DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![viewer_id, limit], map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn replies(&self, parent_id: &str, viewer_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{POST_SELECT}
                 WHERE p.replied_post_id = ?2
                 ORDER BY p.created_at ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((viewer_id, parent_id), map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Likes --

    /// Idempotent like; returns the post's like count afterwards.
    pub fn like(&self, post_id: &str, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO likes (post_id, user_id) VALUES (?1, ?2)",
                (post_id, user_id),
            )?;
            count_likes(conn, post_id)
        })
    }

    pub fn unlike(&self, post_id: &str, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
                (post_id, user_id),
            )?;
            count_likes(conn, post_id)
        })
    }

    // -- Follows --

    pub fn follow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                (follower_id, followed_id),
            )?;
            Ok(())
        })
    }

    pub fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                (follower_id, followed_id),
            )?;
            Ok(())
        })
    }

    pub fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let following = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
                (follower_id, followed_id),
                |row| row.get(0),
            )?;
            Ok(following)
        })
    }

    pub fn followers_of(&self, user_id: &str) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            query_summaries(
                conn,
                "SELECT u.userid, u.username, u.bio, u.icon_url
                 FROM follows f JOIN users u ON u.id = f.follower_id
                 WHERE f.followed_id = ?1 AND u.deleted_at IS NULL",
                user_id,
            )
        })
    }

    pub fn followings_of(&self, user_id: &str) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            query_summaries(
                conn,
                "SELECT u.userid, u.username, u.bio, u.icon_url
                 FROM follows f JOIN users u ON u.id = f.followed_id
                 WHERE f.follower_id = ?1 AND u.deleted_at IS NULL",
                user_id,
            )
        })
    }
}

fn query_user(conn: &Connection, predicate: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, userid, username, email, bio, icon_url, password,
                need_description_about_lock, deleted_at, created_at
         FROM users WHERE {predicate}"
    );
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                userid: row.get(1)?,
                username: row.get(2)?,
                email: row.get(3)?,
                bio: row.get(4)?,
                icon_url: row.get(5)?,
                password: row.get(6)?,
                need_description_about_lock: row.get(7)?,
                deleted_at: row.get(8)?,
                created_at: row.get(9)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn map_post_row(row: &rusqlite::Row<'_>) -> std::result::Result<PostRow, rusqlite::Error> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        userid: row.get(2)?,
        username: row.get(3)?,
        icon_url: row.get(4)?,
        content: row.get(5)?,
        image_url: row.get(6)?,
        is_locked: row.get(7)?,
        replied_post_id: row.get(8)?,
        created_at: row.get(9)?,
        likes_count: row.get(10)?,
        liked_by_me: row.get(11)?,
    })
}

fn query_summaries(conn: &Connection, sql: &str, value: &str) -> Result<Vec<UserSummaryRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([value], |row| {
            Ok(UserSummaryRow {
                userid: row.get(0)?,
                username: row.get(1)?,
                bio: row.get(2)?,
                icon_url: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn count_likes(conn: &Connection, post_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        [post_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
