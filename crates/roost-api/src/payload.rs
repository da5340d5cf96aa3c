//! Row-to-wire mapping helpers shared by the handler modules.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use roost_db::models::{PostRow, UserRow, UserSummaryRow};
use roost_types::api::{PostData, UserData, UserSummary};

pub fn parse_uuid(value: &str, context: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt uuid '{}' in {}: {}", value, context, e);
        Uuid::default()
    })
}

pub fn parse_datetime(value: &str, context: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') format has no timezone marker.
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' in {}: {}", value, context, e);
            DateTime::default()
        })
}

pub fn user_data(row: &UserRow) -> UserData {
    UserData {
        id: parse_uuid(&row.id, "users.id"),
        userid: row.userid.clone(),
        username: row.username.clone(),
        email: row.email.clone(),
        bio: row.bio.clone(),
        icon_url: row.icon_url.clone(),
        need_description_about_lock: row.need_description_about_lock,
        created_at: parse_datetime(&row.created_at, "users.created_at"),
    }
}

pub fn post_data(row: &PostRow) -> PostData {
    PostData {
        id: parse_uuid(&row.id, "posts.id"),
        userid: row.userid.clone(),
        username: row.username.clone(),
        icon_url: row.icon_url.clone(),
        content: row.content.clone(),
        image_url: row.image_url.clone(),
        is_locked: row.is_locked,
        replied_post_id: row
            .replied_post_id
            .as_deref()
            .map(|id| parse_uuid(id, "posts.replied_post_id")),
        likes_count: row.likes_count,
        liked_by_me: row.liked_by_me,
        created_at: parse_datetime(&row.created_at, "posts.created_at"),
    }
}

pub fn user_summary(row: &UserSummaryRow) -> UserSummary {
    UserSummary {
        userid: row.userid.clone(),
        username: row.username.clone(),
        bio: row.bio.clone(),
        icon_url: row.icon_url.clone(),
    }
}

/// Timestamps are written with microsecond precision so newest-first
/// ordering is stable within the same second.
pub fn now_string() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
