/// Database row types. These map directly to SQLite rows.
/// Distinct from the roost-types API payloads so the DB layer stays
/// independent of wire shapes.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub userid: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub icon_url: Option<String>,
    pub password: String,
    pub need_description_about_lock: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct TokenRow {
    pub user_id: String,
    pub client: String,
    pub token_hash: String,
    pub expiry: i64,
}

/// One post with its author joined on and the viewer-dependent like
/// fields computed in SQL.
#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub userid: String,
    pub username: String,
    pub icon_url: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_locked: bool,
    pub replied_post_id: Option<String>,
    pub likes_count: i64,
    pub liked_by_me: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct UserSummaryRow {
    pub userid: String,
    pub username: String,
    pub bio: Option<String>,
    pub icon_url: Option<String>,
}
