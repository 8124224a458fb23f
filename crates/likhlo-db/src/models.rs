/// Database row types. These map directly to SQLite rows and are kept
/// separate from the likhlo-types wire models so the db layer stands alone.
/// Ids are UUID strings and timestamps are RFC 3339 UTC strings.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NoteRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}
