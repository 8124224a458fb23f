use crate::Database;
use crate::models::{NoteRow, UserRow};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str = "id, username, email, password, created_at";
const NOTE_COLUMNS: &str = "id, title, content, user_id, created_at, updated_at";

/// Timestamps are stored as fixed-width RFC 3339 strings so that text
/// ordering matches chronological ordering.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    // -- Users --

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    /// Returns a user whose email OR username matches. Used to reject
    /// duplicate sign-ups before hashing the password.
    pub fn find_user_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 OR username = ?2 LIMIT 1"),
                rusqlite::params![email, username],
            )
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                rusqlite::params![email],
            )
        })
    }

    pub fn find_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                rusqlite::params![id],
            )
        })
    }

    /// Fails on a uniqueness violation (email or username already taken).
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRow> {
        let created_at = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, username, email, password_hash, created_at],
            )?;
            Ok(UserRow {
                id: id.to_string(),
                username: username.to_string(),
                email: email.to_string(),
                password: password_hash.to_string(),
                created_at,
            })
        })
    }

    // -- Notes --
    //
    // Every read and write below carries `user_id` in its predicate. That is
    // the only thing keeping one user's notes away from another.

    pub fn list_notes(&self, user_id: &str) -> Result<Vec<NoteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ?1 ORDER BY updated_at DESC"
            ))?;

            let rows = stmt
                .query_map([user_id], note_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_note(&self, id: &str, user_id: &str) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND user_id = ?2"),
                rusqlite::params![id, user_id],
                note_from_row,
            )
            .optional()
        })
    }

    pub fn create_note(&self, id: &str, user_id: &str, title: &str, content: &str) -> Result<NoteRow> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notes (id, title, content, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, title, content, user_id, now],
            )?;
            Ok(NoteRow {
                id: id.to_string(),
                title: title.to_string(),
                content: content.to_string(),
                user_id: user_id.to_string(),
                created_at: now.clone(),
                updated_at: now,
            })
        })
    }

    /// Overwrite title and/or content of a note owned by `user_id` in one
    /// statement. `None` keeps the stored value. Returns `None` when no such
    /// note exists for this owner.
    pub fn update_note(
        &self,
        id: &str,
        user_id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<NoteRow>> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "UPDATE notes
                     SET title = COALESCE(?3, title),
                         content = COALESCE(?4, content),
                         updated_at = ?5
                     WHERE id = ?1 AND user_id = ?2
                     RETURNING {NOTE_COLUMNS}"
                ),
                rusqlite::params![id, user_id, title, content, now],
                note_from_row,
            )
            .optional()
        })
    }

    /// Returns whether a note was removed.
    pub fn delete_note(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Most recently updated note of `user_id` whose title or content
    /// contains `query`, ignoring case (Unicode-aware).
    pub fn search_first_note(&self, user_id: &str, query: &str) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {NOTE_COLUMNS} FROM notes
                     WHERE user_id = ?1
                       AND (instr(unicode_lower(title), unicode_lower(?2)) > 0
                            OR instr(unicode_lower(content), unicode_lower(?2)) > 0)
                     ORDER BY updated_at DESC
                     LIMIT 1"
                ),
                rusqlite::params![user_id, query],
                note_from_row,
            )
            .optional()
        })
    }
}

fn query_user(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<UserRow>> {
    conn.query_row(sql, params, |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            created_at: row.get(4)?,
        })
    })
    .optional()
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
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

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn db_with_user(email: &str, username: &str) -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let id = new_id();
        db.create_user(&id, email, username, "hash").unwrap();
        (db, id)
    }

    #[test]
    fn create_and_find_users() {
        let (db, id) = db_with_user("al@x.com", "al");
        assert_eq!(db.count_users().unwrap(), 1);

        let by_email = db.find_user_by_email("al@x.com").unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert_eq!(by_email.username, "al");

        assert!(db.find_user_by_email("nobody@x.com").unwrap().is_none());
        assert_eq!(db.find_user_by_id(&id).unwrap().unwrap().email, "al@x.com");
    }

    #[test]
    fn duplicate_lookup_matches_either_field() {
        let (db, _) = db_with_user("al@x.com", "al");

        assert!(db.find_user_by_email_or_username("al@x.com", "other").unwrap().is_some());
        assert!(db.find_user_by_email_or_username("other@x.com", "al").unwrap().is_some());
        assert!(db.find_user_by_email_or_username("other@x.com", "other").unwrap().is_none());
    }

    #[test]
    fn unique_violation_is_an_error() {
        let (db, _) = db_with_user("al@x.com", "al");

        assert!(db.create_user(&new_id(), "al@x.com", "bob", "hash").is_err());
        assert!(db.create_user(&new_id(), "bob@x.com", "al", "hash").is_err());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn notes_are_scoped_to_owner() {
        let (db, alice) = db_with_user("al@x.com", "al");
        let bob = new_id();
        db.create_user(&bob, "bob@x.com", "bob", "hash").unwrap();

        let note_id = new_id();
        db.create_note(&note_id, &alice, "shopping", "milk, eggs").unwrap();

        assert!(db.get_note(&note_id, &bob).unwrap().is_none());
        assert!(db.list_notes(&bob).unwrap().is_empty());
        assert!(db.update_note(&note_id, &bob, Some("x"), None).unwrap().is_none());
        assert!(!db.delete_note(&note_id, &bob).unwrap());
        assert!(db.search_first_note(&bob, "milk").unwrap().is_none());

        let note = db.get_note(&note_id, &alice).unwrap().unwrap();
        assert_eq!(note.title, "shopping");
        assert_eq!(note.content, "milk, eggs");
    }

    #[test]
    fn update_keeps_missing_fields_and_bumps_timestamp() {
        let (db, alice) = db_with_user("al@x.com", "al");
        let note_id = new_id();
        let created = db.create_note(&note_id, &alice, "title", "body").unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        let updated = db.update_note(&note_id, &alice, None, Some("new body")).unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.user_id, alice);
        assert_eq!(updated.title, "title");
        assert_eq!(updated.content, "new body");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[test]
    fn list_orders_by_most_recent_update() {
        let (db, alice) = db_with_user("al@x.com", "al");
        let first = new_id();
        let second = new_id();
        db.create_note(&first, &alice, "first", "").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        db.create_note(&second, &alice, "second", "").unwrap();

        let ids: Vec<String> = db.list_notes(&alice).unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second.clone(), first.clone()]);

        std::thread::sleep(std::time::Duration::from_millis(5));
        db.update_note(&first, &alice, Some("first again"), None).unwrap();
        let ids: Vec<String> = db.list_notes(&alice).unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn delete_removes_once() {
        let (db, alice) = db_with_user("al@x.com", "al");
        let note_id = new_id();
        db.create_note(&note_id, &alice, "t", "c").unwrap();

        assert!(db.delete_note(&note_id, &alice).unwrap());
        assert!(!db.delete_note(&note_id, &alice).unwrap());
        assert!(db.get_note(&note_id, &alice).unwrap().is_none());
    }

    #[test]
    fn search_matches_title_or_content_case_insensitively() {
        let (db, alice) = db_with_user("al@x.com", "al");
        let in_title = new_id();
        let in_content = new_id();
        db.create_note(&in_title, &alice, "Groceries", "nothing here").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        db.create_note(&in_content, &alice, "Todo", "buy GROCERIES later").unwrap();

        // both match; the most recently updated one wins
        let hit = db.search_first_note(&alice, "groceries").unwrap().unwrap();
        assert_eq!(hit.id, in_content);

        let hit = db.search_first_note(&alice, "NOTHING").unwrap().unwrap();
        assert_eq!(hit.id, in_title);

        assert!(db.search_first_note(&alice, "absent").unwrap().is_none());
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let (db, alice) = db_with_user("al@x.com", "al");
        let note_id = new_id();
        db.create_note(&note_id, &alice, "Ärger im Büro", "ÜBERSTUNDEN").unwrap();

        for q in ["ärger", "ÄRGER", "büro", "überstunden", "Überstunden"] {
            let hit = db.search_first_note(&alice, q).unwrap();
            assert_eq!(hit.map(|n| n.id).as_deref(), Some(note_id.as_str()), "{}", q);
        }
        assert!(db.search_first_note(&alice, "urlaub").unwrap().is_none());
    }

    #[test]
    fn search_treats_like_wildcards_literally() {
        let (db, alice) = db_with_user("al@x.com", "al");
        db.create_note(&new_id(), &alice, "plain", "text").unwrap();

        assert!(db.search_first_note(&alice, "%").unwrap().is_none());
        assert!(db.search_first_note(&alice, "_").unwrap().is_none());
    }

    #[test]
    fn note_requires_existing_owner() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_note(&new_id(), &new_id(), "t", "c").is_err());
    }

    #[test]
    fn migrations_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| crate::migrations::run(conn)).unwrap();
        assert_eq!(db.count_users().unwrap(), 0);
    }
}
