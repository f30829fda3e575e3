//! On-disk messenger database fixtures for tests

use std::path::{Path, PathBuf};
use rusqlite::{Connection, params};
use tempfile::TempDir;
use super::Store;

const FIXTURE_SCHEMA: &str = r#"
CREATE TABLE jid (_id INTEGER PRIMARY KEY AUTOINCREMENT, user TEXT, server TEXT, raw_string TEXT);
CREATE TABLE chat (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    jid_row_id INTEGER,
    hidden INTEGER DEFAULT 0,
    subject TEXT,
    created_timestamp INTEGER
);
CREATE TABLE message (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_row_id INTEGER,
    from_me INTEGER,
    key_id TEXT,
    sender_jid_row_id INTEGER,
    status INTEGER,
    timestamp INTEGER,
    message_type INTEGER DEFAULT 0,
    text_data TEXT
);
CREATE TABLE message_media (
    message_row_id INTEGER PRIMARY KEY,
    message_url TEXT,
    mime_type TEXT,
    file_length INTEGER,
    media_name TEXT,
    media_caption TEXT,
    media_duration INTEGER
);
CREATE TABLE message_location (message_row_id INTEGER PRIMARY KEY, latitude REAL, longitude REAL);
CREATE TABLE message_thumbnail (message_row_id INTEGER PRIMARY KEY, thumbnail BLOB);
CREATE TABLE message_quoted (_id INTEGER PRIMARY KEY AUTOINCREMENT, message_row_id INTEGER, key_id TEXT);
CREATE TABLE message_quoted_media (message_row_id INTEGER PRIMARY KEY, thumbnail BLOB);
CREATE TABLE message_link (_id INTEGER PRIMARY KEY AUTOINCREMENT, message_row_id INTEGER);
CREATE TABLE message_thumbnails (thumbnail BLOB, timestamp INTEGER, key_remote_jid TEXT, key_from_me INTEGER, key_id TEXT);
CREATE TABLE messages_quotes (_id INTEGER PRIMARY KEY AUTOINCREMENT, key_remote_jid TEXT, key_id TEXT);
"#;

/// A messenger database in a temporary directory, with a writable connection
/// for seeding rows. Readers open it separately through [`Fixture::open`].
pub(crate) struct Fixture {
    _dir: TempDir,
    path: PathBuf,
    conn: Connection,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let fixture = Self::empty();
        fixture.conn.execute_batch(FIXTURE_SCHEMA).unwrap();
        fixture
    }

    /// A database file with no tables at all
    pub(crate) fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msgstore.db");
        let conn = Connection::open(&path).unwrap();
        Self { _dir: dir, path, conn }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn open(&self) -> Store {
        Store::open(&self.path).unwrap()
    }

    pub(crate) fn execute(&self, sql: &str) {
        self.conn.execute_batch(sql).unwrap();
    }

    pub(crate) fn add_jid(&self, raw_string: &str, user: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO jid (user, raw_string) VALUES (?1, ?2)",
                params![user, raw_string],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub(crate) fn add_chat(&self, jid: i64, subject: Option<&str>, created: i64) -> i64 {
        self.conn
            .execute(
                "INSERT INTO chat (jid_row_id, hidden, subject, created_timestamp) VALUES (?1, 0, ?2, ?3)",
                params![jid, subject, created],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub(crate) fn hide_chat(&self, chat: i64) {
        self.conn
            .execute("UPDATE chat SET hidden = 1 WHERE _id = ?1", [chat])
            .unwrap();
    }

    pub(crate) fn add_message(&self, chat: i64, key_id: &str, from_me: bool, timestamp: i64, text: Option<&str>) -> i64 {
        self.conn
            .execute(
                "INSERT INTO message (chat_row_id, from_me, key_id, status, timestamp, text_data) VALUES (?1, ?2, ?3, 0, ?4, ?5)",
                params![chat, from_me as i64, key_id, timestamp, text],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub(crate) fn set_status(&self, message: i64, status: i64) {
        self.conn
            .execute("UPDATE message SET status = ?2 WHERE _id = ?1", params![message, status])
            .unwrap();
    }

    pub(crate) fn set_message_type(&self, message: i64, message_type: i64) {
        self.conn
            .execute("UPDATE message SET message_type = ?2 WHERE _id = ?1", params![message, message_type])
            .unwrap();
    }

    pub(crate) fn set_sender(&self, message: i64, jid: i64) {
        self.conn
            .execute("UPDATE message SET sender_jid_row_id = ?2 WHERE _id = ?1", params![message, jid])
            .unwrap();
    }

    pub(crate) fn add_quote(&self, message: i64, quoted_key_id: &str) {
        self.conn
            .execute(
                "INSERT INTO message_quoted (message_row_id, key_id) VALUES (?1, ?2)",
                params![message, quoted_key_id],
            )
            .unwrap();
    }

    pub(crate) fn add_quoted_thumbnail(&self, message: i64, thumbnail: &[u8]) {
        self.conn
            .execute(
                "INSERT INTO message_quoted_media (message_row_id, thumbnail) VALUES (?1, ?2)",
                params![message, thumbnail],
            )
            .unwrap();
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add_media(
        &self,
        message: i64,
        url: &str,
        mime_type: &str,
        size: i64,
        name: &str,
        caption: Option<&str>,
        duration: i64,
    ) {
        self.conn
            .execute(
                "INSERT INTO message_media (message_row_id, message_url, mime_type, file_length, media_name, media_caption, media_duration) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![message, url, mime_type, size, name, caption, duration],
            )
            .unwrap();
    }

    pub(crate) fn add_location(&self, message: i64, latitude: Option<f64>, longitude: Option<f64>) {
        self.conn
            .execute(
                "INSERT INTO message_location (message_row_id, latitude, longitude) VALUES (?1, ?2, ?3)",
                params![message, latitude, longitude],
            )
            .unwrap();
    }

    pub(crate) fn add_thumbnail(&self, message: i64, thumbnail: Option<&[u8]>) {
        self.conn
            .execute(
                "INSERT INTO message_thumbnail (message_row_id, thumbnail) VALUES (?1, ?2)",
                params![message, thumbnail],
            )
            .unwrap();
    }

    pub(crate) fn add_link(&self, message: i64) {
        self.conn
            .execute("INSERT INTO message_link (message_row_id) VALUES (?1)", [message])
            .unwrap();
    }

    /// One direct chat with `count` alternating messages, keys `M0..`, timestamps `1000, 1010, ..`
    pub(crate) fn seed_conversation(&self, raw_string: &str, count: usize) -> i64 {
        let jid = self.add_jid(raw_string, raw_string.split('@').next().unwrap_or(raw_string));
        let chat = self.add_chat(jid, None, 1);
        for i in 0..count {
            self.add_message(
                chat,
                &format!("M{}", i),
                i % 2 == 0,
                1000 + (i as i64) * 10,
                Some(&format!("message {}", i)),
            );
        }
        chat
    }
}
