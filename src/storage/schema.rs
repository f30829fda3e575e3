//! Schema requirements and the fixed query shapes used against the
//! messenger database

/// Tables that only exist in databases new enough for this reader
pub const REQUIRED_TABLES: &[&str] = &["message_thumbnails", "messages_quotes", "message_link"];

/// (table, column) pairs added in the supported schema generation
pub const REQUIRED_COLUMNS: &[(&str, &str)] = &[
    ("message_quoted", "message_row_id"),
    ("message_media", "media_caption"),
];

/// Exact-name lookup in the system catalog
pub const TABLE_EXISTS_QUERY: &str = "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1";

/// Column descriptors of one table; column 0 is the column name
pub const TABLE_COLUMNS_QUERY: &str = "SELECT name FROM pragma_table_info(?1)";

/// Chats grouped by (key, subject, creation), newest activity first.
/// Chats without messages have a NULL maximum and sort last.
pub const CHAT_LIST_QUERY: &str = r#"
SELECT j.raw_string, c.subject, c.created_timestamp, MAX(m.timestamp)
FROM chat c
JOIN jid j ON j._id = c.jid_row_id
LEFT JOIN message m ON m.chat_row_id = c._id
WHERE c.hidden = 0
GROUP BY j.raw_string, c.subject, c.created_timestamp
ORDER BY MAX(m.timestamp) DESC NULLS LAST
"#;

/// Messages of all chats sharing an identity key, filtered by direction
pub const MESSAGE_COUNT_QUERY: &str = r#"
SELECT count(m._id)
FROM message m
JOIN chat c ON c._id = m.chat_row_id
JOIN jid j ON j._id = c.jid_row_id
WHERE j.raw_string = ?1 AND m.from_me = ?2
"#;

/// The wide message join. Column positions are listed in [`message_columns`].
pub const MESSAGES_QUERY: &str = r#"
SELECT
    message.key_id, message.chat_row_id, message.from_me, message.status, message.text_data, message.timestamp,
    message_media.message_url, message_media.mime_type, message.message_type, message_media.file_length,
    message_media.media_name, message_media.media_caption, message_media.media_duration,
    message_location.latitude, message_location.longitude, message_thumbnail.thumbnail,
    message_quoted_media.thumbnail,
    message_quoted.key_id, message_link._id,
    sender_jid.user AS remote_resource
FROM message
LEFT JOIN message_quoted ON message._id = message_quoted.message_row_id
LEFT JOIN message_quoted_media ON message_quoted.message_row_id = message_quoted_media.message_row_id
LEFT JOIN message_link ON message._id = message_link.message_row_id
LEFT JOIN message_media ON message._id = message_media.message_row_id
LEFT JOIN message_location ON message._id = message_location.message_row_id
LEFT JOIN message_thumbnail ON message._id = message_thumbnail.message_row_id
JOIN chat ON chat._id = message.chat_row_id
JOIN jid ON jid._id = chat.jid_row_id
LEFT JOIN jid AS sender_jid ON sender_jid._id = message.sender_jid_row_id
WHERE jid.raw_string = ?1
ORDER BY message.timestamp ASC
"#;

/// Column positions of [`MESSAGES_QUERY`]
pub mod message_columns {
    pub const KEY_ID: usize = 0;
    pub const CHAT_ROW_ID: usize = 1;
    pub const FROM_ME: usize = 2;
    pub const STATUS: usize = 3;
    pub const TEXT: usize = 4;
    pub const TIMESTAMP: usize = 5;
    pub const MEDIA_URL: usize = 6;
    pub const MEDIA_MIME_TYPE: usize = 7;
    pub const MESSAGE_TYPE: usize = 8;
    pub const MEDIA_SIZE: usize = 9;
    pub const MEDIA_NAME: usize = 10;
    pub const MEDIA_CAPTION: usize = 11;
    pub const MEDIA_DURATION: usize = 12;
    pub const LATITUDE: usize = 13;
    pub const LONGITUDE: usize = 14;
    pub const THUMBNAIL: usize = 15;
    pub const QUOTED_THUMBNAIL: usize = 16;
    pub const QUOTED_KEY_ID: usize = 17;
    pub const LINK_ID: usize = 18;
    pub const REMOTE_RESOURCE: usize = 19;
}
