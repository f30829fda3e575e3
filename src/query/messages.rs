//! Message retrieval
//!
//! Streams the wide message join for one chat and rebuilds each message's
//! media, location, thumbnail, link and quote data. Quotes are resolved
//! against messages already emitted in the same pass, so a reply can only
//! point backwards.

use std::collections::HashMap;
use crossbeam::channel::Sender;
use rusqlite::Row;
use crate::cancel::CancellationToken;
use crate::message::{Location, Media, Message};
use crate::storage::schema::{self, message_columns as col};
use crate::storage::{ColumnReader, QueryContext, Store, is_interrupted};
use crate::{Error, Result, RetrievalMessage};

/// Messages accumulated by one pass
#[derive(Debug, Default)]
pub struct Retrieval {
    /// Ascending by timestamp
    pub messages: Vec<Message>,
    /// True if the pass stopped early on request; `messages` is then a prefix
    pub interrupted: bool,
}

/// Retrieve every message of a chat.
///
/// The token is checked once per row. A store interrupt during a step ends
/// the pass the same way. Genuine failures return no messages at all.
pub fn retrieve_messages(
    store: &Store,
    chat_key: &str,
    token: &CancellationToken,
    progress: Option<&Sender<RetrievalMessage>>,
) -> Result<Retrieval> {
    notify(progress, RetrievalMessage::Started {
        chat_key: chat_key.to_string(),
    });

    let mut stmt = store
        .conn()
        .prepare(schema::MESSAGES_QUERY)
        .query_context("Could not load messages")?;
    let mut rows = stmt
        .query([chat_key])
        .query_context("Could not bind sql parameter")?;

    let mut assembler = MessageAssembler::default();
    let mut interrupted = false;

    loop {
        if token.is_cancelled() {
            interrupted = true;
            break;
        }

        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(err) if is_interrupted(&err) => {
                interrupted = true;
                break;
            }
            Err(err) => return Err(Error::query("Could not step messages", err)),
        };

        let message = read_message(row).query_context("Could not read message row")?;
        assembler.push(message);
        notify(progress, RetrievalMessage::Row {
            count: assembler.len(),
        });
    }

    let messages = assembler.finish();
    if interrupted {
        tracing::warn!("Retrieval of {} stopped after {} messages", chat_key, messages.len());
    } else {
        tracing::debug!("Retrieved {} messages for {}", messages.len(), chat_key);
    }
    notify(progress, RetrievalMessage::Finished {
        count: messages.len(),
        interrupted,
    });

    Ok(Retrieval { messages, interrupted })
}

fn notify(progress: Option<&Sender<RetrievalMessage>>, message: RetrievalMessage) {
    if let Some(tx) = progress {
        // Observer may be gone
        tx.send(message).ok();
    }
}

/// Builds the in-progress sequence and resolves quotes against it.
#[derive(Default)]
struct MessageAssembler {
    messages: Vec<Message>,
    /// key id -> index of the first message emitted with it
    by_key: HashMap<String, usize>,
}

impl MessageAssembler {
    fn push(&mut self, mut message: Message) {
        if !message.quoted_key_id.is_empty() {
            message.quoted = self.by_key.get(&message.quoted_key_id).copied();
        }

        let index = self.messages.len();
        self.by_key.entry(message.key_id.clone()).or_insert(index);
        self.messages.push(message);
    }

    fn len(&self) -> usize {
        self.messages.len()
    }

    fn finish(self) -> Vec<Message> {
        self.messages
    }
}

fn read_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let link_id = row.int64(col::LINK_ID)?;

    Ok(Message {
        key_id: row.text(col::KEY_ID)?,
        chat_row_id: row.int64(col::CHAT_ROW_ID)?,
        from_me: row.int64(col::FROM_ME)? == 1,
        status: row.int64(col::STATUS)? as i32,
        text: row.text(col::TEXT)?,
        timestamp: row.int64(col::TIMESTAMP)?,
        media: Media {
            url: row.text(col::MEDIA_URL)?,
            mime_type: row.text(col::MEDIA_MIME_TYPE)?,
            kind: row.int64(col::MESSAGE_TYPE)? as i32,
            size: row.int64(col::MEDIA_SIZE)?,
            name: row.text(col::MEDIA_NAME)?,
            caption: row.text(col::MEDIA_CAPTION)?,
            duration: row.int64(col::MEDIA_DURATION)? as i32,
        },
        // NULL coordinates read as 0.0, same as a real (0, 0)
        location: Location {
            latitude: row.double(col::LATITUDE)?,
            longitude: row.double(col::LONGITUDE)?,
        },
        thumbnail: row.blob(col::THUMBNAIL)?,
        quoted_thumbnail: row.blob(col::QUOTED_THUMBNAIL)?,
        remote_resource: row.text(col::REMOTE_RESOURCE)?,
        quoted_key_id: row.text(col::QUOTED_KEY_ID)?,
        quoted: None,
        has_link: link_id > 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixture::Fixture;

    fn keys(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.key_id.as_str()).collect()
    }

    fn retrieve(fixture: &Fixture, chat_key: &str) -> Retrieval {
        retrieve_messages(&fixture.open(), chat_key, &CancellationToken::new(), None).unwrap()
    }

    #[test]
    fn test_messages_ascending_and_scoped_to_chat() {
        let fixture = Fixture::new();
        let alice = fixture.add_jid("111@s.whatsapp.net", "111");
        let bob = fixture.add_jid("222@s.whatsapp.net", "222");
        let chat = fixture.add_chat(alice, None, 1);
        let other = fixture.add_chat(bob, None, 1);

        fixture.add_message(chat, "C", true, 300, Some("third"));
        fixture.add_message(chat, "A", false, 100, Some("first"));
        fixture.add_message(other, "X", false, 150, Some("elsewhere"));
        fixture.add_message(chat, "B", true, 200, Some("second"));

        let result = retrieve(&fixture, "111@s.whatsapp.net");
        assert!(!result.interrupted);
        assert_eq!(keys(&result.messages), vec!["A", "B", "C"]);
        assert!(result.messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let first = &result.messages[0];
        assert_eq!(first.text, "first");
        assert!(!first.from_me);
        assert_eq!(first.chat_row_id, chat);
    }

    #[test]
    fn test_unknown_chat_is_empty() {
        let fixture = Fixture::new();
        fixture.seed_conversation("111@s.whatsapp.net", 3);

        let result = retrieve(&fixture, "nobody@s.whatsapp.net");
        assert!(result.messages.is_empty());
        assert!(!result.interrupted);
    }

    #[test]
    fn test_quotes_resolve_backwards_only() {
        let fixture = Fixture::new();
        let jid = fixture.add_jid("111@s.whatsapp.net", "111");
        let chat = fixture.add_chat(jid, None, 1);

        fixture.add_message(chat, "ORIG", false, 100, Some("question"));
        let reply = fixture.add_message(chat, "REPLY", true, 200, Some("answer"));
        fixture.add_quote(reply, "ORIG");
        fixture.add_quoted_thumbnail(reply, &[9, 9, 9]);

        let early = fixture.add_message(chat, "EARLY", true, 300, Some("quotes the future"));
        fixture.add_quote(early, "LATE");
        fixture.add_message(chat, "LATE", false, 400, Some("later"));

        let orphan = fixture.add_message(chat, "ORPHAN", false, 500, Some("quotes nothing"));
        fixture.add_quote(orphan, "MISSING");

        let result = retrieve(&fixture, "111@s.whatsapp.net");
        let messages = &result.messages;
        assert_eq!(keys(messages), vec!["ORIG", "REPLY", "EARLY", "LATE", "ORPHAN"]);

        assert_eq!(messages[1].quoted, Some(0));
        assert_eq!(messages[1].quoted_message(messages), Some(&messages[0]));
        assert_eq!(messages[1].quoted_thumbnail, Some(vec![9, 9, 9]));

        assert!(messages[2].is_reply());
        assert_eq!(messages[2].quoted, None);
        assert_eq!(messages[4].quoted, None);
        assert_eq!(messages[0].quoted, None);
    }

    #[test]
    fn test_duplicate_key_quotes_first_occurrence() {
        let fixture = Fixture::new();
        let jid = fixture.add_jid("111@s.whatsapp.net", "111");
        let chat = fixture.add_chat(jid, None, 1);
        fixture.add_message(chat, "DUP", false, 100, Some("one"));
        fixture.add_message(chat, "DUP", false, 200, Some("two"));
        let reply = fixture.add_message(chat, "R", true, 300, Some("re"));
        fixture.add_quote(reply, "DUP");

        let result = retrieve(&fixture, "111@s.whatsapp.net");
        assert_eq!(result.messages[2].quoted, Some(0));
    }

    #[test]
    fn test_null_columns_read_as_sentinels() {
        let fixture = Fixture::new();
        let jid = fixture.add_jid("111@s.whatsapp.net", "111");
        let chat = fixture.add_chat(jid, None, 1);
        let msg = fixture.add_message(chat, "M", false, 100, None);
        fixture.add_location(msg, None, None);
        fixture.add_thumbnail(msg, None);

        let result = retrieve(&fixture, "111@s.whatsapp.net");
        let m = &result.messages[0];
        assert_eq!(m.text, "");
        assert_eq!((m.location.latitude, m.location.longitude), (0.0, 0.0));
        assert!(!m.location.is_set());
        assert_eq!(m.thumbnail, None);
        assert_eq!(m.quoted_thumbnail, None);
        assert_eq!(m.media, Media::default());
        assert_eq!(m.remote_resource, "");
        assert!(!m.has_link);
    }

    #[test]
    fn test_attachments_location_link_and_sender() {
        let fixture = Fixture::new();
        let group = fixture.add_jid("123-456@g.us", "123-456");
        let carol = fixture.add_jid("333@s.whatsapp.net", "333");
        let chat = fixture.add_chat(group, Some("Trip"), 1);

        let photo = fixture.add_message(chat, "PHOTO", false, 100, None);
        fixture.set_sender(photo, carol);
        fixture.set_status(photo, 13);
        fixture.set_message_type(photo, 1);
        fixture.add_media(photo, "https://mmg.example/abc", "image/jpeg", 2048, "IMG-1.jpg", Some("summit"), 0);
        fixture.add_thumbnail(photo, Some(&[0xff, 0xd8, 0xff]));

        let pin = fixture.add_message(chat, "PIN", true, 200, None);
        fixture.add_location(pin, Some(47.3769), Some(8.5417));

        let link = fixture.add_message(chat, "LINK", true, 300, Some("https://example.org"));
        fixture.add_link(link);

        let result = retrieve(&fixture, "123-456@g.us");
        let messages = &result.messages;

        let photo = &messages[0];
        assert_eq!(photo.sender(), Some("333"));
        assert_eq!(photo.status, 13);
        assert!(photo.media.is_present());
        assert_eq!(photo.media.url, "https://mmg.example/abc");
        assert_eq!(photo.media.mime_type, "image/jpeg");
        assert_eq!(photo.media.kind, 1);
        assert_eq!(photo.media.size, 2048);
        assert_eq!(photo.media.name, "IMG-1.jpg");
        assert_eq!(photo.media.caption, "summit");
        assert_eq!(photo.thumbnail, Some(vec![0xff, 0xd8, 0xff]));

        let pin = &messages[1];
        assert!(pin.from_me);
        assert_eq!(pin.sender(), None);
        assert!(pin.location.is_set());
        assert!((pin.location.latitude - 47.3769).abs() < 1e-9);
        assert!((pin.location.longitude - 8.5417).abs() < 1e-9);

        assert!(messages[2].has_link);
        assert!(!messages[0].has_link);
    }

    #[test]
    fn test_cancelled_before_first_row() {
        let fixture = Fixture::new();
        fixture.seed_conversation("111@s.whatsapp.net", 5);

        let token = CancellationToken::new();
        token.cancel();
        let result = retrieve_messages(&fixture.open(), "111@s.whatsapp.net", &token, None).unwrap();
        assert!(result.interrupted);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_cancel_mid_pass_yields_strict_prefix() {
        let fixture = Fixture::new();
        fixture.seed_conversation("111@s.whatsapp.net", 8);
        let full = retrieve(&fixture, "111@s.whatsapp.net").messages;
        assert_eq!(full.len(), 8);

        let store = fixture.open();
        let token = CancellationToken::new();
        let worker_token = token.clone();
        // Rendezvous channel: the worker blocks on every event until we take it
        let (tx, rx) = crossbeam::channel::bounded(0);

        let worker = std::thread::spawn(move || {
            retrieve_messages(&store, "111@s.whatsapp.net", &worker_token, Some(&tx)).unwrap()
        });

        assert!(matches!(rx.recv().unwrap(), RetrievalMessage::Started { .. }));
        assert_eq!(rx.recv().unwrap(), RetrievalMessage::Row { count: 1 });
        assert_eq!(rx.recv().unwrap(), RetrievalMessage::Row { count: 2 });
        token.cancel();
        drop(rx);

        let partial = worker.join().unwrap();
        assert!(partial.interrupted);
        assert!((2..=3).contains(&partial.messages.len()));
        assert_eq!(partial.messages[..], full[..partial.messages.len()]);
    }

    #[test]
    fn test_store_interrupt_mid_pass_yields_prefix() {
        let fixture = Fixture::new();
        fixture.seed_conversation("111@s.whatsapp.net", 20);
        let full = retrieve(&fixture, "111@s.whatsapp.net").messages;
        assert_eq!(full.len(), 20);

        let store = fixture.open();
        let interrupt = store.interrupt_handle();
        let (tx, rx) = crossbeam::channel::bounded(0);

        // The token is never set: only the store interrupt stops this pass
        let worker = std::thread::spawn(move || {
            let result = retrieve_messages(&store, "111@s.whatsapp.net", &CancellationToken::new(), Some(&tx));
            (store, result)
        });

        assert!(matches!(rx.recv().unwrap(), RetrievalMessage::Started { .. }));
        for count in 1..=3 {
            assert_eq!(rx.recv().unwrap(), RetrievalMessage::Row { count });
        }
        interrupt.interrupt();
        drop(rx);

        let (store, partial) = worker.join().unwrap();
        let partial = partial.unwrap();
        assert!(partial.interrupted);
        assert!((3..=4).contains(&partial.messages.len()));
        assert_eq!(partial.messages[..], full[..partial.messages.len()]);

        let again = retrieve_messages(&store, "111@s.whatsapp.net", &CancellationToken::new(), None).unwrap();
        assert!(!again.interrupted);
        assert_eq!(again.messages, full);
    }

    #[test]
    fn test_progress_events() {
        let fixture = Fixture::new();
        fixture.seed_conversation("111@s.whatsapp.net", 2);
        let (tx, rx) = crossbeam::channel::unbounded();

        retrieve_messages(&fixture.open(), "111@s.whatsapp.net", &CancellationToken::new(), Some(&tx)).unwrap();
        drop(tx);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                RetrievalMessage::Started { chat_key: "111@s.whatsapp.net".to_string() },
                RetrievalMessage::Row { count: 1 },
                RetrievalMessage::Row { count: 2 },
                RetrievalMessage::Finished { count: 2, interrupted: false },
            ]
        );
    }

    #[test]
    fn test_missing_table_fails_without_partial_result() {
        let fixture = Fixture::new();
        fixture.seed_conversation("111@s.whatsapp.net", 2);
        fixture.execute("DROP TABLE message_location");

        let err = retrieve_messages(&fixture.open(), "111@s.whatsapp.net", &CancellationToken::new(), None)
            .unwrap_err();
        assert!(matches!(err, Error::Query { .. }));
    }
}
