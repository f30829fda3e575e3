use crate::{OutputMode, emit_success};
use msgview::config::ViewerConfig;
use msgview::ui::{self, Icons, RetrievalProgress, Spinner, format_timestamp, section, success};
use msgview::{CancellationToken, Chat, Message, MessageDatabase, NameResolver};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn resolve_database(config: &ViewerConfig, explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    config.database_path(explicit).ok_or_else(|| {
        anyhow::anyhow!("no database given (use --database or set `database` in msgview.toml)")
    })
}

fn open_database(config: &ViewerConfig, explicit: Option<&Path>) -> anyhow::Result<MessageDatabase> {
    let path = resolve_database(config, explicit)?;
    let db = MessageDatabase::open(&path)?.with_poll_interval(config.poll_interval());
    Ok(db)
}

pub fn run_init(output_mode: OutputMode, path: &Path, force: bool) -> anyhow::Result<()> {
    ViewerConfig::template().save(path, force)?;

    if output_mode.is_human() {
        success(&format!("Wrote {}", path.display()));
        ui::summary_row("Edit", "`database` and the [display_names] table to match your case");
    } else {
        emit_success(output_mode, "init", serde_json::json!({ "path": path.display().to_string() }))?;
    }
    Ok(())
}

pub fn run_validate(output_mode: OutputMode, config: &ViewerConfig, database: Option<&Path>) -> anyhow::Result<()> {
    let db = open_database(config, database)?;
    let fingerprint = db.fingerprint()?;
    let stats = db.stats()?;

    if output_mode.is_human() {
        ui::header("Database check");
        ui::status(Icons::DATABASE, "Database", &db.path().display().to_string());
        ui::status(Icons::KEY, "BLAKE3", &fingerprint);
        ui::info("Poll interval", &format!("{} ms", db.poll_interval().as_millis()));
        ui::info("Display names", &format!("{} overrides loaded", config.display_names.len()));
        let chats = stats.chats.to_string();
        let messages = stats.messages.to_string();
        let identities = stats.identities.to_string();
        println!(
            "{}",
            ui::stats_table(&[
                ("Chats", chats.as_str()),
                ("Messages", messages.as_str()),
                ("Identities", identities.as_str()),
            ])
        );
        success("Schema is supported");
    } else {
        emit_success(
            output_mode,
            "validate",
            serde_json::json!({
                "database": db.path().display().to_string(),
                "blake3": fingerprint,
                "stats": stats,
                "display_names": config.display_names.len(),
            }),
        )?;
    }
    Ok(())
}

fn chat_matches(chat: &Chat, pattern: &regex::Regex) -> bool {
    pattern.is_match(&chat.key)
        || chat.subject.as_deref().is_some_and(|s| pattern.is_match(s))
        || chat.display_name.as_deref().is_some_and(|n| pattern.is_match(n))
}

pub fn run_chats(
    output_mode: OutputMode,
    config: &ViewerConfig,
    database: Option<&Path>,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    let pattern = filter.map(regex::Regex::new).transpose()?;
    let db = open_database(config, database)?;

    let spinner = Spinner::new("Loading chats");
    let chats = db.list_chats(&config.display_names);
    spinner.finish_and_clear();

    let chats: Vec<Chat> = chats?
        .into_iter()
        .filter(|chat| pattern.as_ref().is_none_or(|p| chat_matches(chat, p)))
        .collect();

    if output_mode.is_human() {
        ui::header(&format!("{} chats in {}", chats.len(), db.path().display()));
        if chats.is_empty() {
            println!("{} No chats found.", Icons::CROSS);
        } else {
            println!("{}", ui::chat_table(&chats));
        }
    } else {
        emit_success(output_mode, "chats", serde_json::to_value(&chats)?)?;
    }
    Ok(())
}

pub fn run_messages(
    output_mode: OutputMode,
    config: &ViewerConfig,
    database: Option<&Path>,
    chat: &str,
    timeout: Option<u64>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let mut db = open_database(config, database)?;

    let token = CancellationToken::new();
    if let Some(secs) = timeout {
        let watchdog = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            watchdog.cancel();
        });
    }

    let (progress, tx) = RetrievalProgress::new();
    let outcome = db.retrieve_messages(chat, &token, Some(tx));
    progress.finish();
    let outcome = outcome?;

    let complete = outcome.is_complete();
    let messages = outcome.messages();
    let shown = &messages[..limit.unwrap_or(messages.len()).min(messages.len())];

    if output_mode.is_human() {
        let title = config.display_names.lookup(chat).unwrap_or_else(|| chat.to_string());
        section(&format!(" {} {} ", Icons::CHAT, title));
        for message in shown {
            print_message(message, messages);
        }
        println!();
        if complete {
            success(&format!("{} of {} messages shown", shown.len(), messages.len()));
        } else {
            ui::warn(&format!(
                "Stopped early: {} messages read before the timeout",
                messages.len()
            ));
        }
    } else {
        emit_success(
            output_mode,
            "messages",
            serde_json::json!({
                "chat": chat,
                "complete": complete,
                "total": messages.len(),
                "messages": shown,
            }),
        )?;
    }
    Ok(())
}

fn print_message(message: &Message, all: &[Message]) {
    let theme = ui::theme();
    let when = ui::dim(&format!("[{}]", format_timestamp(message.timestamp)));
    let (arrow, who) = if message.from_me {
        (Icons::RIGHT, "me")
    } else {
        (Icons::LEFT, message.sender().unwrap_or("them"))
    };
    let who = who.style(theme.direction(message.direction()));

    println!("{} {} {}: {}", when, arrow, who, message.text);

    if let Some(quoted) = message.quoted_message(all) {
        let snippet: String = quoted.text.chars().take(60).collect();
        println!("    {} {}", Icons::QUOTE, ui::muted(&format!("replying to \"{}\"", snippet)));
    } else if message.is_reply() {
        println!("    {} {}", Icons::QUOTE, ui::muted(&format!("replying to {}", message.quoted_key_id)));
    }

    if message.media.is_present() {
        let media = &message.media;
        let mut line = format!("{} ({} bytes)", media.mime_type, media.size);
        if !media.name.is_empty() {
            line.push_str(&format!(" {}", media.name));
        }
        if media.duration > 0 {
            line.push_str(&format!(" {}s", media.duration));
        }
        if !media.caption.is_empty() {
            line.push_str(&format!(" \"{}\"", media.caption));
        }
        println!("    {} {}", Icons::PAPERCLIP, line);
    }

    if message.location.is_set() {
        println!(
            "    {} {:.5}, {:.5}",
            Icons::PIN,
            message.location.latitude,
            message.location.longitude
        );
    }

    if message.has_link {
        println!("    {} {}", Icons::LINK, ui::muted("link preview"));
    }
}
