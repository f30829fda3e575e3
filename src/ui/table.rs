use tabled::{settings::Style, Table, Tabled};
use crate::chat::Chat;
use crate::ui::format_timestamp;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
struct ChatRow {
    #[tabled(rename = "Chat")]
    title: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Last message")]
    last_message: String,
    #[tabled(rename = "Sent")]
    sent: u64,
    #[tabled(rename = "Received")]
    received: u64,
}

/// Chat list as a table, in the given order
pub fn chat_table(chats: &[Chat]) -> String {
    let rows: Vec<ChatRow> = chats
        .iter()
        .map(|chat| ChatRow {
            title: chat.title().to_string(),
            key: chat.key.clone(),
            last_message: format_timestamp(chat.last_message),
            sent: chat.messages_sent,
            received: chat.messages_received,
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}
