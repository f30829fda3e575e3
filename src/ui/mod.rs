pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, error, format_timestamp, header, info, muted, section, status, success,
    summary_row, warn,
};
pub use progress::{RetrievalProgress, Spinner};
pub use table::{TableBuilder, chat_table, stats_table};
pub use theme::{theme, Theme};
