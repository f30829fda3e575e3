pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const LINK: &str = "🔗";
    pub const DATABASE: &str = "🗄️";
    pub const RIGHT: &str = "➡️";
    pub const LEFT: &str = "⬅️";
    pub const CHAT: &str = "💬";
    pub const QUOTE: &str = "↩️";
    pub const PIN: &str = "📍";
    pub const PAPERCLIP: &str = "📎";
    pub const KEY: &str = "🔑";
}
