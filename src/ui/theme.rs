use crate::message::Direction;
use crate::output::color_enabled;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles per output role. Without color every role is a plain `Style`.
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub muted: Style,
    outgoing: Style,
    incoming: Style,
}

impl Theme {
    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: pick(Style::new().cyan().bold()),
            success: pick(Style::new().green().bold()),
            error: pick(Style::new().red().bold()),
            warn: pick(Style::new().yellow().bold()),
            info: pick(Style::new().magenta()),
            dim: pick(Style::new().white().dimmed()),
            muted: pick(Style::new().bright_black()),
            outgoing: pick(Style::new().green()),
            incoming: pick(Style::new().blue()),
        }
    }

    /// Sender style: owner's messages in one color, the remote party's in another
    pub fn direction(&self, direction: Direction) -> Style {
        match direction {
            Direction::Outgoing => self.outgoing.clone(),
            Direction::Incoming => self.incoming.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(|| Theme::new(color_enabled()))
}
