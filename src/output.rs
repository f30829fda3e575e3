//! Environment switches for human-mode output

use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

fn flag_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Whether decorative human-mode output is suppressed (`MSGVIEW_QUIET=1`)
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| flag_set(std::env::var("MSGVIEW_QUIET").ok().as_deref()))
}

/// Colors need a terminal on stdout and an unset or empty `NO_COLOR`
pub fn color_enabled() -> bool {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    !no_color && console::Term::stdout().is_term()
}

/// Progress spinners draw on stderr, and only when it is a terminal
pub fn progress_visible() -> bool {
    console::Term::stderr().is_term() && !is_quiet()
}
