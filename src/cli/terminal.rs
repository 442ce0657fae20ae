//! Colour for terminal output.

use owo_colors::{OwoColorize, Style};
use supports_color::Stream;

/// Whether stdout understands colour. Piped output is left plain.
fn colour_enabled() -> bool {
    supports_color::on_cached(Stream::Stdout).is_some()
}

fn paint(text: &str, style: Style) -> String {
    if colour_enabled() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Semantic colours for report output.
pub trait Colorize {
    /// A document or case that passed.
    fn success(&self) -> String;
    /// A document that failed to load.
    fn failure(&self) -> String;
    /// Paths, identifiers and keywords.
    fn info(&self) -> String;
    /// Secondary detail such as labels and summaries.
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        paint(self, Style::new().green())
    }

    fn failure(&self) -> String {
        paint(self, Style::new().red().bold())
    }

    fn info(&self) -> String {
        paint(self, Style::new().bright_blue())
    }

    fn dim(&self) -> String {
        paint(self, Style::new().dimmed())
    }
}
