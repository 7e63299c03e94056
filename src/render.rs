//! Terminal presentation of session output.
//!
//! Divider-framed blocks and numbered lists, with optional ANSI styling.
//! Watcher callbacks print through the same presenter from their own tasks;
//! that output is not synchronized with the foreground prompt and may
//! interleave.

use crate::dates::DateRange;
use crate::types::{Channel, Identity, Member, Message};

/// ANSI escape code for green text (used for info lines).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for error lines).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for cyan text (used for titles).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

const DIVIDER: &str = "------------------------------";

/// Plain-text presenter with optional ANSI color.
#[derive(Debug, Clone)]
pub struct Presenter {
    use_color: bool,
}

impl Presenter {
    /// Create a presenter with color enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Create a presenter, choosing whether ANSI styling is emitted.
    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_color {
            format!("{code}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    /// One informational line.
    pub fn info(&self, message: &str) {
        println!("{}", self.paint(ANSI_GREEN, message));
    }

    /// One error line.
    pub fn error(&self, message: &str) {
        println!("{}", self.paint(ANSI_RED, &format!("Error: {message}")));
    }

    /// A framed section title.
    pub fn title(&self, title: &str) {
        println!("{DIVIDER}");
        println!("{}", self.paint(ANSI_CYAN, &format!("# {title}")));
        println!("{DIVIDER}");
        println!();
    }

    /// A framed message block.
    pub fn framed(&self, message: &str) {
        println!("{DIVIDER}");
        println!("{message}");
        println!("{DIVIDER}");
        println!();
    }

    /// The logged-in banner shown once after bootstrap.
    pub fn identity(&self, identity: &Identity) {
        self.framed(&format!("# You are logged in as\n{identity}"));
    }

    /// A numbered channel list under a title.
    pub fn channels(&self, title: &str, channels: &[Channel]) {
        println!("{DIVIDER}");
        println!("# {title}");
        for (i, channel) in channels.iter().enumerate() {
            println!("{}", numbered(i, &channel.to_string()));
        }
        println!("{DIVIDER}");
        println!();
    }

    /// A numbered member list under a title.
    pub fn members(&self, title: &str, members: &[Member]) {
        println!("{DIVIDER}");
        println!("# {title}");
        for (i, member) in members.iter().enumerate() {
            println!("{}", numbered(i, &format!("ID: {}", member.id)));
            println!("{member}");
        }
        println!("{DIVIDER}");
        println!();
    }

    /// A numbered message list under a title, optionally with message ids.
    pub fn messages(&self, title: &str, messages: &[Message], show_ids: bool) {
        println!("{DIVIDER}");
        println!("# {title}");
        for (i, message) in messages.iter().enumerate() {
            let line = if show_ids {
                format!("{} {message}", message.id)
            } else {
                message.to_string()
            };
            println!("{}", numbered(i, &line));
        }
        println!("{DIVIDER}");
        println!();
    }

    /// Message history with the queried period in the heading.
    pub fn messages_for_period(&self, title: &str, range: &DateRange, messages: &[Message]) {
        let heading = format!(
            "{title}\nPeriod (local): {} - {}",
            range.from, range.to
        );
        self.messages(&heading, messages, false);
    }

    /// The set of channels currently being monitored.
    pub fn monitored(&self, names: &[String]) {
        if names.is_empty() {
            self.framed("Not monitoring any channels now.");
        } else {
            self.framed(&format!("Monitoring channels: {}", names.join(", ")));
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn numbered(index: usize, line: &str) -> String {
    format!("[{}] {}", index + 1, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_is_one_based() {
        assert_eq!(numbered(0, "first"), "[1] first");
        assert_eq!(numbered(4, "fifth"), "[5] fifth");
    }

    #[test]
    fn paint_respects_color_switch() {
        let plain = Presenter::with_color(false);
        assert_eq!(plain.paint(ANSI_RED, "x"), "x");
        let colored = Presenter::with_color(true);
        assert_eq!(colored.paint(ANSI_RED, "x"), "\x1b[31mx\x1b[0m");
    }
}
