//! Terminal input acquisition and validation.
//!
//! Every prompt the session issues funnels through [`Prompter`], which
//! parses and validates raw lines into typed values (command ids, emails,
//! booleans) before any remote call is made. Reads are blocking; the only
//! way to unblock one is user input or process termination.
//!
//! The actual line reads go through the [`LineSource`] seam so that
//! deterministic, scripted input can stand in for the terminal without
//! touching validation or dispatch logic.

use std::collections::VecDeque;
use std::io;
use std::sync::OnceLock;

use regex::Regex;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::{Error, Result};

/// Command id that ends the session.
pub const COMMAND_EXIT: i32 = 0;

/// Command id returned for input that does not parse as a command.
pub const COMMAND_INVALID: i32 = -1;

/// Sentinel meaning "quit / use the default" in list and date prompts.
pub const COMMAND_QUIT: &str = "q";

/// Largest number of emails a single list prompt will collect.
pub const MAX_EMAIL_COUNT: usize = 5;

fn email_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email regex must compile")
    })
}

/// Whether a string passes the email-format check.
pub fn is_valid_email(input: &str) -> bool {
    email_regex().is_match(input)
}

/// A blocking source of terminal lines.
pub trait LineSource {
    /// Read one line after printing `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] when the stream is exhausted (Ctrl-D
    /// on a terminal).
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// Line source backed by a rustyline editor with history.
pub struct ConsoleInput {
    editor: DefaultEditor,
}

impl ConsoleInput {
    /// Create a console line source.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|err| Error::io("failed to initialize line editor", io::Error::other(err)))?;
        Ok(Self { editor })
    }
}

impl LineSource for ConsoleInput {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(line)
            }
            // Ctrl-C at a prompt is a soft interrupt: hand back an empty
            // line and let the caller re-prompt.
            Err(ReadlineError::Interrupted) => Ok(String::new()),
            Err(ReadlineError::Eof) => Err(Error::input_closed("end of terminal input")),
            Err(err) => Err(Error::io(
                "failed to read from terminal",
                io::Error::other(err),
            )),
        }
    }
}

/// Deterministic line source fed from a fixed script.
///
/// Substitutes for [`ConsoleInput`] wherever a [`LineSource`] is expected;
/// reading past the end of the script reports closed input.
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    /// Create a scripted source that yields `lines` in order.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Result<String> {
        self.lines
            .pop_front()
            .ok_or_else(|| Error::input_closed("script exhausted"))
    }
}

/// Validating prompt layer over a [`LineSource`].
pub struct Prompter {
    source: Box<dyn LineSource>,
}

impl Prompter {
    /// Create a prompter over an arbitrary line source.
    pub fn new(source: Box<dyn LineSource>) -> Self {
        Self { source }
    }

    /// Create a prompter over the terminal.
    pub fn console() -> Result<Self> {
        Ok(Self::new(Box::new(ConsoleInput::new()?)))
    }

    /// Read one command id.
    ///
    /// Returns [`COMMAND_INVALID`] (after printing a diagnostic) when the
    /// line does not parse as an integer; the caller decides whether and how
    /// to re-prompt. Closed or failed input maps to [`COMMAND_EXIT`] so the
    /// session can shut down in order.
    pub fn get_command(&mut self, prompt: &str) -> i32 {
        let prompt = if prompt.is_empty() {
            "Please select a command (ex. 1): "
        } else {
            prompt
        };
        match self.source.read_line(prompt) {
            Ok(line) => match line.trim().parse::<i32>() {
                Ok(command) => command,
                Err(_) => {
                    println!("Invalid command, please enter a number.");
                    COMMAND_INVALID
                }
            },
            Err(_) => COMMAND_EXIT,
        }
    }

    /// Read one raw line verbatim.
    pub fn get_line(&mut self, prompt: &str) -> Result<String> {
        self.source.read_line(prompt)
    }

    /// Read lines until one passes the email-format check.
    ///
    /// There is no retry bound: this blocks until valid input arrives or the
    /// input stream closes.
    pub fn get_validated_email(&mut self) -> Result<String> {
        loop {
            let input = self.get_line("Please input an email (ex. ada@example.com): ")?;
            if !input.is_empty() && is_valid_email(&input) {
                return Ok(input);
            }
            println!("That does not look like an email address, try again.");
        }
    }

    /// Read lines until the input is exactly `"y"` or `"n"`.
    pub fn get_yes_no(&mut self, prompt: &str) -> Result<bool> {
        loop {
            let input = self.get_line(&format!("{prompt} (y/n): "))?;
            match input.as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => println!("Please answer exactly 'y' or 'n'."),
            }
        }
    }

    /// Collect up to `max` validated emails, preserving input order.
    ///
    /// The quit sentinel stops collection early; reaching `max` stops it
    /// unconditionally. Duplicates are permitted.
    pub fn get_email_list(&mut self, max: usize) -> Result<Vec<String>> {
        println!("You can enter at most {max} email addresses ('{COMMAND_QUIT}' to finish).");
        let mut emails = Vec::new();
        while emails.len() < max {
            let input = self.get_line(&format!(
                "Email {} ('{COMMAND_QUIT}' to finish): ",
                emails.len() + 1
            ))?;
            if input == COMMAND_QUIT {
                break;
            }
            if !input.is_empty() && is_valid_email(&input) {
                emails.push(input);
            } else {
                println!("That does not look like an email address, try again.");
            }
        }
        Ok(emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompter(lines: &[&str]) -> Prompter {
        Prompter::new(Box::new(ScriptedInput::new(lines.iter().copied())))
    }

    #[test]
    fn command_parses_integers() {
        let mut p = prompter(&["7", "  12  ", "-3"]);
        assert_eq!(p.get_command(""), 7);
        assert_eq!(p.get_command(""), 12);
        assert_eq!(p.get_command(""), -3);
    }

    #[test]
    fn command_non_numeric_is_invalid_sentinel() {
        let mut p = prompter(&["seven", "", "1.5"]);
        assert_eq!(p.get_command(""), COMMAND_INVALID);
        assert_eq!(p.get_command(""), COMMAND_INVALID);
        assert_eq!(p.get_command(""), COMMAND_INVALID);
    }

    #[test]
    fn command_on_closed_input_is_exit() {
        let mut p = prompter(&[]);
        assert_eq!(p.get_command(""), COMMAND_EXIT);
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("ada@"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@example.com"));
    }

    #[test]
    fn validated_email_skips_garbage() {
        let mut p = prompter(&["", "nope", "ada@example.com"]);
        assert_eq!(p.get_validated_email().unwrap(), "ada@example.com");
    }

    #[test]
    fn yes_no_is_exact_and_case_sensitive() {
        let mut p = prompter(&["Y", "yes", "y"]);
        assert!(p.get_yes_no("Use cache?").unwrap());
        let mut p = prompter(&["N", " n", "n"]);
        assert!(!p.get_yes_no("Use cache?").unwrap());
    }

    #[test]
    fn email_list_stops_at_max() {
        let mut p = prompter(&[
            "a@example.com",
            "b@example.com",
            "c@example.com",
            "d@example.com",
            "e@example.com",
            "f@example.com",
        ]);
        let emails = p.get_email_list(MAX_EMAIL_COUNT).unwrap();
        assert_eq!(emails.len(), 5);
        assert_eq!(emails[0], "a@example.com");
        assert_eq!(emails[4], "e@example.com");
    }

    #[test]
    fn email_list_quit_stops_early() {
        let mut p = prompter(&["a@example.com", "q", "b@example.com"]);
        let emails = p.get_email_list(MAX_EMAIL_COUNT).unwrap();
        assert_eq!(emails, vec!["a@example.com".to_string()]);
    }

    #[test]
    fn email_list_permits_duplicates_and_keeps_order() {
        let mut p = prompter(&["a@example.com", "a@example.com", "q"]);
        let emails = p.get_email_list(MAX_EMAIL_COUNT).unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0], emails[1]);
    }

    #[test]
    fn email_list_rejects_invalid_without_counting() {
        let mut p = prompter(&["bogus", "a@example.com", "q"]);
        let emails = p.get_email_list(MAX_EMAIL_COUNT).unwrap();
        assert_eq!(emails, vec!["a@example.com".to_string()]);
    }

    #[test]
    fn scripted_input_exhaustion_is_input_closed() {
        let mut p = prompter(&[]);
        let err = p.get_line("anything: ").unwrap_err();
        assert!(err.is_input_closed());
    }
}
