//! Parsing of CLI input lines.
//!
//! Pure functions without side effects, so the runner stays thin.

/// One line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `@bob hello there`
    Send { to: String, content: String },
    /// `/reconnect`
    Reconnect,
    /// `/quit`
    Quit,
    /// `/help`
    Help,
    /// Anything else, with a hint for the user
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "/quit" | "/exit" => return Command::Quit,
            "/reconnect" => return Command::Reconnect,
            "/help" => return Command::Help,
            _ => {}
        }

        if line.starts_with('/') {
            return Command::Invalid(format!("Unknown command '{}'", line));
        }

        let Some(rest) = line.strip_prefix('@') else {
            return Command::Invalid("Messages must start with @recipient".to_string());
        };
        match rest.split_once(char::is_whitespace) {
            Some((to, content)) if !to.is_empty() && !content.trim().is_empty() => {
                Command::Send {
                    to: to.to_string(),
                    content: content.trim().to_string(),
                }
            }
            _ => Command::Invalid("Usage: @recipient message".to_string()),
        }
    }
}
