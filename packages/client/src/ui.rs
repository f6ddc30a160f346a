//! UI utilities for the client.

use std::io::Write;

/// Print a block of output and redisplay the prompt after it
pub fn print_with_prompt(text: &str, user_id: &str) {
    print!("{}", text);
    print!("{}> ", user_id);
    std::io::stdout().flush().ok();
}
