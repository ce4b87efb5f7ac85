//! Slash-command parsing for terminal input.
//!
//! Lines starting with a known slash command are client-side actions; every
//! other line goes to the pipeline verbatim (including chat-command trigger
//! lines, which the pipeline routes itself).

use murmur_client::UserInput;

/// Classify one line of terminal input.
///
/// - `/quit` leaves.
/// - `/name <new>` renames; the argument is validated downstream.
/// - `/secret <new>` replaces the shared secret, kept byte-for-byte.
/// - Anything else is chat text.
pub fn parse_line(line: &str) -> UserInput {
    if line.trim() == "/quit" {
        return UserInput::Quit;
    }

    if let Some(rest) = strip_command(line, "/name") {
        return UserInput::Rename(rest.to_owned());
    }

    if let Some(rest) = strip_command(line, "/secret") {
        return UserInput::ChangeSecret(rest.to_owned());
    }

    UserInput::Text(line.to_owned())
}

/// Argument of `command`, or `None` if the line is not that command.
///
/// `/namex` is not `/name`: the command must end the line or be followed by
/// a single separating space.
fn strip_command<'a>(line: &'a str, command: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(command)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(' ')
}
