// Text command surface - menu labels and the old typed settings commands
// Labels come first so a keyboard press never gets read as anything else

use super::event::Button;
use crate::error::CommandError;

pub const LABEL_NEW_PLAYLIST: &str = "🎶 Новый плейлист";
pub const LABEL_LIST: &str = "📂 Список";
pub const LABEL_SETTINGS: &str = "⚙️ Настройки";

pub const MENU_LABELS: [&str; 3] = [LABEL_NEW_PLAYLIST, LABEL_LIST, LABEL_SETTINGS];

const KW_DELETE: &str = "удалить";
const KW_TRACK: &str = "трек";
const KW_RENAME: &str = "переименовать";

/// First words a playlist name can't start with, or typing it back
/// (`удалить трек X`) would parse as a different command
pub const COMMAND_WORDS: [&str; 3] = [KW_DELETE, KW_RENAME, KW_TRACK];

pub const USAGE_DELETE: &str = "удалить <название>";
pub const USAGE_RENAME: &str = "переименовать <старое> <новое>";
pub const USAGE_REMOVE_TRACK: &str = "удалить трек <плейлист> <номер>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Button(Button),
    Delete { name: String },
    Rename { old: String, new: String },
    /// `position` is 1-based; anything typed below 1, or too big to count, arrives as 0
    RemoveTrack { name: String, position: usize },
}

/// Parse a line of free text.
///
/// `None` means the line isn't a command at all and should be tried as a
/// playlist name. `Some(Err(_))` means it looked like a command but didn't fit.
pub fn parse(text: &str) -> Option<Result<Command, CommandError>> {
    let text = text.trim();

    if text == "/start" {
        return Some(Ok(Command::Start));
    }
    if let Some(button) = label_button(text) {
        return Some(Ok(Command::Button(button)));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let keyword = tokens.first()?.to_lowercase();

    match keyword.as_str() {
        KW_DELETE => Some(parse_delete(text, &tokens)),
        KW_RENAME => Some(parse_rename(&tokens)),
        _ => None,
    }
}

fn label_button(text: &str) -> Option<Button> {
    match text {
        LABEL_NEW_PLAYLIST => Some(Button::CreatePlaylist),
        LABEL_LIST => Some(Button::ListPlaylists),
        LABEL_SETTINGS => Some(Button::OpenSettings),
        _ => None,
    }
}

fn parse_delete(text: &str, tokens: &[&str]) -> Result<Command, CommandError> {
    // "удалить трек" on its own deletes a playlist called "трек"
    let is_track = tokens.len() > 2 && tokens[1].to_lowercase() == KW_TRACK;
    if is_track {
        return parse_remove_track(tokens);
    }

    if tokens.len() < 2 {
        return Err(CommandError::MalformedCommand { usage: USAGE_DELETE });
    }
    // everything after the keyword, so names with spaces work
    let name = text[tokens[0].len()..].trim().to_string();
    Ok(Command::Delete { name })
}

fn parse_remove_track(tokens: &[&str]) -> Result<Command, CommandError> {
    let malformed = CommandError::MalformedCommand {
        usage: USAGE_REMOVE_TRACK,
    };
    if tokens.len() != 4 {
        return Err(malformed);
    }

    let position = parse_position(tokens[3]).ok_or(malformed)?;
    Ok(Command::RemoveTrack {
        name: tokens[2].to_string(),
        position,
    })
}

/// A signed integer of any length; `None` only when it isn't a number
fn parse_position(token: &str) -> Option<usize> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if negative {
        return Some(0);
    }
    Some(digits.parse::<usize>().unwrap_or(0))
}

fn parse_rename(tokens: &[&str]) -> Result<Command, CommandError> {
    match tokens {
        [_, old, new] => Ok(Command::Rename {
            old: old.to_string(),
            new: new.to_string(),
        }),
        _ => Err(CommandError::MalformedCommand { usage: USAGE_RENAME }),
    }
}
