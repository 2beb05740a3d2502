// User-facing copy, kept in one place so the wording stays consistent

use crate::error::{CommandError, NameRejection, PlaylistError};
use crate::router::command::{USAGE_DELETE, USAGE_REMOVE_TRACK, USAGE_RENAME};

pub const GREETING: &str = "Привет 👋 Я бот для создания музыкальных плейлистов.\nВыбери действие:";
pub const PROMPT_NAME: &str = "Введи название нового плейлиста:";
pub const NO_ACTIVE_PLAYLIST: &str = "Сначала создай или выбери плейлист!";
pub const NO_PLAYLISTS: &str = "У тебя пока нет плейлистов 😢";
pub const NOTHING_TO_SET_UP: &str = "Нет плейлистов для настройки 😢";
pub const UNRECOGNIZED: &str = "Я понимаю только команды, музыку или название плейлиста 😉";

pub fn created(name: &str) -> String {
    format!("✅ Плейлист '{}' создан!\nКидай музыку для добавления.", name)
}

pub fn track_added(playlist: &str, len: usize) -> String {
    format!("Добавлено в '{}' ✅ (треков: {})", playlist, len)
}

pub fn playlist_list(names: &[String]) -> String {
    format!("📂 Твои плейлисты:\n{}", bullets(names))
}

pub fn settings(names: &[String]) -> String {
    format!(
        "⚙️ Доступные плейлисты:\n{}\n\nВыбери действие кнопкой или напиши команду:\n{}\n{}\n{}",
        bullets(names),
        USAGE_DELETE,
        USAGE_RENAME,
        USAGE_REMOVE_TRACK
    )
}

pub fn playlist_header(name: &str) -> String {
    format!("🎵 Песни из '{}':", name)
}

pub fn playlist_empty(name: &str) -> String {
    format!("Плейлист '{}' пуст 🕳️", name)
}

pub fn deleted(name: &str) -> String {
    format!("🗑 Плейлист '{}' удалён!", name)
}

pub fn prompt_rename(old: &str) -> String {
    format!("Введи новое название для '{}':", old)
}

pub fn renamed(old: &str, new: &str) -> String {
    format!("✏️ '{}' переименован в '{}' ✅", old, new)
}

pub fn track_menu(name: &str) -> String {
    format!("Какой трек удалить из '{}'?", name)
}

pub fn track_menu_empty(name: &str) -> String {
    format!("В '{}' нет треков 🕳️", name)
}

pub fn track_removed(name: &str, position: usize) -> String {
    format!("➖ Трек {} удалён из '{}' ✅", position, name)
}

pub fn playlist_error(err: &PlaylistError) -> String {
    match err {
        PlaylistError::AlreadyExists(_) => "Такой плейлист уже есть ❌".to_string(),
        PlaylistError::NotFound(_) => "Такого плейлиста нет ❌".to_string(),
        PlaylistError::IndexOutOfRange { name, position, len } => format!(
            "В '{}' нет трека {} (всего треков: {}) ❌",
            name, position, len
        ),
        PlaylistError::InvalidName { reason, .. } => match reason {
            NameRejection::Empty => "Название не может быть пустым ❌".to_string(),
            NameRejection::TooLong { max } => {
                format!("Слишком длинное название, максимум {} символов ❌", max)
            }
            NameRejection::Reserved => {
                "Это название совпадает с командой бота, выбери другое ❌".to_string()
            }
        },
    }
}

pub fn command_error(err: &CommandError) -> String {
    match err {
        CommandError::MalformedCommand { usage } => format!("Используй: {}", usage),
    }
}

fn bullets(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("• {}", name))
        .collect::<Vec<_>>()
        .join("\n")
}
