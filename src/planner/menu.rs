use crate::router::command::{LABEL_LIST, LABEL_NEW_PLAYLIST, LABEL_SETTINGS};
use crate::router::Button;
use crate::types::TrackRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    /// Persistent keyboard under the input box; presses arrive as text
    Reply,
    /// Buttons attached to one message; presses arrive as button actions
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub button: Button,
}

impl MenuEntry {
    pub fn new(label: impl Into<String>, button: Button) -> Self {
        Self {
            label: label.into(),
            button,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub kind: MenuKind,
    pub rows: Vec<Vec<MenuEntry>>,
}

impl Menu {
    /// Entries left to right, top to bottom
    pub fn entries(&self) -> impl Iterator<Item = &MenuEntry> {
        self.rows.iter().flatten()
    }
}

pub fn main_menu() -> Menu {
    Menu {
        kind: MenuKind::Reply,
        rows: vec![
            vec![MenuEntry::new(LABEL_NEW_PLAYLIST, Button::CreatePlaylist)],
            vec![MenuEntry::new(LABEL_LIST, Button::ListPlaylists)],
            vec![MenuEntry::new(LABEL_SETTINGS, Button::OpenSettings)],
        ],
    }
}

/// One open button per playlist, in listing order
pub fn playlists_menu(names: &[String]) -> Menu {
    Menu {
        kind: MenuKind::Inline,
        rows: names
            .iter()
            .map(|name| vec![MenuEntry::new(name.clone(), Button::OpenPlaylist(name.clone()))])
            .collect(),
    }
}

pub fn settings_menu(names: &[String]) -> Menu {
    Menu {
        kind: MenuKind::Inline,
        rows: names
            .iter()
            .map(|name| {
                vec![
                    MenuEntry::new(format!("🗑 {}", name), Button::DeletePlaylist(name.clone())),
                    MenuEntry::new(format!("✏️ {}", name), Button::RenamePlaylist(name.clone())),
                    MenuEntry::new(format!("➖ {}", name), Button::RemoveTrackMenu(name.clone())),
                ]
            })
            .collect(),
    }
}

/// Numbered picker for removing a track, positions as of right now
pub fn track_removal_menu(name: &str, tracks: &[TrackRef]) -> Menu {
    Menu {
        kind: MenuKind::Inline,
        rows: (1..=tracks.len())
            .map(|position| {
                vec![MenuEntry::new(
                    position.to_string(),
                    Button::RemoveTrackAt(name.to_string(), position),
                )]
            })
            .collect(),
    }
}
