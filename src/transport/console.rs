// Console transport - chat with the bot from a terminal
// Each stdin line is one event; replies are printed with their message ids

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::Transport;
use crate::bot::PlaylistBot;
use crate::planner::{Menu, MenuKind};
use crate::router::{Button, Event};
use crate::types::{MessageId, TrackRef, UserId};

pub const HELP: &str = "\
Commands:
  /start            greet and show the main menu
  /audio <ref>      send a track (any id works)
  /button <n>       press entry n of the last inline menu
  /as <user_id>     switch who is talking
  /quit             leave
Anything else is sent as plain text.";

#[derive(Debug, Default)]
pub struct ConsoleTransport {
    next_id: AtomicI64,
    // messages still on screen, per user
    live: Mutex<HashMap<UserId, HashSet<MessageId>>>,
    // last inline keyboard each user saw
    inline_menus: Mutex<HashMap<UserId, Menu>>,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Button behind entry `n` (1-based) of the user's last inline menu
    pub fn inline_button(&self, user: UserId, n: usize) -> Option<Button> {
        let menus = self.inline_menus.lock().ok()?;
        let button = menus
            .get(&user)?
            .entries()
            .nth(n.checked_sub(1)?)
            .map(|entry| entry.button.clone());
        button
    }

    fn allocate(&self, user: UserId) -> MessageId {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        if let Ok(mut live) = self.live.lock() {
            live.entry(user).or_default().insert(id);
        }
        id
    }

    fn print_menu(menu: &Menu) {
        match menu.kind {
            MenuKind::Reply => {
                let labels: Vec<&str> = menu.entries().map(|e| e.label.as_str()).collect();
                println!("      keyboard: [{}]", labels.join("] ["));
            }
            MenuKind::Inline => {
                for (i, entry) in menu.entries().enumerate() {
                    println!("      ({}) {}", i + 1, entry.label);
                }
            }
        }
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_text(&self, user: UserId, text: &str, menu: Option<&Menu>) -> Result<MessageId> {
        let id = self.allocate(user);
        println!("[#{} -> {}] {}", id, user, text);

        if let Some(menu) = menu {
            Self::print_menu(menu);
            if menu.kind == MenuKind::Inline {
                if let Ok(mut menus) = self.inline_menus.lock() {
                    menus.insert(user, menu.clone());
                }
            }
        }
        Ok(id)
    }

    async fn send_media(&self, user: UserId, track: &TrackRef) -> Result<MessageId> {
        let id = self.allocate(user);
        println!("[#{} -> {}] 🎧 {}", id, user, track);
        Ok(id)
    }

    async fn delete_message(&self, user: UserId, message: MessageId) -> Result<()> {
        let removed = self
            .live
            .lock()
            .map_err(|e| anyhow!("console state poisoned: {}", e))?
            .get_mut(&user)
            .map(|ids| ids.remove(&message))
            .unwrap_or(false);

        if !removed {
            return Err(anyhow!("message {} is not on screen", message));
        }
        println!("[#{} -> {}] (deleted)", message, user);
        Ok(())
    }
}

/// What one line of console input means
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Event(Event),
    SwitchUser(UserId),
    PressInline(usize),
    Help,
    Quit,
    Invalid(&'static str),
}

fn parse_line(user: UserId, line: &str) -> Input {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "/start" => Input::Event(Event::Start(user)),
        "/help" => Input::Help,
        "/quit" | "/exit" => Input::Quit,
        "/audio" if rest.is_empty() => Input::Invalid("usage: /audio <ref>"),
        "/audio" => Input::Event(Event::MediaInput(user, TrackRef::new(rest))),
        "/as" => rest
            .parse::<i64>()
            .map(|id| Input::SwitchUser(UserId(id)))
            .unwrap_or(Input::Invalid("usage: /as <user_id>")),
        "/button" => rest
            .parse::<usize>()
            .map(Input::PressInline)
            .unwrap_or(Input::Invalid("usage: /button <n>")),
        _ => Input::Event(Event::TextInput(user, line.to_string())),
    }
}

/// Read stdin until EOF or /quit, feeding every line to the bot
pub async fn run(bot: PlaylistBot, first_user: UserId) -> Result<()> {
    let transport = ConsoleTransport::new();
    let mut user = first_user;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);
    println!("talking as user {}", user);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_line(user, &line) {
            Input::Event(event) => event,
            Input::SwitchUser(next) => {
                user = next;
                println!("talking as user {}", user);
                continue;
            }
            Input::PressInline(n) => match transport.inline_button(user, n) {
                Some(button) => Event::ButtonAction(user, button),
                None => {
                    println!("no button {} on the last menu", n);
                    continue;
                }
            },
            Input::Help => {
                println!("{}", HELP);
                continue;
            }
            Input::Quit => break,
            Input::Invalid(usage) => {
                println!("{}", usage);
                continue;
            }
        };

        if let Err(e) = bot.handle(event, &transport).await {
            warn!("Reply delivery failed: {}", e);
        }
    }

    info!("Console session finished");
    Ok(())
}
