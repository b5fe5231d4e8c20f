//! Advisory session bookkeeping.
//!
//! Remembers which websites and apps this session already opened so the
//! core can answer "already open" instead of re-launching. Not authoritative
//! about real OS state (the user may close things behind our back), so it is
//! UX sugar on top of the guard, never a safety mechanism.

use sentinel_common::ActionKind;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct SessionContext {
    open_websites: HashSet<String>,
    open_apps: HashSet<String>,
    pub last_command: String,
    pub last_action: Option<ActionKind>,
    pub last_target: String,
    pub conversation_count: u32,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful dispatch.
    pub fn update(&mut self, command: &str, kind: ActionKind, target: &str) {
        self.last_command = command.to_string();
        self.last_action = Some(kind);
        self.last_target = target.to_string();

        let target = target.to_lowercase();
        match kind {
            ActionKind::OpenUrl => {
                self.open_websites.insert(target);
            }
            ActionKind::LaunchApp => {
                self.open_apps.insert(target);
            }
            _ => {}
        }
    }

    /// Whether this session believes the target is already open.
    pub fn is_already_open(&self, target: &str, kind: ActionKind) -> bool {
        let target = target.to_lowercase();
        match kind {
            ActionKind::OpenUrl => self.open_websites.contains(&target),
            ActionKind::LaunchApp => self.open_apps.contains(&target),
            _ => false,
        }
    }

    /// Forget a target after an external close signal.
    pub fn mark_closed(&mut self, target: &str, kind: ActionKind) {
        let target = target.to_lowercase();
        match kind {
            ActionKind::OpenUrl => {
                self.open_websites.remove(&target);
            }
            ActionKind::LaunchApp => {
                self.open_apps.remove(&target);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_tracks_websites_and_apps_separately() {
        let mut ctx = SessionContext::new();
        ctx.update("open youtube", ActionKind::OpenUrl, "YouTube");
        ctx.update("open notepad", ActionKind::LaunchApp, "notepad");

        assert!(ctx.is_already_open("youtube", ActionKind::OpenUrl));
        assert!(!ctx.is_already_open("youtube", ActionKind::LaunchApp));
        assert!(ctx.is_already_open("NOTEPAD", ActionKind::LaunchApp));
        assert_eq!(ctx.last_target, "notepad");
    }

    #[test]
    fn non_open_actions_do_not_register() {
        let mut ctx = SessionContext::new();
        ctx.update("play jazz", ActionKind::PlayMedia, "jazz");
        assert!(!ctx.is_already_open("jazz", ActionKind::PlayMedia));
    }

    #[test]
    fn mark_closed_forgets() {
        let mut ctx = SessionContext::new();
        ctx.update("open github", ActionKind::OpenUrl, "github");
        ctx.mark_closed("GitHub", ActionKind::OpenUrl);
        assert!(!ctx.is_already_open("github", ActionKind::OpenUrl));
    }
}
