//! Local fast path for common commands.
//!
//! Checked before the remote resolver. Each rule inspects the normalized
//! utterance and, on a hit, returns a complete 1-3 step plan immediately —
//! no network, no model. The rule list is a literal ordered table so the
//! first-match-wins priority is visible and testable on its own.

use once_cell::sync::Lazy;
use regex::Regex;
use sentinel_common::domains;
use sentinel_common::personality::{self, ResponseCategory};
use sentinel_common::plan::{ActionStep, Plan};
use tracing::debug;

type RuleFn = fn(&str) -> Option<Plan>;

/// A named fast-path rule.
pub struct FastPathRule {
    pub name: &'static str,
    check: RuleFn,
}

impl FastPathRule {
    pub fn check(&self, text: &str) -> Option<Plan> {
        (self.check)(text)
    }
}

/// The ordered rule battery. Conversational rules run first, mirroring the
/// classifier's bias toward non-action.
static RULES: &[FastPathRule] = &[
    FastPathRule { name: "greeting", check: greeting },
    FastPathRule { name: "thanks", check: thanks },
    FastPathRule { name: "goodbye", check: goodbye },
    FastPathRule { name: "affirmative", check: affirmative },
    FastPathRule { name: "identity", check: identity },
    FastPathRule { name: "capabilities", check: capabilities },
    FastPathRule { name: "status_question", check: status_question },
    FastPathRule { name: "open_target", check: open_target },
    FastPathRule { name: "play_media", check: play_media },
    FastPathRule { name: "screenshot", check: screenshot },
    FastPathRule { name: "show_desktop", check: show_desktop },
    FastPathRule { name: "lock", check: lock },
    FastPathRule { name: "system_status", check: system_status },
];

pub fn rules() -> &'static [FastPathRule] {
    RULES
}

/// Run the battery in order. `None` defers to the resolver tier.
pub fn try_match(text: &str) -> Option<Plan> {
    let text = text.trim().to_lowercase();
    for rule in RULES {
        if let Some(plan) = rule.check(&text) {
            debug!("Fast path hit: {}", rule.name);
            return Some(plan);
        }
    }
    None
}

fn greeting(text: &str) -> Option<Plan> {
    const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "yo", "howdy"];
    GREETING_WORDS
        .contains(&text)
        .then(|| Plan::speak(personality::respond(ResponseCategory::Greeting)))
}

fn thanks(text: &str) -> Option<Plan> {
    text.contains("thank")
        .then(|| Plan::speak(personality::respond(ResponseCategory::Thanks)))
}

fn goodbye(text: &str) -> Option<Plan> {
    const GOODBYE_WORDS: &[&str] = &["bye", "goodbye", "see ya", "later", "cya"];
    GOODBYE_WORDS
        .iter()
        .any(|w| text == *w)
        .then(|| Plan::speak(personality::respond(ResponseCategory::Goodbye)))
}

fn affirmative(text: &str) -> Option<Plan> {
    const AFFIRMATIVES: &[&str] = &["ok", "okay", "alright", "sure", "cool", "nice", "great"];
    AFFIRMATIVES
        .contains(&text.trim_end_matches(['!', '.', '?']))
        .then(|| Plan::speak(personality::respond(ResponseCategory::Done)))
}

fn identity(text: &str) -> Option<Plan> {
    (text.contains("who are you") || text.contains("what are you"))
        .then(|| Plan::speak(personality::respond(ResponseCategory::Identity)))
}

fn capabilities(text: &str) -> Option<Plan> {
    (text.contains("what can you do") || text.contains("capabilities"))
        .then(|| Plan::speak(personality::respond(ResponseCategory::Capabilities)))
}

fn status_question(text: &str) -> Option<Plan> {
    text.contains("how are you")
        .then(|| Plan::speak(personality::respond(ResponseCategory::Status)))
}

static OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:open|go\s*to|visit|launch|start)\s+(.+?)(?:\s+(?:website|site|page|app))?$")
        .expect("open pattern compiles")
});

fn open_target(text: &str) -> Option<Plan> {
    let caps = OPEN_RE.captures(text)?;
    let target = caps[1].trim();

    if let Some(url) = domains::canonical_url(target) {
        return Some(Plan::new(vec![
            ActionStep::OpenUrl(url.to_string()),
            ActionStep::Speak(format!("Opening {}.", target)),
        ]));
    }
    if let Some(cmd) = domains::app_launch_target(target) {
        return Some(Plan::new(vec![
            ActionStep::LaunchApp(cmd.to_string()),
            ActionStep::Speak(format!("Launching {}.", target)),
        ]));
    }

    // Unknown target: ask for the exact address. A URL is never fabricated.
    Some(Plan::chat(personality::respond(ResponseCategory::UnknownSite)))
}

static PLAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^play\s+(.+?)(?:\s+on\s+youtube|\s+on\s+spotify|\s+music)?$")
        .expect("play pattern compiles")
});

fn play_media(text: &str) -> Option<Plan> {
    let caps = PLAY_RE.captures(text)?;
    let subject = caps[1].trim();
    if subject.len() < 2 {
        // Too short to be a media title; let the core or resolver ask.
        return None;
    }
    Some(Plan::new(vec![
        ActionStep::PlayMedia(subject.to_string()),
        ActionStep::Speak(format!("Playing {}.", subject)),
    ]))
}

fn screenshot(text: &str) -> Option<Plan> {
    (text.contains("screenshot") || text.contains("screen shot")).then(|| {
        Plan::new(vec![
            ActionStep::Screenshot("capture".to_string()),
            ActionStep::Speak("Captured.".to_string()),
        ])
    })
}

fn show_desktop(text: &str) -> Option<Plan> {
    (text.contains("minimize all") || text.contains("show desktop")).then(|| {
        Plan::new(vec![
            ActionStep::Shortcut("show desktop".to_string()),
            ActionStep::Speak("Done.".to_string()),
        ])
    })
}

fn lock(text: &str) -> Option<Plan> {
    (text.contains("lock the pc") || text.contains("lock screen") || text == "lock").then(|| {
        Plan::new(vec![
            ActionStep::Shortcut("lock".to_string()),
            ActionStep::Speak("Locked.".to_string()),
        ])
    })
}

fn system_status(text: &str) -> Option<Plan> {
    const STATUS_PHRASES: &[&str] = &["system status", "status report", "system health", "battery"];
    STATUS_PHRASES.iter().any(|p| text.contains(p)).then(|| {
        Plan::new(vec![
            ActionStep::SystemCheck(String::new()),
            ActionStep::Speak("Systems check complete.".to_string()),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::plan::ActionKind;

    #[test]
    fn greeting_hits_first() {
        let plan = try_match("hello").unwrap();
        assert!(plan.speech_only());
        assert_eq!(plan.steps.len(), 1);
    }

    #[test]
    fn open_known_site_builds_a_two_step_plan() {
        let plan = try_match("open youtube").unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(
            plan.steps[0],
            ActionStep::OpenUrl("https://www.youtube.com".to_string())
        );
        assert_eq!(plan.steps[1].kind(), ActionKind::Speak);
    }

    #[test]
    fn open_known_app_launches() {
        let plan = try_match("start calculator").unwrap();
        assert_eq!(plan.steps[0], ActionStep::LaunchApp("calc".to_string()));
    }

    #[test]
    fn open_unknown_site_asks_instead_of_guessing() {
        let plan = try_match("open my cousins blog").unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].kind(), ActionKind::Chat);
        assert!(plan.speech_only());
    }

    #[test]
    fn play_builds_media_plan_and_strips_platform() {
        let plan = try_match("play starboy on youtube").unwrap();
        assert_eq!(plan.steps[0], ActionStep::PlayMedia("starboy".to_string()));
    }

    #[test]
    fn play_without_a_title_defers() {
        assert!(try_match("play x").is_none());
    }

    #[test]
    fn screenshot_and_desktop_and_lock() {
        assert_eq!(
            try_match("take a screenshot").unwrap().steps[0].kind(),
            ActionKind::Screenshot
        );
        assert_eq!(
            try_match("minimize all windows").unwrap().steps[0],
            ActionStep::Shortcut("show desktop".to_string())
        );
        assert_eq!(
            try_match("lock screen").unwrap().steps[0],
            ActionStep::Shortcut("lock".to_string())
        );
    }

    #[test]
    fn status_report_checks_the_system() {
        let plan = try_match("status report").unwrap();
        assert_eq!(plan.steps[0].kind(), ActionKind::SystemCheck);
    }

    #[test]
    fn unmatched_text_defers_to_the_resolver() {
        assert!(try_match("write a poem about rust").is_none());
    }

    #[test]
    fn rule_order_is_stable() {
        let names: Vec<&str> = rules().iter().map(|r| r.name).collect();
        let greeting_pos = names.iter().position(|n| *n == "greeting").unwrap();
        let open_pos = names.iter().position(|n| *n == "open_target").unwrap();
        assert!(greeting_pos < open_pos, "conversational rules come first");
    }
}
