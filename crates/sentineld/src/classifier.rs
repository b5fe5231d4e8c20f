//! Intent classification.
//!
//! A strict first-match-wins cascade over the normalized utterance. The
//! conversational check runs before every action rule: a request phrased as
//! a question must never trigger a side effect, even when it contains an
//! action verb ("what happens if I open the browser" stays conversational).

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use sentinel_common::{domains, Intent};

/// Stop phrases halt everything and clear the guard.
static STOP_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^stop[\s!.]*$",
        r"^cancel[\s!.]*$",
        r"^abort[\s!.]*$",
        r"^halt[\s!.]*$",
        r"^nevermind[\s!.]*$",
        r"^never\s*mind[\s!.]*$",
        r"^quit[\s!.]*$",
        r"^exit[\s!.]*$",
    ])
    .expect("stop patterns compile")
});

/// Conversational triggers. Actions are never executed for these.
static CONVERSATIONAL_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        // Greetings (with optional words after)
        r"^(hi|hello|hey|yo|sup|howdy|greetings?)\b.*$",
        r"^good\s*(morning|afternoon|evening|night).*$",
        r"^what'?s?\s*up.*$",
        r"^how'?s?\s*it\s*going.*$",
        // Thanks / bye / bare acknowledgments
        r"^(thanks?|thank\s*you|thx|ty)\b.*$",
        r"^(bye|goodbye|see\s*ya|later|cya)\b.*$",
        r"^(ok|okay|alright|sure|cool|nice|great|awesome)[\s!.?]*$",
        // Questions about the assistant
        r"^who\s*(are|r)\s*you",
        r"^what\s*(are|r)\s*you",
        r"^what\s*can\s*you\s*do",
        r"^(can|could|will|would)\s*you\s*(help|assist)",
        r"^tell\s*me\s*about\s*(yourself|you)",
        r"^how\s*(are|r)\s*you",
        r"^are\s*you\s*(there|alive|ready|listening)",
        // General questions, not action requests
        r"^(what|how|why|when|where|who)\s+(is|are|was|were|do|does|did|can|could|would|should)\b",
        r"^(do|does|did|can|could|would|should|is|are)\s+(you|it|this|that)\b",
        r"^(explain|describe|tell\s*me)\b",
    ])
    .expect("conversational patterns compile")
});

/// Question starters: any sentence opening with one of these is treated as
/// conversational regardless of what follows.
const QUESTION_STARTERS: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "is it", "are you", "can you", "do you",
    "does it", "would", "could", "should", "will it", "explain", "tell me",
];

static PLAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^play\s+(.+?)(?:\s+on\s+youtube|\s+on\s+spotify|\s+music)?$")
        .expect("play pattern compiles")
});

static OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:open|go\s*to|visit|launch)\s+(.+)$").expect("open pattern compiles")
});

static OPEN_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(website|site|page|app)$").expect("suffix pattern compiles"));

static TYPE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(type|write|enter)\s+").expect("type pattern compiles"));

const SCREENSHOT_KEYWORDS: &[&str] = &["screenshot", "screen shot", "capture", "snap"];

const SYSTEM_KEYWORDS: &[&str] = &[
    "shutdown", "restart", "lock", "sleep", "hibernate", "minimize", "maximize", "close",
    "status", "battery",
];

const BROWSER_KEYWORDS: &[&str] = &["new tab", "close tab", "refresh", "next tab", "switch tab"];

const FILE_KEYWORDS: &[&str] = &["create folder", "delete file", "new folder", "remove"];

/// True when the utterance is conversational: a greeting/social phrase or a
/// question. Reused by the resolver safety filter to decide whether a plan
/// may carry side effects at all.
pub fn is_conversational(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if CONVERSATIONAL_PATTERNS.is_match(&text) {
        return true;
    }
    QUESTION_STARTERS
        .iter()
        .any(|starter| text.starts_with(starter))
}

/// Classify an utterance. Total: every input gets exactly one intent, with
/// `Unknown` as the default.
pub fn classify(text: &str) -> (Intent, Option<String>) {
    let text = text.trim().to_lowercase();

    // 1. Stop commands, highest priority.
    if STOP_PATTERNS.is_match(&text) {
        return (Intent::StopCommand, None);
    }

    // 2. Conversational, checked before any action rule.
    if CONVERSATIONAL_PATTERNS.is_match(&text) {
        return (Intent::Conversational, Some(text));
    }
    if QUESTION_STARTERS.iter().any(|s| text.starts_with(s)) {
        return (Intent::Conversational, Some(text));
    }

    // 3. Play media.
    if let Some(caps) = PLAY_RE.captures(&text) {
        let subject = caps[1].trim().to_string();
        return (Intent::PlayMedia, Some(subject));
    }

    // 4. Open / navigate.
    if let Some(caps) = OPEN_RE.captures(&text) {
        let target = OPEN_SUFFIX_RE.replace(caps[1].trim(), "").trim().to_string();

        if domains::is_known_site(&target) {
            return (Intent::OpenWebsite, Some(target));
        }
        if domains::is_known_app(&target) {
            return (Intent::OpenApp, Some(target));
        }
        if domains::looks_like_domain(&target) {
            return (Intent::OpenWebsite, Some(target));
        }
        // Anything else still reads as a website request, left unresolved
        // for the core to ask about. Never guessed.
        return (Intent::OpenWebsite, Some(target));
    }

    // 5. Screenshot.
    if SCREENSHOT_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return (Intent::Screenshot, None);
    }

    // 6. System control.
    if SYSTEM_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return (Intent::SystemControl, Some(text));
    }

    // 7. Browser control.
    if BROWSER_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return (Intent::BrowserControl, Some(text));
    }

    // 8. Type text.
    if TYPE_PREFIX_RE.is_match(&text) {
        let content = TYPE_PREFIX_RE.replace(&text, "").to_string();
        return (Intent::TypeText, Some(content));
    }

    // 9. File operations.
    if FILE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return (Intent::FileOperation, Some(text));
    }

    // 10. Multi-step: a conjunction plus a sequencing cue.
    if text.contains(" and ") && (text.contains("then") || text.contains("after")) {
        return (Intent::MultiStep, Some(text));
    }

    (Intent::Unknown, Some(text))
}
