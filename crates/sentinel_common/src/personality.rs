//! Canned response phrasing.
//!
//! Short, calm, slightly wry. The picker is stateless; callers that need a
//! deterministic choice use `options()` and index themselves.

use rand::Rng;

/// Response category for the canned tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCategory {
    Done,
    Already,
    Blocked,
    Greeting,
    Goodbye,
    Thanks,
    UnknownSite,
    Capabilities,
    Identity,
    Status,
}

const ACK_DONE: &[&str] = &[
    "Done.",
    "That's handled.",
    "Taken care of.",
    "On it.",
    "Completed.",
];

const ACK_ALREADY: &[&str] = &[
    "Already open.",
    "That's already running.",
    "Still there. Want me to refresh?",
    "Already done. I don't forget that fast.",
    "It's open. Need me to bring it forward?",
];

const ACK_BLOCKED: &[&str] = &[
    "Hold on. You just asked for that.",
    "I heard you the first time.",
    "Still on cooldown. Give it a moment.",
    "That's a duplicate. Skipping.",
];

const GREETINGS: &[&str] = &[
    "Ready when you are.",
    "Standing by.",
    "At your service.",
    "Online and listening.",
    "What do you need?",
];

const GOODBYES: &[&str] = &[
    "Standing down.",
    "Going quiet.",
    "Call if you need me.",
    "Offline.",
];

const THANKS_RESPONSES: &[&str] = &[
    "Anytime.",
    "That's what I'm here for.",
    "Copy that.",
    "No problem.",
];

const UNKNOWN_SITE: &[&str] = &[
    "Don't recognize that site. Can you spell it out?",
    "Not in my records. What's the exact URL?",
    "Unknown domain. Full address please?",
];

const CAPABILITIES: &[&str] = &[
    "Open apps, websites, play music, type text, screenshots, system control. What do you need?",
];

const IDENTITY: &[&str] = &[
    "Sentinel. Your desktop assistant. Built for speed and precision.",
];

const STATUS: &[&str] = &["Operational. Systems nominal."];

/// Table backing a category. Exposed so tests can assert membership.
pub fn options(category: ResponseCategory) -> &'static [&'static str] {
    match category {
        ResponseCategory::Done => ACK_DONE,
        ResponseCategory::Already => ACK_ALREADY,
        ResponseCategory::Blocked => ACK_BLOCKED,
        ResponseCategory::Greeting => GREETINGS,
        ResponseCategory::Goodbye => GOODBYES,
        ResponseCategory::Thanks => THANKS_RESPONSES,
        ResponseCategory::UnknownSite => UNKNOWN_SITE,
        ResponseCategory::Capabilities => CAPABILITIES,
        ResponseCategory::Identity => IDENTITY,
        ResponseCategory::Status => STATUS,
    }
}

/// Pick a phrase from the category table.
pub fn respond(category: ResponseCategory) -> String {
    let table = options(category);
    let idx = rand::thread_rng().gen_range(0..table.len());
    table[idx].to_string()
}
